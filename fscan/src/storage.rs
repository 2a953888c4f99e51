use crate::table::ALL_TABLES;
use crate::{info, AppError};
use redb::{Database, ReadTransaction, WriteTransaction};
use std::path::PathBuf;
use std::sync::Arc;
use std::{env, fs};

/// Handle to the explorer database, shared by every request.
#[derive(Clone)]
pub struct Storage {
    pub db: Arc<Database>,
}

impl Storage {
    pub fn new(db: Arc<Database>) -> Self {
        Self { db }
    }

    pub fn temp(name: &str, db_cache_size_mb: usize, random: bool) -> Result<Arc<Storage>, AppError> {
        let db_name = if random {
            format!("{}_{}", name, rand::random::<u64>())
        } else {
            name.to_string()
        };
        let db_path = env::temp_dir().join(format!("{}/{}", "fscan", db_name));
        if random && db_path.exists() {
            fs::remove_dir_all(&db_path)?;
        }
        let (_, storage) = Storage::init(db_path, db_cache_size_mb)?;
        Ok(storage)
    }

    /// Opens or creates the database under `db_dir`, returns whether it was freshly created.
    pub fn init(db_dir: PathBuf, db_cache_size_mb: usize) -> Result<(bool, Arc<Storage>), AppError> {
        let db_path = db_dir.join("fscan.db");
        let created = !db_path.exists();
        if created {
            fs::create_dir_all(&db_dir)?;
        } else {
            info!("Opening existing db at {:?}", db_path);
        }
        let db = Database::builder().set_cache_size(db_cache_size_mb * 1024 * 1024).create(db_path)?;
        let storage = Storage::new(Arc::new(db));
        storage.create_tables()?;
        Ok((created, Arc::new(storage)))
    }

    fn create_tables(&self) -> Result<(), AppError> {
        let write_tx = self.db.begin_write()?;
        for def in ALL_TABLES {
            write_tx.open_table(*def)?;
        }
        write_tx.commit()?;
        Ok(())
    }

    pub fn begin_read(&self) -> Result<ReadTransaction, AppError> {
        Ok(self.db.begin_read()?)
    }

    pub fn begin_write(&self) -> Result<WriteTransaction, AppError> {
        Ok(self.db.begin_write()?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::table::BLOCKS;
    use redb::ReadableTableMetadata;

    #[test]
    fn temp_storage_starts_with_empty_tables() {
        let storage = Storage::temp("storage_empty", 8, true).expect("Failed to create storage");
        let read_tx = storage.begin_read().expect("Failed to begin read transaction");
        let blocks = read_tx.open_table(BLOCKS).expect("Failed to open table");
        assert_eq!(blocks.len().expect("Failed to count"), 0);
    }

    #[test]
    fn reopening_keeps_existing_database() {
        let dir = env::temp_dir().join(format!("fscan/storage_reopen_{}", rand::random::<u64>()));
        let (created, storage) = Storage::init(dir.clone(), 8).expect("Failed to init storage");
        assert!(created);
        drop(storage);
        let (created, _) = Storage::init(dir, 8).expect("Failed to reopen storage");
        assert!(!created);
    }
}
