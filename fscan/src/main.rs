use fscan::{error, launcher};

#[tokio::main]
async fn main() {
    if let Err(e) = launcher::launch(None, None).await {
        error!("fscan failed: {}", e);
        std::process::exit(1);
    }
}
