use tracing::error;

#[tokio::main]
async fn main() {
    if let Err(e) = slot_engine::run().await {
        error!("Fatal: {}", e);
        eprintln!("slot-engine failed to start: {e}");
        std::process::exit(1);
    }
}
