//! Portfolio CMS - binary entry point
//! Delegates to the library for all app logic.

#[tokio::main]
async fn main() {
    if let Err(e) = portfolio_cms::run().await {
        tracing::error!("FATAL: {}", e);
        eprintln!("FATAL: {}", e);
        std::process::exit(1);
    }
}
