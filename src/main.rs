#[tokio::main]
async fn main() -> anyhow::Result<()> {
    if let Err(e) = trainee_rust::run().await {
        eprintln!("trainee-rust fatal: {e:#}");
        std::process::exit(1);
    }
    Ok(())
}
