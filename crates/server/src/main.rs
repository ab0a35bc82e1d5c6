#[tokio::main]
async fn main() -> anyhow::Result<()> {
    valorie_server::start().await
}
