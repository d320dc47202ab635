#[tokio::main]
async fn main() -> anyhow::Result<()> {
    sidecar_host::run().await
}
