#[tokio::main]
async fn main() -> anyhow::Result<()> {
    mom_mode_lib::run().await
}
