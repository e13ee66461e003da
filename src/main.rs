#[tokio::main(flavor = "current_thread")]
async fn main() -> anyhow::Result<()> {
    tsp_visualizer::cli::run().await
}
