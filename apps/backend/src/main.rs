#[tokio::main]
async fn main() -> anyhow::Result<()> {
    grammar_backend::run().await
}
