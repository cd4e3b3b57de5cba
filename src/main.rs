use anyhow::Result;
use docflow::cli::App;

#[tokio::main]
async fn main() -> Result<()> {
    let mut app = App::from_args().await?;
    let args = docflow::cli::Args::parse_args();

    app.run(args).await?;

    Ok(())
}
