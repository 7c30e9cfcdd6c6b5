mod cli;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::init();
    aroundyou::config::load_env_files();

    cli::run().await?;
    Ok(())
}
