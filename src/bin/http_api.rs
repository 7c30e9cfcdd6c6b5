use aroundyou::config::{ConfigBuilder, load_env_files};
use aroundyou::server;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::init();
    load_env_files();

    let config = ConfigBuilder::from_env()?.build()?;
    server::serve(config).await?;
    Ok(())
}
