use aroundyou::app::App;
use aroundyou::clients::errors::Result;
use aroundyou::config::ConfigBuilder;
use aroundyou::flow::{FlowState, Trigger};
use aroundyou::render::{PlayerState, View};
use clap::{Parser, Subcommand};
use log::info;
use serde_json::json;

#[derive(Parser)]
#[command(name = "aroundyou")]
#[command(version, about = "New music releases around you", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Show the new releases for your country
    Around {
        /// Skip the geo lookup and use this country code
        #[arg(long)]
        country: Option<String>,
    },
    /// Request a client-credentials token and print it
    Token {},
    /// Top charts (new releases, unfiltered)
    Charts {},
    /// Recommendations seeded by a genre
    Genre { genre: String },
    /// Search tracks
    Search { term: String },
    /// Artist details
    Artist { id: String },
    /// Track details
    Track { id: String },
    /// Tracks related to a track
    Related { id: String },
}

pub async fn run() -> Result<()> {
    let cli = Cli::parse();

    info!("Building config ...");
    let config = ConfigBuilder::from_env()?.build()?;
    let app = App::from_config(&config)?;

    let value = match cli.command {
        Commands::Around { country } => return around_you(&app, country).await,
        Commands::Token {} => return print_token(&app).await,
        Commands::Charts {} => app.catalog.top_charts().await?,
        Commands::Genre { genre } => app.catalog.songs_by_genre(&genre).await?,
        Commands::Search { term } => app.catalog.songs_by_search(&term).await?,
        Commands::Artist { id } => app.catalog.artist_details(&id).await?,
        Commands::Track { id } => app.catalog.song_details(&id).await?,
        Commands::Related { id } => app.catalog.song_related(&id).await?,
    };
    println!("{}", serde_json::to_string_pretty(&value)?);
    Ok(())
}

async fn around_you(app: &App, country: Option<String>) -> Result<()> {
    let trigger = Trigger::from_country(country.as_deref());
    let player = PlayerState::default();

    eprint!("{}", View::new(&FlowState::Loading, "", &player));
    app.controller.invoke(trigger).await;
    let snapshot = app.controller.snapshot();
    print!("{}", View::from_snapshot(&snapshot, &player));
    Ok(())
}

async fn print_token(app: &App) -> Result<()> {
    let token = app.fresh_token().await?;
    let body = json!({
        "access_token": &token.value,
        "token_type": &token.token_type,
        "expires_in": token.remaining().as_secs(),
    });
    println!("{}", serde_json::to_string_pretty(&body)?);
    Ok(())
}
