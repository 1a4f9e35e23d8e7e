use clap::Parser;

use roster_api::{
    config::Config,
    tracing_config::{self, HoneycombConfig},
};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    color_eyre::install()?;
    dotenv::dotenv().ok();
    let mut config = Config::parse();

    let honeycomb_config = config.honeycomb_team.take().map(|team| HoneycombConfig {
        team,
        dataset: std::mem::take(&mut config.honeycomb_dataset),
    });

    tracing_config::configure("roster", std::io::stdout, honeycomb_config)?;

    let server = roster_api::create_server(config).await?;
    let result = server.run().await;

    tracing_config::teardown();

    result?;
    Ok(())
}
