use anyhow::Context;
use web_server::AppState;

// Entry point for `cargo run -p web-server`: the dashboard on its own, configured
// from `farmtech.toml` and the environment like the main binary.
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let config = configuration::load_config(None)?;
    let _guard = configuration::init_tracing(&config.logging)?;

    let repo = database::create_repository(&config.database)
        .await
        .context("could not open the farm database")?;
    let horizon = forecast::horizon_from_secs(config.forecast.horizon_secs)?;
    let state = AppState::new(repo, horizon);
    web_server::run_server(config.dashboard.bind_addr, state).await
}
