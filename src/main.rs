use anyhow::Context;
use chrono::Local;
use clap::{Parser, Subcommand};
use configuration::{Backend, Config};
use database::FarmRepository;
use indicatif::{ProgressBar, ProgressStyle};
use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use web_server::AppState;

mod menu;

use menu::Menu;

/// The main entry point for the FarmTech application.
fn main() -> anyhow::Result<()> {
    // A missing .env file is fine; the configuration has defaults.
    dotenvy::dotenv().ok();

    // Parse command-line arguments
    let cli = Cli::parse();

    let mut config = configuration::load_config(cli.config.as_deref())?;
    if let Some(backend) = cli.backend {
        config.database.backend = backend;
        configuration::validate(&config)?;
    }
    let _guard = configuration::init_tracing(&config.logging)?;

    // Every action is awaited before the next one starts; one thread is enough.
    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()?;
    runtime.block_on(run(cli.command.unwrap_or(Commands::Menu), config))
}

// ==============================================================================
// CLI Structure
// ==============================================================================

/// Record keeping for farm producers, areas, crops, sensors and their readings.
#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Path to a TOML configuration file. Defaults to ./farmtech.toml when present.
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Overrides `database.backend` from the configuration.
    #[arg(long, global = true, value_enum)]
    backend: Option<Backend>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Interactive numbered menu (the default when no command is given).
    Menu,
    /// Replace the demo producer and load generated sensor history.
    Seed(SeedArgs),
    /// Serve the JSON dashboard.
    Serve(ServeArgs),
    /// Print the next humidity value predicted for an area.
    Forecast(ForecastArgs),
}

#[derive(Parser)]
struct SeedArgs {
    /// Readings per series. Defaults to `seed.readings_per_series`.
    #[arg(long)]
    count: Option<usize>,
}

#[derive(Parser)]
struct ServeArgs {
    /// Address to bind. Defaults to `dashboard.bind_addr`.
    #[arg(long)]
    addr: Option<SocketAddr>,
}

#[derive(Parser)]
struct ForecastArgs {
    /// The area whose humidity sensors are used.
    #[arg(long)]
    area: i64,

    /// Seconds past the newest reading. Defaults to `forecast.horizon_secs`.
    #[arg(long)]
    horizon_secs: Option<i64>,
}

// ==============================================================================
// Command Logic
// ==============================================================================

async fn run(command: Commands, config: Config) -> anyhow::Result<()> {
    // Not reaching the database is the one failure that stops the program up front.
    let repo = database::create_repository(&config.database)
        .await
        .with_context(|| {
            format!(
                "Could not open the {} database. Check the [database] settings.",
                config.database.backend
            )
        })?;

    match command {
        Commands::Menu => handle_menu(repo, &config).await,
        Commands::Seed(args) => handle_seed(args, repo, &config).await,
        Commands::Serve(args) => handle_serve(args, repo, &config).await,
        Commands::Forecast(args) => handle_forecast(args, repo, &config).await,
    }
}

async fn handle_menu(repo: Arc<dyn FarmRepository>, config: &Config) -> anyhow::Result<()> {
    let stdin = std::io::stdin();
    let stdout = std::io::stdout();
    let horizon = forecast::horizon_from_secs(config.forecast.horizon_secs)?;
    let mut menu = Menu::new(repo.as_ref(), stdin.lock(), stdout.lock(), horizon);
    menu.run().await
}

async fn handle_seed(
    args: SeedArgs,
    repo: Arc<dyn FarmRepository>,
    config: &Config,
) -> anyhow::Result<()> {
    let count = args.count.unwrap_or(config.seed.readings_per_series);

    let spinner = ProgressBar::new_spinner();
    spinner.set_style(ProgressStyle::default_spinner().template("{spinner:.green} [{elapsed_precise}] {msg}")?);
    spinner.enable_steady_tick(Duration::from_millis(100));
    spinner.set_message(format!("Seeding demo data ({} readings per series)...", count));

    let result = seeder::populate(repo.as_ref(), count, Local::now().naive_local()).await;
    match &result {
        Ok(_) => spinner.finish_with_message("Seeding complete!"),
        Err(_) => spinner.abandon_with_message("Seeding failed."),
    }
    let summary = result?;

    if summary.replaced_previous {
        println!("Previous demo data was removed first.");
    }
    println!(
        "Demo producer {}: {} areas, {} sensors, {} readings, {} new crops.",
        summary.producer_id, summary.areas, summary.sensors, summary.readings, summary.crops_created
    );
    Ok(())
}

async fn handle_serve(
    args: ServeArgs,
    repo: Arc<dyn FarmRepository>,
    config: &Config,
) -> anyhow::Result<()> {
    let addr = args.addr.unwrap_or(config.dashboard.bind_addr);
    let horizon = forecast::horizon_from_secs(config.forecast.horizon_secs)?;
    println!("Dashboard listening on http://{}", addr);
    web_server::run_server(addr, AppState::new(repo, horizon)).await
}

async fn handle_forecast(
    args: ForecastArgs,
    repo: Arc<dyn FarmRepository>,
    config: &Config,
) -> anyhow::Result<()> {
    let horizon = match args.horizon_secs {
        Some(secs) => forecast::horizon_from_secs(secs).context("Invalid --horizon-secs")?,
        None => forecast::horizon_from_secs(config.forecast.horizon_secs)?,
    };

    let area = repo.get_area(args.area).await?;
    let points: Vec<_> = repo
        .list_area_readings(area.id, Some(core_types::SensorKind::Humidity))
        .await?
        .iter()
        .map(|r| r.point())
        .collect();
    let forecast = forecast::next_step(&points, horizon)
        .with_context(|| format!("No forecast for area '{}'", area.name))?;

    println!(
        "{} ({}): humidity {:.2}% expected at {} (trend {:+.2} per hour, {} readings).",
        area.name,
        area.location,
        forecast.value,
        forecast.at.format("%Y-%m-%d %H:%M:%S"),
        forecast.slope_per_hour,
        forecast.samples
    );
    Ok(())
}
