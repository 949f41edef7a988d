use clap::Parser;
use server::game::GameState;
use server::network::Server;
use server::rules::GameplayRules;
use shared::default_catalog;
use std::time::{Duration, SystemTime, UNIX_EPOCH};

/// Command line arguments
#[derive(Parser, Debug)]
#[clap(author, version, about)]
struct Args {
    /// Server IP address to bind to
    #[clap(short = 'H', long, default_value = "127.0.0.1")]
    host: String,
    /// Server port to listen on
    #[clap(short, long, default_value = "8080")]
    port: u16,
    /// Tick rate (updates per second)
    #[clap(short, long, default_value = "60")]
    tick_rate: u32,
    /// Maximum number of concurrent clients
    #[clap(short, long, default_value = "32")]
    max_clients: usize,
    /// Number of bot opponents to spawn at startup
    #[clap(short, long, default_value = "4")]
    bots: usize,
    /// Simulation seed (defaults to the current time)
    #[clap(short, long)]
    seed: Option<u64>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::init();

    let args = Args::parse();
    let address = format!("{}:{}", args.host, args.port);
    let tick_duration = Duration::from_secs_f64(1.0 / args.tick_rate as f64);

    let seed = match args.seed {
        Some(seed) => seed,
        None => SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_nanos() as u64)
            .unwrap_or(0),
    };

    let game = GameState::new(GameplayRules::default(), default_catalog(), seed);

    log::info!(
        "Starting combat server on {} at {}Hz (seed {})",
        address,
        args.tick_rate,
        seed
    );

    let mut server = Server::new(
        &address,
        tick_duration,
        args.max_clients,
        game,
        args.bots,
    )
    .await?;

    server.run().await?;

    Ok(())
}
