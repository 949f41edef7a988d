use clap::Parser;
use client::network::{Client, Loadout};
use log::info;
use shared::{default_catalog, make_data_id};

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Server address to connect to
    #[arg(short = 's', long, default_value = "127.0.0.1:8080")]
    server: String,

    /// Player name shown to other clients
    #[arg(short = 'n', long, default_value = "player")]
    name: String,

    /// Equipped head item, by catalog name
    #[arg(long, default_value = "Rookie Helm")]
    head: String,

    /// Equipped body item, by catalog name
    #[arg(long, default_value = "Scout")]
    body: String,

    /// Equipped weapon, by catalog name
    #[arg(short = 'w', long, default_value = "Blaster")]
    weapon: String,

    /// Extra equipment, by catalog name (repeatable)
    #[arg(short = 'e', long = "equip")]
    equipment: Vec<String>,

    /// Free-form extra data sent with the join request
    #[arg(long, default_value = "")]
    extra: String,

    /// Simulate network latency in milliseconds
    #[arg(short = 'l', long, default_value = "0")]
    fake_ping: u64,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::init();

    if std::env::var("RUST_LOG").is_err() {
        eprintln!("Set RUST_LOG=info for detailed logging");
    }

    let args = Args::parse();

    info!("Starting client...");
    info!("Connecting to: {}", args.server);
    if args.fake_ping > 0 {
        info!("Simulating {}ms latency", args.fake_ping);
    }

    let loadout = Loadout {
        player_name: args.name,
        head_id: make_data_id(&args.head),
        body_id: make_data_id(&args.body),
        weapon_id: make_data_id(&args.weapon),
        custom_equipment_ids: args.equipment.iter().map(|name| make_data_id(name)).collect(),
        extra: args.extra,
    };

    let mut client = Client::new(&args.server, loadout, default_catalog(), args.fake_ping).await?;

    client.run().await?;

    Ok(())
}
