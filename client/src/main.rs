use clap::Parser;
use client::network::Client;
use log::info;
use rand::distributions::Alphanumeric;
use rand::Rng;

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Server WebSocket URL
    #[arg(short = 's', long, env = "GRID_SERVER", default_value = "ws://127.0.0.1:8080")]
    server: String,

    /// Player identifier; a random one is generated when omitted
    #[arg(short = 'p', long, env = "PLAYER_ID")]
    player_id: Option<String>,
}

fn random_player_id() -> String {
    let suffix: String = rand::thread_rng()
        .sample_iter(&Alphanumeric)
        .take(8)
        .map(char::from)
        .collect();
    format!("player-{}", suffix)
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::init();

    if std::env::var("RUST_LOG").is_err() {
        eprintln!("Set RUST_LOG=info for detailed logging");
    }

    let args = Args::parse();
    let player_id = args.player_id.unwrap_or_else(random_player_id);

    info!("Starting viewer...");
    let mut client = Client::new(&args.server, &player_id).await?;

    client.run().await?;

    Ok(())
}
