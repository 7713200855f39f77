mod chat;
mod serve;

use anyhow::Result;
use clap::{Parser, Subcommand};
use std::net::SocketAddr;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "pairlink")]
#[command(bin_name = "pairlink")]
#[command(about = "Two-party WebRTC rooms: signaling server and terminal peer")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the signaling server.
    Serve {
        #[arg(long, env = "PAIRLINK_BIND", default_value = "0.0.0.0:3001")]
        bind: SocketAddr,

        #[arg(long, default_value_t = pairlink::model::DEFAULT_ROOM_CAPACITY)]
        capacity: usize,

        /// Tell a peer when a newer joiner takes its slot.
        #[arg(long)]
        notify_evicted: bool,

        /// TURN server pushed to peers instead of the public STUN servers.
        #[arg(long, env = "TURN_URL")]
        turn_url: Option<String>,

        #[arg(long, env = "TURN_USERNAME", requires = "turn_url")]
        turn_username: Option<String>,

        #[arg(long, env = "TURN_CREDENTIAL", requires = "turn_url")]
        turn_credential: Option<String>,
    },

    /// Join a room and chat over a data channel.
    Chat {
        #[arg(long, env = "PAIRLINK_SERVER", default_value = "ws://127.0.0.1:3001")]
        server: String,

        #[arg(short, long, default_value = "lobby")]
        room: String,

        /// Prompted for when omitted.
        #[arg(short, long)]
        username: Option<String>,

        /// Send the offer right after joining.
        #[arg(long)]
        initiate: bool,

        #[arg(long)]
        audio: bool,

        #[arg(long)]
        video: bool,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    match Cli::parse().command {
        Commands::Serve {
            bind,
            capacity,
            notify_evicted,
            turn_url,
            turn_username,
            turn_credential,
        } => {
            let turn = turn_url.map(|url| serve::TurnArgs {
                url,
                username: turn_username,
                credential: turn_credential,
            });
            serve::run(bind, capacity, notify_evicted, turn).await
        }
        Commands::Chat {
            server,
            room,
            username,
            initiate,
            audio,
            video,
        } => {
            let args = chat::ChatArgs {
                server,
                room,
                username,
                initiate,
                audio,
                video,
            };
            chat::run(args).await
        }
    }
}
