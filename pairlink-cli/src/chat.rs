use anyhow::{Context, Result};
use colored::*;
use dialoguer::Input;
use pairlink::client::{
    MediaOptions, SessionConfig, SessionEvent, SessionEvents, SessionHandle, SignalingConfig,
    TransportConfig, connect,
};
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::warn;

pub struct ChatArgs {
    pub server: String,
    pub room: String,
    pub username: Option<String>,
    pub initiate: bool,
    pub audio: bool,
    pub video: bool,
}

pub async fn run(args: ChatArgs) -> Result<()> {
    let username = match args.username {
        Some(name) => name,
        None => Input::<String>::new()
            .with_prompt("Username")
            .interact_text()
            .context("Failed to read username")?,
    };

    let signaling = SignalingConfig::new(args.server, username.clone(), args.room.clone());
    let config = SessionConfig {
        transport: TransportConfig {
            media: MediaOptions {
                audio: args.audio,
                video: args.video,
            },
            ..TransportConfig::default()
        },
        ..SessionConfig::default()
    };

    let (session, events) = connect(&signaling, config)
        .await
        .context("Failed to join room")?;
    println!(
        "{} {} {} {}",
        "🔗 Joined".green().bold(),
        args.room.cyan(),
        "as".green(),
        username.cyan()
    );
    println!("{}", "Commands: /start, /end, /quit. Anything else is sent.".dimmed());

    tokio::spawn(print_events(events));

    if args.initiate {
        session.start_session().await.context("Failed to start session")?;
    }

    read_input(&session).await?;
    session.end_session().await.ok();
    Ok(())
}

async fn read_input(session: &SessionHandle) -> Result<()> {
    let mut lines = BufReader::new(tokio::io::stdin()).lines();

    while let Some(line) = lines.next_line().await.context("Failed to read stdin")? {
        let line = line.trim();
        let result = match line {
            "" => continue,
            "/quit" => break,
            "/start" => session.start_session().await,
            "/end" => session.end_session().await,
            text => session.send_message(text.to_owned()).await,
        };
        if let Err(e) = result {
            println!("{} {}", "⚠".yellow(), e.to_string().yellow());
        }
    }
    Ok(())
}

async fn print_events(mut events: SessionEvents) {
    while let Some(event) = events.recv().await {
        match event {
            SessionEvent::StateChanged(state) => {
                println!("{} {}", "state:".dimmed(), state.to_string().blue());
            }
            SessionEvent::ChannelStateChanged(channel) => {
                println!("{} {}", "channel:".dimmed(), channel.to_string().blue());
            }
            SessionEvent::Message(data) => {
                println!("{} {}", "peer>".magenta().bold(), String::from_utf8_lossy(&data));
            }
            SessionEvent::RemoteTrack { kind } => {
                println!("{} {:?}", "remote track:".dimmed(), kind);
            }
            SessionEvent::Evicted { room_id } => {
                println!("{} {}", "❌ Evicted from".red().bold(), room_id.to_string().red());
            }
            SessionEvent::Error(e) => {
                warn!("Session error: {}", e);
                println!("{} {}", "❌".red(), e.to_string().red());
            }
        }
    }
}
