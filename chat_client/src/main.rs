use std::sync::Arc;

use anyhow::Context;
use clap::Parser;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tracing::info;

use chat_client::{ChatError, ChatSession, ClientConfig, OpenAiAgent, RodioPlayer, SpeechDispatcher};

#[derive(Parser, Debug)]
#[command(name = "notes-chat", about = "Chat with the notes assistant and hear its replies")]
struct Args {
    /// Speech relay URL (overrides BACKEND_URL)
    #[arg(long)]
    backend_url: Option<String>,

    /// Do not speak replies
    #[arg(long)]
    mute: bool,

    /// Enable debug logging
    #[arg(short, long)]
    verbose: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let _ = dotenv::dotenv();
    let args = Args::parse();

    let default_level = if args.verbose { "debug" } else { "warn" };
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(default_level)),
        )
        .init();

    let mut config = ClientConfig::from_env();
    if let Some(url) = args.backend_url {
        config.backend_url = url.trim_end_matches('/').to_string();
    }

    if config.openai_api_key.is_none() {
        eprintln!("API Key Missing: set OPENAI_API_KEY in your environment or a .env file.");
        anyhow::bail!("OPENAI_API_KEY is not set");
    }
    let agent = OpenAiAgent::from_config(&config).context("could not create the agent")?;

    let speech = (!args.mute)
        .then(|| SpeechDispatcher::new(config.backend_url.clone(), Arc::new(RodioPlayer::new())));
    info!(backend = %config.backend_url, muted = args.mute, "Chat session ready");

    let mut session = ChatSession::new(Arc::new(agent), speech);
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let mut stdout = tokio::io::stdout();

    loop {
        stdout.write_all(b"> ").await?;
        stdout.flush().await?;
        let Some(line) = lines.next_line().await? else {
            break;
        };

        if let Some(output) = session.handle_command(&line) {
            println!("{}", output.trim_end());
            continue;
        }

        match session.send_message(&line).await {
            Ok(reply) => println!("{reply}"),
            Err(ChatError::EmptyInput) => continue,
            Err(e) => eprintln!("error: {e}"),
        }
    }
    Ok(())
}
