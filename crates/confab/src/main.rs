//! # confab
//!
//! Terminal chat client: wires settings, the HTTP transport, and the session
//! controller together, streams the agent's replies to stdout, and sends
//! each stdin line as a user message.

#![deny(unsafe_code)]

use std::io::Write as _;
use std::sync::Arc;

use anyhow::Result;
use clap::Parser;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::watch;
use tracing::error;
use tracing_subscriber::EnvFilter;

use confab_client::{AgentTransport, HttpAgent, SessionController};
use confab_core::{ConversationState, Role};
use confab_settings::Settings;

/// Endpoint used when neither the CLI nor the environment names one.
const DEFAULT_URL: &str = "http://localhost:8000/";

/// Terminal chat for AG-UI agent endpoints.
#[derive(Parser, Debug)]
#[command(name = "confab", about = "Terminal chat for AG-UI agent endpoints")]
struct Cli {
    /// Agent endpoint URL (falls back to AGUI_SERVER_URL, then localhost).
    #[arg(long)]
    url: Option<String>,

    /// Bearer credential (falls back to ACCESS_TOKEN).
    #[arg(long)]
    token: Option<String>,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let settings = Settings::load();
    let url = cli
        .url
        .or_else(|| settings.server_url())
        .unwrap_or_else(|| DEFAULT_URL.to_string());
    let token = cli.token.or_else(|| settings.access_token());

    let mut agent = HttpAgent::new(url);
    if let Some(token) = token {
        agent = agent.with_bearer_token(token);
    }

    let mut session = SessionController::new(Arc::new(agent) as Arc<dyn AgentTransport>);
    session.start()?;

    let printer = tokio::spawn(render_transcript(session.watch_states()));

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    prompt()?;
    while let Some(line) = lines.next_line().await? {
        let line = line.trim();
        if line == "/quit" {
            break;
        }
        if !line.is_empty() {
            if let Err(send_error) = session.send(line).await {
                error!(error = %send_error, "send failed");
            }
        }
        prompt()?;
    }

    session.stop();
    printer.abort();
    Ok(())
}

fn prompt() -> Result<()> {
    let mut stdout = std::io::stdout();
    write!(stdout, "you> ")?;
    stdout.flush()?;
    Ok(())
}

/// Print agent messages as they stream in.
///
/// Tracks how much of the newest message has been printed so each state
/// update only emits the fresh suffix. A snapshot that rewrites history
/// re-renders the transcript from scratch.
async fn render_transcript(mut states: watch::Receiver<ConversationState>) {
    let mut rendered_messages = 0usize;
    let mut rendered_tail = 0usize;

    while states.changed().await.is_ok() {
        let state = states.borrow_and_update().clone();
        let transcript = state.transcript();

        if transcript.len() < rendered_messages {
            // Snapshot rewrote history: start over.
            println!();
            rendered_messages = 0;
            rendered_tail = 0;
        }

        let mut stdout = std::io::stdout();
        while rendered_messages < transcript.len() {
            let message = &transcript[rendered_messages];
            if message.role != Role::User {
                let _ = write!(stdout, "\n{}> {}", message.role, message.content);
            }
            rendered_tail = message.content.len();
            rendered_messages += 1;
        }

        // The newest message may have grown since the last update. A message
        // restart can rewrite the tail entirely, so only stream the suffix
        // when the printed prefix is still a prefix.
        if let Some(message) = transcript.last() {
            if message.role != Role::User && message.content.len() > rendered_tail {
                if message.content.is_char_boundary(rendered_tail) {
                    let _ = write!(stdout, "{}", &message.content[rendered_tail..]);
                } else {
                    let _ = write!(stdout, "\n{}> {}", message.role, message.content);
                }
                rendered_tail = message.content.len();
            }
        }
        let _ = stdout.flush();
    }
}
