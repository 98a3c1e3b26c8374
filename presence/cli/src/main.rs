//! Presence CLI
//!
//! Publishes a rich presence activity and keeps the connection open so the
//! peer keeps displaying it.
//!
//! # Usage
//!
//! ```bash
//! # Show "Details / State" with five minutes remaining, hold for 30 seconds
//! presence --client-id 975346661540909056 --details Details --state State --remaining 300
//!
//! # Application id from the environment, with buttons
//! PRESENCE_CLIENT_ID=975346661540909056 presence --details Coding \
//!     --button "Homepage=https://example.com" --hold 120
//!
//! # With verbose logging
//! RUST_LOG=debug presence --client-id 975346661540909056 --details Coding
//! ```
//!
//! # Environment Variables
//!
//! - `PRESENCE_CLIENT_ID`: Application id (same as `--client-id`)
//! - `PRESENCE_CONNECT_TIMEOUT`: Per-endpoint connect timeout in ms
//! - `PRESENCE_IO_TIMEOUT`: Read/write deadline in ms (0 = none)
//! - `RUST_LOG`: Log level (trace, debug, info, warn, error)
//!
//! # Signals
//!
//! - SIGINT (Ctrl-C): clears the activity and disconnects before `--hold` elapses
//!
//! The peer keys an activity by process id, so it disappears once this process
//! clears it or exits. Another process cannot clear it.

use std::time::Duration;

use anyhow::{anyhow, bail, Context, Result};
use chrono::Utc;
use clap::Parser;
use tokio::signal;
use tracing::{info, warn};

use presence_core::{
    Activity, Assets, Button, Party, Response, Session, SessionConfig, Timestamps,
};

/// Publish a rich presence activity
#[derive(Debug, Parser)]
#[command(name = "presence", version, about)]
struct Args {
    /// Application id registered with the peer
    #[arg(long, env = "PRESENCE_CLIENT_ID")]
    client_id: String,

    /// What the user is currently doing
    #[arg(long, default_value = "")]
    details: String,

    /// The user's current party status
    #[arg(long, default_value = "")]
    state: String,

    /// Uploaded asset name for the large image
    #[arg(long, default_value = "")]
    large_image: String,

    /// Tooltip for the large image
    #[arg(long, default_value = "")]
    large_text: String,

    /// Uploaded asset name for the small image
    #[arg(long, default_value = "")]
    small_image: String,

    /// Tooltip for the small image
    #[arg(long, default_value = "")]
    small_text: String,

    /// Party id
    #[arg(long)]
    party_id: Option<String>,

    /// Party size as CURRENT/MAX
    #[arg(long, value_parser = parse_party_size)]
    party_size: Option<[u32; 2]>,

    /// Link button as LABEL=URL (at most two)
    #[arg(long = "button", value_parser = parse_button)]
    buttons: Vec<Button>,

    /// Show time elapsed since now
    #[arg(long, conflicts_with = "remaining")]
    elapsed: bool,

    /// Show time remaining, in seconds from now
    #[arg(long)]
    remaining: Option<u64>,

    /// Seconds to keep the connection (and the activity) alive
    #[arg(long, default_value_t = 30)]
    hold: u64,
}

impl Args {
    fn activity(&self) -> Result<Activity> {
        let now = Utc::now();
        let timestamps = if self.elapsed {
            Some(Timestamps::started_at(now))
        } else if let Some(secs) = self.remaining {
            let end = i64::try_from(secs)
                .ok()
                .and_then(chrono::Duration::try_seconds)
                .and_then(|remaining| now.checked_add_signed(remaining))
                .context("--remaining is too large")?;
            Some(Timestamps::ends_at(end))
        } else {
            None
        };

        let assets = Assets {
            large_image: self.large_image.clone(),
            large_text: self.large_text.clone(),
            small_image: self.small_image.clone(),
            small_text: self.small_text.clone(),
        };

        let party = (self.party_id.is_some() || self.party_size.is_some()).then(|| Party {
            id: self.party_id.clone().unwrap_or_default(),
            size: self.party_size,
        });

        if self.buttons.len() > 2 {
            bail!("at most two buttons are allowed, got {}", self.buttons.len());
        }

        Ok(Activity {
            details: self.details.clone(),
            state: self.state.clone(),
            timestamps,
            assets: (assets != Assets::default()).then_some(assets),
            party,
            secrets: None,
            buttons: self.buttons.clone(),
        })
    }
}

fn parse_party_size(value: &str) -> Result<[u32; 2]> {
    let (current, max) = value
        .split_once('/')
        .ok_or_else(|| anyhow!("expected CURRENT/MAX, got {value:?}"))?;
    Ok([current.trim().parse()?, max.trim().parse()?])
}

fn parse_button(value: &str) -> Result<Button> {
    let (label, url) = value
        .split_once('=')
        .ok_or_else(|| anyhow!("expected LABEL=URL, got {value:?}"))?;
    if label.is_empty() || url.is_empty() {
        bail!("button label and URL must both be set");
    }
    Ok(Button::new(label, url))
}

/// Log the peer's verdict on a SET_ACTIVITY command
fn report(ack: &presence_core::Frame) {
    match ack.json::<Response>() {
        Ok(response) => match response.error() {
            Some(error) => warn!(code = error.code, message = %error.message, "Peer rejected activity"),
            None => info!(nonce = ?response.nonce, "Activity acknowledged"),
        },
        Err(e) => warn!(error = %e, "Unreadable acknowledgement"),
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("presence_cli=info".parse()?)
                .add_directive("presence_core=info".parse()?),
        )
        .with_target(true)
        .init();

    let args = Args::parse();

    let config = SessionConfig {
        client_id: args.client_id.clone(),
        ..SessionConfig::from_env()
    };
    let mut session = Session::new(config).context("Invalid session configuration")?;

    let activity = args.activity()?;
    let ack = session
        .publish_activity(&activity)
        .await
        .context("Failed to publish activity")?;
    report(&ack);

    info!(seconds = args.hold, "Holding activity");
    tokio::select! {
        () = tokio::time::sleep(Duration::from_secs(args.hold)) => {}
        result = signal::ctrl_c() => {
            result.context("Failed to listen for Ctrl-C")?;
            info!("Interrupted");
        }
    }

    // The connection may have dropped while holding; clearing reconnects if so.
    match session.clear_activity().await {
        Ok(ack) => report(&ack),
        Err(e) => warn!(error = %e, "Failed to clear activity"),
    }
    session.close().await.context("Failed to disconnect")?;

    info!("Done");
    Ok(())
}
