use anyhow::{Context, Result};
use std::env;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use kommark::config::Config;
use kommark::constants::REPLAY_DRAIN_TIMEOUT_SECS;
use kommark::kom::{KomSession, MemorySession, SessionFixture, TextNo};
use kommark::logging::setup_logging;
use kommark::marker::ReadMarker;

fn print_usage() {
    eprintln!(
        r#"kommark - Read-mark dispatcher for conference-server clients

Usage: kommark <command>

Commands:
    replay <fixture.toml> <text>...   Mark texts read against a recorded session
    help                              Show this help message

Configuration file: ~/.config/kommark/config.toml
"#
    );
}

fn parse_texts(args: &[String]) -> Result<Vec<TextNo>> {
    args.iter()
        .map(|arg| {
            arg.parse::<TextNo>()
                .with_context(|| format!("Invalid text number: {}", arg))
        })
        .collect()
}

async fn run_replay(fixture_path: &Path, texts: &[TextNo]) -> Result<()> {
    let config = Config::load()?;
    setup_logging(&config.logging);

    let fixture = SessionFixture::load(fixture_path)?;
    let session = Arc::new(MemorySession::from_fixture(fixture));
    let marker = ReadMarker::spawn(
        Arc::clone(&session) as Arc<dyn KomSession>,
        config.marker.clone(),
    );

    for &text in texts {
        marker.mark(text);
    }

    let mut stats_rx = marker.stats();
    let drained = tokio::time::timeout(
        Duration::from_secs(REPLAY_DRAIN_TIMEOUT_SECS),
        stats_rx.wait_for(|s| s.handled >= s.accepted),
    )
    .await
    .is_ok();
    if !drained {
        eprintln!(
            "Warning: queue not drained after {}s",
            REPLAY_DRAIN_TIMEOUT_SECS
        );
    }
    marker.shutdown().await;

    for call in session.calls() {
        println!("mark-as-read conf {} local {:?}", call.recipient, call.local_nos);
    }

    let stats = marker.stats().borrow().clone();
    println!(
        "accepted {}, handled {}, calls {}, failed {}, offline {}, no metadata {}",
        stats.accepted,
        stats.handled,
        stats.mark_calls,
        stats.mark_failures,
        stats.offline,
        stats.no_metadata
    );
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    let args: Vec<String> = env::args().collect();

    match args.get(1).map(|s| s.as_str()) {
        Some("help") | Some("--help") | Some("-h") | None => {
            print_usage();
            Ok(())
        }
        Some("replay") => {
            let Some(fixture) = args.get(2) else {
                print_usage();
                std::process::exit(1);
            };
            let texts = parse_texts(&args[3..])?;
            run_replay(Path::new(fixture), &texts).await
        }
        Some(cmd) => {
            eprintln!("Unknown command: {}", cmd);
            print_usage();
            std::process::exit(1);
        }
    }
}
