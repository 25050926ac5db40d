//! Raw command console.
//!
//! Demonstrates:
//! - Connecting a client with a transcript as its special message sink
//! - Sending each stdin line as a command
//! - Printing the transcript as replies arrive
//!
//! Usage:
//!   cargo run --example raw_console
//!   cargo run --example raw_console -- --host 127.0.0.1 --port 14789
//!   cargo run --example raw_console -- --debug

mod common;

// ============================================================================
// Imports
// ============================================================================

use std::sync::Arc;

use common::Args;
use linecorr::{Client, Result, Transcript, UiSink};
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::mpsc;

// ============================================================================
// Main
// ============================================================================

#[tokio::main]
async fn main() {
    let args = Args::parse();
    common::init_logging(args.debug);

    if let Err(e) = run(args).await {
        eprintln!("\n[ERROR] {e}");
        std::process::exit(1);
    }
}

async fn run(args: Args) -> Result<()> {
    let (line_tx, mut line_rx) = mpsc::unbounded_channel();
    let transcript = Arc::new(Transcript::with_listener(line_tx));

    let client = Client::builder()
        .host(&args.host)
        .port(args.port)
        .shared_sink(Arc::clone(&transcript) as Arc<dyn UiSink>)
        .connect()
        .await?;

    println!("Connected to {}:{}. Type commands, Ctrl+D to quit.", args.host, args.port);

    tokio::spawn(async move {
        while let Some(line) = line_rx.recv().await {
            println!("{line}");
        }
    });

    let mut stdin = BufReader::new(tokio::io::stdin()).lines();
    while let Some(command) = stdin.next_line().await? {
        if command.is_empty() {
            continue;
        }
        transcript.submit(&client, &command).await;
    }

    client.shutdown().await
}
