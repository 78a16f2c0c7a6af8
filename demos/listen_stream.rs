//! Listen stream - forwarding live transcripts to a subscribed client.
//!
//! This example demonstrates:
//! - Subscribing to the listen characteristic with a small value size
//! - Starting the stream with the `listen` command
//! - Truncation of long utterances, and the stream stopping itself once
//!   the client unsubscribes
//!
//! # Running
//!
//! ```sh
//! cargo run --example listen_stream
//! ```

use std::sync::Arc;
use std::time::Duration;

use botwire::actuator::MockActuator;
use botwire::protocol::build_frame;
use botwire::Link;
use bytes::Bytes;
use tokio::sync::mpsc;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let robot = Arc::new(MockActuator::new());
    let link = Link::builder(robot.clone()).start()?;

    let (tx, mut transcripts) = mpsc::unbounded_channel::<Bytes>();
    link.subscribe_listen(16, tx);
    link.on_command_write(&build_frame(br#"{"name":"listen"}"#));

    for utterance in [
        "hello robot",
        "  what is the weather like today  ",
        "turn the light blue",
    ] {
        robot.emit_transcript(utterance);
        if let Some(item) = transcripts.recv().await {
            println!("listen: {:?}", String::from_utf8_lossy(&item));
        }
    }

    link.unsubscribe_listen();
    robot.emit_transcript("is anyone still there?");
    tokio::time::sleep(Duration::from_millis(50)).await;
    println!("still listening after unsubscribe: {}", robot.is_listening());

    Ok(())
}
