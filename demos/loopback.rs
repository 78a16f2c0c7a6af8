//! Loopback - a simulated client talking to a mock robot.
//!
//! This example demonstrates:
//! - Starting a link with the builder pattern
//! - Writing commands in small fragments, as a BLE central does
//! - Reassembling chunked replies from the response channel
//!
//! # Running
//!
//! ```sh
//! RUST_LOG=botwire=debug cargo run --example loopback
//! ```

use std::sync::Arc;
use std::time::Duration;

use botwire::actuator::MockActuator;
use botwire::protocol::{build_frame, FrameBuffer};
use botwire::{Ack, Link};
use bytes::Bytes;
use serde_json::{json, Value};
use tokio::sync::mpsc;
use tracing_subscriber::EnvFilter;

/// Largest write a typical phone central makes without a larger MTU.
const ATT_PAYLOAD: usize = 20;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let robot = Arc::new(
        MockActuator::new()
            .with_delay("speak", Duration::from_millis(200))
            .with_result("recognizeObjectsInPhoto", json!([{ "class": "coffee mug", "score": 0.91 }])),
    );
    let link = Link::builder(robot.clone()).hostname("tjbot").start()?;

    let (tx, mut replies) = mpsc::unbounded_channel::<Bytes>();
    link.subscribe_response(ATT_PAYLOAD, tx);

    send(&link, false, json!({ "name": "shine", "args": { "color": "orange" } }));
    send(&link, false, json!({ "name": "pulse", "args": { "color": "red", "duration": 9 } }));
    send(&link, false, json!({ "name": "wave", "args": { "speed": "fast" } }));
    send(&link, true, json!({ "name": "speak", "args": { "message": "Hello from the loopback demo" } }));
    send(&link, true, json!({ "name": "see" }));
    send(&link, true, json!({ "name": "fly" }));

    for _ in 0..3 {
        let reply = receive(&mut replies).await?;
        println!("reply: {}", reply);
    }

    println!("actuator saw:");
    for call in robot.calls() {
        println!("  {} {}", call.method, call.args);
    }

    link.disconnect();
    Ok(())
}

/// Write one command the way a central would, `ATT_PAYLOAD` bytes at a time.
fn send(link: &Link, request: bool, command: Value) {
    let frame = build_frame(command.to_string().as_bytes());
    let mut ack = Ack::Success;
    for fragment in frame.chunks(ATT_PAYLOAD) {
        ack = if request {
            link.on_request_write(fragment)
        } else {
            link.on_command_write(fragment)
        };
    }
    println!("sent {} -> ack 0x{:02x}", command, ack.code());
}

async fn receive(rx: &mut mpsc::UnboundedReceiver<Bytes>) -> Result<Value, Box<dyn std::error::Error>> {
    let mut buffer = FrameBuffer::new();
    while let Some(chunk) = rx.recv().await {
        if let Some(frame) = buffer.push(&chunk).into_iter().next() {
            return Ok(frame.decode()?);
        }
    }
    Err("response channel closed".into())
}
