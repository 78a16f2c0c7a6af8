//! Actuator module - the robot side of every command.
//!
//! The [`Actuator`] trait abstracts over the hardware and cloud services a
//! command ends up driving: servo, LED, microphone and speaker, camera, and
//! the vision, speech, tone and translation services. Command handlers only
//! ever talk to an `Arc<dyn Actuator>`, which lets the protocol be exercised
//! end to end with [`MockActuator`] instead of a physical robot.
//!
//! Quick physical actions return immediately with an [`ActuatorResult`]; the
//! robot may keep moving after the call returns. Work that waits on the
//! network or on a device returns a [`BoxFuture`].

mod mock;

use std::path::PathBuf;

use serde_json::Value;
use tokio::sync::mpsc;

pub use mock::{ActuatorCall, MockActuator};

use crate::error::ActuatorResult;
use crate::handler::BoxFuture;

/// Sender half handed to [`Actuator::listen`]; one message per utterance.
pub type TranscriptSender = mpsc::UnboundedSender<String>;

/// Physical and cognitive capabilities of the robot.
pub trait Actuator: Send + Sync + 'static {
    /// Put the robot to sleep for `msec` milliseconds.
    fn sleep(&self, msec: u64) -> ActuatorResult<()>;

    /// Start continuous speech-to-text, sending each utterance to `transcripts`.
    fn listen(&self, transcripts: TranscriptSender) -> ActuatorResult<()>;

    /// Temporarily stop transcribing without closing the stream.
    fn pause_listening(&self) -> ActuatorResult<()>;

    /// Resume a paused transcription stream.
    fn resume_listening(&self) -> ActuatorResult<()>;

    /// Stop transcribing and release the microphone.
    fn stop_listening(&self) -> ActuatorResult<()>;

    /// Set the LED to a named or `#RRGGBB` color.
    fn shine(&self, color: &str) -> ActuatorResult<()>;

    /// Pulse the LED once over `duration` seconds.
    fn pulse(&self, color: &str, duration: f64) -> ActuatorResult<()>;

    fn arm_back(&self) -> ActuatorResult<()>;

    fn raise_arm(&self) -> ActuatorResult<()>;

    fn lower_arm(&self) -> ActuatorResult<()>;

    fn wave(&self) -> ActuatorResult<()>;

    /// Names of every color the LED understands.
    fn shine_colors(&self) -> ActuatorResult<Vec<String>>;

    /// Pick one of [`shine_colors`](Self::shine_colors) at random.
    fn random_color(&self) -> ActuatorResult<String>;

    /// Run tone analysis over `text`.
    fn analyze_tone(&self, text: String) -> BoxFuture<'_, ActuatorResult<Value>>;

    /// Send one conversational turn to the given workspace.
    fn converse(
        &self,
        workspace_id: String,
        message: String,
    ) -> BoxFuture<'_, ActuatorResult<Value>>;

    /// Capture a still image to `path`.
    fn take_photo(&self, path: PathBuf) -> BoxFuture<'_, ActuatorResult<()>>;

    /// Classify the objects in the photo at `path`.
    fn recognize_objects_in_photo(&self, path: PathBuf) -> BoxFuture<'_, ActuatorResult<Value>>;

    /// Extract text from the photo at `path`.
    fn recognize_text_in_photo(&self, path: PathBuf) -> BoxFuture<'_, ActuatorResult<Value>>;

    /// Speak `message` aloud; resolves once playback has finished.
    fn speak(&self, message: String) -> BoxFuture<'_, ActuatorResult<()>>;

    /// Play a sound file; resolves once playback has finished.
    fn play(&self, sound_file: String) -> BoxFuture<'_, ActuatorResult<()>>;

    fn translate(
        &self,
        text: String,
        source_language: String,
        target_language: String,
    ) -> BoxFuture<'_, ActuatorResult<Value>>;

    /// Identify candidate languages for `text`.
    ///
    /// The result must carry a `languages` array ordered by confidence.
    fn identify_language(&self, text: String) -> BoxFuture<'_, ActuatorResult<Value>>;

    fn is_translatable(
        &self,
        source_language: String,
        target_language: String,
    ) -> BoxFuture<'_, ActuatorResult<Value>>;
}
