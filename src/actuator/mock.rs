//! Mock actuator for deterministic testing of the protocol.
//!
//! [`MockActuator`] implements [`Actuator`] by recording every call and
//! answering from pre-loaded results. Failures and artificial delays can be
//! configured per method, which is how out-of-order completion of
//! concurrent requests is exercised in tests.
//!
//! # Example
//!
//! ```
//! use botwire::actuator::{Actuator, MockActuator};
//! use serde_json::json;
//!
//! let mock = MockActuator::new()
//!     .with_result("randomColor", json!("orange"))
//!     .with_failure("wave", "arm servo not attached");
//!
//! assert_eq!(mock.random_color().unwrap(), "orange");
//! assert!(mock.wave().is_err());
//! assert_eq!(mock.call_count(), 2);
//! ```

use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::{Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use serde_json::{json, Value};

use super::{Actuator, TranscriptSender};
use crate::error::{ActuatorError, ActuatorResult};
use crate::handler::BoxFuture;

/// One recorded actuator call.
#[derive(Debug, Clone, PartialEq)]
pub struct ActuatorCall {
    /// Method name, spelled as the wire command (e.g. `"raiseArm"`).
    pub method: &'static str,
    /// Arguments the method was called with.
    pub args: Value,
}

#[derive(Debug, Default)]
struct MockState {
    calls: Vec<ActuatorCall>,
    results: HashMap<String, Value>,
    failures: HashMap<String, String>,
    delays: HashMap<String, Duration>,
    transcripts: Option<TranscriptSender>,
    paused: bool,
}

/// A recording [`Actuator`] with canned results.
#[derive(Debug, Default)]
pub struct MockActuator {
    state: Mutex<MockState>,
}

impl MockActuator {
    /// Create a mock that succeeds at everything.
    pub fn new() -> Self {
        Self::default()
    }

    /// Answer `method` with `value` instead of the default result.
    pub fn with_result(self, method: &str, value: Value) -> Self {
        self.lock().results.insert(method.to_string(), value);
        self
    }

    /// Make every call to `method` fail with `message`.
    pub fn with_failure(self, method: &str, message: &str) -> Self {
        self.lock()
            .failures
            .insert(method.to_string(), message.to_string());
        self
    }

    /// Delay completion of an asynchronous `method` by `delay`.
    pub fn with_delay(self, method: &str, delay: Duration) -> Self {
        self.lock().delays.insert(method.to_string(), delay);
        self
    }

    /// All calls so far, in call order.
    pub fn calls(&self) -> Vec<ActuatorCall> {
        self.lock().calls.clone()
    }

    /// Arguments of every call to `method`, in call order.
    pub fn calls_to(&self, method: &str) -> Vec<Value> {
        self.lock()
            .calls
            .iter()
            .filter(|c| c.method == method)
            .map(|c| c.args.clone())
            .collect()
    }

    /// Number of calls so far.
    pub fn call_count(&self) -> usize {
        self.lock().calls.len()
    }

    /// True between `listen` and `stopListening`.
    pub fn is_listening(&self) -> bool {
        self.lock().transcripts.is_some()
    }

    /// Feed one utterance into the active listen stream.
    ///
    /// Returns false when nothing is listening, the stream is paused, or the
    /// receiving side has gone away.
    pub fn emit_transcript(&self, text: &str) -> bool {
        let state = self.lock();
        if state.paused {
            return false;
        }
        match &state.transcripts {
            Some(tx) => tx.send(text.to_string()).is_ok(),
            None => false,
        }
    }

    fn lock(&self) -> MutexGuard<'_, MockState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Record a call and return the canned result, if any.
    fn record(&self, method: &'static str, args: Value) -> ActuatorResult<Option<Value>> {
        let mut state = self.lock();
        state.calls.push(ActuatorCall { method, args });
        if let Some(message) = state.failures.get(method) {
            return Err(ActuatorError::new(message.clone()));
        }
        Ok(state.results.get(method).cloned())
    }

    fn record_unit(&self, method: &'static str, args: Value) -> ActuatorResult<()> {
        self.record(method, args).map(|_| ())
    }

    /// Record a call now, resolve it after the configured delay.
    fn respond(
        &self,
        method: &'static str,
        args: Value,
        default: Value,
    ) -> BoxFuture<'_, ActuatorResult<Value>> {
        let outcome = self.record(method, args);
        let delay = self.lock().delays.get(method).copied();
        Box::pin(async move {
            if let Some(delay) = delay {
                tokio::time::sleep(delay).await;
            }
            outcome.map(|canned| canned.unwrap_or(default))
        })
    }

    fn respond_unit(&self, method: &'static str, args: Value) -> BoxFuture<'_, ActuatorResult<()>> {
        let fut = self.respond(method, args, Value::Null);
        Box::pin(async move { fut.await.map(|_| ()) })
    }
}

impl Actuator for MockActuator {
    fn sleep(&self, msec: u64) -> ActuatorResult<()> {
        self.record_unit("sleep", json!({ "msec": msec }))
    }

    fn listen(&self, transcripts: TranscriptSender) -> ActuatorResult<()> {
        self.record_unit("listen", json!({}))?;
        let mut state = self.lock();
        state.transcripts = Some(transcripts);
        state.paused = false;
        Ok(())
    }

    fn pause_listening(&self) -> ActuatorResult<()> {
        self.record_unit("pauseListening", json!({}))?;
        self.lock().paused = true;
        Ok(())
    }

    fn resume_listening(&self) -> ActuatorResult<()> {
        self.record_unit("resumeListening", json!({}))?;
        self.lock().paused = false;
        Ok(())
    }

    fn stop_listening(&self) -> ActuatorResult<()> {
        self.record_unit("stopListening", json!({}))?;
        let mut state = self.lock();
        state.transcripts = None;
        state.paused = false;
        Ok(())
    }

    fn shine(&self, color: &str) -> ActuatorResult<()> {
        self.record_unit("shine", json!({ "color": color }))
    }

    fn pulse(&self, color: &str, duration: f64) -> ActuatorResult<()> {
        self.record_unit("pulse", json!({ "color": color, "duration": duration }))
    }

    fn arm_back(&self) -> ActuatorResult<()> {
        self.record_unit("armBack", json!({}))
    }

    fn raise_arm(&self) -> ActuatorResult<()> {
        self.record_unit("raiseArm", json!({}))
    }

    fn lower_arm(&self) -> ActuatorResult<()> {
        self.record_unit("lowerArm", json!({}))
    }

    fn wave(&self) -> ActuatorResult<()> {
        self.record_unit("wave", json!({}))
    }

    fn shine_colors(&self) -> ActuatorResult<Vec<String>> {
        match self.record("shineColors", json!({}))? {
            Some(value) => serde_json::from_value(value)
                .map_err(|e| ActuatorError::new(format!("bad shineColors result: {}", e))),
            None => Ok(vec!["red".into(), "green".into(), "blue".into()]),
        }
    }

    fn random_color(&self) -> ActuatorResult<String> {
        match self.record("randomColor", json!({}))? {
            Some(Value::String(color)) => Ok(color),
            Some(other) => Err(ActuatorError::new(format!(
                "bad randomColor result: {}",
                other
            ))),
            None => Ok("blue".to_string()),
        }
    }

    fn analyze_tone(&self, text: String) -> BoxFuture<'_, ActuatorResult<Value>> {
        self.respond(
            "analyzeTone",
            json!({ "text": text }),
            json!({ "document_tone": { "tones": [] } }),
        )
    }

    fn converse(
        &self,
        workspace_id: String,
        message: String,
    ) -> BoxFuture<'_, ActuatorResult<Value>> {
        let default = json!({ "object": {}, "description": message });
        self.respond(
            "converse",
            json!({ "workspaceId": workspace_id, "message": message }),
            default,
        )
    }

    fn take_photo(&self, path: PathBuf) -> BoxFuture<'_, ActuatorResult<()>> {
        self.respond_unit("takePhoto", json!({ "path": path }))
    }

    fn recognize_objects_in_photo(&self, path: PathBuf) -> BoxFuture<'_, ActuatorResult<Value>> {
        self.respond("recognizeObjectsInPhoto", json!({ "path": path }), json!([]))
    }

    fn recognize_text_in_photo(&self, path: PathBuf) -> BoxFuture<'_, ActuatorResult<Value>> {
        self.respond("recognizeTextInPhoto", json!({ "path": path }), json!([]))
    }

    fn speak(&self, message: String) -> BoxFuture<'_, ActuatorResult<()>> {
        self.respond_unit("speak", json!({ "message": message }))
    }

    fn play(&self, sound_file: String) -> BoxFuture<'_, ActuatorResult<()>> {
        self.respond_unit("play", json!({ "soundFile": sound_file }))
    }

    fn translate(
        &self,
        text: String,
        source_language: String,
        target_language: String,
    ) -> BoxFuture<'_, ActuatorResult<Value>> {
        let default = json!({ "translations": [{ "translation": text }] });
        self.respond(
            "translate",
            json!({
                "text": text,
                "sourceLanguage": source_language,
                "targetLanguage": target_language,
            }),
            default,
        )
    }

    fn identify_language(&self, text: String) -> BoxFuture<'_, ActuatorResult<Value>> {
        self.respond(
            "identifyLanguage",
            json!({ "text": text }),
            json!({ "languages": [] }),
        )
    }

    fn is_translatable(
        &self,
        source_language: String,
        target_language: String,
    ) -> BoxFuture<'_, ActuatorResult<Value>> {
        self.respond(
            "isTranslatable",
            json!({ "sourceLanguage": source_language, "targetLanguage": target_language }),
            json!(true),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::sync::mpsc;

    #[test]
    fn test_records_calls_in_order() {
        let mock = MockActuator::new();
        mock.raise_arm().unwrap();
        mock.shine("red").unwrap();
        mock.lower_arm().unwrap();

        let methods: Vec<&str> = mock.calls().iter().map(|c| c.method).collect();
        assert_eq!(methods, vec!["raiseArm", "shine", "lowerArm"]);
        assert_eq!(mock.calls_to("shine"), vec![json!({ "color": "red" })]);
    }

    #[test]
    fn test_failure_is_still_recorded() {
        let mock = MockActuator::new().with_failure("shine", "LED missing");
        let err = mock.shine("red").unwrap_err();
        assert_eq!(err.message(), "LED missing");
        assert_eq!(mock.call_count(), 1);
    }

    #[tokio::test]
    async fn test_async_canned_result() {
        let mock = MockActuator::new().with_result("analyzeTone", json!({ "tone": "joy" }));
        let value = mock.analyze_tone("yay".into()).await.unwrap();
        assert_eq!(value, json!({ "tone": "joy" }));
    }

    #[tokio::test]
    async fn test_transcripts_follow_listen_lifecycle() {
        let mock = MockActuator::new();
        let (tx, mut rx) = mpsc::unbounded_channel();

        assert!(!mock.emit_transcript("ignored"));
        mock.listen(tx).unwrap();
        assert!(mock.emit_transcript("hello"));
        assert_eq!(rx.recv().await.unwrap(), "hello");

        mock.pause_listening().unwrap();
        assert!(!mock.emit_transcript("while paused"));
        mock.resume_listening().unwrap();
        assert!(mock.emit_transcript("again"));

        mock.stop_listening().unwrap();
        assert!(!mock.is_listening());
        assert!(!mock.emit_transcript("after stop"));
    }
}
