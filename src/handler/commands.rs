//! Built-in command handlers.
//!
//! Handlers read their arguments, start the actuator, and return. Required
//! keys have already been checked by the dispatcher, so the only argument
//! errors left here are wrong types.

use serde_json::{json, Value};
use tokio::sync::mpsc;

use super::registry::{completed, Completion, CommandSpec, Signature};
use super::{Args, HandlerContext};
use crate::error::{ActuatorError, ActuatorResult, BotwireError, DeliveryError, Result};

/// Every command the robot understands.
pub const BUILTIN_COMMANDS: &[CommandSpec] = &[
    // fire-and-forget
    CommandSpec::command("sleep", &["msec"], sleep),
    CommandSpec::command("listen", &[], listen),
    CommandSpec::command("pauseListening", &[], pause_listening),
    CommandSpec::command("resumeListening", &[], resume_listening),
    CommandSpec::command("stopListening", &[], stop_listening),
    CommandSpec::command("shine", &["color"], shine),
    CommandSpec::command("pulse", &["color", "duration"], pulse),
    CommandSpec::command("armBack", &[], arm_back),
    CommandSpec::command("raiseArm", &[], raise_arm),
    CommandSpec::command("lowerArm", &[], lower_arm),
    CommandSpec::command("wave", &[], wave),
    // request/response
    CommandSpec::request("analyzeTone", &["text"], Signature::Async, analyze_tone),
    CommandSpec::request(
        "converse",
        &["workspaceId", "message"],
        Signature::Async,
        converse,
    ),
    CommandSpec::request("see", &[], Signature::Async, see),
    CommandSpec::request("read", &[], Signature::Async, read),
    CommandSpec::request("shineColors", &[], Signature::Sync, shine_colors),
    CommandSpec::request("randomColor", &[], Signature::Sync, random_color),
    CommandSpec::request("speak", &["message"], Signature::Async, speak),
    CommandSpec::request("play", &["soundFile"], Signature::Async, play),
    CommandSpec::request(
        "translate",
        &["text", "sourceLanguage", "targetLanguage"],
        Signature::Async,
        translate,
    ),
    CommandSpec::request("identifyLanguage", &["text"], Signature::Async, identify_language),
    CommandSpec::request(
        "isTranslatable",
        &["sourceLanguage", "targetLanguage"],
        Signature::Async,
        is_translatable,
    ),
];

fn done() -> Completion {
    completed(Value::Null)
}

fn sleep(ctx: &HandlerContext, args: &Args) -> Result<Completion> {
    let msec = args.millis("sleep", "msec")?;
    ctx.actuator().sleep(msec)?;
    Ok(done())
}

/// Start speech-to-text and forward each utterance to the listen channel.
///
/// The forwarder ends when the actuator drops its sender, or when an
/// utterance arrives with nobody subscribed (which also stops the actuator).
fn listen(ctx: &HandlerContext, _args: &Args) -> Result<Completion> {
    let (tx, mut rx) = mpsc::unbounded_channel::<String>();
    ctx.actuator().listen(tx)?;

    let listen = ctx.listen();
    let trim = ctx.config().trim_transcripts;
    ctx.spawn(async move {
        while let Some(text) = rx.recv().await {
            let text = if trim { text.trim() } else { text.as_str() };
            match listen.deliver_text(text) {
                Ok(()) => {}
                Err(BotwireError::Delivery(DeliveryError::NotSubscribed { .. })) => break,
                Err(e) => tracing::warn!(error = %e, "Dropped transcript"),
            }
        }
        tracing::debug!("Listen stream ended");
    });
    Ok(done())
}

fn pause_listening(ctx: &HandlerContext, _args: &Args) -> Result<Completion> {
    ctx.actuator().pause_listening()?;
    Ok(done())
}

fn resume_listening(ctx: &HandlerContext, _args: &Args) -> Result<Completion> {
    ctx.actuator().resume_listening()?;
    Ok(done())
}

fn stop_listening(ctx: &HandlerContext, _args: &Args) -> Result<Completion> {
    ctx.actuator().stop_listening()?;
    Ok(done())
}

fn shine(ctx: &HandlerContext, args: &Args) -> Result<Completion> {
    let color = args.string("shine", "color")?;
    ctx.actuator().shine(&color)?;
    Ok(done())
}

fn pulse(ctx: &HandlerContext, args: &Args) -> Result<Completion> {
    let color = args.string("pulse", "color")?;
    let duration = args.number("pulse", "duration")?;
    let clamped = ctx.config().clamp_pulse(duration);
    if clamped != duration {
        tracing::debug!(requested = duration, clamped, "Pulse duration clamped");
    }
    ctx.actuator().pulse(&color, clamped)?;
    Ok(done())
}

fn arm_back(ctx: &HandlerContext, _args: &Args) -> Result<Completion> {
    ctx.actuator().arm_back()?;
    Ok(done())
}

fn raise_arm(ctx: &HandlerContext, _args: &Args) -> Result<Completion> {
    ctx.actuator().raise_arm()?;
    Ok(done())
}

fn lower_arm(ctx: &HandlerContext, _args: &Args) -> Result<Completion> {
    ctx.actuator().lower_arm()?;
    Ok(done())
}

fn wave(ctx: &HandlerContext, _args: &Args) -> Result<Completion> {
    ctx.actuator().wave()?;
    Ok(done())
}

fn analyze_tone(ctx: &HandlerContext, args: &Args) -> Result<Completion> {
    let text = args.string("analyzeTone", "text")?;
    let actuator = ctx.actuator();
    Ok(Box::pin(async move { actuator.analyze_tone(text).await }))
}

fn converse(ctx: &HandlerContext, args: &Args) -> Result<Completion> {
    let workspace_id = args.string("converse", "workspaceId")?;
    let message = args.string("converse", "message")?;
    let actuator = ctx.actuator();
    Ok(Box::pin(async move {
        actuator.converse(workspace_id, message).await
    }))
}

/// Take a photo and classify what is in it.
fn see(ctx: &HandlerContext, _args: &Args) -> Result<Completion> {
    let actuator = ctx.actuator();
    let path = ctx.config().photo_path();
    let image_url = ctx.config().image_url();
    Ok(Box::pin(async move {
        actuator.take_photo(path.clone()).await?;
        let objects = actuator.recognize_objects_in_photo(path).await?;
        Ok::<_, ActuatorError>(json!({ "objects": objects, "imageURL": image_url }))
    }))
}

/// Take a photo and read the text in it.
fn read(ctx: &HandlerContext, _args: &Args) -> Result<Completion> {
    let actuator = ctx.actuator();
    let path = ctx.config().photo_path();
    let image_url = ctx.config().image_url();
    Ok(Box::pin(async move {
        actuator.take_photo(path.clone()).await?;
        let objects = actuator.recognize_text_in_photo(path).await?;
        Ok::<_, ActuatorError>(json!({ "objects": objects, "imageURL": image_url }))
    }))
}

fn shine_colors(ctx: &HandlerContext, _args: &Args) -> Result<Completion> {
    let colors = ctx.actuator().shine_colors()?;
    Ok(completed(json!(colors)))
}

fn random_color(ctx: &HandlerContext, _args: &Args) -> Result<Completion> {
    let color = ctx.actuator().random_color()?;
    Ok(completed(Value::String(color)))
}

fn speak(ctx: &HandlerContext, args: &Args) -> Result<Completion> {
    let message = args.string("speak", "message")?;
    let actuator = ctx.actuator();
    Ok(Box::pin(async move {
        actuator.speak(message.clone()).await?;
        Ok::<_, ActuatorError>(json!({ "message": message }))
    }))
}

fn play(ctx: &HandlerContext, args: &Args) -> Result<Completion> {
    let sound_file = args.string("play", "soundFile")?;
    let actuator = ctx.actuator();
    Ok(Box::pin(async move {
        actuator.play(sound_file.clone()).await?;
        Ok::<_, ActuatorError>(Value::String(sound_file))
    }))
}

fn translate(ctx: &HandlerContext, args: &Args) -> Result<Completion> {
    let text = args.string("translate", "text")?;
    let source = args.string("translate", "sourceLanguage")?;
    let target = args.string("translate", "targetLanguage")?;
    let actuator = ctx.actuator();
    Ok(Box::pin(async move {
        actuator.translate(text, source, target).await
    }))
}

fn identify_language(ctx: &HandlerContext, args: &Args) -> Result<Completion> {
    let text = args.string("identifyLanguage", "text")?;
    let max = ctx.config().max_language_candidates;
    let actuator = ctx.actuator();
    Ok(Box::pin(async move {
        let result = actuator.identify_language(text).await?;
        top_languages(result, max)
    }))
}

fn is_translatable(ctx: &HandlerContext, args: &Args) -> Result<Completion> {
    let source = args.string("isTranslatable", "sourceLanguage")?;
    let target = args.string("isTranslatable", "targetLanguage")?;
    let actuator = ctx.actuator();
    Ok(Box::pin(async move {
        actuator.is_translatable(source, target).await
    }))
}

/// Keep the `max` most likely language candidates.
pub fn top_languages(result: Value, max: usize) -> ActuatorResult<Value> {
    let languages = result
        .get("languages")
        .and_then(Value::as_array)
        .ok_or_else(|| ActuatorError::new("identifyLanguage result has no 'languages' list"))?;

    let top: Vec<Value> = languages.iter().take(max).cloned().collect();
    Ok(json!({ "languages": top }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::actuator::{Actuator, MockActuator};
    use crate::config::LinkConfig;
    use crate::notify::ListenChannel;
    use std::sync::Arc;
    use tokio::runtime::Handle;

    fn context(mock: Arc<MockActuator>, config: LinkConfig) -> HandlerContext {
        let actuator: Arc<dyn Actuator> = mock;
        let listen = Arc::new(ListenChannel::new(actuator.clone()));
        HandlerContext::new(actuator, Arc::new(config), listen, Handle::current())
    }

    fn args(value: Value) -> Args {
        match value {
            Value::Object(map) => Args::from_map(map),
            _ => panic!("test args must be an object"),
        }
    }

    #[test]
    fn test_top_languages() {
        let result = json!({
            "languages": [
                { "language": "en", "confidence": 0.9 },
                { "language": "fr", "confidence": 0.05 },
                { "language": "de", "confidence": 0.03 },
            ]
        });
        let top = top_languages(result, 2).unwrap();
        assert_eq!(top["languages"].as_array().unwrap().len(), 2);
        assert_eq!(top["languages"][0]["language"], "en");

        assert!(top_languages(json!({}), 5).is_err());
    }

    #[tokio::test]
    async fn test_pulse_is_clamped() {
        let mock = Arc::new(MockActuator::new());
        let ctx = context(mock.clone(), LinkConfig::default());

        pulse(&ctx, &args(json!({ "color": "red", "duration": 10 }))).unwrap();
        pulse(&ctx, &args(json!({ "color": "red", "duration": 0.1 }))).unwrap();

        assert_eq!(
            mock.calls_to("pulse"),
            vec![
                json!({ "color": "red", "duration": 3.0 }),
                json!({ "color": "red", "duration": 0.5 }),
            ]
        );
    }

    #[tokio::test]
    async fn test_wrong_type_never_reaches_actuator() {
        let mock = Arc::new(MockActuator::new());
        let ctx = context(mock.clone(), LinkConfig::default());

        let err = match shine(&ctx, &args(json!({ "color": 7 }))) {
            Err(e) => e,
            Ok(_) => panic!("expected an argument error"),
        };
        assert!(matches!(err, BotwireError::InvalidArgument { .. }));
        assert_eq!(mock.call_count(), 0);
    }

    #[tokio::test]
    async fn test_see_reply_shape() {
        let mock = Arc::new(
            MockActuator::new().with_result("recognizeObjectsInPhoto", json!([{ "class": "cat" }])),
        );
        let config = LinkConfig {
            hostname: "Desk".into(),
            ..LinkConfig::default()
        };
        let ctx = context(mock.clone(), config);

        let value = see(&ctx, &Args::new()).unwrap().await.unwrap();
        assert_eq!(
            value,
            json!({
                "objects": [{ "class": "cat" }],
                "imageURL": "http://desk.local:9080/photo.jpg",
            })
        );
        let methods: Vec<_> = mock.calls().iter().map(|c| c.method).collect();
        assert_eq!(methods, vec!["takePhoto", "recognizeObjectsInPhoto"]);
    }

    #[tokio::test]
    async fn test_failed_photo_skips_recognition() {
        let mock = Arc::new(MockActuator::new().with_failure("takePhoto", "camera busy"));
        let ctx = context(mock.clone(), LinkConfig::default());

        let err = read(&ctx, &Args::new()).unwrap().await.unwrap_err();
        assert_eq!(err.message(), "camera busy");
        assert!(mock.calls_to("recognizeTextInPhoto").is_empty());
    }

    #[tokio::test]
    async fn test_speak_and_play_replies() {
        let mock = Arc::new(MockActuator::new());
        let ctx = context(mock, LinkConfig::default());

        let spoken = speak(&ctx, &args(json!({ "message": "hi" })))
            .unwrap()
            .await
            .unwrap();
        assert_eq!(spoken, json!({ "message": "hi" }));

        let played = play(&ctx, &args(json!({ "soundFile": "/tmp/beep.wav" })))
            .unwrap()
            .await
            .unwrap();
        assert_eq!(played, json!("/tmp/beep.wav"));
    }

    #[tokio::test]
    async fn test_sync_failure_is_returned_immediately() {
        let mock = Arc::new(MockActuator::new().with_failure("wave", "arm servo not attached"));
        let ctx = context(mock, LinkConfig::default());

        let err = match wave(&ctx, &Args::new()) {
            Err(e) => e,
            Ok(_) => panic!("expected an actuator error"),
        };
        assert_eq!(err.to_string(), "arm servo not attached");
    }
}
