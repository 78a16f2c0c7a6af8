//! Link configuration.
//!
//! Every field has a default, so an empty JSON object is a valid
//! configuration. Loading it from disk is up to the host process.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::error::Result;

/// Longest local name a BLE advertisement can carry.
pub const MAX_DEVICE_NAME_LEN: usize = 26;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LinkConfig {
    /// Host name; advertised as the device name and used in image URLs.
    #[serde(default = "default_hostname")]
    pub hostname: String,
    /// Port of the web server that serves captured photos.
    #[serde(default = "default_image_port")]
    pub image_port: u16,
    /// Directory photos are captured into.
    #[serde(default = "default_photo_dir")]
    pub photo_dir: PathBuf,
    #[serde(default = "default_photo_file")]
    pub photo_file: String,
    /// How many `identifyLanguage` candidates to reply with.
    #[serde(default = "default_max_language_candidates")]
    pub max_language_candidates: usize,
    /// Lower bound `pulse` durations are clamped to, in seconds.
    #[serde(default = "default_pulse_min_duration")]
    pub pulse_min_duration: f64,
    /// Upper bound `pulse` durations are clamped to, in seconds.
    #[serde(default = "default_pulse_max_duration")]
    pub pulse_max_duration: f64,
    /// Acknowledge rejected request-channel commands positively.
    ///
    /// Applies to frames that name a command, such as an unknown command or
    /// one missing arguments. Undecodable or nameless frames are still
    /// refused. The error reply is sent either way; some older clients treat
    /// a failed write as fatal.
    #[serde(default)]
    pub always_ack_requests: bool,
    /// Strip surrounding whitespace from transcript items.
    #[serde(default = "default_true")]
    pub trim_transcripts: bool,
}

impl Default for LinkConfig {
    fn default() -> Self {
        Self {
            hostname: default_hostname(),
            image_port: default_image_port(),
            photo_dir: default_photo_dir(),
            photo_file: default_photo_file(),
            max_language_candidates: default_max_language_candidates(),
            pulse_min_duration: default_pulse_min_duration(),
            pulse_max_duration: default_pulse_max_duration(),
            always_ack_requests: false,
            trim_transcripts: default_true(),
        }
    }
}

impl LinkConfig {
    /// Parse a configuration from JSON text, defaulting missing fields.
    pub fn from_json(text: &str) -> Result<Self> {
        Ok(serde_json::from_str(text)?)
    }

    /// Advertised device name: the host name cut to the BLE name limit.
    pub fn device_name(&self) -> &str {
        let mut end = self.hostname.len().min(MAX_DEVICE_NAME_LEN);
        while !self.hostname.is_char_boundary(end) {
            end -= 1;
        }
        &self.hostname[..end]
    }

    /// Where `see` and `read` capture their photo.
    pub fn photo_path(&self) -> PathBuf {
        self.photo_dir.join(&self.photo_file)
    }

    /// URL the client can fetch the last captured photo from.
    pub fn image_url(&self) -> String {
        format!(
            "http://{}.local:{}/{}",
            self.hostname.to_lowercase(),
            self.image_port,
            self.photo_file
        )
    }

    /// Clamp a requested pulse duration to the supported range.
    pub fn clamp_pulse(&self, duration: f64) -> f64 {
        duration
            .max(self.pulse_min_duration)
            .min(self.pulse_max_duration)
    }
}

fn default_hostname() -> String {
    "tjbot".to_string()
}
fn default_image_port() -> u16 {
    9080
}
fn default_photo_dir() -> PathBuf {
    PathBuf::from("/tmp/tjbot-photo/")
}
fn default_photo_file() -> String {
    "photo.jpg".to_string()
}
fn default_max_language_candidates() -> usize {
    5
}
fn default_pulse_min_duration() -> f64 {
    0.5
}
fn default_pulse_max_duration() -> f64 {
    3.0
}
fn default_true() -> bool {
    true
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = LinkConfig::default();
        assert_eq!(config.image_port, 9080);
        assert_eq!(config.max_language_candidates, 5);
        assert!(!config.always_ack_requests);
        assert!(config.trim_transcripts);
        assert_eq!(config.photo_path(), PathBuf::from("/tmp/tjbot-photo/photo.jpg"));
    }

    #[test]
    fn test_empty_json_is_default() {
        assert_eq!(LinkConfig::from_json("{}").unwrap(), LinkConfig::default());
    }

    #[test]
    fn test_partial_json_overrides() {
        let config =
            LinkConfig::from_json(r#"{"hostname":"Kitchen-Bot","image_port":8000}"#).unwrap();
        assert_eq!(config.image_url(), "http://kitchen-bot.local:8000/photo.jpg");
        assert_eq!(config.max_language_candidates, 5);
    }

    #[test]
    fn test_device_name_is_truncated() {
        let config = LinkConfig {
            hostname: "a-very-long-hostname-for-a-small-robot".into(),
            ..LinkConfig::default()
        };
        assert_eq!(config.device_name().len(), MAX_DEVICE_NAME_LEN);
        assert_eq!(config.device_name(), "a-very-long-hostname-for-a");
    }

    #[test]
    fn test_pulse_clamp() {
        let config = LinkConfig::default();
        assert_eq!(config.clamp_pulse(10.0), 3.0);
        assert_eq!(config.clamp_pulse(0.1), 0.5);
        assert_eq!(config.clamp_pulse(1.25), 1.25);
    }

    #[test]
    fn test_bad_json_is_error() {
        assert!(LinkConfig::from_json("{\"image_port\": \"eighty\"}").is_err());
    }
}
