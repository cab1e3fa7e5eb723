//! Domain configuration for the chat-event engine.
//!
//! A [`ChatConfig`] is loaded once per session from the external settings
//! store (a JSON document) and owned by the session for its lifetime.
//! Event patterns and instructions are plain string maps keyed by event
//! key; the canonical key order in [`EVENT_KEYS`] is the tie-break order
//! used everywhere matchers are iterated.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use thiserror::Error;

/// Canonical event keys in declaration order.
///
/// This order is the deterministic tie-break when a line could match more
/// than one compiled template.
pub const EVENT_KEYS: [&str; 10] = [
    "follow", "tip", "host", "sub", "resub", "giftsub", "bits", "redeem", "raid", "order",
];

/// Errors that can occur while loading or validating configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to parse configuration JSON: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("missing required configuration field: {0}")]
    MissingField(&'static str),
}

/// Root configuration as read from the settings store.
///
/// Event keys absent from `patterns` (or mapped to an empty string) leave
/// that event disabled; this is never an error.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatConfig {
    /// Channel whose chat feed is joined.
    #[serde(default)]
    pub channel: String,
    /// The source account whose messages are eligible for event
    /// classification.
    #[serde(default)]
    pub bot_name: String,
    /// Optional substring that forces a priority notification on any line
    /// containing it, from any user.
    #[serde(default)]
    pub immediate_reaction: Option<String>,
    /// Event key -> detection template (with `{var}` placeholders).
    #[serde(default)]
    pub patterns: HashMap<String, String>,
    /// Event key -> instruction template.
    #[serde(default)]
    pub instructions: HashMap<String, String>,
}

impl ChatConfig {
    /// Parse a configuration from a serialized JSON document.
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        Ok(serde_json::from_str(json)?)
    }

    /// Fill in any event key missing from `patterns` or `instructions`
    /// from the given defaults table. Existing entries are never
    /// overwritten.
    pub fn merge_defaults(&mut self, defaults: &EventDefaults) {
        for (key, pattern) in defaults.patterns {
            self.patterns
                .entry((*key).to_string())
                .or_insert_with(|| (*pattern).to_string());
        }
        for (key, instruction) in defaults.instructions {
            self.instructions
                .entry((*key).to_string())
                .or_insert_with(|| (*instruction).to_string());
        }
    }

    /// Check that the fields without a usable fallback are present.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.channel.trim().is_empty() {
            return Err(ConfigError::MissingField("channel"));
        }
        if self.bot_name.trim().is_empty() {
            return Err(ConfigError::MissingField("bot_name"));
        }
        Ok(())
    }

    /// Pattern template for an event, if that event is enabled.
    pub fn pattern(&self, key: &str) -> Option<&str> {
        self.patterns
            .get(key)
            .map(String::as_str)
            .filter(|p| !p.is_empty())
    }

    /// Instruction template for an event, if one is configured.
    pub fn instruction(&self, key: &str) -> Option<&str> {
        self.instructions
            .get(key)
            .map(String::as_str)
            .filter(|i| !i.is_empty())
    }
}

/// Immutable defaults table handed to the configuration loader at
/// construction. Deliberately a value, not process-global state.
#[derive(Debug, Clone, Copy)]
pub struct EventDefaults {
    pub patterns: &'static [(&'static str, &'static str)],
    pub instructions: &'static [(&'static str, &'static str)],
}

impl EventDefaults {
    /// Defaults for the canonical event set.
    pub fn canonical() -> Self {
        Self {
            patterns: DEFAULT_PATTERNS,
            instructions: DEFAULT_INSTRUCTIONS,
        }
    }

    /// A `ChatConfig` consisting only of the defaults (channel and bot
    /// name left for the caller to fill in).
    pub fn to_config(self) -> ChatConfig {
        let mut config = ChatConfig {
            channel: String::new(),
            bot_name: String::new(),
            immediate_reaction: None,
            patterns: HashMap::new(),
            instructions: HashMap::new(),
        };
        config.merge_defaults(&self);
        config
    }
}

const DEFAULT_PATTERNS: &[(&str, &str)] = &[
    ("follow", "{user} just followed!"),
    ("tip", "{user} just tipped {amount}"),
    ("host", "{user} just hosted the stream"),
    ("sub", "{user} just subscribed!"),
    ("resub", "{user} just subscribed for {months}"),
    ("giftsub", "{user} just gifted a subscription!"),
    ("bits", "{user} cheered {amount}"),
    ("redeem", "{user} just redeemed {reward}"),
    ("raid", "{user} raids with {viewers}"),
    ("order", "{user} just ordered {item}"),
];

const DEFAULT_INSTRUCTIONS: &[(&str, &str)] = &[
    (
        "follow",
        "Show appreciation by greeting {user} and thanking them for the follow.",
    ),
    (
        "tip",
        "Acknowledge {user}'s donation of {amount} and express gratitude for their support.",
    ),
    (
        "host",
        "Give a shout-out to {user} for hosting {channel}'s stream.",
    ),
    (
        "sub",
        "Celebrate {user}'s subscription and give them a warm welcome.",
    ),
    (
        "resub",
        "Acknowledge {user}'s loyalty of {months} months and express gratitude for their continued support.",
    ),
    (
        "giftsub",
        "Acknowledge {user}'s generosity and express gratitude.",
    ),
    (
        "bits",
        "Give a big thank you to {user} for the {amount} bits and mention their message.",
    ),
    (
        "redeem",
        "Acknowledge {user}'s redemption of {reward} and fulfill their request if applicable.",
    ),
    (
        "raid",
        "Welcome the raiding party and express appreciation to {user} for bringing {viewers} viewers.",
    ),
    (
        "order",
        "Acknowledge {user}'s order for {item} and let them know when it will be fulfilled.",
    ),
];
