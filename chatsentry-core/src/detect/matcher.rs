//! Template compiler.
//!
//! Turns configured pattern templates (`"{user} cheered {amount}"`) into
//! anchored, case-insensitive regular expressions with one capture group
//! per placeholder. Matchers are compiled once per configuration load and
//! never mutated; a configuration change means full recompilation.

use crate::config::{ChatConfig, EVENT_KEYS};
use crate::detect::template::{self, Segment, TemplateError};
use regex::{Regex, RegexBuilder};
use tracing::warn;

/// Variable names a pattern template may reference.
pub const RESERVED_VARIABLES: [&str; 7] = [
    "user", "amount", "viewers", "months", "reward", "item", "message",
];

/// Variables whose values are numeric; they get a stricter capture group.
const NUMERIC_VARIABLES: [&str; 3] = ["amount", "viewers", "months"];

/// Digits with an optional decimal point.
const NUMERIC_GROUP: &str = r"([0-9]+(?:\.[0-9]+)?)";

/// Non-greedy "any characters".
const TEXT_GROUP: &str = "(.+?)";

/// A compiled detection rule for one event.
#[derive(Debug)]
pub struct CompiledMatcher {
    key: String,
    regex: Regex,
    variable_names: Vec<String>,
}

impl CompiledMatcher {
    /// Compile one pattern template for the given event key.
    ///
    /// Fails if the placeholder syntax is malformed or a placeholder names
    /// a variable outside [`RESERVED_VARIABLES`].
    pub fn compile(key: &str, pattern: &str) -> Result<Self, TemplateError> {
        let segments = template::parse(pattern)?;

        let mut expr = String::from("^");
        let mut variable_names = Vec::new();
        for segment in segments {
            match segment {
                Segment::Literal(text) => expr.push_str(&regex::escape(&text)),
                Segment::Variable(name) => {
                    if !RESERVED_VARIABLES.contains(&name.as_str()) {
                        return Err(TemplateError::UnknownVariable(name));
                    }
                    if NUMERIC_VARIABLES.contains(&name.as_str()) {
                        expr.push_str(NUMERIC_GROUP);
                    } else {
                        expr.push_str(TEXT_GROUP);
                    }
                    variable_names.push(name);
                }
            }
        }
        expr.push('$');

        let regex = RegexBuilder::new(&expr)
            .case_insensitive(true)
            .build()
            .map_err(|e| TemplateError::Regex(e.to_string()))?;

        Ok(Self {
            key: key.to_string(),
            regex,
            variable_names,
        })
    }

    /// The event key this matcher detects.
    pub fn key(&self) -> &str {
        &self.key
    }

    /// Test a chat message against this matcher, returning captured
    /// variables in declaration order on a match.
    pub fn matches(&self, text: &str) -> Option<Vec<(String, String)>> {
        let captures = self.regex.captures(text)?;
        let variables = self
            .variable_names
            .iter()
            .zip(captures.iter().skip(1))
            .filter_map(|(name, group)| group.map(|g| (name.clone(), g.as_str().to_string())))
            .collect();
        Some(variables)
    }
}

/// Compile matchers for every enabled event in the configuration.
///
/// Events are visited in [`EVENT_KEYS`] order, which fixes the tie-break
/// order for classification. Events with no pattern (or an empty one) are
/// disabled and produce no matcher. A pattern that fails to compile
/// disables only that event; the rest proceed.
pub fn compile_config(config: &ChatConfig) -> Vec<CompiledMatcher> {
    let mut matchers = Vec::new();
    for key in EVENT_KEYS {
        let Some(pattern) = config.pattern(key) else {
            continue;
        };
        match CompiledMatcher::compile(key, pattern) {
            Ok(matcher) => matchers.push(matcher),
            Err(e) => {
                warn!(event = key, error = %e, "failed to compile event pattern; event disabled");
            }
        }
    }
    matchers
}
