//! Line classifier.
//!
//! Pure function of its inputs: no I/O, no logging. Only lines authored
//! by the configured source account are eligible; everything else is
//! `None` regardless of content.

use crate::detect::matcher::CompiledMatcher;
use crate::events::ChatLine;
use std::collections::HashMap;

/// A classified chat line: which event it denotes and the variables
/// extracted from it. Ephemeral; consumed by the renderer and discarded.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MatchResult {
    pub event_key: String,
    pub variables: HashMap<String, String>,
}

/// Test a chat line against the compiled matchers.
///
/// Matchers are tried in their compiled (canonical declaration) order and
/// the first structural match wins. The username comparison against
/// `source_account` is case-insensitive.
pub fn classify(
    line: &ChatLine,
    source_account: &str,
    matchers: &[CompiledMatcher],
) -> Option<MatchResult> {
    if !line.username.eq_ignore_ascii_case(source_account) {
        return None;
    }

    for matcher in matchers {
        if let Some(variables) = matcher.matches(&line.text) {
            return Some(MatchResult {
                event_key: matcher.key().to_string(),
                variables: variables.into_iter().collect(),
            });
        }
    }
    None
}
