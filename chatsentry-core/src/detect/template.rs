//! Placeholder scanner shared by the matcher compiler and the
//! instruction renderer.
//!
//! Templates are literal text with `{name}` placeholders. Nesting and
//! escapes are not supported; an unpaired brace is a syntax error.

use thiserror::Error;

/// Errors produced while scanning a template string.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum TemplateError {
    #[error("unbalanced braces in template: {0:?}")]
    UnbalancedBraces(String),

    #[error("empty placeholder in template: {0:?}")]
    EmptyPlaceholder(String),

    #[error("template references unrecognized variable: {0:?}")]
    UnknownVariable(String),

    #[error("template does not compile to a valid expression: {0}")]
    Regex(String),
}

/// One piece of a scanned template.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Segment {
    /// Literal text, matched or emitted verbatim.
    Literal(String),
    /// A `{name}` placeholder.
    Variable(String),
}

/// Split a template into literal and placeholder segments.
pub fn parse(template: &str) -> Result<Vec<Segment>, TemplateError> {
    let mut segments = Vec::new();
    let mut literal = String::new();
    let mut chars = template.chars();

    while let Some(c) = chars.next() {
        match c {
            '{' => {
                let mut name = String::new();
                loop {
                    match chars.next() {
                        Some('}') => break,
                        Some('{') | None => {
                            return Err(TemplateError::UnbalancedBraces(template.to_string()));
                        }
                        Some(c) => name.push(c),
                    }
                }
                if name.trim().is_empty() {
                    return Err(TemplateError::EmptyPlaceholder(template.to_string()));
                }
                if !literal.is_empty() {
                    segments.push(Segment::Literal(std::mem::take(&mut literal)));
                }
                segments.push(Segment::Variable(name));
            }
            '}' => return Err(TemplateError::UnbalancedBraces(template.to_string())),
            c => literal.push(c),
        }
    }

    if !literal.is_empty() {
        segments.push(Segment::Literal(literal));
    }
    Ok(segments)
}
