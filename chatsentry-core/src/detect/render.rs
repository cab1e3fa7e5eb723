//! Instruction renderer.
//!
//! Pure string substitution: placeholders resolve from the extracted
//! variables plus the implicit `channel` binding. No conditionals, no
//! nesting.

use crate::detect::template::{self, Segment, TemplateError};
use std::collections::HashMap;
use thiserror::Error;

/// Errors produced while rendering an instruction template.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum RenderError {
    /// The instruction references a placeholder that is neither an
    /// extracted variable nor `channel`.
    #[error("instruction references unresolved variable: {0:?}")]
    MissingVariable(String),

    #[error(transparent)]
    Template(#[from] TemplateError),
}

/// Fill an instruction template from the given variables.
///
/// `channel` is always resolvable as `{channel}`. Variables the template
/// does not reference are ignored.
pub fn render(
    instruction: &str,
    variables: &HashMap<String, String>,
    channel: &str,
) -> Result<String, RenderError> {
    let segments = template::parse(instruction)?;

    let mut out = String::with_capacity(instruction.len());
    for segment in segments {
        match segment {
            Segment::Literal(text) => out.push_str(&text),
            Segment::Variable(name) => {
                if name == "channel" {
                    out.push_str(channel);
                } else if let Some(value) = variables.get(&name) {
                    out.push_str(value);
                } else {
                    return Err(RenderError::MissingVariable(name));
                }
            }
        }
    }
    Ok(out)
}
