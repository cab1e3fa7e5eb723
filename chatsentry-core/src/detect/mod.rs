//! Event detection: template compilation, line classification and
//! instruction rendering.
//!
//! The flow is:
//!
//! 1. [`matcher::compile_config`] turns configured pattern templates into
//!    an ordered list of [`CompiledMatcher`]s.
//! 2. [`classify::classify`] tests a chat line against the matchers and
//!    produces a [`MatchResult`] with extracted variables.
//! 3. [`render::render`] fills the event's instruction template from the
//!    extracted variables.
//!
//! Every step is a pure function of its inputs; the session owns all
//! side effects.

pub mod classify;
pub mod matcher;
pub mod render;
pub mod template;

pub use classify::{MatchResult, classify};
pub use matcher::{CompiledMatcher, compile_config};
pub use render::{RenderError, render};
pub use template::{Segment, TemplateError};
