//! Prompt templates for the two task kinds.
//!
//! Each task has a fixed system prompt that states the review criteria, the
//! verdict rules and the exact JSON response shape, plus a pure renderer
//! that lays caller-supplied text out as the user message. Interpolated text
//! is treated as opaque.

pub mod critique;
pub mod review;

/// A system + user message pair.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Prompt {
    pub system: String,
    pub user: String,
}

impl Prompt {
    pub fn new(system: impl Into<String>, user: impl Into<String>) -> Self {
        Self {
            system: system.into(),
            user: user.into(),
        }
    }
}

pub(crate) fn push_context(prompt: &mut String, context: Option<&str>) {
    if let Some(context) = context.filter(|c| !c.trim().is_empty()) {
        prompt.push_str("## Additional Context\n\n");
        prompt.push_str(context);
        prompt.push_str("\n\n");
    }
}
