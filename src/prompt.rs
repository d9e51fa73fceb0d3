//! Prompt construction for outreach generation.
//!
//! The user prompt is rendered in one pass from the lead and the settings, so
//! lead values are inserted verbatim even when they contain braces. The strict
//! variant is the base prompt plus one fixed warning; it is never built by
//! editing the base text further.

use crate::config::Settings;
use crate::lead::Lead;
use crate::message::MessagePack;

/// System message sent with every request.
pub const SYSTEM_PROMPT: &str = "You write concise outreach messages.";

const STRICT_SUFFIX: &str = " Return only JSON with double quotes and no trailing text. \
Any emoji or non-ASCII character makes the response invalid.";

/// Prompt variant selected by the attempt state machine.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PromptKind {
    /// First attempt
    Base,
    /// Retries after a rejected response
    Strict,
}

/// A rendered two-message prompt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Prompt {
    /// System message
    pub system: String,
    /// User message
    pub user: String,
}

impl Prompt {
    /// Renders the prompt of the given kind for one lead.
    #[must_use]
    pub fn build(kind: PromptKind, lead: &Lead, settings: &Settings) -> Self {
        let base = render_user_prompt(lead, settings);
        let user = match kind {
            PromptKind::Base => base,
            PromptKind::Strict => base + STRICT_SUFFIX,
        };

        Self {
            system: SYSTEM_PROMPT.to_string(),
            user,
        }
    }
}

fn render_user_prompt(lead: &Lead, settings: &Settings) -> String {
    let buzzwords = if settings.buzzwords.is_empty() {
        "none".to_string()
    } else {
        settings.buzzwords.join(", ")
    };

    format!(
        "You are an outreach assistant. Return ONLY valid JSON with keys: {keys}. \
Constraints: body_A and body_B <= {word_limit} words, no emojis, use only ASCII characters, \
no buzzwords: {buzzwords}. Tone: warm, respectful, direct, non-salesy. \
Goal: invite a short intro conversation. No meta commentary. \
Lead: first_name={first_name}, last_name={last_name}, role={role}, \
company={company}, industry={industry}, stage={stage}.",
        keys = MessagePack::FIELD_NAMES.join(", "),
        word_limit = settings.word_limit,
        first_name = lead.first_name,
        last_name = lead.last_name,
        role = lead.role,
        company = lead.company,
        industry = lead.industry,
        stage = lead.stage,
    )
}
