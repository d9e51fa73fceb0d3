use crate::{
    backend::{ChatRequest, CompletionBackend, HttpBackend},
    config::{ExhaustionPolicy, Settings},
    error::{Error, Result},
    lead::Lead,
    message::MessagePack,
    prompt::{Prompt, PromptKind},
    validator::validate_message_pack,
};
use tracing::{debug, info, instrument, warn};

/// Total attempts per lead: the initial one plus two strict retries.
pub const MAX_ATTEMPTS: usize = 3;

/// Position in the per-lead attempt sequence.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Attempt {
    index: usize,
}

impl Attempt {
    const fn first() -> Self {
        Self { index: 0 }
    }

    /// The following attempt, or `None` once the sequence is exhausted.
    const fn next(self) -> Option<Self> {
        if self.index + 1 < MAX_ATTEMPTS {
            Some(Self {
                index: self.index + 1,
            })
        } else {
            None
        }
    }

    const fn prompt_kind(self) -> PromptKind {
        if self.index == 0 {
            PromptKind::Base
        } else {
            PromptKind::Strict
        }
    }

    /// 1-based number for display.
    const fn number(self) -> usize {
        self.index + 1
    }
}

/// Where a message pack came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PackOrigin {
    /// Produced by the backend and validated
    Backend,
    /// Demo copy because the generator runs offline
    Offline,
    /// Demo copy substituted after every attempt failed
    Fallback,
}

/// Generates validated message packs, one lead at a time.
pub struct Generator {
    settings: Settings,
    backend: Option<Box<dyn CompletionBackend>>,
}

impl Generator {
    /// Creates a generator.
    ///
    /// No backend is built when `dry_run` is set or `credential` is missing
    /// or blank; every pack is then demo copy.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be built.
    pub fn new(settings: Settings, credential: Option<&str>, dry_run: bool) -> Result<Self> {
        let backend: Option<Box<dyn CompletionBackend>> =
            match credential.map(str::trim).filter(|key| !key.is_empty()) {
                Some(key) if !dry_run => {
                    Some(Box::new(HttpBackend::new(settings.endpoint.clone(), key)?))
                }
                _ => None,
            };

        Ok(Self { settings, backend })
    }

    /// Creates a generator that sends every request to `backend`.
    #[must_use]
    pub fn with_backend(settings: Settings, backend: Box<dyn CompletionBackend>) -> Self {
        Self {
            settings,
            backend: Some(backend),
        }
    }

    /// Returns true when no backend calls will be made.
    #[must_use]
    pub fn is_offline(&self) -> bool {
        self.backend.is_none()
    }

    /// Produces a validated message pack for one lead.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Generation`] when all attempts fail and the settings
    /// do not allow falling back to demo copy.
    #[instrument(skip(self, lead), fields(email = %lead.email))]
    pub fn generate(&self, lead: &Lead) -> Result<(MessagePack, PackOrigin)> {
        let Some(backend) = self.backend.as_deref() else {
            debug!("Offline, using demo copy");
            return Ok((demo_pack(lead), PackOrigin::Offline));
        };

        let mut attempt = Attempt::first();
        loop {
            match self.try_attempt(backend, lead, attempt) {
                Ok(pack) => {
                    debug!("Attempt {} accepted", attempt.number());
                    return Ok((pack, PackOrigin::Backend));
                }
                Err(err) => match attempt.next() {
                    Some(next) => {
                        warn!(
                            "Attempt {}/{} rejected: {}; retrying with strict prompt",
                            attempt.number(),
                            MAX_ATTEMPTS,
                            err
                        );
                        attempt = next;
                    }
                    None => return self.on_exhausted(lead, &err),
                },
            }
        }
    }

    fn try_attempt(
        &self,
        backend: &dyn CompletionBackend,
        lead: &Lead,
        attempt: Attempt,
    ) -> Result<MessagePack> {
        let prompt = Prompt::build(attempt.prompt_kind(), lead, &self.settings);
        let request = ChatRequest::new(&self.settings, prompt);

        let content = backend.complete(&request)?;
        let pack: MessagePack = serde_json::from_str(&content)
            .map_err(|e| Error::malformed(format!("content is not a message pack: {e}")))?;
        validate_message_pack(&pack, &self.settings)?;

        Ok(pack)
    }

    fn on_exhausted(&self, lead: &Lead, last: &Error) -> Result<(MessagePack, PackOrigin)> {
        match self.settings.on_exhaustion {
            ExhaustionPolicy::Fail => Err(Error::generation(&lead.email, MAX_ATTEMPTS, last)),
            ExhaustionPolicy::Demo => {
                warn!(
                    "All {} attempts failed ({}); substituting demo copy",
                    MAX_ATTEMPTS, last
                );
                info!("Demo copy used for {}", lead.email);
                Ok((demo_pack(lead), PackOrigin::Fallback))
            }
        }
    }
}

/// Deterministic placeholder copy for dry runs and fallbacks.
///
/// Built only from the lead's first name, company and industry.
#[must_use]
pub fn demo_pack(lead: &Lead) -> MessagePack {
    let body = format!(
        "[DEMO COPY] Hi {}, I track early teams in {}. \
         Would you be open to a short intro chat next week?",
        lead.first_name, lead.industry
    );

    MessagePack {
        subject_a: format!("[DEMO COPY] Quick intro, {}", lead.first_name),
        body_a: body.clone(),
        subject_b: format!("[DEMO COPY] {} intro?", lead.company),
        body_b: body,
        followup_1: format!(
            "[DEMO COPY] Following up, {}. Happy to share context if helpful.",
            lead.first_name
        ),
        followup_2: format!(
            "[DEMO COPY] Final check-in, {}. Open to a brief intro?",
            lead.first_name
        ),
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use std::cell::RefCell;
    use std::collections::VecDeque;
    use std::rc::Rc;

    /// Replays canned replies and records every request.
    pub(crate) struct ScriptedBackend {
        replies: RefCell<VecDeque<Result<String>>>,
        fallback: Option<String>,
        pub(crate) requests: Rc<RefCell<Vec<ChatRequest>>>,
    }

    impl ScriptedBackend {
        pub(crate) fn new(replies: Vec<Result<String>>) -> Self {
            Self {
                replies: RefCell::new(replies.into()),
                fallback: None,
                requests: Rc::default(),
            }
        }

        /// Answers every request with the same content.
        pub(crate) fn always(content: &str) -> Self {
            Self {
                replies: RefCell::default(),
                fallback: Some(content.to_string()),
                requests: Rc::default(),
            }
        }
    }

    impl CompletionBackend for ScriptedBackend {
        fn complete(&self, request: &ChatRequest) -> Result<String> {
            self.requests.borrow_mut().push(request.clone());
            match self.replies.borrow_mut().pop_front() {
                Some(reply) => reply,
                None => self
                    .fallback
                    .clone()
                    .ok_or_else(|| Error::backend("script exhausted")),
            }
        }
    }

    pub(crate) fn lead(first_name: &str, email: &str) -> Lead {
        Lead {
            first_name: first_name.to_string(),
            last_name: "Lovelace".to_string(),
            role: "CTO".to_string(),
            company: "Acme".to_string(),
            industry: "Fintech".to_string(),
            stage: "Seed".to_string(),
            email: email.to_string(),
            source: "Apollo".to_string(),
        }
    }

    pub(crate) fn pack_json(body_a: &str) -> String {
        serde_json::json!({
            "subject_A": "Quick intro",
            "body_A": body_a,
            "subject_B": "Intro?",
            "body_B": "Open to a short chat next week?",
            "followup_1": "Following up.",
            "followup_2": "Final check-in.",
        })
        .to_string()
    }

    fn user_prompt(request: &ChatRequest) -> &str {
        &request.messages[1].content
    }

    #[test]
    fn test_dry_run_skips_backend() {
        let generator = Generator::new(Settings::default(), Some("sk-test"), true).unwrap();
        assert!(generator.is_offline());

        let lead = lead("Ada", "ada@acme.io");
        let (pack, origin) = generator.generate(&lead).unwrap();
        assert_eq!(origin, PackOrigin::Offline);
        assert_eq!(pack, demo_pack(&lead));
    }

    #[test]
    fn test_missing_credential_is_offline() {
        assert!(Generator::new(Settings::default(), None, false).unwrap().is_offline());
        assert!(Generator::new(Settings::default(), Some("  "), false).unwrap().is_offline());
        assert!(!Generator::new(Settings::default(), Some("sk-test"), false).unwrap().is_offline());
    }

    #[test]
    fn test_demo_pack_is_deterministic_and_valid() {
        let lead = lead("Ada", "ada@acme.io");
        let first = demo_pack(&lead);
        assert_eq!(first, demo_pack(&lead));

        assert!(first.subject_a.contains("Ada"));
        assert!(first.subject_b.contains("Acme"));
        assert!(first.body_a.contains("Fintech"));
        assert!(validate_message_pack(&first, &Settings::default()).is_ok());

        let mut other = lead.clone();
        other.email = "someone@else.io".to_string();
        other.last_name = "Byron".to_string();
        assert_eq!(demo_pack(&other), first);
    }

    #[test]
    fn test_first_valid_response_is_accepted() {
        let backend = ScriptedBackend::new(vec![Ok(pack_json("Hi Ada, open to a chat?"))]);
        let requests = Rc::clone(&backend.requests);
        let generator = Generator::with_backend(Settings::default(), Box::new(backend));

        let (pack, origin) = generator.generate(&lead("Ada", "ada@acme.io")).unwrap();
        assert_eq!(origin, PackOrigin::Backend);
        assert_eq!(pack.body_a, "Hi Ada, open to a chat?");

        let requests = requests.borrow();
        assert_eq!(requests.len(), 1);
        assert_eq!(requests[0].model, "gpt-4o-mini");
        assert!(!user_prompt(&requests[0]).contains("non-ASCII character makes"));
    }

    #[test]
    fn test_retries_escalate_to_strict_prompt() {
        let backend = ScriptedBackend::new(vec![
            Ok("Sure! Here is your JSON:".to_string()),
            Err(Error::backend("HTTP 500")),
            Ok(pack_json("Hi Ada, open to a chat?")),
        ]);
        let requests = Rc::clone(&backend.requests);
        let generator = Generator::with_backend(Settings::default(), Box::new(backend));

        let (_, origin) = generator.generate(&lead("Ada", "ada@acme.io")).unwrap();
        assert_eq!(origin, PackOrigin::Backend);

        let requests = requests.borrow();
        assert_eq!(requests.len(), 3);
        let base = user_prompt(&requests[0]);
        for retry in &requests[1..] {
            let strict = user_prompt(retry);
            assert!(strict.starts_with(base));
            assert!(strict.contains("Any emoji or non-ASCII character makes the response invalid."));
        }
    }

    #[test]
    fn test_exhaustion_fails_after_three_attempts() {
        let backend = ScriptedBackend::always(&pack_json("Hi Ada \u{1f600}"));
        let requests = Rc::clone(&backend.requests);
        let generator = Generator::with_backend(Settings::default(), Box::new(backend));

        let err = generator.generate(&lead("Ada", "ada@acme.io")).unwrap_err();
        assert!(err.is_generation());
        assert!(err.to_string().contains("ada@acme.io"));
        assert!(err.to_string().contains("non-ASCII"));
        assert_eq!(requests.borrow().len(), MAX_ATTEMPTS);
    }

    #[test]
    fn test_banned_term_triggers_retry() {
        let settings = Settings {
            buzzwords: vec!["synergy".to_string()],
            ..Settings::default()
        };
        let backend = ScriptedBackend::new(vec![
            Ok(pack_json("Big Synergy ahead")),
            Ok(pack_json("Open to a chat?")),
        ]);
        let requests = Rc::clone(&backend.requests);
        let generator = Generator::with_backend(settings, Box::new(backend));

        let (pack, _) = generator.generate(&lead("Ada", "ada@acme.io")).unwrap();
        assert_eq!(pack.body_a, "Open to a chat?");
        assert_eq!(requests.borrow().len(), 2);
    }

    #[test]
    fn test_exhaustion_falls_back_when_configured() {
        let settings = Settings {
            word_limit: 2,
            on_exhaustion: ExhaustionPolicy::Demo,
            ..Settings::default()
        };
        let backend = ScriptedBackend::always(&pack_json("far too many words here"));
        let generator = Generator::with_backend(settings, Box::new(backend));

        let lead = lead("Ada", "ada@acme.io");
        let (pack, origin) = generator.generate(&lead).unwrap();
        assert_eq!(origin, PackOrigin::Fallback);
        assert_eq!(pack, demo_pack(&lead));
    }

    #[test]
    fn test_attempt_sequence() {
        let first = Attempt::first();
        assert_eq!(first.prompt_kind(), PromptKind::Base);

        let second = first.next().unwrap();
        let third = second.next().unwrap();
        assert_eq!(second.prompt_kind(), PromptKind::Strict);
        assert_eq!(third.prompt_kind(), PromptKind::Strict);
        assert_eq!(third.number(), 3);
        assert!(third.next().is_none());
    }
}
