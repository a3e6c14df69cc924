use async_trait::async_trait;

use super::prompts::{REPAIR_SYSTEM_PROMPT, SYSTEM_PROMPT, build_repair_prompt, build_user_context};
use super::protocol::parse_extraction;
use super::{AdapterError, CompletionAdapter, ExtractionResult};
use crate::conversation::Message;
use crate::prd::PrdDocument;

/// Raw text-in/text-out access to a provider
#[async_trait]
pub trait CompletionClient: Send + Sync {
    async fn complete(&self, system_prompt: &str, user_prompt: &str)
    -> Result<String, AdapterError>;
}

/// Adapter that asks a [`CompletionClient`] for an extraction and, when the
/// reply does not parse, asks it exactly once more to reformat that reply.
pub struct RepairingAdapter<C> {
    client: C,
    debug_raw: bool,
}

impl<C: CompletionClient> RepairingAdapter<C> {
    pub fn new(client: C) -> Self {
        Self {
            client,
            debug_raw: false,
        }
    }

    /// Log every raw provider reply at debug level
    pub fn with_debug_raw(mut self, debug_raw: bool) -> Self {
        self.debug_raw = debug_raw;
        self
    }

    async fn repair(&self, raw_output: &str, reason: &str) -> Result<ExtractionResult, AdapterError> {
        log::warn!("Provider output did not parse ({}); attempting one repair pass", reason);

        let repaired = self
            .client
            .complete(REPAIR_SYSTEM_PROMPT, &build_repair_prompt(raw_output))
            .await?;
        if self.debug_raw {
            log::debug!("Raw repair output:\n{}", repaired);
        }

        // Report the original reply on failure; it is what needs diagnosing
        parse_extraction(&repaired).map_err(|err| match err {
            AdapterError::MalformedOutput { reason, .. } => AdapterError::MalformedOutput {
                reason: format!("repair pass failed: {}", reason),
                raw_output: raw_output.to_string(),
            },
            other => other,
        })
    }
}

#[async_trait]
impl<C: CompletionClient> CompletionAdapter for RepairingAdapter<C> {
    fn name(&self) -> &'static str {
        "live"
    }

    async fn extract(
        &self,
        history: &[Message],
        current: &PrdDocument,
    ) -> Result<ExtractionResult, AdapterError> {
        let context = build_user_context(history, current);
        let raw = self.client.complete(SYSTEM_PROMPT, &context).await?;
        if self.debug_raw {
            log::debug!("Raw provider output:\n{}", raw);
        }

        match parse_extraction(&raw) {
            Ok(result) => Ok(result),
            Err(AdapterError::MalformedOutput { reason, .. }) => self.repair(&raw, &reason).await,
            Err(other) => Err(other),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::VecDeque;
    use std::sync::Mutex;

    /// Replays canned replies and records the prompts it was sent
    struct FakeClient {
        replies: Mutex<VecDeque<Result<String, AdapterError>>>,
        prompts: Mutex<Vec<(String, String)>>,
    }

    impl FakeClient {
        fn new(replies: Vec<Result<String, AdapterError>>) -> Self {
            Self {
                replies: Mutex::new(replies.into()),
                prompts: Mutex::new(Vec::new()),
            }
        }

        fn calls(&self) -> usize {
            self.prompts.lock().unwrap().len()
        }
    }

    #[async_trait]
    impl CompletionClient for FakeClient {
        async fn complete(
            &self,
            system_prompt: &str,
            user_prompt: &str,
        ) -> Result<String, AdapterError> {
            self.prompts
                .lock()
                .unwrap()
                .push((system_prompt.to_string(), user_prompt.to_string()));
            self.replies
                .lock()
                .unwrap()
                .pop_front()
                .unwrap_or_else(|| Err(AdapterError::ProviderUnavailable("no reply".into())))
        }
    }

    const GOOD_REPLY: &str =
        r#"{"assistant_text": "What is the primary goal you want?", "questions": ["What is the primary goal you want?"], "prd": {"problem": "Reviews stall"}}"#;

    #[tokio::test]
    async fn clean_reply_needs_one_call() {
        let adapter = RepairingAdapter::new(FakeClient::new(vec![Ok(GOOD_REPLY.into())]));
        let history = vec![Message::user("a code review tool")];

        let result = adapter.extract(&history, &PrdDocument::new()).await.unwrap();
        assert_eq!(result.prd_fragment.problem.as_deref(), Some("Reviews stall"));
        assert_eq!(adapter.client.calls(), 1);

        let prompts = adapter.client.prompts.lock().unwrap();
        assert_eq!(prompts[0].0, SYSTEM_PROMPT);
        assert!(prompts[0].1.contains("user: a code review tool"));
    }

    #[tokio::test]
    async fn malformed_reply_is_repaired_once() {
        let adapter = RepairingAdapter::new(FakeClient::new(vec![
            Ok("assistant_text = What is the goal?".into()),
            Ok(GOOD_REPLY.into()),
        ]));

        let result = adapter.extract(&[], &PrdDocument::new()).await.unwrap();
        assert_eq!(result.questions, vec!["What is the primary goal you want?"]);
        assert_eq!(adapter.client.calls(), 2);

        let prompts = adapter.client.prompts.lock().unwrap();
        assert_eq!(prompts[1].0, REPAIR_SYSTEM_PROMPT);
        assert!(prompts[1].1.contains("assistant_text = What is the goal?"));
    }

    #[tokio::test]
    async fn failed_repair_surfaces_original_raw_output() {
        let adapter = RepairingAdapter::new(FakeClient::new(vec![
            Ok("first garbage".into()),
            Ok("second garbage".into()),
            Ok(GOOD_REPLY.into()),
        ]));

        let err = adapter.extract(&[], &PrdDocument::new()).await.unwrap_err();
        match err {
            AdapterError::MalformedOutput { reason, raw_output } => {
                assert!(reason.starts_with("repair pass failed"));
                assert_eq!(raw_output, "first garbage");
            }
            other => panic!("unexpected error: {other:?}"),
        }
        // never a second repair
        assert_eq!(adapter.client.calls(), 2);
    }

    #[tokio::test]
    async fn unavailable_provider_skips_repair() {
        let adapter = RepairingAdapter::new(FakeClient::new(vec![Err(
            AdapterError::ProviderUnavailable("connection refused".into()),
        )]));

        let err = adapter.extract(&[], &PrdDocument::new()).await.unwrap_err();
        assert_eq!(
            err,
            AdapterError::ProviderUnavailable("connection refused".into())
        );
        assert_eq!(adapter.client.calls(), 1);
    }

    #[tokio::test]
    async fn provider_failure_during_repair_is_reported_as_unavailable() {
        let adapter = RepairingAdapter::new(FakeClient::new(vec![
            Ok("not json".into()),
            Err(AdapterError::ProviderUnavailable("timed out".into())),
        ]));

        let err = adapter.extract(&[], &PrdDocument::new()).await.unwrap_err();
        assert!(matches!(err, AdapterError::ProviderUnavailable(_)));
    }
}
