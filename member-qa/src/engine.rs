//! Question pipeline: validate → cache → names → filter → prompt → completion → cache.

use std::{sync::Arc, time::Duration};

use ai_llm_service::{AiLlmError, CompletionClient};
use tracing::{debug, info, instrument, warn};

use crate::{
    cache::AnswerCache,
    cfg::QaConfig,
    error::QaError,
    filter::{self, FilterOptions},
    names,
    prompt::PromptComposer,
    store::MessageStore,
};

/// Shortest question worth sending anywhere (in characters, after trimming).
pub const MIN_QUESTION_CHARS: usize = 3;
/// Longest accepted question (in characters).
pub const MAX_QUESTION_CHARS: usize = 2_000;

const RETRY_DELAY: Duration = Duration::from_millis(250);

/// Answers questions about the loaded members. Cheap to share behind `Arc`.
pub struct QaEngine {
    store: Arc<MessageStore>,
    cache: Arc<AnswerCache>,
    client: Arc<dyn CompletionClient>,
    filter: FilterOptions,
    composer: PromptComposer,
    completion_timeout: Duration,
}

impl QaEngine {
    pub fn new(
        store: Arc<MessageStore>,
        cache: Arc<AnswerCache>,
        client: Arc<dyn CompletionClient>,
        cfg: &QaConfig,
    ) -> Self {
        let composer = PromptComposer::new(cfg.max_prompt_chars, store.roster());
        Self {
            store,
            cache,
            client,
            filter: cfg.filter_options(),
            composer,
            completion_timeout: cfg.completion_timeout,
        }
    }

    pub fn store(&self) -> &MessageStore {
        &self.store
    }

    pub fn cache(&self) -> &AnswerCache {
        &self.cache
    }

    /// Answers `question`, serving repeats from the cache.
    ///
    /// # Errors
    /// - [`QaError::Validation`] before any filtering when the question is
    ///   blank, too short or too long
    /// - [`QaError::Upstream`] when the completion fails
    #[instrument(skip_all, fields(question_len = question.len()))]
    pub async fn ask(&self, question: &str) -> Result<String, QaError> {
        let question = validate_question(question)?;

        if let Some(answer) = self.cache.get(question) {
            debug!("answer cache hit");
            return Ok(answer);
        }

        let matched = names::extract(question, self.store.roster());
        if matched.is_empty() {
            info!("no known member named; using the general sample");
        } else {
            info!(members = ?matched, "members named in question");
        }

        let bundle = filter::filter(self.store.all(), &matched, &self.filter);
        let prompt = self.composer.compose(question, &bundle);
        debug!(
            selected = filter::selected_count(&bundle),
            groups = bundle.len(),
            prompt_len = prompt.len(),
            "prompt composed"
        );

        let answer = self.complete_with_retry(&prompt).await?;
        self.cache.put(question, &answer);
        Ok(answer)
    }

    /// One attempt, plus one more when the first failure is transient.
    async fn complete_with_retry(&self, prompt: &str) -> Result<String, QaError> {
        match self.complete_once(prompt).await {
            Ok(answer) => Ok(answer),
            Err(e) if e.is_transient() => {
                warn!(error = %e, model = self.client.model(), "transient completion failure; retrying once");
                tokio::time::sleep(RETRY_DELAY).await;
                Ok(self.complete_once(prompt).await?)
            }
            Err(e) => Err(e.into()),
        }
    }

    async fn complete_once(&self, prompt: &str) -> Result<String, AiLlmError> {
        match tokio::time::timeout(self.completion_timeout, self.client.complete(prompt)).await {
            Ok(res) => res,
            Err(_) => Err(AiLlmError::Timeout(self.completion_timeout)),
        }
    }
}

/// Trims `question` and checks its length.
pub fn validate_question(question: &str) -> Result<&str, QaError> {
    let q = question.trim();
    let chars = q.chars().count();
    if chars == 0 {
        return Err(QaError::Validation("question must not be empty".into()));
    }
    if chars < MIN_QUESTION_CHARS {
        return Err(QaError::Validation(format!(
            "question must be at least {MIN_QUESTION_CHARS} characters long"
        )));
    }
    if chars > MAX_QUESTION_CHARS {
        return Err(QaError::Validation(format!(
            "question must be at most {MAX_QUESTION_CHARS} characters long"
        )));
    }
    Ok(q)
}
