//! Runtime configuration loaded from environment variables.

use std::time::Duration;

use crate::{error::ConfigError, filter::FilterOptions, prompt::min_prompt_budget, store::MessageSource};

/// Lets the HTTP client's own timeout fire first.
const COMPLETION_GRACE: Duration = Duration::from_secs(5);

/// Config bag for the question pipeline. Unset variables take the defaults below.
#[derive(Clone, Debug)]
pub struct QaConfig {
    /// Dataset location (`MESSAGES_SOURCE`).
    pub messages_source: MessageSource,

    // Context selection knobs
    pub context_cap: usize,
    pub fallback_per_member: usize,
    pub max_prompt_chars: usize,

    // Answer cache
    pub cache_ttl: Duration,
    /// `None` disables the bound (`QA_CACHE_MAX_ENTRIES=0`).
    pub cache_max_entries: Option<usize>,

    /// Outer bound on one completion attempt (`LLM_TIMEOUT_SECS` plus a grace period).
    pub completion_timeout: Duration,
}

impl Default for QaConfig {
    fn default() -> Self {
        Self {
            messages_source: MessageSource::parse("data/messages.json"),
            context_cap: 350,
            fallback_per_member: 30,
            max_prompt_chars: 60_000,
            cache_ttl: Duration::from_secs(300),
            cache_max_entries: Some(1024),
            completion_timeout: Duration::from_secs(30) + COMPLETION_GRACE,
        }
    }
}

impl QaConfig {
    /// Build from environment variables with sensible defaults.
    ///
    /// # Errors
    /// [`ConfigError`] when a variable is set but does not parse, or when
    /// `QA_MAX_PROMPT_CHARS` is below [`min_prompt_budget`].
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|k| std::env::var(k).ok())
    }

    /// Same as [`QaConfig::from_env`] over an arbitrary variable source.
    pub fn from_lookup<F>(get: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let d = Self::default();
        let var = |k: &str| get(k).filter(|v| !v.trim().is_empty());

        let max_entries: usize = num(&var, "QA_CACHE_MAX_ENTRIES", d.cache_max_entries.unwrap_or(0))?;
        let max_prompt_chars = num(&var, "QA_MAX_PROMPT_CHARS", d.max_prompt_chars)?;
        let min = min_prompt_budget();
        if max_prompt_chars < min {
            return Err(ConfigError::PromptBudgetTooSmall {
                got: max_prompt_chars,
                min,
            });
        }

        Ok(Self {
            messages_source: var("MESSAGES_SOURCE")
                .map(|s| MessageSource::parse(&s))
                .unwrap_or(d.messages_source),
            context_cap: num(&var, "QA_CONTEXT_CAP", d.context_cap)?,
            fallback_per_member: num(&var, "QA_FALLBACK_PER_MEMBER", d.fallback_per_member)?,
            max_prompt_chars,
            cache_ttl: Duration::from_secs(num(&var, "QA_CACHE_TTL_SECS", d.cache_ttl.as_secs())?),
            cache_max_entries: (max_entries > 0).then_some(max_entries),
            completion_timeout: Duration::from_secs(num(&var, "LLM_TIMEOUT_SECS", 30u64)?)
                + COMPLETION_GRACE,
        })
    }

    pub fn filter_options(&self) -> FilterOptions {
        FilterOptions {
            cap: self.context_cap,
            fallback_per_member: self.fallback_per_member,
        }
    }
}

/// Unset or blank gives `dflt`; anything else must parse.
fn num<T, F>(var: &F, k: &'static str, dflt: T) -> Result<T, ConfigError>
where
    T: std::str::FromStr,
    F: Fn(&str) -> Option<String>,
{
    match var(k) {
        None => Ok(dflt),
        Some(v) => v.trim().parse().map_err(|_| ConfigError::InvalidValue {
            var: k,
            value: v,
            reason: "expected an unsigned integer",
        }),
    }
}
