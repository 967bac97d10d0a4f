//! Image loading seam

use crate::error::LoadError;
use async_trait::async_trait;
use std::sync::{Mutex, PoisonError};

/// Platform primitive that fetches and decodes one image URL
#[async_trait]
pub trait ImageLoader: Send + Sync {
    /// Load `url`, resolving once the platform reports success or failure
    async fn load(&self, url: &str) -> Result<(), LoadError>;
}

#[derive(Debug)]
struct Rule {
    prefix: String,
    /// Remaining failures; `None` fails forever
    failures: Option<u32>,
}

/// In-memory loader with scripted outcomes.
///
/// Rules match on URL prefix, so a rule for a qualified URL also covers its
/// cache-busted retries. The first matching rule wins; URLs matching no
/// rule succeed.
#[derive(Debug, Default)]
pub struct ScriptedLoader {
    rules: Mutex<Vec<Rule>>,
    calls: Mutex<Vec<String>>,
}

impl ScriptedLoader {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fail the first `times` loads of URLs starting with `prefix`
    pub fn fail_times(self, prefix: impl Into<String>, times: u32) -> Self {
        self.push_rule(prefix.into(), Some(times))
    }

    /// Fail every load of URLs starting with `prefix`
    pub fn always_fail(self, prefix: impl Into<String>) -> Self {
        self.push_rule(prefix.into(), None)
    }

    fn push_rule(self, prefix: String, failures: Option<u32>) -> Self {
        self.rules
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(Rule { prefix, failures });
        self
    }

    /// URLs requested so far, in order
    pub fn calls(&self) -> Vec<String> {
        self.calls
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    fn outcome(&self, url: &str) -> Result<(), LoadError> {
        let mut rules = self.rules.lock().unwrap_or_else(PoisonError::into_inner);
        let Some(rule) = rules.iter_mut().find(|r| url.starts_with(&r.prefix)) else {
            return Ok(());
        };

        match rule.failures.as_mut() {
            None => Err(LoadError::Network(format!("scripted failure: {}", url))),
            Some(0) => Ok(()),
            Some(remaining) => {
                *remaining -= 1;
                Err(LoadError::Network(format!("scripted failure: {}", url)))
            }
        }
    }
}

#[async_trait]
impl ImageLoader for ScriptedLoader {
    async fn load(&self, url: &str) -> Result<(), LoadError> {
        self.calls
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(url.to_string());
        self.outcome(url)
    }
}
