//! Interactive prompt collaborator.
//!
//! Every call may come back as `None`, meaning the user cancelled. Callers
//! treat that as "abort this step" and carry on with the rest of the run.

use async_trait::async_trait;

/// Interactive questions asked during queue expansion and setup.
#[async_trait]
pub trait Prompt: Send + Sync {
    /// Yes/no question. `None` when cancelled.
    async fn confirm(&self, message: &str, default: bool) -> Option<bool>;

    /// Single choice among `choices`, returned as an index. `None` when
    /// cancelled or when there is nothing to choose from.
    async fn select(&self, message: &str, choices: &[String]) -> Option<usize>;

    /// Free-text line. `None` when cancelled.
    async fn input(&self, message: &str, default: Option<&str>) -> Option<String>;
}

/// Prompt that answers every question with its default, for unattended runs.
#[derive(Debug, Default, Clone, Copy)]
pub struct AutoConfirmPrompt;

#[async_trait]
impl Prompt for AutoConfirmPrompt {
    async fn confirm(&self, message: &str, default: bool) -> Option<bool> {
        tracing::debug!(message, answer = default, "Auto-confirming prompt");
        Some(default)
    }

    async fn select(&self, _message: &str, choices: &[String]) -> Option<usize> {
        if choices.is_empty() {
            None
        } else {
            Some(0)
        }
    }

    async fn input(&self, _message: &str, default: Option<&str>) -> Option<String> {
        Some(default.unwrap_or_default().to_string())
    }
}
