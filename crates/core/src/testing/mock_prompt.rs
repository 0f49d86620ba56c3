//! Mock prompt for testing.

use async_trait::async_trait;
use std::collections::VecDeque;
use std::sync::Arc;
use tokio::sync::RwLock;

use crate::prompt::Prompt;

/// A question asked through the mock.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PromptCall {
    Confirm(String),
    Select(String, Vec<String>),
    Input(String),
}

/// Mock implementation of the Prompt trait.
///
/// Answers are scripted per kind of question and consumed in order. Once a
/// script runs dry, confirms answer `Some(true)`, selects pick the first
/// choice and inputs return their default.
#[derive(Debug, Clone, Default)]
pub struct MockPrompt {
    confirms: Arc<RwLock<VecDeque<Option<bool>>>>,
    selects: Arc<RwLock<VecDeque<Option<usize>>>>,
    inputs: Arc<RwLock<VecDeque<Option<String>>>>,
    calls: Arc<RwLock<Vec<PromptCall>>>,
}

impl MockPrompt {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn push_confirm(&self, answer: Option<bool>) {
        self.confirms.write().await.push_back(answer);
    }

    pub async fn push_select(&self, answer: Option<usize>) {
        self.selects.write().await.push_back(answer);
    }

    pub async fn push_input(&self, answer: Option<String>) {
        self.inputs.write().await.push_back(answer);
    }

    /// Every question asked, in order.
    pub async fn calls(&self) -> Vec<PromptCall> {
        self.calls.read().await.clone()
    }
}

#[async_trait]
impl Prompt for MockPrompt {
    async fn confirm(&self, message: &str, _default: bool) -> Option<bool> {
        self.calls
            .write()
            .await
            .push(PromptCall::Confirm(message.to_string()));
        self.confirms.write().await.pop_front().unwrap_or(Some(true))
    }

    async fn select(&self, message: &str, choices: &[String]) -> Option<usize> {
        self.calls
            .write()
            .await
            .push(PromptCall::Select(message.to_string(), choices.to_vec()));
        match self.selects.write().await.pop_front() {
            Some(answer) => answer,
            None => (!choices.is_empty()).then_some(0),
        }
    }

    async fn input(&self, message: &str, default: Option<&str>) -> Option<String> {
        self.calls
            .write()
            .await
            .push(PromptCall::Input(message.to_string()));
        match self.inputs.write().await.pop_front() {
            Some(answer) => answer,
            None => Some(default.unwrap_or_default().to_string()),
        }
    }
}
