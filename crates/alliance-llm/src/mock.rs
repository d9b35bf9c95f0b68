//! Scripted provider for tests and offline runs.

use std::collections::VecDeque;
use std::sync::Mutex;

use async_trait::async_trait;

use crate::error::{LlmError, Result};
use crate::types::{CompletionRequest, CompletionResponse, TokenUsage};
use crate::LlmProvider;

#[derive(Debug, Default)]
struct MockState {
    responses: VecDeque<String>,
    last: Option<String>,
    failures: VecDeque<LlmError>,
    requests: Vec<CompletionRequest>,
}

/// Replays scripted responses in order.
///
/// Once the script runs out the last response repeats. Queued failures are
/// returned first, one per call.
#[derive(Debug, Default)]
pub struct MockLlmProvider {
    state: Mutex<MockState>,
}

impl MockLlmProvider {
    /// A provider replaying `responses` in order.
    pub fn new(responses: Vec<String>) -> Self {
        Self {
            state: Mutex::new(MockState {
                responses: responses.into(),
                ..MockState::default()
            }),
        }
    }

    /// A provider that always answers `response`.
    pub fn with_response(response: impl Into<String>) -> Self {
        Self::new(vec![response.into()])
    }

    /// Queues errors returned before any scripted response.
    pub fn with_failures(self, failures: Vec<LlmError>) -> Self {
        if let Ok(mut state) = self.state.lock() {
            state.failures.extend(failures);
        }
        self
    }

    /// Appends a response to the script.
    pub fn push_response(&self, response: impl Into<String>) {
        if let Ok(mut state) = self.state.lock() {
            state.responses.push_back(response.into());
        }
    }

    /// Queues an error for the next call.
    pub fn push_failure(&self, failure: LlmError) {
        if let Ok(mut state) = self.state.lock() {
            state.failures.push_back(failure);
        }
    }

    /// Requests received so far.
    pub fn requests(&self) -> Vec<CompletionRequest> {
        self.state
            .lock()
            .map(|s| s.requests.clone())
            .unwrap_or_default()
    }

    /// Number of calls received so far.
    pub fn call_count(&self) -> usize {
        self.state.lock().map(|s| s.requests.len()).unwrap_or(0)
    }
}

#[async_trait]
impl LlmProvider for MockLlmProvider {
    async fn complete(&self, request: CompletionRequest) -> Result<CompletionResponse> {
        let mut state = self
            .state
            .lock()
            .map_err(|_| LlmError::decode("mock state poisoned"))?;
        state.requests.push(request);

        if let Some(failure) = state.failures.pop_front() {
            return Err(failure);
        }

        let content = match state.responses.pop_front() {
            Some(next) => {
                state.last = Some(next.clone());
                next
            }
            None => state.last.clone().ok_or(LlmError::EmptyResponse)?,
        };

        Ok(CompletionResponse {
            tokens_used: TokenUsage {
                input: 0,
                output: content.split_whitespace().count() as u32,
            },
            content,
        })
    }
}
