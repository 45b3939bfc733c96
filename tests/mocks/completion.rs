use std::sync::{Arc, Mutex};
use ytsum::SummaryError;
use ytsum::summarize::{ChatRequest, CompletionBackend};

#[derive(Clone)]
pub struct MockCompletion {
    pub summary: String,
    pub calls: Arc<Mutex<Vec<ChatRequest>>>,
    pub fail_with: Option<String>,
}

impl MockCompletion {
    pub fn new(summary: &str) -> Self {
        Self {
            summary: summary.to_string(),
            calls: Arc::new(Mutex::new(Vec::new())),
            fail_with: None,
        }
    }

    pub fn failing(msg: &str) -> Self {
        Self {
            summary: String::new(),
            calls: Arc::new(Mutex::new(Vec::new())),
            fail_with: Some(msg.to_string()),
        }
    }
}

impl CompletionBackend for MockCompletion {
    async fn complete(&self, request: &ChatRequest) -> Result<String, SummaryError> {
        self.calls.lock().unwrap().push(request.clone());
        if let Some(ref msg) = self.fail_with {
            return Err(SummaryError::Api {
                status: 429,
                message: msg.clone(),
            });
        }
        Ok(self.summary.clone())
    }
}
