use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

use outreach_engine::{ClientError, EngineEvent, ProgressSink, WebhookClient};
use serde_json::Value;

/// Replays canned answers in order and records every request.
#[derive(Default)]
pub struct RecordingClient {
    calls: Mutex<Vec<(String, Value)>>,
    answers: Mutex<VecDeque<Result<Value, ClientError>>>,
}

impl RecordingClient {
    pub fn new(answers: Vec<Result<Value, ClientError>>) -> Arc<Self> {
        Arc::new(Self {
            calls: Mutex::new(Vec::new()),
            answers: Mutex::new(answers.into()),
        })
    }

    pub fn calls(&self) -> Vec<(String, Value)> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait::async_trait]
impl WebhookClient for RecordingClient {
    async fn post_json(&self, url: &str, body: &Value) -> Result<Value, ClientError> {
        self.calls
            .lock()
            .unwrap()
            .push((url.to_string(), body.clone()));
        self.answers
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or(Ok(Value::Null))
    }
}

#[derive(Default)]
pub struct TestSink {
    events: Mutex<Vec<EngineEvent>>,
}

impl TestSink {
    pub fn take(&self) -> Vec<EngineEvent> {
        self.events.lock().unwrap().drain(..).collect()
    }
}

impl ProgressSink for TestSink {
    fn emit(&self, event: EngineEvent) {
        self.events.lock().unwrap().push(event);
    }
}
