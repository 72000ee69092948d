use std::sync::mpsc;

use outreach_logging::{outreach_info, outreach_warn};
use serde_json::Value;

use crate::client::WebhookClient;
use crate::{BatchProgress, BatchReport, ClientError, EngineEvent, RowOutcome};

pub trait ProgressSink: Send + Sync {
    fn emit(&self, event: EngineEvent);
}

pub struct ChannelProgressSink {
    tx: mpsc::Sender<EngineEvent>,
}

impl ChannelProgressSink {
    pub fn new(tx: mpsc::Sender<EngineEvent>) -> Self {
        Self { tx }
    }
}

impl ProgressSink for ChannelProgressSink {
    fn emit(&self, event: EngineEvent) {
        let _ = self.tx.send(event);
    }
}

/// Posts one request per row, strictly in order, one at a time.
///
/// A failing row is recorded and the loop moves on. A progress event is
/// emitted after every call. An empty `rows` makes no calls.
pub async fn dispatch_batch<T, F>(
    client: &dyn WebhookClient,
    url: &str,
    rows: &[T],
    build: F,
    sink: &dyn ProgressSink,
) -> BatchReport
where
    F: Fn(&T) -> Value,
{
    let total = rows.len();
    let mut outcomes = Vec::with_capacity(total);
    for (index, row) in rows.iter().enumerate() {
        let payload = build(row);
        let outcome = match client.post_json(url, &payload).await {
            Ok(body) => check_reported_status(&body),
            Err(err) => Err(err),
        };
        if let Err(err) = &outcome {
            outreach_warn!("Row {}/{} to {} failed: {}", index + 1, total, url, err);
        }
        sink.emit(EngineEvent::BatchProgress(BatchProgress {
            index,
            total,
            outcome: outcome.clone(),
        }));
        outcomes.push(outcome);
    }

    let report = BatchReport { outcomes };
    outreach_info!(
        "Batch to {} finished: {}/{} succeeded",
        url,
        report.succeeded(),
        report.total()
    );
    report
}

/// A 2xx answer still fails the row when the body says `"status": "error"`.
pub fn check_reported_status(body: &Value) -> RowOutcome {
    let Some(status) = body.get("status").and_then(Value::as_str) else {
        return Ok(());
    };
    if !status.eq_ignore_ascii_case("error") {
        return Ok(());
    }
    let message = body
        .get("message")
        .and_then(Value::as_str)
        .unwrap_or("no details given");
    Err(ClientError::Rejected(message.to_string()))
}
