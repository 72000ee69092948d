//! Outreach engine: webhook IO, batch dispatch and file export.
mod batch;
mod client;
mod engine;
mod export;
mod types;
mod webhooks;

pub use batch::{check_reported_status, dispatch_batch, ChannelProgressSink, ProgressSink};
pub use client::{parse_json_body, ReqwestWebhookClient, WebhookClient, WebhookSettings};
pub use engine::EngineHandle;
pub use export::{csv_document, export_csv, export_json, sanitize_stem, ExportError, ExportSummary};
pub use types::{
    BatchProgress, BatchReport, BatchTarget, ClientError, EngineEvent, JsonObject, PayloadBuilder,
    RowOutcome, MAX_BODY_EXCERPT,
};
pub use webhooks::{
    expect_object_array, generate_drafts, generate_payload, join_url, search, search_payload,
    Endpoints,
};
