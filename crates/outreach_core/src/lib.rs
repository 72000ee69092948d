//! Outreach core: pure workflow state machine, record model and view-model helpers.
mod draft;
mod effect;
mod msg;
mod record;
mod state;
mod update;
mod view_model;

pub use draft::{
    send_payload, EmailDraft, FieldMapping, BODY, EMAIL_ID, RECIPIENT_EMAIL,
    SEND_REQUIRED_FIELDS, SUBJECT,
};
pub use effect::{Effect, ExportFormat};
pub use msg::Msg;
pub use record::{
    coerce_input, column_sample, format_timestamp, parse_records_json, parse_timestamp, persist_payload,
    preprocess_record, validate_required, Cell, JsonInputError, RawRecord, Record,
    ValidationError, EMAILS_FIELD, PERSIST_ACTION, PERSIST_REQUIRED_FIELDS,
};
pub use state::{
    AppState, BatchKind, BatchSummary, ComposeForm, Notice, Operation, RowResult, Stage,
    TableSource,
};
pub use update::update;
pub use view_model::{
    column_order, AppViewModel, BatchProgressView, TableView, RECORD_COLUMNS,
};
