use crate::record::RawRecord;
use crate::{BatchKind, BatchSummary, ExportFormat};

#[derive(Debug, Clone, PartialEq)]
pub enum Msg {
    /// User submitted a search query.
    SearchSubmitted(String),
    /// Search webhook answered (error text on failure).
    SearchCompleted {
        query: String,
        result: Result<Vec<RawRecord>, String>,
    },
    /// User pasted or loaded a JSON array to use as the table.
    JsonPasted(String),
    /// User edited one cell. `row` is 0-based.
    CellEdited {
        row: usize,
        field: String,
        value: String,
    },
    /// User appended an empty row to the record table.
    RowAdded,
    /// User removed a row from the record table.
    RowRemoved(usize),
    /// User asked to save all rows.
    SaveClicked,
    /// One row of a running batch finished.
    BatchProgress {
        kind: BatchKind,
        index: usize,
        total: usize,
        ok: bool,
    },
    /// Persistence batch finished.
    PersistCompleted(BatchSummary),
    /// User changed the composer form.
    ComposeEdited {
        subject: String,
        body_template: String,
    },
    /// User asked for drafts to be generated.
    GenerateClicked,
    /// Generation webhook answered (error text on failure).
    DraftsGenerated(Result<Vec<RawRecord>, String>),
    /// User asked to send all drafts.
    SendClicked,
    /// Send batch finished.
    SendCompleted(BatchSummary),
    /// User asked to export the current table.
    ExportRequested(ExportFormat),
    /// Export written (file path) or failed (error text).
    ExportCompleted(Result<String, String>),
    /// Render tick.
    Tick,
    /// Fallback for placeholder wiring.
    NoOp,
}
