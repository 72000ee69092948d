use crate::draft::EmailDraft;
use crate::record::Record;
use crate::view_model::{self, AppViewModel, BatchProgressView};

/// Phase of the guided workflow.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Stage {
    #[default]
    SearchEdit,
    Compose,
    ReviewSend,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BatchKind {
    Persist,
    Send,
}

/// An operation handed to the shell that has not reported back yet.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operation {
    Search,
    Persist,
    Generate,
    Send,
}

/// Where the current table came from.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum TableSource {
    #[default]
    Empty,
    Search { query: String },
    Pasted,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RowResult {
    pub index: usize,
    pub ok: bool,
    pub detail: Option<String>,
}

/// Per-row outcomes of one batch, in row order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BatchSummary {
    pub kind: BatchKind,
    pub results: Vec<RowResult>,
}

impl BatchSummary {
    pub fn total(&self) -> usize {
        self.results.len()
    }

    pub fn succeeded(&self) -> usize {
        self.results.iter().filter(|result| result.ok).count()
    }

    pub fn failed(&self) -> usize {
        self.total() - self.succeeded()
    }

    /// True for an empty batch.
    pub fn all_succeeded(&self) -> bool {
        self.results.iter().all(|result| result.ok)
    }

    pub fn failures(&self) -> impl Iterator<Item = &RowResult> {
        self.results.iter().filter(|result| !result.ok)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Notice {
    Success(String),
    Warning(String),
    Error(String),
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ComposeForm {
    pub subject: String,
    pub body_template: String,
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct AppState {
    stage: Stage,
    source: TableSource,
    records: Vec<Record>,
    compose: ComposeForm,
    drafts: Vec<EmailDraft>,
    pending: Option<Operation>,
    progress: Option<BatchProgressView>,
    last_send: Option<BatchSummary>,
    notices: Vec<Notice>,
    dirty: bool,
}

impl AppState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Starts with a pre-filled composer form.
    pub fn with_compose_defaults(subject: impl Into<String>, body_template: impl Into<String>) -> Self {
        Self {
            compose: ComposeForm {
                subject: subject.into(),
                body_template: body_template.into(),
            },
            ..Self::default()
        }
    }

    pub fn view(&self) -> AppViewModel {
        view_model::build(self)
    }

    pub fn stage(&self) -> Stage {
        self.stage
    }

    pub fn source(&self) -> &TableSource {
        &self.source
    }

    pub fn records(&self) -> &[Record] {
        &self.records
    }

    pub fn drafts(&self) -> &[EmailDraft] {
        &self.drafts
    }

    pub fn compose(&self) -> &ComposeForm {
        &self.compose
    }

    pub fn pending(&self) -> Option<Operation> {
        self.pending
    }

    pub fn progress(&self) -> Option<&BatchProgressView> {
        self.progress.as_ref()
    }

    pub fn last_send(&self) -> Option<&BatchSummary> {
        self.last_send.as_ref()
    }

    pub fn notices(&self) -> &[Notice] {
        &self.notices
    }

    /// Returns true once after any change, then resets.
    pub fn consume_dirty(&mut self) -> bool {
        std::mem::take(&mut self.dirty)
    }

    /// Drains notices raised since the last call.
    pub fn take_notices(&mut self) -> Vec<Notice> {
        std::mem::take(&mut self.notices)
    }

    pub(crate) fn notify(&mut self, notice: Notice) {
        self.notices.push(notice);
        self.dirty = true;
    }

    pub(crate) fn begin(&mut self, operation: Operation) {
        self.pending = Some(operation);
        self.progress = None;
        self.dirty = true;
    }

    pub(crate) fn finish(&mut self) {
        self.pending = None;
        self.progress = None;
        self.dirty = true;
    }

    /// A new table replaces everything downstream of it.
    pub(crate) fn reset_table(&mut self, source: TableSource, records: Vec<Record>) {
        self.stage = Stage::SearchEdit;
        self.source = source;
        self.records = records;
        self.drafts.clear();
        self.last_send = None;
        self.dirty = true;
    }

    pub(crate) fn records_mut(&mut self) -> &mut Vec<Record> {
        self.dirty = true;
        &mut self.records
    }

    pub(crate) fn drafts_mut(&mut self) -> &mut Vec<EmailDraft> {
        self.dirty = true;
        &mut self.drafts
    }

    pub(crate) fn set_stage(&mut self, stage: Stage) {
        self.stage = stage;
        self.dirty = true;
    }

    pub(crate) fn set_compose(&mut self, compose: ComposeForm) {
        self.compose = compose;
        self.dirty = true;
    }

    pub(crate) fn set_drafts(&mut self, drafts: Vec<EmailDraft>) {
        self.drafts = drafts;
        self.dirty = true;
    }

    pub(crate) fn set_progress(&mut self, progress: BatchProgressView) {
        self.progress = Some(progress);
        self.dirty = true;
    }

    pub(crate) fn set_last_send(&mut self, summary: BatchSummary) {
        self.last_send = Some(summary);
        self.dirty = true;
    }
}
