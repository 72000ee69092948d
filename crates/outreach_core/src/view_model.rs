use crate::draft::SEND_REQUIRED_FIELDS;
use crate::record::Record;
use crate::{AppState, BatchKind, ComposeForm, Operation, Stage, TableSource};

/// Record columns shown first, in this order; anything else follows in the
/// order first seen.
pub const RECORD_COLUMNS: &[&str] = &[
    "name", "type", "location", "phone", "emails", "website", "rating", "s_no", "timestamp", "id",
];

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BatchProgressView {
    pub kind: BatchKind,
    pub completed: usize,
    pub total: usize,
    pub failures: usize,
}

impl BatchProgressView {
    pub fn fraction(&self) -> f64 {
        if self.total == 0 {
            1.0
        } else {
            self.completed as f64 / self.total as f64
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct TableView {
    pub columns: Vec<String>,
    pub rows: Vec<Vec<String>>,
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct AppViewModel {
    pub stage: Stage,
    pub source: TableSource,
    pub table: TableView,
    pub compose: ComposeForm,
    pub busy: Option<Operation>,
    pub progress: Option<BatchProgressView>,
    /// e.g. `3/3 sent`, once a send batch has finished.
    pub send_outcome: Option<String>,
}

pub(crate) fn build(state: &AppState) -> AppViewModel {
    let table = match state.stage() {
        Stage::SearchEdit | Stage::Compose => table_view(state.records().iter(), RECORD_COLUMNS),
        Stage::ReviewSend => table_view(
            state.drafts().iter().map(|draft| draft.fields()),
            SEND_REQUIRED_FIELDS,
        ),
    };
    AppViewModel {
        stage: state.stage(),
        source: state.source().clone(),
        table,
        compose: state.compose().clone(),
        busy: state.pending(),
        progress: state.progress().cloned(),
        send_outcome: state
            .last_send()
            .map(|summary| format!("{}/{} sent", summary.succeeded(), summary.total())),
    }
}

/// Union of field names across rows: preferred ones first, then first-seen order.
pub fn column_order<'a>(rows: impl Iterator<Item = &'a Record>, preferred: &[&str]) -> Vec<String> {
    let mut seen: Vec<String> = Vec::new();
    for row in rows {
        for field in row.fields() {
            if !seen.iter().any(|known| known == field) {
                seen.push(field.to_string());
            }
        }
    }
    let mut ordered: Vec<String> = preferred
        .iter()
        .filter(|name| seen.iter().any(|known| known == *name))
        .map(|name| name.to_string())
        .collect();
    ordered.extend(seen.into_iter().filter(|field| !preferred.contains(&field.as_str())));
    ordered
}

fn table_view<'a>(rows: impl Iterator<Item = &'a Record> + Clone, preferred: &[&str]) -> TableView {
    let columns = column_order(rows.clone(), preferred);
    let rows = rows
        .map(|row| {
            columns
                .iter()
                .map(|column| row.get(column).map(|cell| cell.display()).unwrap_or_default())
                .collect()
        })
        .collect();
    TableView { columns, rows }
}
