use std::path::PathBuf;

use outreach_core::{
    persist_payload, send_payload, BatchKind, BatchSummary, Effect, ExportFormat, Msg, RowResult,
};
use outreach_engine::{
    export_csv, export_json, BatchReport, BatchTarget, EngineEvent, EngineHandle,
};
use outreach_logging::{outreach_error, outreach_info, outreach_warn};

/// Hands effects to the engine and turns its events back into messages.
pub struct EffectRunner {
    engine: EngineHandle,
    export_dir: PathBuf,
}

impl EffectRunner {
    pub fn new(engine: EngineHandle, export_dir: PathBuf) -> Self {
        Self { engine, export_dir }
    }

    /// Runs one effect to completion. Every message it produces, progress
    /// included, goes to `deliver` in the order the engine reported it.
    pub fn run(&self, effect: Effect, deliver: &mut dyn FnMut(Msg)) {
        match effect {
            Effect::Search { query } => {
                self.engine.search(query.clone());
                self.wait(Awaiting::Search { query }, deliver);
            }
            Effect::PersistRecords { rows } => {
                outreach_info!("Saving {} record(s)", rows.len());
                let total = rows.len();
                self.engine
                    .run_batch(BatchTarget::Persist, rows, persist_payload);
                self.wait(
                    Awaiting::Batch {
                        kind: BatchKind::Persist,
                        total,
                    },
                    deliver,
                );
            }
            Effect::GenerateDrafts {
                subject,
                body_template,
                records,
            } => {
                self.engine.generate(subject, body_template, records);
                self.wait(Awaiting::Drafts, deliver);
            }
            Effect::SendDrafts { drafts } => {
                outreach_info!("Sending {} email(s)", drafts.len());
                let total = drafts.len();
                self.engine.run_batch(BatchTarget::Send, drafts, send_payload);
                self.wait(
                    Awaiting::Batch {
                        kind: BatchKind::Send,
                        total,
                    },
                    deliver,
                );
            }
            Effect::Export {
                format,
                file_stem,
                rows,
            } => {
                let written = match format {
                    ExportFormat::Csv => export_csv(&self.export_dir, &file_stem, &rows),
                    ExportFormat::Json => export_json(&self.export_dir, &file_stem, &rows),
                };
                let result = match written {
                    Ok(summary) => {
                        outreach_info!("Exported {} row(s) to {:?}", summary.row_count, summary.path);
                        Ok(summary.path.display().to_string())
                    }
                    Err(err) => {
                        outreach_error!("Export of {} failed: {}", file_stem, err);
                        Err(err.to_string())
                    }
                };
                deliver(Msg::ExportCompleted(result));
            }
        }
    }

    /// Forwards engine events until the one that ends the current command.
    /// If the engine goes away first, a failed completion is delivered so
    /// the operation still ends.
    fn wait(&self, awaiting: Awaiting, deliver: &mut dyn FnMut(Msg)) {
        let batch = match &awaiting {
            Awaiting::Batch { kind, .. } => Some(*kind),
            _ => None,
        };
        let mut reported: Vec<(usize, Result<(), String>)> = Vec::new();
        loop {
            let Some(event) = self.engine.recv() else {
                outreach_error!("Engine stopped before answering");
                deliver(abandoned(awaiting, &reported));
                return;
            };
            if let EngineEvent::BatchProgress(progress) = &event {
                let outcome = progress.outcome.clone().map_err(|err| err.to_string());
                reported.push((progress.index, outcome));
            }
            let finished = !matches!(event, EngineEvent::BatchProgress(_));
            if let Some(msg) = map_event(event, batch) {
                deliver(msg);
            }
            if finished {
                return;
            }
        }
    }
}

/// The completion the shell is waiting for.
#[derive(Debug, Clone, PartialEq)]
enum Awaiting {
    Search { query: String },
    Drafts,
    Batch { kind: BatchKind, total: usize },
}

const ENGINE_GONE: &str = "the webhook engine stopped";

/// Failed completion for an operation the engine never finished. Batch rows
/// already reported keep their outcome; the rest fail.
fn abandoned(awaiting: Awaiting, reported: &[(usize, Result<(), String>)]) -> Msg {
    match awaiting {
        Awaiting::Search { query } => Msg::SearchCompleted {
            query,
            result: Err(ENGINE_GONE.to_string()),
        },
        Awaiting::Drafts => Msg::DraftsGenerated(Err(ENGINE_GONE.to_string())),
        Awaiting::Batch { kind, total } => {
            let summary = BatchSummary {
                kind,
                results: (0..total)
                    .map(|index| {
                        let outcome = reported
                            .iter()
                            .find(|(row, _)| *row == index)
                            .map(|(_, outcome)| outcome.clone())
                            .unwrap_or_else(|| Err(ENGINE_GONE.to_string()));
                        RowResult {
                            index,
                            ok: outcome.is_ok(),
                            detail: outcome.err(),
                        }
                    })
                    .collect(),
            };
            match kind {
                BatchKind::Persist => Msg::PersistCompleted(summary),
                BatchKind::Send => Msg::SendCompleted(summary),
            }
        }
    }
}

/// `batch` is the kind of batch running, if any. Progress events carry no
/// target of their own.
fn map_event(event: EngineEvent, batch: Option<BatchKind>) -> Option<Msg> {
    match event {
        EngineEvent::SearchCompleted { query, result } => Some(Msg::SearchCompleted {
            query,
            result: result.map_err(|err| err.to_string()),
        }),
        EngineEvent::DraftsGenerated(result) => {
            Some(Msg::DraftsGenerated(result.map_err(|err| err.to_string())))
        }
        EngineEvent::BatchProgress(progress) => {
            let Some(kind) = batch else {
                outreach_warn!("Progress for row {} arrived outside a batch", progress.index);
                return None;
            };
            Some(Msg::BatchProgress {
                kind,
                index: progress.index,
                total: progress.total,
                ok: progress.outcome.is_ok(),
            })
        }
        EngineEvent::BatchCompleted { target, report } => {
            let kind = map_target(target);
            let summary = summarize(kind, &report);
            Some(match kind {
                BatchKind::Persist => Msg::PersistCompleted(summary),
                BatchKind::Send => Msg::SendCompleted(summary),
            })
        }
    }
}

fn map_target(target: BatchTarget) -> BatchKind {
    match target {
        BatchTarget::Persist => BatchKind::Persist,
        BatchTarget::Send => BatchKind::Send,
    }
}

pub fn summarize(kind: BatchKind, report: &BatchReport) -> BatchSummary {
    BatchSummary {
        kind,
        results: report
            .outcomes
            .iter()
            .enumerate()
            .map(|(index, outcome)| RowResult {
                index,
                ok: outcome.is_ok(),
                detail: outcome.as_ref().err().map(ToString::to_string),
            })
            .collect(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use outreach_engine::{BatchProgress, ClientError};
    use pretty_assertions::assert_eq;

    #[test]
    fn report_maps_to_summary_with_details() {
        let report = BatchReport {
            outcomes: vec![
                Ok(()),
                Err(ClientError::HttpStatus {
                    status: 502,
                    body: "bad gateway".to_string(),
                }),
            ],
        };
        let summary = summarize(BatchKind::Send, &report);
        assert_eq!(summary.succeeded(), 1);
        assert_eq!(
            summary.results[1],
            RowResult {
                index: 1,
                ok: false,
                detail: Some("webhook returned status 502: bad gateway".to_string()),
            }
        );
    }

    #[test]
    fn progress_is_tagged_with_running_batch() {
        let event = EngineEvent::BatchProgress(BatchProgress {
            index: 0,
            total: 2,
            outcome: Ok(()),
        });
        assert_eq!(
            map_event(event.clone(), Some(BatchKind::Persist)),
            Some(Msg::BatchProgress {
                kind: BatchKind::Persist,
                index: 0,
                total: 2,
                ok: true,
            })
        );
        assert_eq!(map_event(event, None), None);
    }

    #[test]
    fn completion_picks_message_by_target() {
        let msg = map_event(
            EngineEvent::BatchCompleted {
                target: BatchTarget::Send,
                report: BatchReport::default(),
            },
            Some(BatchKind::Send),
        );
        assert!(matches!(msg, Some(Msg::SendCompleted(summary)) if summary.total() == 0));
    }

    #[test]
    fn unfinished_batch_fails_unreported_rows() {
        let msg = abandoned(
            Awaiting::Batch {
                kind: BatchKind::Persist,
                total: 3,
            },
            &[(1, Err("network error: reset".to_string())), (0, Ok(()))],
        );
        let Msg::PersistCompleted(summary) = msg else {
            panic!("unexpected message {msg:?}");
        };
        assert_eq!(summary.succeeded(), 1);
        assert_eq!(summary.results[1].detail.as_deref(), Some("network error: reset"));
        assert_eq!(summary.results[2].detail.as_deref(), Some(ENGINE_GONE));
    }

    #[test]
    fn unfinished_search_and_generation_fail() {
        assert_eq!(
            abandoned(
                Awaiting::Search {
                    query: "florists".to_string()
                },
                &[]
            ),
            Msg::SearchCompleted {
                query: "florists".to_string(),
                result: Err(ENGINE_GONE.to_string()),
            }
        );
        assert_eq!(
            abandoned(Awaiting::Drafts, &[]),
            Msg::DraftsGenerated(Err(ENGINE_GONE.to_string()))
        );
    }

    #[test]
    fn search_error_becomes_text() {
        let msg = map_event(
            EngineEvent::SearchCompleted {
                query: "florists".to_string(),
                result: Err(ClientError::Timeout("after 300s".to_string())),
            },
            None,
        );
        assert_eq!(
            msg,
            Some(Msg::SearchCompleted {
                query: "florists".to_string(),
                result: Err("request timed out: after 300s".to_string()),
            })
        );
    }
}
