use std::sync::{mpsc, Arc};
use std::thread;
use std::time::Duration;

use outreach_logging::{outreach_error, outreach_info};

use crate::batch::{dispatch_batch, ChannelProgressSink};
use crate::client::{ReqwestWebhookClient, WebhookClient, WebhookSettings};
use crate::webhooks::{self, Endpoints};
use crate::{BatchTarget, ClientError, EngineEvent, JsonObject, PayloadBuilder};

enum EngineCommand {
    Search {
        query: String,
    },
    RunBatch {
        target: BatchTarget,
        rows: Vec<JsonObject>,
        build: PayloadBuilder,
    },
    Generate {
        subject: String,
        body_template: String,
        records: Vec<JsonObject>,
    },
}

/// Runs webhook calls on a worker thread, one command at a time.
pub struct EngineHandle {
    cmd_tx: mpsc::Sender<EngineCommand>,
    event_rx: mpsc::Receiver<EngineEvent>,
}

impl EngineHandle {
    pub fn new(settings: WebhookSettings, endpoints: Endpoints) -> Result<Self, ClientError> {
        let client = ReqwestWebhookClient::new(&settings)?;
        Ok(Self::with_client(Arc::new(client), endpoints))
    }

    pub fn with_client(client: Arc<dyn WebhookClient>, endpoints: Endpoints) -> Self {
        let (cmd_tx, cmd_rx) = mpsc::channel();
        let (event_tx, event_rx) = mpsc::channel();

        thread::spawn(move || {
            let runtime = match tokio::runtime::Builder::new_current_thread()
                .enable_all()
                .build()
            {
                Ok(runtime) => runtime,
                Err(err) => {
                    outreach_error!("Cannot start the engine runtime: {}", err);
                    return;
                }
            };
            while let Ok(command) = cmd_rx.recv() {
                runtime.block_on(handle_command(
                    client.as_ref(),
                    &endpoints,
                    command,
                    &event_tx,
                ));
            }
            outreach_info!("Engine thread stopped");
        });

        Self { cmd_tx, event_rx }
    }

    pub fn search(&self, query: impl Into<String>) {
        let _ = self.cmd_tx.send(EngineCommand::Search {
            query: query.into(),
        });
    }

    /// Posts every row to the target's webhook, building each body with `build`.
    pub fn run_batch(&self, target: BatchTarget, rows: Vec<JsonObject>, build: PayloadBuilder) {
        let _ = self.cmd_tx.send(EngineCommand::RunBatch {
            target,
            rows,
            build,
        });
    }

    pub fn generate(
        &self,
        subject: impl Into<String>,
        body_template: impl Into<String>,
        records: Vec<JsonObject>,
    ) {
        let _ = self.cmd_tx.send(EngineCommand::Generate {
            subject: subject.into(),
            body_template: body_template.into(),
            records,
        });
    }

    /// Blocks until the next event. `None` once the worker is gone.
    pub fn recv(&self) -> Option<EngineEvent> {
        self.event_rx.recv().ok()
    }

    pub fn recv_timeout(&self, timeout: Duration) -> Option<EngineEvent> {
        self.event_rx.recv_timeout(timeout).ok()
    }

    pub fn try_recv(&self) -> Option<EngineEvent> {
        self.event_rx.try_recv().ok()
    }
}

async fn handle_command(
    client: &dyn WebhookClient,
    endpoints: &Endpoints,
    command: EngineCommand,
    event_tx: &mpsc::Sender<EngineEvent>,
) {
    match command {
        EngineCommand::Search { query } => {
            outreach_info!("Searching for {:?}", query);
            let result = webhooks::search(client, &endpoints.search, &query).await;
            let _ = event_tx.send(EngineEvent::SearchCompleted { query, result });
        }
        EngineCommand::RunBatch {
            target,
            rows,
            build,
        } => {
            let url = match target {
                BatchTarget::Persist => &endpoints.persist,
                BatchTarget::Send => &endpoints.send,
            };
            let sink = ChannelProgressSink::new(event_tx.clone());
            let report = dispatch_batch(client, url, &rows, build, &sink).await;
            let _ = event_tx.send(EngineEvent::BatchCompleted { target, report });
        }
        EngineCommand::Generate {
            subject,
            body_template,
            records,
        } => {
            outreach_info!("Generating drafts for {} record(s)", records.len());
            let result = webhooks::generate_drafts(
                client,
                &endpoints.generate,
                &subject,
                &body_template,
                &records,
            )
            .await;
            let _ = event_tx.send(EngineEvent::DraftsGenerated(result));
        }
    }
}
