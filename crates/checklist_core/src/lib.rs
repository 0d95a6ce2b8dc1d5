//! Client-side engine for a collaboratively edited checklist hosted on an
//! external action surface.
//!
//! The engine holds the authoritative in-session view of checklist items,
//! decides which items actually need to reach the record store, and
//! sequences the network workflows. Commands travel through one typed
//! channel: pure edits are applied synchronously by the mutator layer,
//! workflow commands run record-store I/O and settle by dispatching more
//! edits. The server record is authoritative; conflicting edits overwrite.

use std::{collections::HashSet, sync::Arc};

use thiserror::Error;
use tokio::sync::{broadcast, mpsc, Mutex};
use tracing::{error, info, warn};

pub mod client;
pub mod command;
pub mod diff;
pub mod item;
pub mod mutator;
pub mod section;
pub mod store;

pub use client::RecordStoreClient;
pub use command::{Command, DialogKind, EditCommand, WorkflowCommand, WorkflowKind};
pub use item::ChecklistItem;
pub use section::{focus_after_append, focus_after_edit, section_items, FocusTarget, SectionKind};
pub use store::{FlowKind, SessionStore};

use shared::{
    domain::{ProgressState, RecordId, RecordStatus, Timestamp, UserId},
    error::{ApiResult, ClientError},
    protocol::{BatchRequest, HostContext, Record, RecordRow, RecordStatusUpdate},
};

/// Page size used when draining the record's rows at bootstrap.
pub const DEFAULT_ROW_PAGE_SIZE: u32 = 100;

/// Some filesystems reject long names, so the CSV export name is capped.
pub const REPORT_FILE_NAME_MAX_LEN: usize = 50;

#[derive(Debug, Error)]
pub enum EngineError {
    #[error("command dispatcher is no longer running")]
    DispatcherClosed,
}

/// Published after every dispatched command settles; the UI layer treats
/// the carried store as its observable state.
#[derive(Debug, Clone)]
pub enum EngineEvent {
    StoreChanged(SessionStore),
}

enum Bootstrap {
    Completed,
    Failed,
    RecordDeleted,
}

pub struct ChecklistEngine<C: RecordStoreClient> {
    flow: FlowKind,
    client: Arc<C>,
    store: Mutex<SessionStore>,
    events: broadcast::Sender<EngineEvent>,
}

impl<C: RecordStoreClient + 'static> ChecklistEngine<C> {
    pub fn new(flow: FlowKind, client: Arc<C>) -> Arc<Self> {
        let (events, _) = broadcast::channel(256);
        Arc::new(Self {
            flow,
            client,
            store: Mutex::new(SessionStore::new()),
            events,
        })
    }

    pub fn flow(&self) -> FlowKind {
        self.flow
    }

    /// Current store snapshot.
    pub async fn store(&self) -> SessionStore {
        self.store.lock().await.clone()
    }

    pub fn subscribe(&self) -> broadcast::Receiver<EngineEvent> {
        self.events.subscribe()
    }

    /// Handles one command to completion. Edits settle synchronously;
    /// workflows run their I/O and every follow-up edit before returning,
    /// so callers observe the settled store immediately afterwards.
    pub async fn dispatch(&self, command: Command) {
        match command {
            Command::Edit(edit) => self.apply(edit).await,
            Command::Workflow(workflow) => match workflow {
                WorkflowCommand::Initialize => self.initialize().await,
                WorkflowCommand::CreateChecklist => self.create_checklist().await,
                WorkflowCommand::SaveChanges => self.save_changes().await,
                WorkflowCommand::CloseChecklist => self.close_checklist().await,
                WorkflowCommand::DeleteChecklist => self.delete_checklist().await,
                WorkflowCommand::DownloadReport => self.download_report().await,
                WorkflowCommand::UpdateExpiry { expiry_time } => {
                    self.update_expiry(expiry_time).await
                }
            },
        }
    }

    async fn apply(&self, command: EditCommand) {
        let snapshot = {
            let mut store = self.store.lock().await;
            mutator::apply(&mut store, command);
            store.clone()
        };
        let _ = self.events.send(EngineEvent::StoreChanged(snapshot));
    }

    // ---- Initialize -----------------------------------------------------

    async fn initialize(&self) {
        self.apply(EditCommand::SetProgressState {
            state: ProgressState::InProgress,
        })
        .await;

        match self.bootstrap().await {
            Bootstrap::Completed => {
                self.apply(EditCommand::SetProgressState {
                    state: ProgressState::Completed,
                })
                .await;
            }
            Bootstrap::Failed => {
                self.apply(EditCommand::SetProgressState {
                    state: ProgressState::Failed,
                })
                .await;
            }
            Bootstrap::RecordDeleted => {
                // Dedicated terminal view, distinct from the generic
                // bootstrap failure.
                self.apply(EditCommand::SetRecordDeleted { deleted: true })
                    .await;
            }
        }

        if let Err(err) = self.client.hide_loading_indicator().await {
            warn!(error = %err, "initialize: failed to hide loading indicator");
        }
    }

    async fn bootstrap(&self) -> Bootstrap {
        let context = match self.client.get_context().await {
            Ok(context) => context,
            Err(err) => {
                error!(error = %err, "initialize: host context fetch failed");
                return classify_bootstrap_error(&err);
            }
        };
        self.apply(EditCommand::SetContext {
            context: context.clone(),
        })
        .await;

        // The strings themselves belong to the UI layer; the fetch still
        // gates bootstrap so a broken host fails fast.
        if let Err(err) = self.client.get_localized_strings().await {
            error!(error = %err, "initialize: localized strings fetch failed");
            return classify_bootstrap_error(&err);
        }

        if self.flow == FlowKind::Edit {
            let Some(record_id) = context.record_id.clone() else {
                error!("initialize: edit flow launched without a record id");
                return Bootstrap::Failed;
            };

            let record = match self.client.get_record(&record_id).await {
                Ok(record) => record,
                Err(err) => {
                    error!(record_id = %record_id, error = %err, "initialize: record fetch failed");
                    return classify_bootstrap_error(&err);
                }
            };
            self.apply(EditCommand::SetRecord { record }).await;

            let rows = match self
                .fetch_all_rows(&record_id, DEFAULT_ROW_PAGE_SIZE)
                .await
            {
                Ok(rows) => rows,
                Err(err) => {
                    error!(record_id = %record_id, error = %err, "initialize: row fetch failed");
                    return classify_bootstrap_error(&err);
                }
            };
            info!(record_id = %record_id, rows = rows.len(), "initialize: rows fetched");

            let responder_ids = completion_user_ids(&rows);
            self.apply(EditCommand::IngestRows { rows }).await;

            if !responder_ids.is_empty() {
                match self.client.get_member_profiles(&responder_ids).await {
                    Ok(profiles) => self.apply(EditCommand::ApplyProfiles { profiles }).await,
                    Err(err) => {
                        error!(error = %err, "initialize: responder profile fetch failed");
                        return classify_bootstrap_error(&err);
                    }
                }
            }
        }

        Bootstrap::Completed
    }

    /// Drains every row page sequentially; each continuation token gates
    /// the next request, and pages are concatenated in arrival order.
    async fn fetch_all_rows(
        &self,
        record_id: &RecordId,
        page_size: u32,
    ) -> ApiResult<Vec<RecordRow>> {
        let mut rows = Vec::new();
        let mut continuation_token: Option<String> = None;
        loop {
            let page = self
                .client
                .get_record_rows(record_id, continuation_token.as_deref(), page_size)
                .await?;
            rows.extend(page.rows);
            match page.continuation_token {
                Some(token) => continuation_token = Some(token),
                None => break,
            }
        }
        Ok(rows)
    }

    // ---- Create ---------------------------------------------------------

    async fn create_checklist(&self) {
        let snapshot = self.store().await;
        let Some(context) = snapshot.context.clone() else {
            warn!("create: dispatched before the host context was available");
            self.apply(EditCommand::SetProgressState {
                state: ProgressState::Failed,
            })
            .await;
            return;
        };

        if snapshot.title.trim().is_empty() {
            self.apply(EditCommand::SetBlankTitleError { visible: true })
                .await;
            return;
        }

        let record = Record::draft(&context, snapshot.title.clone());
        let mut add_rows = diff::creation_rows(&snapshot.items, &record.id, &context.user_id);
        diff::stamp_new_rows(&mut add_rows);
        info!(record_id = %record.id, rows = add_rows.len(), "create: submitting checklist");

        self.apply(EditCommand::SetInFlight {
            workflow: WorkflowKind::Save,
            active: true,
        })
        .await;

        let mut requests = vec![BatchRequest::CreateRecord(record)];
        if !add_rows.is_empty() {
            requests.push(BatchRequest::AddOrUpdateRows {
                add_rows,
                update_rows: Vec::new(),
            });
        }

        let result = self.client.batch_execute(requests).await;
        self.apply(EditCommand::SetInFlight {
            workflow: WorkflowKind::Save,
            active: false,
        })
        .await;

        match result {
            Ok(()) => self.close_host_surface().await,
            Err(err) => {
                error!(error = %err, "create: batched create failed");
                self.flag_not_found(&err).await;
                // Creation has no inline retry banner; it surfaces as a
                // bootstrap-class failure.
                self.apply(EditCommand::SetProgressState {
                    state: ProgressState::Failed,
                })
                .await;
            }
        }
    }

    // ---- Save -----------------------------------------------------------

    async fn save_changes(&self) {
        let snapshot = self.store().await;
        let Some((context, record_id)) = edit_target(&snapshot) else {
            warn!("save: dispatched without host context or record id");
            self.apply(EditCommand::SetFailed {
                workflow: WorkflowKind::Save,
                failed: true,
            })
            .await;
            return;
        };

        let mut dirty = diff::compute_dirty(
            &snapshot.items,
            &snapshot.fetched_rows,
            &record_id,
            &context.user_id,
        );
        if dirty.is_empty() {
            // A no-op save still dismisses the surface.
            info!(record_id = %record_id, "save: nothing dirty, dismissing");
            self.close_host_surface().await;
            return;
        }

        self.apply(EditCommand::SetInFlight {
            workflow: WorkflowKind::Save,
            active: true,
        })
        .await;
        diff::stamp_new_rows(&mut dirty.add_rows);
        diff::stamp_updated_rows(&mut dirty.update_rows);
        info!(
            record_id = %record_id,
            adds = dirty.add_rows.len(),
            updates = dirty.update_rows.len(),
            "save: upserting dirty rows"
        );

        let result = self
            .client
            .add_or_update_rows(dirty.add_rows, dirty.update_rows)
            .await;
        self.apply(EditCommand::SetInFlight {
            workflow: WorkflowKind::Save,
            active: false,
        })
        .await;

        match result {
            Ok(()) => self.close_host_surface().await,
            Err(err) => {
                error!(record_id = %record_id, error = %err, "save: upsert failed");
                self.apply(EditCommand::SetFailed {
                    workflow: WorkflowKind::Save,
                    failed: true,
                })
                .await;
                self.flag_not_found(&err).await;
            }
        }
    }

    // ---- Close ----------------------------------------------------------

    async fn close_checklist(&self) {
        let snapshot = self.store().await;
        let Some((context, record_id)) = edit_target(&snapshot) else {
            warn!("close: dispatched without host context or record id");
            self.apply(EditCommand::SetFailed {
                workflow: WorkflowKind::Close,
                failed: true,
            })
            .await;
            return;
        };

        self.apply(EditCommand::SetInFlight {
            workflow: WorkflowKind::Close,
            active: true,
        })
        .await;

        // Unsaved edits are persisted first; the status update only goes
        // out once the rows are safely upserted.
        let mut dirty = diff::compute_dirty(
            &snapshot.items,
            &snapshot.fetched_rows,
            &record_id,
            &context.user_id,
        );
        if !dirty.is_empty() {
            diff::stamp_new_rows(&mut dirty.add_rows);
            diff::stamp_updated_rows(&mut dirty.update_rows);
            info!(record_id = %record_id, rows = dirty.len(), "close: persisting dirty rows first");
            if let Err(err) = self
                .client
                .add_or_update_rows(dirty.add_rows, dirty.update_rows)
                .await
            {
                error!(record_id = %record_id, error = %err, "close: row persist stage failed");
                self.apply(EditCommand::SetInFlight {
                    workflow: WorkflowKind::Close,
                    active: false,
                })
                .await;
                self.apply(EditCommand::SetFailed {
                    workflow: WorkflowKind::Save,
                    failed: true,
                })
                .await;
                self.flag_not_found(&err).await;
                return;
            }
        }

        let Some(record) = snapshot.record.clone() else {
            warn!(record_id = %record_id, "close: record missing from the session");
            self.apply(EditCommand::SetInFlight {
                workflow: WorkflowKind::Close,
                active: false,
            })
            .await;
            self.apply(EditCommand::SetFailed {
                workflow: WorkflowKind::Close,
                failed: true,
            })
            .await;
            return;
        };

        let update = RecordStatusUpdate {
            id: record.id.clone(),
            version: record.version,
            status: RecordStatus::Closed,
        };
        let result = self.client.update_record_status(update).await;
        self.apply(EditCommand::SetInFlight {
            workflow: WorkflowKind::Close,
            active: false,
        })
        .await;

        match result {
            Ok(()) => {
                self.apply(EditCommand::SetDialogOpen {
                    dialog: DialogKind::Close,
                    open: false,
                })
                .await;
                // Local status only advances once the server accepted it.
                let mut closed = record;
                closed.status = RecordStatus::Closed;
                self.apply(EditCommand::SetRecord { record: closed }).await;
                self.close_host_surface().await;
            }
            Err(err) => {
                error!(record_id = %record_id, error = %err, "close: status update failed");
                self.apply(EditCommand::SetFailed {
                    workflow: WorkflowKind::Close,
                    failed: true,
                })
                .await;
                self.flag_not_found(&err).await;
            }
        }
    }

    // ---- Delete ---------------------------------------------------------

    async fn delete_checklist(&self) {
        let snapshot = self.store().await;
        let Some((_, record_id)) = edit_target(&snapshot) else {
            warn!("delete: dispatched without host context or record id");
            self.apply(EditCommand::SetFailed {
                workflow: WorkflowKind::Delete,
                failed: true,
            })
            .await;
            return;
        };

        self.apply(EditCommand::SetInFlight {
            workflow: WorkflowKind::Delete,
            active: true,
        })
        .await;

        let result = self.client.delete_record(&record_id).await;
        self.apply(EditCommand::SetInFlight {
            workflow: WorkflowKind::Delete,
            active: false,
        })
        .await;

        match result {
            Ok(()) => {
                self.apply(EditCommand::SetDialogOpen {
                    dialog: DialogKind::Delete,
                    open: false,
                })
                .await;
                self.close_host_surface().await;
            }
            Err(err) => {
                error!(record_id = %record_id, error = %err, "delete: record delete failed");
                self.apply(EditCommand::SetFailed {
                    workflow: WorkflowKind::Delete,
                    failed: true,
                })
                .await;
                self.flag_not_found(&err).await;
            }
        }
    }

    // ---- Download -------------------------------------------------------

    async fn download_report(&self) {
        let snapshot = self.store().await;
        let Some((_, record_id)) = edit_target(&snapshot) else {
            warn!("download: dispatched without host context or record id");
            self.apply(EditCommand::SetFailed {
                workflow: WorkflowKind::Download,
                failed: true,
            })
            .await;
            return;
        };

        let title = snapshot
            .record
            .as_ref()
            .map(|record| record.title.clone())
            .unwrap_or_else(|| snapshot.title.clone());
        let filename = report_filename(&title);

        self.apply(EditCommand::SetInFlight {
            workflow: WorkflowKind::Download,
            active: true,
        })
        .await;

        let result = self.client.download_rows_as_csv(&record_id, &filename).await;
        // The downloading flag is cleared regardless of outcome.
        self.apply(EditCommand::SetInFlight {
            workflow: WorkflowKind::Download,
            active: false,
        })
        .await;

        if let Err(err) = result {
            error!(record_id = %record_id, error = %err, "download: CSV export failed");
            self.apply(EditCommand::SetFailed {
                workflow: WorkflowKind::Download,
                failed: true,
            })
            .await;
            self.flag_not_found(&err).await;
        }
    }

    // ---- Expiry update --------------------------------------------------

    async fn update_expiry(&self, expiry_time: Timestamp) {
        let snapshot = self.store().await;
        let Some(record) = snapshot.record.clone() else {
            warn!("expiry: dispatched before the record was fetched");
            self.apply(EditCommand::SetFailed {
                workflow: WorkflowKind::UpdateExpiry,
                failed: true,
            })
            .await;
            return;
        };

        self.apply(EditCommand::SetInFlight {
            workflow: WorkflowKind::UpdateExpiry,
            active: true,
        })
        .await;

        let mut updated = record;
        updated.expiry_time = expiry_time;
        updated.update_time = Some(Timestamp::now());

        let result = self.client.update_record(updated.clone()).await;
        self.apply(EditCommand::SetInFlight {
            workflow: WorkflowKind::UpdateExpiry,
            active: false,
        })
        .await;

        match result {
            Ok(()) => {
                self.apply(EditCommand::SetRecord { record: updated }).await;
                self.apply(EditCommand::SetDialogOpen {
                    dialog: DialogKind::Expiry,
                    open: false,
                })
                .await;
            }
            Err(err) => {
                error!(error = %err, "expiry: record update failed");
                self.apply(EditCommand::SetFailed {
                    workflow: WorkflowKind::UpdateExpiry,
                    failed: true,
                })
                .await;
                self.flag_not_found(&err).await;
            }
        }
    }

    // ---- Shared tails ---------------------------------------------------

    async fn close_host_surface(&self) {
        if let Err(err) = self.client.close_host_surface().await {
            warn!(error = %err, "failed to close host surface");
        }
    }

    /// A 404 on any call means the record was deleted server-side; that
    /// overrides the workflow's own failure classification.
    async fn flag_not_found(&self, err: &ClientError) {
        if err.is_not_found() {
            self.apply(EditCommand::SetRecordDeleted { deleted: true })
                .await;
        }
    }
}

fn classify_bootstrap_error(err: &ClientError) -> Bootstrap {
    if err.is_not_found() {
        Bootstrap::RecordDeleted
    } else {
        Bootstrap::Failed
    }
}

fn edit_target(snapshot: &SessionStore) -> Option<(HostContext, RecordId)> {
    let context = snapshot.context.clone()?;
    let record_id = context.record_id.clone()?;
    Some((context, record_id))
}

/// Distinct completion users referenced by completed rows, in first-seen
/// order. Zero completed rows means zero enrichment calls.
fn completion_user_ids(rows: &[RecordRow]) -> Vec<UserId> {
    let mut seen = HashSet::new();
    let mut ids = Vec::new();
    for row in rows {
        if row.columns.parse_status() != shared::domain::Status::Completed {
            continue;
        }
        if row.columns.completion_user.is_empty() {
            continue;
        }
        if seen.insert(row.columns.completion_user.clone()) {
            ids.push(UserId::new(row.columns.completion_user.clone()));
        }
    }
    ids
}

fn report_filename(title: &str) -> String {
    format!("{title} checklist results")
        .chars()
        .take(REPORT_FILE_NAME_MAX_LEN)
        .collect()
}

/// Front end of the typed command channel. Commands are processed strictly
/// in dispatch order on one task; a workflow runs to completion before the
/// next command is picked up. The in-flight flags double as mutual
/// exclusion latches for the UI; the engine itself neither queues around
/// nor rejects a duplicate invocation of the same workflow.
#[derive(Clone)]
pub struct CommandDispatcher {
    tx: mpsc::UnboundedSender<Command>,
}

impl CommandDispatcher {
    pub fn spawn<C: RecordStoreClient + 'static>(engine: Arc<ChecklistEngine<C>>) -> Self {
        let (tx, mut rx) = mpsc::unbounded_channel::<Command>();
        tokio::spawn(async move {
            while let Some(command) = rx.recv().await {
                engine.dispatch(command).await;
            }
        });
        Self { tx }
    }

    pub fn send(&self, command: impl Into<Command>) -> Result<(), EngineError> {
        self.tx
            .send(command.into())
            .map_err(|_| EngineError::DispatcherClosed)
    }
}

#[cfg(test)]
#[path = "tests/engine_tests.rs"]
mod tests;
