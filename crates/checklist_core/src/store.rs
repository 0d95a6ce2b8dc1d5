use serde::Serialize;
use shared::{
    domain::ProgressState,
    protocol::{HostContext, Record, RecordRow},
};

use crate::item::ChecklistItem;

/// Which view instance this session backs: authoring a brand new checklist
/// or editing a persisted one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FlowKind {
    Create,
    Edit,
}

/// Authoritative in-memory state for one open view instance.
///
/// Created at view bootstrap and dropped on navigation away; nothing here
/// survives the session. The mutator layer is the sole writer. `items` is
/// kept in insertion order; display ordering is derived read-side.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SessionStore {
    pub context: Option<HostContext>,
    pub title: String,
    pub items: Vec<ChecklistItem>,
    pub record: Option<Record>,
    /// Raw rows from the last fetch; diff baseline.
    pub fetched_rows: Vec<RecordRow>,
    pub progress_state: ProgressState,
    pub show_blank_title_error: bool,

    pub is_sending: bool,
    pub closing_checklist: bool,
    pub deleting_checklist: bool,
    pub downloading_report: bool,
    pub updating_expiry: bool,

    pub save_changes_failed: bool,
    pub close_checklist_failed: bool,
    pub delete_checklist_failed: bool,
    pub download_report_failed: bool,

    pub close_dialog_open: bool,
    pub delete_dialog_open: bool,
    pub expiry_dialog_open: bool,

    pub is_record_deleted: bool,
}

impl SessionStore {
    pub fn new() -> Self {
        Self {
            context: None,
            title: String::new(),
            items: vec![ChecklistItem::blank()],
            record: None,
            fetched_rows: Vec::new(),
            progress_state: ProgressState::NotStarted,
            show_blank_title_error: false,
            is_sending: false,
            closing_checklist: false,
            deleting_checklist: false,
            downloading_report: false,
            updating_expiry: false,
            save_changes_failed: false,
            close_checklist_failed: false,
            delete_checklist_failed: false,
            download_report_failed: false,
            close_dialog_open: false,
            delete_dialog_open: false,
            expiry_dialog_open: false,
            is_record_deleted: false,
        }
    }

    /// Stale error banners must not persist into a new attempt; every
    /// state-changing transition funnels through this.
    pub(crate) fn clear_failure_flags(&mut self) {
        self.save_changes_failed = false;
        self.close_checklist_failed = false;
        self.delete_checklist_failed = false;
        self.download_report_failed = false;
    }
}

impl Default for SessionStore {
    fn default() -> Self {
        Self::new()
    }
}
