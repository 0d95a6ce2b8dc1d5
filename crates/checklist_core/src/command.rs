use shared::{
    domain::{LocalKey, ProgressState, Timestamp},
    protocol::{HostContext, MemberProfile, Record, RecordRow},
};

/// Workflows the store tracks in-flight and failure flags for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WorkflowKind {
    Save,
    Close,
    Delete,
    Download,
    UpdateExpiry,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DialogKind {
    Close,
    Delete,
    Expiry,
}

/// Everything that travels through the command channel.
#[derive(Debug, Clone)]
pub enum Command {
    Edit(EditCommand),
    Workflow(WorkflowCommand),
}

impl From<EditCommand> for Command {
    fn from(command: EditCommand) -> Self {
        Command::Edit(command)
    }
}

impl From<WorkflowCommand> for Command {
    fn from(command: WorkflowCommand) -> Self {
        Command::Workflow(command)
    }
}

/// Pure synchronous state transitions, applied by the mutator layer.
/// Item-addressing commands carry the item's `local_key`; a key that no
/// longer resolves makes the command a no-op.
#[derive(Debug, Clone)]
pub enum EditCommand {
    AddItem,
    /// Create-flow removal: the item has no server row to tombstone, so it
    /// is dropped outright.
    RemoveItem {
        local_key: LocalKey,
    },
    ToggleDelete {
        local_key: LocalKey,
    },
    SetChecked {
        local_key: LocalKey,
        checked: bool,
    },
    UpdateText {
        local_key: LocalKey,
        text: String,
    },
    UpdateTitle {
        title: String,
    },
    IngestRows {
        rows: Vec<RecordRow>,
    },
    SetRecord {
        record: Record,
    },
    SetContext {
        context: HostContext,
    },
    ApplyProfiles {
        profiles: Vec<MemberProfile>,
    },
    SetProgressState {
        state: ProgressState,
    },
    SetBlankTitleError {
        visible: bool,
    },
    SetInFlight {
        workflow: WorkflowKind,
        active: bool,
    },
    SetFailed {
        workflow: WorkflowKind,
        failed: bool,
    },
    SetDialogOpen {
        dialog: DialogKind,
        open: bool,
    },
    SetRecordDeleted {
        deleted: bool,
    },
}

/// Asynchronous workflows, handled by the orchestrator layer. Each one
/// reads the store, performs record-store I/O, and settles by dispatching
/// further edit commands.
#[derive(Debug, Clone)]
pub enum WorkflowCommand {
    Initialize,
    CreateChecklist,
    SaveChanges,
    CloseChecklist,
    DeleteChecklist,
    DownloadReport,
    UpdateExpiry { expiry_time: Timestamp },
}
