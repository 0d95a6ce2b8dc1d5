use serde::{Deserialize, Serialize};

use crate::domain::{RecordId, RecordStatus, RowId, Status, Timestamp, UserId};

/// Days until a freshly created record soft-expires.
pub const RECORD_DEFAULT_EXPIRY_DAYS: i64 = 30;

/// The fixed column set of a checklist record, in schema order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChecklistColumn {
    ChecklistItem,
    Status,
    CompletionTime,
    CompletionUser,
    LatestEditTime,
    LatestEditUser,
    CreationTime,
    CreationUser,
    DeletionTime,
    DeletionUser,
}

impl ChecklistColumn {
    pub const ALL: [ChecklistColumn; 10] = [
        ChecklistColumn::ChecklistItem,
        ChecklistColumn::Status,
        ChecklistColumn::CompletionTime,
        ChecklistColumn::CompletionUser,
        ChecklistColumn::LatestEditTime,
        ChecklistColumn::LatestEditUser,
        ChecklistColumn::CreationTime,
        ChecklistColumn::CreationUser,
        ChecklistColumn::DeletionTime,
        ChecklistColumn::DeletionUser,
    ];

    pub fn name(self) -> &'static str {
        match self {
            ChecklistColumn::ChecklistItem => "checklistItem",
            ChecklistColumn::Status => "status",
            ChecklistColumn::CompletionTime => "completionTime",
            ChecklistColumn::CompletionUser => "completionUser",
            ChecklistColumn::LatestEditTime => "latestEditTime",
            ChecklistColumn::LatestEditUser => "latestEditUser",
            ChecklistColumn::CreationTime => "creationTime",
            ChecklistColumn::CreationUser => "creationUser",
            ChecklistColumn::DeletionTime => "deletionTime",
            ChecklistColumn::DeletionUser => "deletionUser",
        }
    }

    pub fn value_type(self) -> ColumnValueType {
        match self {
            ChecklistColumn::ChecklistItem => ColumnValueType::Text,
            ChecklistColumn::Status => ColumnValueType::SingleOption,
            ChecklistColumn::CompletionUser
            | ChecklistColumn::LatestEditUser
            | ChecklistColumn::CreationUser
            | ChecklistColumn::DeletionUser => ColumnValueType::UserId,
            ChecklistColumn::CompletionTime
            | ChecklistColumn::LatestEditTime
            | ChecklistColumn::CreationTime
            | ChecklistColumn::DeletionTime => ColumnValueType::DateTime,
        }
    }

    pub fn required(self) -> bool {
        matches!(
            self,
            ChecklistColumn::ChecklistItem
                | ChecklistColumn::Status
                | ChecklistColumn::CreationTime
                | ChecklistColumn::CreationUser
        )
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ColumnValueType {
    Text,
    SingleOption,
    UserId,
    DateTime,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColumnOption {
    pub name: String,
    pub display_name: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColumnSpec {
    pub name: String,
    pub display_name: String,
    pub value_type: ColumnValueType,
    pub allow_null_value: bool,
    pub options: Vec<ColumnOption>,
}

/// The fixed schema every checklist record is created with. The status
/// column carries the three status options; user and time columns get their
/// dedicated value types.
pub fn checklist_columns() -> Vec<ColumnSpec> {
    ChecklistColumn::ALL
        .iter()
        .map(|column| {
            let mut spec = ColumnSpec {
                name: column.name().to_string(),
                display_name: column.name().to_string(),
                value_type: column.value_type(),
                allow_null_value: !column.required(),
                options: Vec::new(),
            };
            if *column == ChecklistColumn::Status {
                spec.options = [Status::Active, Status::Completed, Status::Deleted]
                    .iter()
                    .map(|status| ColumnOption {
                        name: status.as_wire().to_string(),
                        display_name: status.as_wire().to_string(),
                    })
                    .collect();
            }
            spec
        })
        .collect()
}

/// Flat column-value projection of one checklist row. Empty string means
/// the column is unset on the wire.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ChecklistRowValues {
    pub checklist_item: String,
    pub status: String,
    pub completion_time: String,
    pub completion_user: String,
    pub latest_edit_time: String,
    pub latest_edit_user: String,
    pub creation_time: String,
    pub creation_user: String,
    pub deletion_time: String,
    pub deletion_user: String,
}

impl ChecklistRowValues {
    pub fn parse_status(&self) -> Status {
        Status::from_wire(&self.status)
    }

    pub fn parse_creation_time(&self) -> Option<Timestamp> {
        Timestamp::parse_wire(&self.creation_time)
    }

    pub fn parse_completion_time(&self) -> Option<Timestamp> {
        Timestamp::parse_wire(&self.completion_time)
    }
}

/// One persisted checklist entry. `id` is absent until the row has been
/// accepted by the record store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RecordRow {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<RowId>,
    pub record_id: RecordId,
    pub columns: ChecklistRowValues,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub create_time: Option<Timestamp>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub update_time: Option<Timestamp>,
}

impl RecordRow {
    pub fn new(record_id: RecordId, columns: ChecklistRowValues) -> Self {
        Self {
            id: None,
            record_id,
            columns,
            create_time: None,
            update_time: None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RowPage {
    pub rows: Vec<RecordRow>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub continuation_token: Option<String>,
}

/// Server-side checklist instance: title, schema, status, lifecycle fields.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Record {
    pub id: RecordId,
    pub title: String,
    pub status: RecordStatus,
    pub version: u64,
    pub expiry_time: Timestamp,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub create_time: Option<Timestamp>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub update_time: Option<Timestamp>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub creator_id: Option<UserId>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub locale: Option<String>,
    pub columns: Vec<ColumnSpec>,
}

impl Record {
    /// A not-yet-persisted record carrying the fixed checklist schema,
    /// ready for a create call.
    pub fn draft(context: &HostContext, title: impl Into<String>) -> Self {
        let now = Timestamp::now();
        Self {
            id: RecordId::generate(),
            title: title.into(),
            status: RecordStatus::Open,
            version: 1,
            expiry_time: now.plus_days(RECORD_DEFAULT_EXPIRY_DAYS),
            create_time: Some(now),
            update_time: Some(now),
            creator_id: Some(context.user_id.clone()),
            locale: Some(context.locale.clone()),
            columns: checklist_columns(),
        }
    }
}

/// Status-only record update, used to close a checklist without touching
/// any other field.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RecordStatusUpdate {
    pub id: RecordId,
    pub version: u64,
    pub status: RecordStatus,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MemberProfile {
    pub id: UserId,
    pub display_name: String,
}

/// Host context handed to the engine at bootstrap. `record_id` is absent
/// while authoring a checklist that has never been persisted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HostContext {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub record_id: Option<RecordId>,
    pub user_id: UserId,
    pub locale: String,
}

/// One entry of a batched record-store call.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "payload", rename_all = "snake_case")]
pub enum BatchRequest {
    CreateRecord(Record),
    AddOrUpdateRows {
        add_rows: Vec<RecordRow>,
        update_rows: Vec<RecordRow>,
    },
}
