use serde::Serialize;
use shared::{
    domain::{ItemState, LocalKey, RowId, Status, Timestamp, UserId},
    protocol::{MemberProfile, RecordRow},
};

/// One checklist entry as the session sees it.
///
/// Items are persistent values: every edit clones the item and the list it
/// lives in, so a UI layer can detect change by plain equality. `local_key`
/// is the stable in-session identity and is never regenerated; `row_id` is
/// the server identity and stays absent until the row has been persisted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ChecklistItem {
    pub local_key: LocalKey,
    pub row_id: Option<RowId>,
    pub title: String,
    pub status: Status,
    pub item_state: ItemState,
    pub sub_title: String,
    pub creation_time: Timestamp,
    pub creator_user_id: Option<UserId>,
    pub completed_user_id: Option<UserId>,
    pub completion_time: Option<Timestamp>,
    /// Snapshot captured at the last fetch; sectioning and diffing baseline.
    pub server_status: Status,
    pub server_completion_time: Option<Timestamp>,
}

impl ChecklistItem {
    /// A fresh, never-persisted row the user can start typing into.
    pub fn blank() -> Self {
        Self {
            local_key: LocalKey::generate(),
            row_id: None,
            title: String::new(),
            status: Status::Active,
            item_state: ItemState::Generated,
            sub_title: String::new(),
            creation_time: Timestamp::now(),
            creator_user_id: None,
            completed_user_id: None,
            completion_time: None,
            server_status: Status::Active,
            server_completion_time: None,
        }
    }

    /// Builds the session view of a fetched row, capturing the server
    /// snapshot fields the diff engine compares against.
    pub fn from_row(row: &RecordRow) -> Self {
        let status = row.columns.parse_status();
        let mut item = Self {
            local_key: LocalKey::generate(),
            row_id: row.id.clone(),
            title: row.columns.checklist_item.clone(),
            status,
            item_state: ItemState::Generated,
            sub_title: String::new(),
            creation_time: row
                .columns
                .parse_creation_time()
                .unwrap_or_else(Timestamp::now),
            creator_user_id: if row.columns.creation_user.is_empty() {
                None
            } else {
                Some(UserId::new(row.columns.creation_user.clone()))
            },
            completed_user_id: None,
            completion_time: None,
            server_status: status,
            server_completion_time: None,
        };
        if status == Status::Completed {
            if !row.columns.completion_user.is_empty() {
                item.completed_user_id = Some(UserId::new(row.columns.completion_user.clone()));
            }
            item.completion_time = row.columns.parse_completion_time();
            item.server_completion_time = item.completion_time;
        }
        item
    }

    /// Display subtitle for a completed item once the responder profile has
    /// been resolved.
    pub fn completed_subtitle(profile: &MemberProfile, completion_time: Timestamp) -> String {
        let when = completion_time
            .to_datetime()
            .map(|time| time.format("%b %d, %Y %H:%M").to_string())
            .unwrap_or_else(|| completion_time.to_wire());
        format!("Completed by {} on {}", profile.display_name, when)
    }
}
