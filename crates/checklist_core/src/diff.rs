//! Per-item dirty detection and row-mutation derivation.
//!
//! The diff baseline is the raw row set captured at the last fetch; only
//! items whose state is `Modified` are candidates, and an item whose title
//! and status still match its snapshot produces nothing even then.

use shared::{
    domain::{ItemState, RecordId, RowId, Status, Timestamp, UserId},
    protocol::{ChecklistRowValues, RecordRow},
};

use crate::item::ChecklistItem;

/// Row mutations partitioned for the bulk-upsert call: rows without a
/// server id are creates, the rest are updates.
#[derive(Debug, Clone, Default)]
pub struct DirtyRows {
    pub add_rows: Vec<RecordRow>,
    pub update_rows: Vec<RecordRow>,
}

impl DirtyRows {
    pub fn is_empty(&self) -> bool {
        self.add_rows.is_empty() && self.update_rows.is_empty()
    }

    pub fn len(&self) -> usize {
        self.add_rows.len() + self.update_rows.len()
    }
}

fn snapshot_for<'a>(fetched_rows: &'a [RecordRow], row_id: &RowId) -> Option<&'a RecordRow> {
    fetched_rows
        .iter()
        .find(|row| row.id.as_ref() == Some(row_id))
}

/// Whether the item's working fields differ from its last fetched snapshot.
///
/// A persisted item is clean when both title and status still match the
/// snapshot row, however many times it was touched locally. A never
/// persisted item that ended up deleted is clean by definition: it is
/// dropped from the session without ever reaching the server.
pub fn is_dirty(item: &ChecklistItem, fetched_rows: &[RecordRow]) -> bool {
    if item.item_state != ItemState::Modified {
        return false;
    }
    match &item.row_id {
        Some(row_id) => match snapshot_for(fetched_rows, row_id) {
            Some(snapshot) => {
                item.title != snapshot.columns.checklist_item
                    || item.status != snapshot.columns.parse_status()
            }
            None => true,
        },
        None => item.status != Status::Deleted,
    }
}

/// Derives the rows that actually need to be sent for the edit flow.
pub fn compute_dirty(
    items: &[ChecklistItem],
    fetched_rows: &[RecordRow],
    record_id: &RecordId,
    user_id: &UserId,
) -> DirtyRows {
    let now = Timestamp::now();
    let mut dirty = DirtyRows::default();

    for item in items {
        if !is_dirty(item, fetched_rows) {
            continue;
        }
        // A never-persisted row with no text has nothing to say.
        if item.row_id.is_none() && item.title.trim().is_empty() {
            continue;
        }

        let mut title = item.title.clone();
        let mut status = item.status;
        let mut columns = ChecklistRowValues::default();

        if let Some(row_id) = &item.row_id {
            if let Some(creator) = &item.creator_user_id {
                columns.creation_user = creator.as_str().to_string();
            }
            // Clearing the text of a persisted row deletes it; the label
            // sent is the last one the server knew, never a blank.
            if title.trim().is_empty() {
                status = Status::Deleted;
                title = snapshot_for(fetched_rows, row_id)
                    .map(|snapshot| snapshot.columns.checklist_item.clone())
                    .unwrap_or_default();
            }
        } else {
            columns.creation_user = user_id.as_str().to_string();
        }

        columns.creation_time = item.creation_time.to_wire();
        columns.checklist_item = title;
        columns.status = status.as_wire().to_string();
        if status == Status::Completed {
            columns.completion_user = user_id.as_str().to_string();
            columns.completion_time = item.completion_time.unwrap_or(now).to_wire();
        } else if status == Status::Deleted {
            columns.deletion_user = user_id.as_str().to_string();
            columns.deletion_time = now.to_wire();
        }
        columns.latest_edit_user = user_id.as_str().to_string();
        columns.latest_edit_time = now.to_wire();

        let mut row = RecordRow::new(record_id.clone(), columns);
        row.id = item.row_id.clone();
        if row.id.is_some() {
            dirty.update_rows.push(row);
        } else {
            dirty.add_rows.push(row);
        }
    }

    dirty
}

/// Rows for the create flow, where every item is new and there is no
/// snapshot to diff against. Only touched items with text are sent.
pub fn creation_rows(
    items: &[ChecklistItem],
    record_id: &RecordId,
    user_id: &UserId,
) -> Vec<RecordRow> {
    let now = Timestamp::now();
    items
        .iter()
        .filter(|item| item.item_state == ItemState::Modified && !item.title.trim().is_empty())
        .map(|item| {
            let mut columns = ChecklistRowValues {
                checklist_item: item.title.clone(),
                status: item.status.as_wire().to_string(),
                creation_user: user_id.as_str().to_string(),
                creation_time: item.creation_time.to_wire(),
                ..Default::default()
            };
            if item.status == Status::Completed {
                columns.completion_user = user_id.as_str().to_string();
                columns.completion_time = item.completion_time.unwrap_or(now).to_wire();
            }
            RecordRow::new(record_id.clone(), columns)
        })
        .collect()
}

/// Stamps client-generated identity and timestamps on rows about to be
/// created.
pub fn stamp_new_rows(rows: &mut [RecordRow]) {
    let now = Timestamp::now();
    for row in rows {
        if row.id.is_none() {
            row.id = Some(RowId::generate());
        }
        row.create_time = Some(now);
        row.update_time = Some(now);
    }
}

pub fn stamp_updated_rows(rows: &mut [RecordRow]) {
    let now = Timestamp::now();
    for row in rows {
        row.update_time = Some(now);
    }
}

#[cfg(test)]
#[path = "tests/diff_tests.rs"]
mod tests;
