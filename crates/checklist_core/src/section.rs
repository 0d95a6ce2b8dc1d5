//! Read-side sectioning, ordering, and focus continuity.
//!
//! Sections always partition by the immutable server snapshot, never the
//! live working status: toggling a checkbox must not make the item jump
//! sections until the next fetch refreshes the snapshot.

use serde::Serialize;
use shared::domain::{LocalKey, Status};

use crate::item::ChecklistItem;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SectionKind {
    All,
    Open,
    Completed,
}

/// Items of one section in display order. `All` keeps insertion order and
/// is the view used while authoring a new checklist; the sorts are stable,
/// so ties keep insertion order too.
pub fn section_items(items: &[ChecklistItem], section: SectionKind) -> Vec<ChecklistItem> {
    match section {
        SectionKind::All => items.to_vec(),
        SectionKind::Open => {
            let mut open: Vec<ChecklistItem> = items
                .iter()
                .filter(|item| item.server_status == Status::Active)
                .cloned()
                .collect();
            open.sort_by_key(|item| item.creation_time);
            open
        }
        SectionKind::Completed => {
            let mut completed: Vec<ChecklistItem> = items
                .iter()
                .filter(|item| item.server_status == Status::Completed)
                .cloned()
                .collect();
            completed.sort_by(|a, b| b.server_completion_time.cmp(&a.server_completion_time));
            completed
        }
    }
}

/// Where keyboard focus should land after a transition.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FocusTarget {
    Item(LocalKey),
    AddItemEntry,
}

/// After a delete/undo-delete or a checked-state toggle: the next item in
/// the section's display order, or the add-item affordance when the
/// affected item was last.
pub fn focus_after_edit(section: &[ChecklistItem], affected: &LocalKey) -> FocusTarget {
    let position = section.iter().position(|item| &item.local_key == affected);
    match position {
        Some(index) => match section.get(index + 1) {
            Some(next) => FocusTarget::Item(next.local_key.clone()),
            None => FocusTarget::AddItemEntry,
        },
        None => FocusTarget::AddItemEntry,
    }
}

/// After appending a blank item: the new item itself.
pub fn focus_after_append(items: &[ChecklistItem]) -> FocusTarget {
    match items.last() {
        Some(item) => FocusTarget::Item(item.local_key.clone()),
        None => FocusTarget::AddItemEntry,
    }
}

#[cfg(test)]
#[path = "tests/section_tests.rs"]
mod tests;
