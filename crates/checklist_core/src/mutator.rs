//! Pure, synchronous store transitions; the sole writer of the session
//! store. Each transition replaces the item list wholesale so the store
//! only ever exposes fresh values.

use shared::domain::{ItemState, LocalKey, Status, Timestamp};

use crate::{
    command::{DialogKind, EditCommand, WorkflowKind},
    item::ChecklistItem,
    store::SessionStore,
};

pub fn apply(store: &mut SessionStore, command: EditCommand) {
    match command {
        EditCommand::AddItem => {
            let mut items = store.items.clone();
            items.push(ChecklistItem::blank());
            store.items = items;
            store.clear_failure_flags();
        }
        EditCommand::RemoveItem { local_key } => {
            store.items = store
                .items
                .iter()
                .filter(|item| item.local_key != local_key)
                .cloned()
                .collect();
            store.clear_failure_flags();
        }
        EditCommand::ToggleDelete { local_key } => {
            store.items = replace_item(&store.items, &local_key, |item| {
                item.status = if item.status == Status::Deleted {
                    Status::Active
                } else {
                    Status::Deleted
                };
                item.item_state = ItemState::Modified;
            });
            store.clear_failure_flags();
        }
        EditCommand::SetChecked { local_key, checked } => {
            store.items = replace_item(&store.items, &local_key, |item| {
                if checked {
                    item.status = Status::Completed;
                    item.completion_time = Some(Timestamp::now());
                } else {
                    item.status = Status::Active;
                    item.completion_time = None;
                }
                item.item_state = ItemState::Modified;
            });
            store.clear_failure_flags();
        }
        EditCommand::UpdateText { local_key, text } => {
            store.items = replace_item(&store.items, &local_key, |item| {
                item.title = text.clone();
                item.item_state = ItemState::Modified;
            });
            store.clear_failure_flags();
        }
        EditCommand::UpdateTitle { title } => {
            store.title = title;
            store.show_blank_title_error = false;
        }
        EditCommand::IngestRows { rows } => {
            store.items = rows.iter().map(ChecklistItem::from_row).collect();
            store.fetched_rows = rows;
        }
        EditCommand::SetRecord { record } => {
            store.title = record.title.clone();
            store.record = Some(record);
        }
        EditCommand::SetContext { context } => {
            store.context = Some(context);
        }
        EditCommand::ApplyProfiles { profiles } => {
            store.items = store
                .items
                .iter()
                .map(|item| {
                    let mut next = item.clone();
                    if let (Some(user_id), Some(completion_time)) =
                        (&item.completed_user_id, item.completion_time)
                    {
                        if let Some(profile) = profiles.iter().find(|p| &p.id == user_id) {
                            next.sub_title =
                                ChecklistItem::completed_subtitle(profile, completion_time);
                        }
                    }
                    next
                })
                .collect();
        }
        EditCommand::SetProgressState { state } => {
            store.progress_state = state;
        }
        EditCommand::SetBlankTitleError { visible } => {
            store.show_blank_title_error = visible;
        }
        EditCommand::SetInFlight { workflow, active } => {
            match workflow {
                WorkflowKind::Save => store.is_sending = active,
                WorkflowKind::Close => store.closing_checklist = active,
                WorkflowKind::Delete => store.deleting_checklist = active,
                WorkflowKind::Download => store.downloading_report = active,
                WorkflowKind::UpdateExpiry => store.updating_expiry = active,
            }
            // The download flag is a pure display toggle and keeps any
            // banner already on screen.
            if workflow != WorkflowKind::Download {
                store.clear_failure_flags();
            }
        }
        EditCommand::SetFailed { workflow, failed } => match workflow {
            // Expiry updates share the save banner.
            WorkflowKind::Save | WorkflowKind::UpdateExpiry => store.save_changes_failed = failed,
            WorkflowKind::Close => store.close_checklist_failed = failed,
            WorkflowKind::Delete => store.delete_checklist_failed = failed,
            WorkflowKind::Download => store.download_report_failed = failed,
        },
        EditCommand::SetDialogOpen { dialog, open } => match dialog {
            DialogKind::Close => store.close_dialog_open = open,
            DialogKind::Delete => store.delete_dialog_open = open,
            DialogKind::Expiry => store.expiry_dialog_open = open,
        },
        EditCommand::SetRecordDeleted { deleted } => {
            store.is_record_deleted = deleted;
        }
    }
}

/// Clone-before-mutate: the touched item is rebuilt, untouched items are
/// carried over, and the list itself is a new value.
fn replace_item(
    items: &[ChecklistItem],
    local_key: &LocalKey,
    mutate: impl Fn(&mut ChecklistItem),
) -> Vec<ChecklistItem> {
    items
        .iter()
        .map(|item| {
            if &item.local_key == local_key {
                let mut next = item.clone();
                mutate(&mut next);
                next
            } else {
                item.clone()
            }
        })
        .collect()
}

#[cfg(test)]
#[path = "tests/mutator_tests.rs"]
mod tests;
