use shared::domain::{LocalKey, Status, Timestamp};

use crate::{
    item::ChecklistItem,
    section::{focus_after_append, focus_after_edit, section_items, FocusTarget, SectionKind},
};

fn item(title: &str, server_status: Status, created_at: i64) -> ChecklistItem {
    let mut item = ChecklistItem::blank();
    item.local_key = LocalKey::new(title);
    item.title = title.to_string();
    item.status = server_status;
    item.server_status = server_status;
    item.creation_time = Timestamp::from_millis(created_at);
    if server_status == Status::Completed {
        item.completion_time = Some(Timestamp::from_millis(created_at + 1_000));
        item.server_completion_time = item.completion_time;
    }
    item
}

fn titles(items: &[ChecklistItem]) -> Vec<&str> {
    items.iter().map(|item| item.title.as_str()).collect()
}

#[test]
fn all_section_keeps_insertion_order() {
    let items = vec![
        item("b", Status::Active, 200),
        item("a", Status::Completed, 100),
        item("c", Status::Deleted, 300),
    ];
    assert_eq!(titles(&section_items(&items, SectionKind::All)), ["b", "a", "c"]);
}

#[test]
fn open_section_filters_and_sorts_by_creation_time() {
    let items = vec![
        item("late", Status::Active, 300),
        item("done", Status::Completed, 100),
        item("early", Status::Active, 100),
        item("gone", Status::Deleted, 50),
    ];
    assert_eq!(
        titles(&section_items(&items, SectionKind::Open)),
        ["early", "late"]
    );
}

#[test]
fn open_section_keeps_insertion_order_on_equal_creation_times() {
    let items = vec![
        item("first", Status::Active, 100),
        item("second", Status::Active, 100),
        item("third", Status::Active, 100),
    ];
    assert_eq!(
        titles(&section_items(&items, SectionKind::Open)),
        ["first", "second", "third"]
    );
}

#[test]
fn completed_section_sorts_most_recent_first() {
    let items = vec![
        item("old", Status::Completed, 100),
        item("new", Status::Completed, 300),
        item("open", Status::Active, 200),
    ];
    assert_eq!(
        titles(&section_items(&items, SectionKind::Completed)),
        ["new", "old"]
    );
}

#[test]
fn live_status_toggle_does_not_move_sections() {
    let mut checked = item("checked", Status::Active, 100);
    // A local check only changes the working status; the section key is
    // the snapshot captured at the last fetch.
    checked.status = Status::Completed;
    checked.completion_time = Some(Timestamp::now());

    let items = vec![checked, item("other", Status::Active, 200)];
    assert_eq!(
        titles(&section_items(&items, SectionKind::Open)),
        ["checked", "other"]
    );
    assert!(section_items(&items, SectionKind::Completed).is_empty());
}

#[test]
fn focus_moves_to_the_next_item_in_display_order() {
    let section = vec![
        item("a", Status::Active, 100),
        item("b", Status::Active, 200),
        item("c", Status::Active, 300),
    ];
    assert_eq!(
        focus_after_edit(&section, &LocalKey::new("a")),
        FocusTarget::Item(LocalKey::new("b"))
    );
}

#[test]
fn focus_falls_back_to_the_add_item_entry() {
    let section = vec![item("a", Status::Active, 100), item("b", Status::Active, 200)];
    // Last item in the section.
    assert_eq!(
        focus_after_edit(&section, &LocalKey::new("b")),
        FocusTarget::AddItemEntry
    );
    // The affected item already left the section.
    assert_eq!(
        focus_after_edit(&section, &LocalKey::new("gone")),
        FocusTarget::AddItemEntry
    );
    assert_eq!(focus_after_edit(&[], &LocalKey::new("a")), FocusTarget::AddItemEntry);
}

#[test]
fn focus_lands_on_a_freshly_appended_item() {
    let items = vec![item("a", Status::Active, 100), item("new", Status::Active, 200)];
    assert_eq!(
        focus_after_append(&items),
        FocusTarget::Item(LocalKey::new("new"))
    );
    assert_eq!(focus_after_append(&[]), FocusTarget::AddItemEntry);
}
