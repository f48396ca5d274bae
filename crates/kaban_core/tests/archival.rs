mod common;

use common::Harness;
use kaban_core::model::card::CardPatch;
use kaban_core::model::list::ListPatch;
use kaban_core::{ArchivalChange, EntityState, ServiceError};

fn archive_list() -> ListPatch {
    ListPatch {
        archival: Some(ArchivalChange::Archive),
        ..ListPatch::default()
    }
}

fn restore_list() -> ListPatch {
    ListPatch {
        archival: Some(ArchivalChange::Restore),
        ..ListPatch::default()
    }
}

fn archive_card() -> CardPatch {
    CardPatch {
        archival: Some(ArchivalChange::Archive),
        ..CardPatch::default()
    }
}

#[test]
fn archive_stamps_timestamp_and_restore_clears_it() {
    let h = Harness::new();
    let board = h.board("B");
    let list = h.list(&board, "L", 1);

    h.clock.advance(1_000);
    let archived = h.lists().update_list(list.id, &archive_list()).unwrap();
    assert_eq!(archived.lifecycle.state, EntityState::Archived);
    let archived_at = archived.lifecycle.archived_at.unwrap();
    assert!(archived_at >= list.audit.created_at);

    let err = h.lists().get_list(list.id).unwrap_err();
    assert!(matches!(err, ServiceError::NotFound { .. }));

    h.clock.advance(1_000);
    let restored = h.lists().update_list(list.id, &restore_list()).unwrap();
    assert_eq!(restored.lifecycle.state, EntityState::Active);
    assert_eq!(restored.lifecycle.archived_at, None);
    assert_eq!(h.lists().get_list(list.id).unwrap().list.id, list.id);
}

#[test]
fn archive_restore_archive_converges() {
    let h = Harness::new();
    let board = h.board("B");
    let list = h.list(&board, "L", 1);

    let lists = h.lists();
    lists.update_list(list.id, &archive_list()).unwrap();
    lists.update_list(list.id, &restore_list()).unwrap();
    let again = lists.update_list(list.id, &archive_list()).unwrap();

    assert_eq!(again.lifecycle.state, EntityState::Archived);
    assert!(again.lifecycle.archived_at.is_some());
    assert!(again.lifecycle.is_consistent());
}

#[test]
fn repeated_archive_keeps_first_timestamp() {
    let h = Harness::new();
    let board = h.board("B");
    let list = h.list(&board, "L", 1);

    let first = h.lists().update_list(list.id, &archive_list()).unwrap();
    h.clock.advance(5_000);
    let second = h.lists().update_list(list.id, &archive_list()).unwrap();

    assert_eq!(second.lifecycle.archived_at, first.lifecycle.archived_at);
}

#[test]
fn archived_list_can_still_be_renamed() {
    let h = Harness::new();
    let board = h.board("B");
    let list = h.list(&board, "L", 1);
    h.lists().update_list(list.id, &archive_list()).unwrap();

    let renamed = h
        .lists()
        .update_list(
            list.id,
            &ListPatch {
                name: Some("Parked".to_string()),
                ..ListPatch::default()
            },
        )
        .unwrap();

    assert_eq!(renamed.name, "Parked");
    assert_eq!(renamed.lifecycle.state, EntityState::Archived);
}

#[test]
fn archiving_a_list_does_not_archive_its_cards() {
    let h = Harness::new();
    let board = h.board("B");
    let list = h.list(&board, "L", 1);
    let card = h.card(&list, "C", 1);

    h.lists().update_list(list.id, &archive_list()).unwrap();

    let loaded = h.cards().get_card(card.id).unwrap();
    assert_eq!(loaded.lifecycle.state, EntityState::Active);
    assert!(h.cards().get_archived_cards(board.id).unwrap().is_empty());
}

#[test]
fn archived_lists_are_most_recent_first_and_scoped_to_board() {
    let h = Harness::new();
    let board = h.board("B");
    let other = h.board("Other");
    let older = h.list(&board, "older", 1);
    let newer = h.list(&board, "newer", 2);
    let foreign = h.list(&other, "foreign", 1);

    h.lists().update_list(older.id, &archive_list()).unwrap();
    h.clock.advance(10);
    h.lists().update_list(newer.id, &archive_list()).unwrap();
    h.lists().update_list(foreign.id, &archive_list()).unwrap();

    let ids: Vec<_> = h
        .lists()
        .get_archived_lists(board.id)
        .unwrap()
        .into_iter()
        .map(|list| list.id)
        .collect();
    assert_eq!(ids, vec![newer.id, older.id]);
}

#[test]
fn archived_cards_are_scoped_to_board_and_exclude_deleted() {
    let h = Harness::new();
    let board = h.board("B");
    let other = h.board("Other");
    let todo = h.list(&board, "todo", 1);
    let done = h.list(&board, "done", 2);
    let foreign_list = h.list(&other, "foreign", 1);
    let first = h.card(&todo, "first", 1);
    let second = h.card(&done, "second", 1);
    let gone = h.card(&done, "gone", 2);
    let foreign = h.card(&foreign_list, "foreign", 1);

    for card in [&first, &second, &gone, &foreign] {
        h.clock.advance(10);
        h.cards().update_card(card.id, &archive_card()).unwrap();
    }
    h.cards().delete_card(gone.id).unwrap();

    let ids: Vec<_> = h
        .cards()
        .get_archived_cards(board.id)
        .unwrap()
        .into_iter()
        .map(|card| card.id)
        .collect();
    assert_eq!(ids, vec![second.id, first.id]);
}

#[test]
fn archived_card_can_be_deleted_and_then_is_gone_everywhere() {
    let h = Harness::new();
    let board = h.board("B");
    let list = h.list(&board, "L", 1);
    let card = h.card(&list, "C", 1);
    h.cards().update_card(card.id, &archive_card()).unwrap();

    h.cards().delete_card(card.id).unwrap();

    assert!(h.cards().get_archived_cards(board.id).unwrap().is_empty());
    let err = h
        .cards()
        .update_card(
            card.id,
            &CardPatch {
                archival: Some(ArchivalChange::Restore),
                ..CardPatch::default()
            },
        )
        .unwrap_err();
    assert!(matches!(err, ServiceError::NotFound { .. }));
}
