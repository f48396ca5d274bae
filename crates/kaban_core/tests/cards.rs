mod common;

use common::Harness;
use kaban_core::model::card::{CardPatch, NewCard};
use kaban_core::{EntityKind, ServiceError};
use uuid::Uuid;

#[test]
fn card_moves_between_lists_of_the_same_board() {
    let h = Harness::new();
    let board = h.board("B");
    let todo = h.list(&board, "todo", 1);
    let done = h.list(&board, "done", 2);
    let card = h.card(&todo, "ship", 1);

    let moved = h
        .cards()
        .update_card(
            card.id,
            &CardPatch {
                list_id: Some(done.id),
                order_number: Some(0),
                ..CardPatch::default()
            },
        )
        .unwrap();

    assert_eq!(moved.list_id, done.id);
    assert_eq!(moved.name, "ship");
    assert!(h.cards().get_cards(todo.id).unwrap().is_empty());
    assert_eq!(h.cards().get_cards(done.id).unwrap()[0].id, card.id);
}

#[test]
fn card_cannot_move_to_another_board_or_a_deleted_list() {
    let h = Harness::new();
    let board = h.board("B");
    let other = h.board("Other");
    let home = h.list(&board, "home", 1);
    let removed = h.list(&board, "removed", 2);
    let foreign = h.list(&other, "foreign", 1);
    h.lists().delete_list(removed.id).unwrap();
    let card = h.card(&home, "stay", 1);

    for target in [foreign.id, removed.id, Uuid::new_v4()] {
        let err = h
            .cards()
            .update_card(
                card.id,
                &CardPatch {
                    list_id: Some(target),
                    ..CardPatch::default()
                },
            )
            .unwrap_err();
        assert!(matches!(err, ServiceError::Validation(_)), "target {target}");
    }
    assert_eq!(h.cards().get_card(card.id).unwrap().list_id, home.id);
}

#[test]
fn creating_card_under_deleted_list_is_not_found() {
    let h = Harness::new();
    let board = h.board("B");
    let list = h.list(&board, "L", 1);
    h.lists().delete_list(list.id).unwrap();

    let err = h
        .cards()
        .create_card(&NewCard::new(list.id, "late", 1))
        .unwrap_err();
    assert!(matches!(
        err,
        ServiceError::NotFound {
            kind: EntityKind::List,
            ..
        }
    ));
}

#[test]
fn cards_can_be_created_in_an_archived_list() {
    let h = Harness::new();
    let board = h.board("B");
    let list = h.list(&board, "L", 1);
    h.lists()
        .update_list(
            list.id,
            &kaban_core::model::list::ListPatch {
                archival: Some(kaban_core::ArchivalChange::Archive),
                ..Default::default()
            },
        )
        .unwrap();

    let card = h
        .cards()
        .create_card(&NewCard::new(list.id, "parked", 1).with_description("later"))
        .unwrap();
    assert_eq!(card.description, "later");
}

#[test]
fn cover_replacement_keeps_one_asset_and_follows_moves() {
    let h = Harness::new();
    let board = h.board("B");
    let todo = h.list(&board, "todo", 1);
    let done = h.list(&board, "done", 2);
    let card = h.card(&todo, "pic", 1);

    h.cards().set_card_cover(card.id, "png", b"one").unwrap();
    let replaced = h.cards().set_card_cover(card.id, "jpg", b"two").unwrap();
    assert_eq!(replaced.extension, "jpg");
    assert_eq!(h.assets.len(), 1);

    h.cards()
        .update_card(
            card.id,
            &CardPatch {
                list_id: Some(done.id),
                ..CardPatch::default()
            },
        )
        .unwrap();
    let cover = h.cards().card_cover(card.id).unwrap().unwrap();
    assert_eq!(cover, replaced);
}

#[test]
fn invalid_cover_extension_is_a_validation_error() {
    let h = Harness::new();
    let board = h.board("B");
    let list = h.list(&board, "L", 1);
    let card = h.card(&list, "C", 1);

    let err = h
        .cards()
        .set_card_cover(card.id, "../../etc", b"x")
        .unwrap_err();
    assert!(matches!(err, ServiceError::Validation(_)));
}

#[test]
fn cover_of_deleted_card_is_not_found() {
    let h = Harness::new();
    let board = h.board("B");
    let list = h.list(&board, "L", 1);
    let card = h.card(&list, "C", 1);
    h.cards().delete_card(card.id).unwrap();

    let err = h.cards().card_cover(card.id).unwrap_err();
    assert!(matches!(err, ServiceError::NotFound { .. }));
}
