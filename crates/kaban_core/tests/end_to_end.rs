mod common;

use common::Harness;
use kaban_core::Boundary;

#[test]
fn board_list_card_copy_scenario() {
    let h = Harness::new();
    let board = h.board("B1");
    let l1 = h.list(&board, "L1", 1);
    let c1 = h.card(&l1, "C1", 1);

    let result = h.lists().copy_list(l1.id).unwrap();
    let l2 = &result.copy.list;

    assert_eq!(l2.name, "L1");
    assert_eq!(result.copy.cards.len(), 1);
    let copied = &result.copy.cards[0];
    assert_eq!(copied.name, "C1");
    assert_eq!(copied.order_number, 1);
    assert_ne!(copied.id, c1.id);
    assert!(h.comments().get_comments(copied.id).unwrap().is_empty());

    let ids: Vec<_> = h
        .lists()
        .get_lists(board.id)
        .unwrap()
        .into_iter()
        .map(|list| list.id)
        .collect();
    assert_eq!(ids, vec![l1.id, l2.id]);
}

#[test]
fn every_failure_resolves_to_a_boundary_outcome() {
    let h = Harness::new();
    let board = h.board("B1");

    let missing = h.lists().get_list(uuid::Uuid::new_v4()).unwrap_err();
    assert!(matches!(missing.boundary(), Boundary::NotFound(_)));

    let blank = h
        .lists()
        .create_list(&kaban_core::model::list::NewList::new(board.id, "", 0))
        .unwrap_err();
    match blank.boundary() {
        Boundary::BadRequest(message) => assert!(message.contains("list name")),
        other => panic!("unexpected boundary: {other:?}"),
    }
}
