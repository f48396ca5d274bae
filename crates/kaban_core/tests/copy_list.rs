mod common;

use common::Harness;
use kaban_core::asset::{AssetError, AssetResult};
use kaban_core::model::card::CardPatch;
use kaban_core::model::comment::NewComment;
use kaban_core::model::list::ListPatch;
use kaban_core::{
    ArchivalChange, AssetKey, AssetStore, EntityState, FsAssetStore, ListService, ServiceDeps,
    ServiceError, StoredAsset,
};
use std::io;
use uuid::Uuid;

#[test]
fn copy_duplicates_list_cards_and_only_existing_covers() {
    let h = Harness::new();
    let board = h.board("B");
    let source = h.list(&board, "Backlog", 4);
    let with_cover = h.card(&source, "with cover", 1);
    let without_cover = h.card(&source, "without cover", 2);
    h.cards()
        .update_card(
            with_cover.id,
            &CardPatch {
                description: Some("has an image".to_string()),
                ..CardPatch::default()
            },
        )
        .unwrap();
    h.cards().set_card_cover(with_cover.id, "png", b"cover").unwrap();
    let comment = h
        .comments()
        .create_comment(&NewComment::new(with_cover.id, "note"))
        .unwrap();
    h.comments().delete_comment(comment.id).unwrap();
    h.comments()
        .create_comment(&NewComment::new(without_cover.id, "kept on source"))
        .unwrap();

    let result = h.lists().copy_list(source.id).unwrap();
    let copy = &result.copy;

    assert_ne!(copy.list.id, source.id);
    assert_eq!(copy.list.name, "Backlog");
    assert_eq!(copy.list.order_number, 4);
    assert_eq!(copy.list.board_id, board.id);
    assert_eq!(copy.cards.len(), 2);
    assert_eq!(copy.cards[0].name, "with cover");
    assert_eq!(copy.cards[0].description, "has an image");
    assert_eq!(copy.cards[0].order_number, 1);
    assert_eq!(copy.cards[1].name, "without cover");
    assert_eq!(copy.cards[1].order_number, 2);
    for card in &copy.cards {
        assert_ne!(card.id, with_cover.id);
        assert_ne!(card.id, without_cover.id);
        assert_eq!(card.list_id, copy.list.id);
        assert!(h.comments().get_comments(card.id).unwrap().is_empty());
    }

    assert_eq!(result.covers_copied, 1);
    assert_eq!(result.cover_failures, 0);
    assert_eq!(
        h.assets
            .read(&AssetKey::card_cover(board.id, copy.cards[0].id))
            .unwrap(),
        Some(b"cover".to_vec())
    );
    assert!(h.cards().card_cover(copy.cards[1].id).unwrap().is_none());

    let source_after = h.lists().get_list(source.id).unwrap();
    assert_eq!(source_after.list, source);
    assert_eq!(source_after.cards.len(), 2);
    assert_eq!(h.comments().get_comments(without_cover.id).unwrap().len(), 1);
    assert!(h.cards().card_cover(with_cover.id).unwrap().is_some());
}

#[test]
fn copy_skips_hidden_cards_and_starts_active() {
    let h = Harness::new();
    let board = h.board("B");
    let source = h.list(&board, "L", 1);
    let visible = h.card(&source, "visible", 1);
    let archived = h.card(&source, "archived", 2);
    let deleted = h.card(&source, "deleted", 3);
    h.cards()
        .update_card(
            archived.id,
            &CardPatch {
                archival: Some(ArchivalChange::Archive),
                ..CardPatch::default()
            },
        )
        .unwrap();
    h.cards().delete_card(deleted.id).unwrap();
    h.lists()
        .update_list(
            source.id,
            &ListPatch {
                archival: Some(ArchivalChange::Archive),
                ..ListPatch::default()
            },
        )
        .unwrap();

    let result = h.lists().copy_list(source.id).unwrap();

    assert_eq!(result.copy.list.lifecycle.state, EntityState::Active);
    assert_eq!(result.copy.list.lifecycle.archived_at, None);
    let names: Vec<_> = result
        .copy
        .cards
        .iter()
        .map(|card| card.name.as_str())
        .collect();
    assert_eq!(names, vec!["visible"]);
    assert_ne!(result.copy.cards[0].id, visible.id);
}

#[test]
fn copy_of_deleted_list_is_not_found_and_writes_nothing() {
    let h = Harness::new();
    let board = h.board("B");
    let source = h.list(&board, "L", 1);
    h.lists().delete_list(source.id).unwrap();

    let err = h.lists().copy_list(source.id).unwrap_err();
    assert!(matches!(err, ServiceError::NotFound { .. }));
    let count: i64 = h
        .conn
        .query_row("SELECT COUNT(*) FROM lists;", [], |row| row.get(0))
        .unwrap();
    assert_eq!(count, 1);
}

#[test]
fn copy_under_deleted_board_is_not_found_and_writes_nothing() {
    let h = Harness::new();
    let board = h.board("B");
    let source = h.list(&board, "L", 1);
    h.card(&source, "C", 1);
    h.boards().delete_board(board.id).unwrap();

    let err = h.lists().copy_list(source.id).unwrap_err();
    match err {
        ServiceError::NotFound { id, .. } => assert_eq!(id, board.id),
        other => panic!("expected NotFound, got {other:?}"),
    }
    let lists: i64 = h
        .conn
        .query_row("SELECT COUNT(*) FROM lists;", [], |row| row.get(0))
        .unwrap();
    let cards: i64 = h
        .conn
        .query_row("SELECT COUNT(*) FROM cards;", [], |row| row.get(0))
        .unwrap();
    assert_eq!((lists, cards), (1, 1));
}

/// Delegates to an in-memory store but fails every duplication.
struct BrokenDuplication(kaban_core::MemoryAssetStore);

impl AssetStore for BrokenDuplication {
    fn store(&self, key: &AssetKey, extension: &str, bytes: &[u8]) -> AssetResult<StoredAsset> {
        self.0.store(key, extension, bytes)
    }

    fn resolve(&self, key: &AssetKey) -> AssetResult<Option<StoredAsset>> {
        self.0.resolve(key)
    }

    fn read(&self, key: &AssetKey) -> AssetResult<Option<Vec<u8>>> {
        self.0.read(key)
    }

    fn duplicate(&self, _source: &AssetKey, target: &AssetKey) -> AssetResult<bool> {
        Err(AssetError::Io {
            path: target.relative_path("png"),
            source: io::Error::new(io::ErrorKind::Other, "disk full"),
        })
    }

    fn remove(&self, key: &AssetKey) -> AssetResult<bool> {
        self.0.remove(key)
    }
}

#[test]
fn cover_failure_does_not_roll_back_the_copy() {
    let h = Harness::new();
    let board = h.board("B");
    let source = h.list(&board, "L", 1);
    h.card(&source, "C", 1);
    let broken = BrokenDuplication(kaban_core::MemoryAssetStore::new());
    let deps = ServiceDeps::new(&h.conn, &kaban_core::Anonymous, &h.clock, &broken);
    let lists = ListService::try_new(deps).unwrap();

    let result = lists.copy_list(source.id).unwrap();

    assert_eq!(result.cover_failures, 1);
    assert_eq!(result.covers_copied, 0);
    let page = h.boards().get_board_page(board.id).unwrap();
    assert_eq!(page.lists.len(), 2);
    assert_eq!(page.lists[1].cards.len(), 1);
}

#[test]
fn copy_duplicates_cover_files_on_disk() {
    let h = Harness::new();
    let dir = tempfile::tempdir().unwrap();
    let assets = FsAssetStore::open(dir.path()).unwrap();
    let deps = ServiceDeps::new(&h.conn, &kaban_core::Anonymous, &h.clock, &assets);
    let board = h.board("B");
    let source = h.list(&board, "L", 1);
    let card = h.card(&source, "C", 1);
    kaban_core::CardService::try_new(deps)
        .unwrap()
        .set_card_cover(card.id, "webp", b"pixels")
        .unwrap();

    let result = ListService::try_new(deps)
        .unwrap()
        .copy_list(source.id)
        .unwrap();

    let copied_key = AssetKey::card_cover(board.id, result.copy.cards[0].id);
    let copied = assets.resolve(&copied_key).unwrap().unwrap();
    assert_eq!(copied.extension, "webp");
    assert_eq!(
        std::fs::read(assets.absolute_path(&copied)).unwrap(),
        b"pixels"
    );
    assert!(assets
        .resolve(&AssetKey::card_cover(board.id, Uuid::new_v4()))
        .unwrap()
        .is_none());
}
