#![allow(dead_code)]

use kaban_core::model::board::{Board, NewBoard};
use kaban_core::model::card::{Card, NewCard};
use kaban_core::model::list::{BoardList, NewList};
use kaban_core::{
    open_db_in_memory, Anonymous, BoardService, CardService, Clock, CommentService,
    IdentityProvider, ListService, ManualClock, MemoryAssetStore, ServiceDeps, UserService,
};
use rusqlite::Connection;

pub const START_MS: i64 = 1_700_000_000_000;

/// In-memory store, settable clock and in-memory assets shared by one test.
pub struct Harness {
    pub conn: Connection,
    pub clock: ManualClock,
    pub assets: MemoryAssetStore,
}

impl Harness {
    pub fn new() -> Self {
        Self {
            conn: open_db_in_memory().unwrap(),
            clock: ManualClock::new(START_MS),
            assets: MemoryAssetStore::new(),
        }
    }

    pub fn clock_now(&self) -> i64 {
        self.clock.now_epoch_ms()
    }

    pub fn deps(&self) -> ServiceDeps<'_> {
        ServiceDeps::new(&self.conn, &Anonymous, &self.clock, &self.assets)
    }

    pub fn deps_as<'a>(&'a self, identity: &'a dyn IdentityProvider) -> ServiceDeps<'a> {
        ServiceDeps::new(&self.conn, identity, &self.clock, &self.assets)
    }

    pub fn boards(&self) -> BoardService<'_> {
        BoardService::try_new(self.deps()).unwrap()
    }

    pub fn lists(&self) -> ListService<'_> {
        ListService::try_new(self.deps()).unwrap()
    }

    pub fn cards(&self) -> CardService<'_> {
        CardService::try_new(self.deps()).unwrap()
    }

    pub fn comments(&self) -> CommentService<'_> {
        CommentService::try_new(self.deps()).unwrap()
    }

    pub fn users(&self) -> UserService<'_> {
        UserService::try_new(self.deps()).unwrap()
    }

    pub fn board(&self, name: &str) -> Board {
        self.clock.advance(1);
        self.boards().create_board(&NewBoard::new(name)).unwrap()
    }

    pub fn list(&self, board: &Board, name: &str, order: u32) -> BoardList {
        self.clock.advance(1);
        self.lists()
            .create_list(&NewList::new(board.id, name, order))
            .unwrap()
    }

    pub fn card(&self, list: &BoardList, name: &str, order: u32) -> Card {
        self.clock.advance(1);
        self.cards()
            .create_card(&NewCard::new(list.id, name, order))
            .unwrap()
    }
}
