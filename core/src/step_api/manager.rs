use std::cell::RefCell;
use std::collections::HashMap;

use crate::run::Game;

#[derive(Default)]
struct GameManager {
    next_handle: u32,
    games: HashMap<u32, Game>,
}

impl GameManager {
    fn insert(&mut self, game: Game) -> u32 {
        self.next_handle = self.next_handle.saturating_add(1).max(1);
        let handle = self.next_handle;
        self.games.insert(handle, game);
        handle
    }

    fn destroy(&mut self, handle: u32) {
        if let Some(mut game) = self.games.remove(&handle) {
            game.cleanup();
        }
    }
}

thread_local! {
    static MANAGER: RefCell<GameManager> = RefCell::new(GameManager::default());
}

pub(super) fn insert_game(game: Game) -> u32 {
    MANAGER.with(|manager| manager.borrow_mut().insert(game))
}

pub(super) fn destroy_game(handle: u32) {
    MANAGER.with(|manager| manager.borrow_mut().destroy(handle));
}

pub(super) fn with_game_mut<T>(handle: u32, f: impl FnOnce(&mut Game) -> T) -> Option<T> {
    MANAGER.with(|manager| {
        let mut manager = manager.borrow_mut();
        manager.games.get_mut(&handle).map(f)
    })
}

pub(super) fn with_game<T>(handle: u32, f: impl FnOnce(&Game) -> T) -> Option<T> {
    MANAGER.with(|manager| {
        let manager = manager.borrow();
        manager.games.get(&handle).map(f)
    })
}
