//! Veil Quest core crate.
//!
//! A dice-gated quest: chapters of levels (or a looping route of rooms) whose
//! directions stay veiled until the d20 is rolled, each with a small mechanic
//! played out in the real world and tracked here. All game rules are plain
//! Rust over an injected `ProgressStore`; `web` wraps them for JavaScript.

use wasm_bindgen::prelude::*;

pub mod backdrop;
pub mod config;
pub mod content;
pub mod dice;
pub mod error;
pub mod mechanics;
pub mod progress;
pub mod quest;
pub mod reveal;
pub mod rng;
pub mod rooms;
pub mod store;
pub mod web;

pub use config::QuestConfig;
pub use content::{Chapter, GameDefinition, Level, Mechanic};
pub use error::{QuestError, QuestResult};
pub use progress::ProgressRecord;
pub use quest::{HintPrice, QuestSession, RollMode};
pub use reveal::{RevealState, reveal};
pub use rooms::{RewardTier, RoomRun, RouteDefinition};
pub use store::{LocalStorageStore, MemoryStore, ProgressStore};

// Optional small allocator for size (feature gated)
#[cfg(feature = "wee_alloc")]
#[global_allocator]
static ALLOC: wee_alloc::WeeAlloc = wee_alloc::WeeAlloc::INIT;

#[wasm_bindgen(start)]
pub fn wasm_start() {
    #[cfg(feature = "console_error_panic_hook")]
    console_error_panic_hook::set_once();
}
