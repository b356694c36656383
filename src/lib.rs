//! Memo page core crate.
//!
//! Two independent widgets for a small portfolio page: a pair-matching memory
//! game and a validated contact form. Game and form logic are plain Rust and
//! run headless; `dom` binds them to the page through `web-sys` and `gloo`.

use wasm_bindgen::prelude::*;

pub mod board;
pub mod config;
pub mod dom;
pub mod error;
pub mod form;
pub mod timer;

pub use board::{Board, Engine, GameEvent, Level, Phase, Selection, Surface, Transition};
pub use config::{FormConfig, GameConfig, PageConfig};
pub use dom::{ContactFormPage, GamePage, mount_contact_form, mount_game};
pub use error::{ConfigError, InitError, StoreError};
pub use form::{ContactForm, FieldId, FormEvent, FormOutcome, FormSummary};
pub use timer::{TimerId, Timers, VirtualTimers};

// Optional small allocator for size (feature gated)
#[cfg(feature = "wee_alloc")]
#[global_allocator]
static ALLOC: wee_alloc::WeeAlloc = wee_alloc::WeeAlloc::INIT;

#[wasm_bindgen(start)]
pub fn wasm_start() {
    #[cfg(feature = "console_error_panic_hook")]
    console_error_panic_hook::set_once();
    #[cfg(feature = "console_log")]
    tracing_wasm::set_as_global_default();
}

/// Mounts the game and the contact form with the default element ids, starts
/// a game at the default level and keeps both alive for the lifetime of the
/// page.
#[wasm_bindgen]
pub fn start_game() -> Result<(), JsValue> {
    let config = PageConfig::default();
    let game = GamePage::mount(config.game)?;
    let form = ContactFormPage::mount(config.form)?;
    std::mem::forget(game);
    std::mem::forget(form);
    Ok(())
}
