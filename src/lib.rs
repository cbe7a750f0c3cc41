//! Donleeve - exit-intent detection
//!
//! Fires a callback when a visitor looks like they are about to leave the
//! page, once the page has been actively viewed for a while, with persisted
//! per-URL cooldowns so the same visitor isn't asked again too soon.
//!
//! [`core`] holds the host-independent logic; [`ui`] wires it to the browser
//! (`hydrate` feature).

pub mod core;
pub mod ui;

#[cfg(feature = "hydrate")]
#[wasm_bindgen::prelude::wasm_bindgen(start)]
pub fn start() {
    console_error_panic_hook::set_once();
}
