//! Browser surface: host adapters, the Leptos component and the JS API

#[cfg(feature = "hydrate")]
pub mod bindings;
#[cfg(feature = "hydrate")]
pub mod browser;
pub mod exit_intent_guard;
pub mod hook;
#[cfg(feature = "hydrate")]
pub mod storage;

pub use exit_intent_guard::ExitIntentGuard;
