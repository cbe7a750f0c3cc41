//! Replaceable callback slot
//!
//! Hooks may be replaced from inside themselves, so the slot never stays
//! borrowed while a hook runs: [`HookSlot::current`] hands out a clone.

use std::cell::RefCell;

/// An optional, replaceable callback
pub struct HookSlot<F> {
    hook: RefCell<Option<F>>,
}

impl<F> Default for HookSlot<F> {
    fn default() -> Self {
        Self {
            hook: RefCell::new(None),
        }
    }
}

impl<F: Clone> HookSlot<F> {
    pub fn set(&self, hook: Option<F>) {
        *self.hook.borrow_mut() = hook;
    }

    pub fn current(&self) -> Option<F> {
        self.hook.borrow().clone()
    }
}
