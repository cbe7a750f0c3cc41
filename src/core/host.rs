//! Host capabilities
//!
//! The detector and scheduler never touch the browser directly. Everything they
//! need from the page (time, frame callbacks, durable storage, the current URL)
//! comes through the traits below, so the same logic runs under wasm and in
//! native tests driven by the manual implementations.

use std::cell::{Cell, RefCell};
use std::collections::{HashMap, VecDeque};
use std::rc::Rc;

/// Callback re-armed by a [`FrameSource`] on the next pulse
pub type FrameCallback = Box<dyn FnOnce()>;

/// Wall-clock time in epoch milliseconds
pub trait Clock {
    fn now_ms(&self) -> f64;
}

/// Host-provided periodic callback (animation frame or fixed timer)
pub trait FrameSource {
    /// Run `callback` once on the next pulse
    fn request_frame(&self, callback: FrameCallback);
}

/// Durable client-side key-value area
pub trait KeyValueStore {
    fn get(&self, key: &str) -> Option<String>;
    fn set(&self, key: &str, value: &str);
}

/// Source of the current page URL
pub trait Location {
    fn href(&self) -> String;
}

/// Real wall clock
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    #[cfg(all(feature = "hydrate", target_arch = "wasm32"))]
    fn now_ms(&self) -> f64 {
        js_sys::Date::now()
    }

    #[cfg(not(all(feature = "hydrate", target_arch = "wasm32")))]
    fn now_ms(&self) -> f64 {
        chrono::Utc::now().timestamp_millis() as f64
    }
}

/// Settable clock for tests and simulations
#[derive(Debug, Default)]
pub struct ManualClock {
    now: Cell<f64>,
}

impl ManualClock {
    pub fn new(start_ms: f64) -> Self {
        Self {
            now: Cell::new(start_ms),
        }
    }

    pub fn set(&self, now_ms: f64) {
        self.now.set(now_ms);
    }

    pub fn advance(&self, ms: f64) {
        self.now.set(self.now.get() + ms);
    }
}

impl Clock for ManualClock {
    fn now_ms(&self) -> f64 {
        self.now.get()
    }
}

/// Frame source that queues callbacks until [`ManualFrames::run_pending`]
#[derive(Default)]
pub struct ManualFrames {
    queue: RefCell<VecDeque<FrameCallback>>,
}

impl ManualFrames {
    pub fn new() -> Self {
        Self::default()
    }

    /// Run every callback queued before this call. Callbacks re-armed while
    /// running wait for the next call. Returns how many ran.
    pub fn run_pending(&self) -> usize {
        let batch: Vec<FrameCallback> = self.queue.borrow_mut().drain(..).collect();
        let ran = batch.len();
        for callback in batch {
            callback();
        }
        ran
    }

    pub fn pending(&self) -> usize {
        self.queue.borrow().len()
    }
}

impl FrameSource for ManualFrames {
    fn request_frame(&self, callback: FrameCallback) {
        self.queue.borrow_mut().push_back(callback);
    }
}

/// A frame callback shared between a primary and a fallback timer. Whichever
/// path claims it first runs it; the other finds it empty.
#[derive(Clone)]
pub struct PendingFrame {
    slot: Rc<RefCell<Option<FrameCallback>>>,
}

impl PendingFrame {
    pub fn new(callback: FrameCallback) -> Self {
        Self {
            slot: Rc::new(RefCell::new(Some(callback))),
        }
    }

    /// Take the callback back, e.g. after the primary timer refused it
    pub fn take(&self) -> Option<FrameCallback> {
        self.slot.borrow_mut().take()
    }

    /// Run the callback if nobody has claimed it yet. Returns whether it ran.
    pub fn run(&self) -> bool {
        match self.take() {
            Some(callback) => {
                callback();
                true
            }
            None => false,
        }
    }
}

/// In-memory key-value store
#[derive(Debug, Default)]
pub struct MemoryStore {
    items: RefCell<HashMap<String, String>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl KeyValueStore for MemoryStore {
    fn get(&self, key: &str) -> Option<String> {
        self.items.borrow().get(key).cloned()
    }

    fn set(&self, key: &str, value: &str) {
        self.items
            .borrow_mut()
            .insert(key.to_string(), value.to_string());
    }
}

/// Location with a settable URL
#[derive(Debug, Default)]
pub struct FixedLocation {
    href: RefCell<String>,
}

impl FixedLocation {
    pub fn new(href: impl Into<String>) -> Self {
        Self {
            href: RefCell::new(href.into()),
        }
    }

    pub fn navigate(&self, href: impl Into<String>) {
        *self.href.borrow_mut() = href.into();
    }
}

impl Location for FixedLocation {
    fn href(&self) -> String {
        self.href.borrow().clone()
    }
}
