//! Deterministic page simulation
//!
//! Bundles the manual host capabilities so a detector or scheduler can be
//! driven frame by frame without a browser.

use std::rc::Rc;

use super::detector::{DetectorHost, RecordingObserver};
use super::gesture::RecordingBinder;
use super::host::{FixedLocation, KeyValueStore, ManualClock, ManualFrames, MemoryStore};
use super::scheduler::ActiveTimeScheduler;
use super::visibility::ManualVisibility;

/// Epoch milliseconds the simulated clock starts at (2023-11-14T22:13:20Z)
pub const SIMULATION_EPOCH_MS: f64 = 1_700_000_000_000.0;

/// Default frame length used by [`SimulatedPage::run_for`]
pub const SIMULATED_FRAME_MS: f64 = 16.0;

/// A fake page with settable time, visibility, storage and URL
pub struct SimulatedPage {
    pub clock: Rc<ManualClock>,
    pub frames: Rc<ManualFrames>,
    pub visibility: Rc<ManualVisibility>,
    pub storage: Rc<MemoryStore>,
    pub location: Rc<FixedLocation>,
    pub binder: Rc<RecordingBinder>,
    pub observer: Rc<RecordingObserver>,
}

impl SimulatedPage {
    pub fn new(href: &str) -> Self {
        Self {
            clock: Rc::new(ManualClock::new(SIMULATION_EPOCH_MS)),
            frames: Rc::new(ManualFrames::new()),
            visibility: Rc::new(ManualVisibility::new()),
            storage: Rc::new(MemoryStore::new()),
            location: Rc::new(FixedLocation::new(href)),
            binder: Rc::new(RecordingBinder::new()),
            observer: Rc::new(RecordingObserver::default()),
        }
    }

    /// Host with durable storage
    pub fn host(&self) -> DetectorHost {
        DetectorHost {
            clock: self.clock.clone(),
            frames: self.frames.clone(),
            visibility: self.visibility.clone(),
            storage: Some(self.storage.clone() as Rc<dyn KeyValueStore>),
            location: self.location.clone(),
            binder: self.binder.clone(),
        }
    }

    /// Host whose storage is unavailable
    pub fn host_without_storage(&self) -> DetectorHost {
        DetectorHost {
            storage: None,
            ..self.host()
        }
    }

    pub fn scheduler(&self) -> ActiveTimeScheduler {
        self.host().scheduler()
    }

    /// Advance the clock by `ms` and run one frame
    pub fn step(&self, ms: f64) {
        self.clock.advance(ms);
        self.frames.run_pending();
    }

    /// Run frames of [`SIMULATED_FRAME_MS`] until at least `ms` have passed
    pub fn run_for(&self, ms: f64) {
        let mut elapsed = 0.0;
        while elapsed < ms {
            self.step(SIMULATED_FRAME_MS);
            elapsed += SIMULATED_FRAME_MS;
        }
    }
}
