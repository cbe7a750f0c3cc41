//! Host-independent exit-intent logic: active-time scheduling, persisted
//! cooldowns, gesture classification and the detector that ties them together

pub mod config;
pub mod cooldown;
pub mod detector;
mod error;
pub mod gesture;
pub mod host;
pub mod scheduler;
pub mod simulation;
#[cfg(test)]
mod tests;
pub mod visibility;

pub use config::{DetectorConfig, DetectorOptions};
pub use cooldown::{ActiveBlock, BlockPattern, CooldownEntry, CooldownStore};
pub use detector::{
    ActionOutcome, DetectorHost, DetectorPhase, ExitIntent, ExitIntentObserver, NoopObserver,
    RecordingObserver,
};
pub use error::{ExitIntentError, Result};
pub use gesture::{GestureBinder, GestureChannels, GestureEvent, GestureKind, RecordingBinder};
pub use host::{
    Clock, FixedLocation, FrameSource, KeyValueStore, Location, ManualClock, ManualFrames,
    MemoryStore, PendingFrame, SystemClock,
};
pub use scheduler::ActiveTimeScheduler;
pub use simulation::SimulatedPage;
pub use visibility::{
    AlwaysVisible, ManualVisibility, VisibilityRegistry, VisibilitySource, VisibilityState,
};
