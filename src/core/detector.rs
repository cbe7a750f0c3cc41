//! Exit-intent detector
//!
//! Waits `bind_delay_ms` of active time, then attaches gesture listeners.
//! Every gesture that looks like the cursor leaving the page becomes a trigger;
//! a trigger runs the user action only when the detector is enabled, has not
//! already acted on this page (unless `ignore_flag_blocking`), and no persisted
//! cooldown matches the current URL (unless `ignore_storage_blocking`). A
//! successful action sets the `acted` flag and writes a new cooldown.
//!
//! # Example
//!
//! ```
//! use donleeve::core::{DetectorConfig, ExitIntent, GestureEvent, NoopObserver, SimulatedPage};
//! use std::rc::Rc;
//!
//! let page = SimulatedPage::new("https://shop.example/cart");
//! let detector = ExitIntent::init(
//!     DetectorConfig::default(),
//!     &page.host(),
//!     Rc::new(NoopObserver),
//!     |_event: &GestureEvent| true,
//! );
//!
//! page.run_for(3_100.0);
//! assert!(detector.is_bound());
//!
//! page.binder.emit(GestureEvent::mouse_leave(0.0));
//! assert!(detector.acted());
//! ```

use std::cell::{Cell, RefCell};
use std::rc::Rc;

use super::config::DetectorConfig;
use super::cooldown::{ActiveBlock, CooldownStore};
use super::gesture::{GestureBinder, GestureEvent, GestureKind};
use super::host::{Clock, FrameSource, KeyValueStore, Location};
use super::scheduler::ActiveTimeScheduler;
use super::visibility::VisibilitySource;

/// Notifications for collaborators. Every method defaults to a no-op.
pub trait ExitIntentObserver {
    /// Gesture listeners were attached
    fn on_bound(&self) {}

    /// A gesture candidate arrived, whether or not it ends up actionable
    fn on_trigger(&self, _event: &GestureEvent) {}

    /// A matching, unexpired cooldown blocked a trigger
    fn on_storage_block(&self, _pattern: &str, _remaining_ms: f64) {}
}

/// Observer that ignores everything
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopObserver;

impl ExitIntentObserver for NoopObserver {}

/// Observer that records every notification
#[derive(Debug, Default)]
pub struct RecordingObserver {
    pub bound: Cell<u32>,
    pub triggers: RefCell<Vec<GestureKind>>,
    pub storage_blocks: RefCell<Vec<ActiveBlock>>,
}

impl ExitIntentObserver for RecordingObserver {
    fn on_bound(&self) {
        self.bound.set(self.bound.get() + 1);
    }

    fn on_trigger(&self, event: &GestureEvent) {
        self.triggers.borrow_mut().push(event.kind);
    }

    fn on_storage_block(&self, pattern: &str, remaining_ms: f64) {
        self.storage_blocks.borrow_mut().push(ActiveBlock {
            pattern: pattern.to_string(),
            remaining_ms,
        });
    }
}

/// What the action callback decided
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ActionOutcome {
    /// Commit: mark the page as acted on and write a cooldown
    Acted,
    /// Leave state untouched
    Declined,
}

impl From<bool> for ActionOutcome {
    fn from(acted: bool) -> Self {
        if acted {
            ActionOutcome::Acted
        } else {
            ActionOutcome::Declined
        }
    }
}

impl From<()> for ActionOutcome {
    fn from(_: ()) -> Self {
        ActionOutcome::Acted
    }
}

impl From<Option<bool>> for ActionOutcome {
    fn from(acted: Option<bool>) -> Self {
        acted.map_or(ActionOutcome::Acted, ActionOutcome::from)
    }
}

/// Listener binding state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DetectorPhase {
    #[default]
    Unbound,
    Bound,
}

/// Everything the detector needs from the page
#[derive(Clone)]
pub struct DetectorHost {
    pub clock: Rc<dyn Clock>,
    pub frames: Rc<dyn FrameSource>,
    pub visibility: Rc<dyn VisibilitySource>,
    /// `None` when the page has no durable storage
    pub storage: Option<Rc<dyn KeyValueStore>>,
    pub location: Rc<dyn Location>,
    pub binder: Rc<dyn GestureBinder>,
}

impl DetectorHost {
    pub fn scheduler(&self) -> ActiveTimeScheduler {
        ActiveTimeScheduler::new(
            self.clock.clone(),
            self.frames.clone(),
            self.visibility.clone(),
        )
    }

    pub fn cooldowns(&self) -> CooldownStore {
        CooldownStore::new(self.storage.clone(), self.clock.clone())
    }
}

type ActionFn = Box<dyn FnMut(&GestureEvent) -> ActionOutcome>;

struct DetectorContext {
    config: DetectorConfig,
    enabled: Cell<bool>,
    acted: Cell<bool>,
    phase: Cell<DetectorPhase>,
    cooldowns: CooldownStore,
    location: Rc<dyn Location>,
    observer: Rc<dyn ExitIntentObserver>,
    action: RefCell<ActionFn>,
}

impl DetectorContext {
    fn bind(self: &Rc<Self>, binder: &dyn GestureBinder) {
        if self.phase.get() == DetectorPhase::Bound {
            return;
        }
        self.phase.set(DetectorPhase::Bound);

        let ctx = self.clone();
        binder.bind(
            self.config.channels,
            Rc::new(move |event: &GestureEvent| {
                ctx.handle(event);
            }),
        );

        self.observer.on_bound();
    }

    fn handle(&self, event: &GestureEvent) -> bool {
        if !self.config.channels.enables(event.kind)
            || !event.is_exit_candidate(self.config.edge_tolerance)
        {
            return false;
        }
        self.trigger(event);
        true
    }

    fn trigger(&self, event: &GestureEvent) {
        self.observer.on_trigger(event);

        if self.is_actionable() {
            self.act(event);
        }
    }

    fn is_actionable(&self) -> bool {
        if !self.enabled.get() {
            return false;
        }
        if !self.config.ignore_flag_blocking && self.acted.get() {
            return false;
        }
        if !self.config.ignore_storage_blocking && self.is_storage_blocking() {
            return false;
        }
        true
    }

    fn is_storage_blocking(&self) -> bool {
        match self.cooldowns.active_blocks(&self.location.href()) {
            Ok(blocks) => {
                for block in &blocks {
                    self.observer
                        .on_storage_block(&block.pattern, block.remaining_ms);
                }
                !blocks.is_empty()
            }
            Err(e) => {
                leptos::logging::warn!("Cooldown check failed, suppressing exit intent: {}", e);
                true
            }
        }
    }

    fn act(&self, event: &GestureEvent) {
        let outcome = {
            let Ok(mut action) = self.action.try_borrow_mut() else {
                leptos::logging::debug_warn!(
                    "Dropping {} trigger raised inside the action",
                    event.kind
                );
                return;
            };
            (*action)(event)
        };

        if outcome == ActionOutcome::Acted {
            self.acted.set(true);
            if let Err(e) = self
                .cooldowns
                .add_block(&self.config.cooldown_pattern, self.config.cooldown_minutes)
            {
                leptos::logging::warn!("Couldn't store exit intent cooldown: {}", e);
            }
        }
    }
}

/// Handle to a running detector. Clones share state.
#[derive(Clone)]
pub struct ExitIntent {
    ctx: Rc<DetectorContext>,
}

impl ExitIntent {
    /// Start the detector: listeners attach after `config.bind_delay_ms` of
    /// active time, and `action` runs on every actionable trigger.
    ///
    /// `action` may return `bool` or `()`; only `false` declines.
    pub fn init<F, R>(
        config: DetectorConfig,
        host: &DetectorHost,
        observer: Rc<dyn ExitIntentObserver>,
        mut action: F,
    ) -> Self
    where
        F: FnMut(&GestureEvent) -> R + 'static,
        R: Into<ActionOutcome>,
    {
        let bind_delay_ms = config.bind_delay_ms;
        let action: ActionFn = Box::new(move |event: &GestureEvent| action(event).into());
        let ctx = Rc::new(DetectorContext {
            config,
            enabled: Cell::new(true),
            acted: Cell::new(false),
            phase: Cell::new(DetectorPhase::Unbound),
            cooldowns: host.cooldowns(),
            location: host.location.clone(),
            observer,
            action: RefCell::new(action),
        });

        let bind_ctx = ctx.clone();
        let binder = host.binder.clone();
        host.scheduler()
            .schedule_after(move || bind_ctx.bind(binder.as_ref()), bind_delay_ms);

        Self { ctx }
    }

    /// Classify a raw gesture and trigger on candidates. Returns whether the
    /// event was a candidate.
    pub fn handle(&self, event: &GestureEvent) -> bool {
        self.ctx.handle(event)
    }

    /// Trigger without classification
    pub fn trigger(&self, event: &GestureEvent) {
        self.ctx.trigger(event);
    }

    /// Evaluate the gates. Reports matching cooldowns to the observer.
    pub fn is_actionable(&self) -> bool {
        self.ctx.is_actionable()
    }

    pub fn phase(&self) -> DetectorPhase {
        self.ctx.phase.get()
    }

    pub fn is_bound(&self) -> bool {
        self.phase() == DetectorPhase::Bound
    }

    pub fn enabled(&self) -> bool {
        self.ctx.enabled.get()
    }

    /// Master switch
    pub fn set_enabled(&self, enabled: bool) {
        self.ctx.enabled.set(enabled);
    }

    pub fn acted(&self) -> bool {
        self.ctx.acted.get()
    }

    /// Overwrite the per-page flag. `false` lets the action run again.
    pub fn set_acted(&self, acted: bool) {
        self.ctx.acted.set(acted);
    }

    pub fn reset_acted(&self) {
        self.set_acted(false);
    }

    /// Drop all cooldowns if `token` differs from the last one seen
    pub fn purge_blocks(&self, token: &str) -> bool {
        self.ctx.cooldowns.purge(token)
    }

    pub fn cooldowns(&self) -> &CooldownStore {
        &self.ctx.cooldowns
    }

    pub fn config(&self) -> &DetectorConfig {
        &self.ctx.config
    }
}
