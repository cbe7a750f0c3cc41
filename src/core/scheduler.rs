//! Active-time scheduler
//!
//! Turns a periodic wall-clock pulse into ticks that exclude the time a page
//! spent hidden. Built in three layers:
//!
//! - [`ActiveTimeScheduler::pulse`] samples the clock once per frame and hands
//!   the delta since the previous sample to a predicate
//! - [`ActiveTimeScheduler::count`] accumulates those deltas
//! - [`ActiveTimeScheduler::schedule`] fires a callback once a target amount of
//!   active time has accumulated
//!
//! A session keeps pulsing while the page is hidden so it resumes promptly, but
//! no time is reported for hidden samples. Each hidden -> visible transition
//! grants every live session one ignore credit, which discards the single
//! interval that spans the hidden period.
//!
//! There is no cancellation handle: a session ends only when its predicate
//! returns `false`.

use std::cell::Cell;
use std::rc::Rc;

use super::host::{Clock, FrameSource};
use super::visibility::{RestoreSubscription, VisibilitySource};

/// Cadence of the fallback timer when no animation frame primitive exists (~60Hz)
pub const FRAME_INTERVAL_MS: f64 = 1000.0 / 60.0;

/// Outcome of one sample
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Sample {
    /// Consumed an ignore credit
    Ignored,
    /// Page hidden, time frozen
    Hidden,
    /// First sample of the session, nothing to diff against
    First,
    /// Predicate ran and returned the contained decision
    Evaluated(bool),
}

impl Sample {
    fn proceed(self) -> bool {
        match self {
            Sample::Ignored | Sample::Hidden | Sample::First => true,
            Sample::Evaluated(proceed) => proceed,
        }
    }
}

/// Per-call measurement state, dropped when the predicate returns false
struct PulseSession {
    ignore_ticks: Rc<Cell<u32>>,
    last_sample: Option<f64>,
    predicate: Box<dyn FnMut(f64) -> bool>,
    _restore: RestoreSubscription,
}

impl PulseSession {
    fn sample(&mut self, now: f64, hidden: bool) -> Sample {
        let outcome = if self.ignore_ticks.get() > 0 {
            self.ignore_ticks.set(self.ignore_ticks.get() - 1);
            Sample::Ignored
        } else if hidden {
            Sample::Hidden
        } else {
            match self.last_sample {
                None => Sample::First,
                Some(last) => Sample::Evaluated((self.predicate)((now - last).max(0.0))),
            }
        };
        self.last_sample = Some(now);
        outcome
    }
}

/// Measures foreground time on a page
#[derive(Clone)]
pub struct ActiveTimeScheduler {
    clock: Rc<dyn Clock>,
    frames: Rc<dyn FrameSource>,
    visibility: Rc<dyn VisibilitySource>,
}

impl ActiveTimeScheduler {
    pub fn new(
        clock: Rc<dyn Clock>,
        frames: Rc<dyn FrameSource>,
        visibility: Rc<dyn VisibilitySource>,
    ) -> Self {
        Self {
            clock,
            frames,
            visibility,
        }
    }

    pub fn clock(&self) -> &Rc<dyn Clock> {
        &self.clock
    }

    /// Number of sessions currently registered for restore notifications
    pub fn live_sessions(&self) -> usize {
        self.visibility.listener_count()
    }

    /// Sample the clock on every frame and pass the active milliseconds since
    /// the previous sample to `predicate`. Stops when it returns `false`.
    ///
    /// The first sample runs synchronously and never reaches the predicate.
    pub fn pulse<P>(&self, predicate: P)
    where
        P: FnMut(f64) -> bool + 'static,
    {
        let ignore_ticks = Rc::new(Cell::new(0u32));
        let credits = ignore_ticks.clone();
        let restore = RestoreSubscription::new(
            self.visibility.clone(),
            Rc::new(move || credits.set(credits.get() + 1)),
        );

        let session = PulseSession {
            ignore_ticks,
            last_sample: None,
            predicate: Box::new(predicate),
            _restore: restore,
        };
        Self::measure(self.clone(), session);
    }

    fn measure(scheduler: Self, mut session: PulseSession) {
        let now = scheduler.clock.now_ms();
        let hidden = scheduler.visibility.is_hidden();

        if session.sample(now, hidden).proceed() {
            let frames = scheduler.frames.clone();
            frames.request_frame(Box::new(move || Self::measure(scheduler, session)));
        }
        // Otherwise the session drops here, removing its restore listener.
    }

    /// Accumulate active time. `predicate` receives the running total and the
    /// latest tick; counting stops when it returns `false`.
    pub fn count<P>(&self, mut predicate: P)
    where
        P: FnMut(f64, f64) -> bool + 'static,
    {
        let mut total = 0.0;
        self.pulse(move |tick| {
            total += tick;
            predicate(total, tick)
        });
    }

    /// Invoke `on_complete` once `duration_ms` of active time has passed.
    ///
    /// `on_tick` receives the remaining time (negative once overshot) and the
    /// tick length on every counted tick, including the final one. A duration
    /// of zero or less completes on the first counted tick.
    pub fn schedule<C, T>(&self, on_complete: C, mut on_tick: Option<T>, duration_ms: f64)
    where
        C: FnOnce() + 'static,
        T: FnMut(f64, f64) + 'static,
    {
        let mut on_complete = Some(on_complete);
        self.count(move |elapsed, tick| {
            if let Some(on_tick) = on_tick.as_mut() {
                on_tick(duration_ms - elapsed, tick);
            }

            if elapsed >= duration_ms {
                if let Some(done) = on_complete.take() {
                    done();
                }
                false
            } else {
                true
            }
        });
    }

    /// [`schedule`](Self::schedule) without a tick callback
    pub fn schedule_after<C>(&self, on_complete: C, duration_ms: f64)
    where
        C: FnOnce() + 'static,
    {
        self.schedule(on_complete, None::<fn(f64, f64)>, duration_ms);
    }
}
