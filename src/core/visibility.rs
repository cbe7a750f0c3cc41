//! Page visibility
//!
//! Wraps the host's page-visibility signal into the two primitives the
//! scheduler needs: whether the page is hidden right now, and a notification
//! when a hidden page becomes visible again.

use std::cell::{Cell, RefCell};
use std::rc::Rc;

/// Listener invoked on every hidden -> visible transition
pub type RestoreListener = Rc<dyn Fn()>;

/// Handle returned by [`VisibilitySource::on_restore`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ListenerId(u64);

/// Page visibility state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum VisibilityState {
    #[default]
    Visible,
    Hidden,
}

impl VisibilityState {
    pub fn is_hidden(&self) -> bool {
        matches!(self, VisibilityState::Hidden)
    }
}

/// Capability the scheduler depends on
pub trait VisibilitySource {
    fn is_hidden(&self) -> bool;

    /// Register a listener for hidden -> visible transitions
    fn on_restore(&self, listener: RestoreListener) -> ListenerId;

    fn remove_listener(&self, id: ListenerId);

    /// Number of registered restore listeners
    fn listener_count(&self) -> usize {
        0
    }
}

/// Listener list shared by the concrete visibility sources
#[derive(Default)]
pub struct VisibilityRegistry {
    next_id: Cell<u64>,
    listeners: RefCell<Vec<(ListenerId, RestoreListener)>>,
}

impl VisibilityRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&self, listener: RestoreListener) -> ListenerId {
        let id = ListenerId(self.next_id.get());
        self.next_id.set(id.0 + 1);
        self.listeners.borrow_mut().push((id, listener));
        id
    }

    pub fn remove(&self, id: ListenerId) {
        self.listeners.borrow_mut().retain(|(existing, _)| *existing != id);
    }

    /// Call every listener once. Listeners may add or remove registrations
    /// while running.
    pub fn notify_restored(&self) {
        let snapshot: Vec<RestoreListener> = self
            .listeners
            .borrow()
            .iter()
            .map(|(_, listener)| listener.clone())
            .collect();
        for listener in snapshot {
            listener();
        }
    }

    pub fn len(&self) -> usize {
        self.listeners.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.listeners.borrow().is_empty()
    }
}

/// Visibility source driven by hand
#[derive(Default)]
pub struct ManualVisibility {
    state: Cell<VisibilityState>,
    registry: VisibilityRegistry,
}

impl ManualVisibility {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> VisibilityState {
        self.state.get()
    }

    pub fn hide(&self) {
        self.state.set(VisibilityState::Hidden);
    }

    /// Make the page visible. Returns true and notifies listeners only when
    /// the page was hidden.
    pub fn show(&self) -> bool {
        if self.state.replace(VisibilityState::Visible).is_hidden() {
            self.registry.notify_restored();
            true
        } else {
            false
        }
    }
}

impl VisibilitySource for ManualVisibility {
    fn is_hidden(&self) -> bool {
        self.state.get().is_hidden()
    }

    fn on_restore(&self, listener: RestoreListener) -> ListenerId {
        self.registry.add(listener)
    }

    fn remove_listener(&self, id: ListenerId) {
        self.registry.remove(id);
    }

    fn listener_count(&self) -> usize {
        self.registry.len()
    }
}

/// Fallback for hosts without a visibility signal: never hidden, never restored
#[derive(Debug, Clone, Copy, Default)]
pub struct AlwaysVisible;

impl VisibilitySource for AlwaysVisible {
    fn is_hidden(&self) -> bool {
        false
    }

    fn on_restore(&self, _listener: RestoreListener) -> ListenerId {
        ListenerId(0)
    }

    fn remove_listener(&self, _id: ListenerId) {}
}

/// Restore listener registration that is removed when dropped
pub struct RestoreSubscription {
    source: Rc<dyn VisibilitySource>,
    id: ListenerId,
}

impl RestoreSubscription {
    pub fn new(source: Rc<dyn VisibilitySource>, listener: RestoreListener) -> Self {
        let id = source.on_restore(listener);
        Self { source, id }
    }
}

impl Drop for RestoreSubscription {
    fn drop(&mut self) {
        self.source.remove_listener(self.id);
    }
}
