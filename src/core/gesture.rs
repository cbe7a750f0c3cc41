//! Exit gestures
//!
//! Raw pointer and focus events reduced to the three fields the classifier
//! needs, and the binder capability that attaches them to the host.

use std::cell::RefCell;
use std::rc::Rc;

use serde::Serialize;

/// Gesture channel an event arrived on
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, derive_more::Display)]
#[serde(rename_all = "lowercase")]
pub enum GestureKind {
    /// Window lost focus
    #[display("blur")]
    Blur,
    /// Cursor left the document root
    #[display("mouseleave")]
    MouseLeave,
    /// Cursor moved over the document root
    #[display("mousemove")]
    MouseMove,
}

/// A raw gesture from the host
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GestureEvent {
    pub kind: GestureKind,
    /// Vertical viewport coordinate of the cursor
    pub y: f64,
    /// Vertical movement since the previous pointer event (negative = up)
    pub movement_y: f64,
}

impl GestureEvent {
    pub fn blur() -> Self {
        Self {
            kind: GestureKind::Blur,
            y: 0.0,
            movement_y: 0.0,
        }
    }

    pub fn mouse_leave(y: f64) -> Self {
        Self {
            kind: GestureKind::MouseLeave,
            y,
            movement_y: 0.0,
        }
    }

    pub fn mouse_move(y: f64, movement_y: f64) -> Self {
        Self {
            kind: GestureKind::MouseMove,
            y,
            movement_y,
        }
    }

    /// Whether this event looks like the cursor heading out of the page.
    ///
    /// Some browsers fire `mouseleave` when the cursor enters the document;
    /// those events carry `y > 0` and are dropped. A fast upward move may skip
    /// the sample at the edge, so a move also counts when the upward distance
    /// covered (scaled by `edge_tolerance`) exceeds the distance left to the
    /// top.
    pub fn is_exit_candidate(&self, edge_tolerance: f64) -> bool {
        match self.kind {
            GestureKind::Blur => true,
            GestureKind::MouseLeave => self.y <= 0.0,
            GestureKind::MouseMove => {
                self.movement_y < 0.0
                    && (self.y <= 0.0 || -self.movement_y * edge_tolerance > self.y)
            }
        }
    }
}

/// Which gesture channels to listen on
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GestureChannels {
    pub blur: bool,
    pub mouse_leave: bool,
    pub mouse_move: bool,
}

impl GestureChannels {
    pub fn all() -> Self {
        Self {
            blur: true,
            mouse_leave: true,
            mouse_move: true,
        }
    }

    pub fn enables(&self, kind: GestureKind) -> bool {
        match kind {
            GestureKind::Blur => self.blur,
            GestureKind::MouseLeave => self.mouse_leave,
            GestureKind::MouseMove => self.mouse_move,
        }
    }
}

impl Default for GestureChannels {
    fn default() -> Self {
        Self::all()
    }
}

/// Receives raw gestures from the host once bound
pub type GestureHandler = Rc<dyn Fn(&GestureEvent)>;

/// Attaches host listeners for the enabled channels
pub trait GestureBinder {
    fn bind(&self, channels: GestureChannels, handler: GestureHandler);
}

/// Binder that keeps the handler so tests can inject gestures
#[derive(Default)]
pub struct RecordingBinder {
    bound: RefCell<Option<(GestureChannels, GestureHandler)>>,
}

impl RecordingBinder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_bound(&self) -> bool {
        self.bound.borrow().is_some()
    }

    pub fn channels(&self) -> Option<GestureChannels> {
        self.bound.borrow().as_ref().map(|(channels, _)| *channels)
    }

    /// Deliver `event` the way a host listener would. Returns false when
    /// nothing is listening on its channel.
    pub fn emit(&self, event: GestureEvent) -> bool {
        let handler = match self.bound.borrow().as_ref() {
            Some((channels, handler)) if channels.enables(event.kind) => handler.clone(),
            _ => return false,
        };
        handler(&event);
        true
    }
}

impl GestureBinder for RecordingBinder {
    fn bind(&self, channels: GestureChannels, handler: GestureHandler) {
        *self.bound.borrow_mut() = Some((channels, handler));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;

    #[test]
    fn test_blur_is_always_candidate() {
        assert!(GestureEvent::blur().is_exit_candidate(1.0));
    }

    #[test]
    fn test_mouse_leave_filters_by_y() {
        assert!(!GestureEvent::mouse_leave(5.0).is_exit_candidate(1.0));
        assert!(GestureEvent::mouse_leave(0.0).is_exit_candidate(1.0));
        assert!(GestureEvent::mouse_leave(-3.0).is_exit_candidate(1.0));
    }

    #[test]
    fn test_mouse_move_requires_upward_motion() {
        assert!(!GestureEvent::mouse_move(0.0, 0.0).is_exit_candidate(1.0));
        assert!(!GestureEvent::mouse_move(-1.0, 4.0).is_exit_candidate(1.0));
        assert!(GestureEvent::mouse_move(0.0, -1.0).is_exit_candidate(1.0));
    }

    #[test]
    fn test_mouse_move_fast_upward_near_edge() {
        // 30px from the top, moved 40px up since the last sample
        assert!(GestureEvent::mouse_move(30.0, -40.0).is_exit_candidate(1.0));
        // Same distance, slow move
        assert!(!GestureEvent::mouse_move(30.0, -10.0).is_exit_candidate(1.0));
        // Slow move counts with a looser tolerance
        assert!(GestureEvent::mouse_move(30.0, -10.0).is_exit_candidate(4.0));
    }

    #[test]
    fn test_kind_display() {
        assert_eq!(GestureKind::Blur.to_string(), "blur");
        assert_eq!(GestureKind::MouseLeave.to_string(), "mouseleave");
        assert_eq!(GestureKind::MouseMove.to_string(), "mousemove");
    }

    #[test]
    fn test_event_serializes_camel_case() {
        let json = serde_json::to_value(GestureEvent::mouse_move(3.0, -7.0)).unwrap();
        assert_eq!(
            json,
            serde_json::json!({"kind": "mousemove", "y": 3.0, "movementY": -7.0})
        );
    }

    #[test]
    fn test_recording_binder_respects_channels() {
        let binder = RecordingBinder::new();
        let hits = Rc::new(Cell::new(0));
        assert!(!binder.emit(GestureEvent::blur()));

        let hits_inner = hits.clone();
        binder.bind(
            GestureChannels {
                blur: false,
                ..GestureChannels::all()
            },
            Rc::new(move |_: &GestureEvent| hits_inner.set(hits_inner.get() + 1)),
        );

        assert!(binder.is_bound());
        assert!(!binder.emit(GestureEvent::blur()));
        assert!(binder.emit(GestureEvent::mouse_leave(0.0)));
        assert_eq!(hits.get(), 1);
    }
}
