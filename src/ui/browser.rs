//! Browser implementations of the host capabilities
//!
//! - [`DocumentVisibility`]: `document.hidden` + `visibilitychange`
//! - [`AnimationFrames`]: `requestAnimationFrame`, or a ~60Hz timeout
//! - [`WindowLocation`]: `window.location.href`
//! - [`DomGestureBinder`]: `blur` on the window, `mouseleave`/`mousemove` on
//!   the document element
//!
//! Listener closures are leaked on purpose: they live as long as the page.

use std::cell::OnceCell;
use std::rc::Rc;

use gloo_timers::callback::Timeout;
use wasm_bindgen::{JsCast, JsValue};
use wasm_bindgen::closure::Closure;

use crate::core::scheduler::FRAME_INTERVAL_MS;
use crate::core::visibility::{ListenerId, RestoreListener};
use crate::core::{
    AlwaysVisible, DetectorHost, FrameSource, GestureBinder, GestureChannels, GestureEvent,
    KeyValueStore, Location, SystemClock, VisibilityRegistry, VisibilitySource,
};
use crate::core::gesture::GestureHandler;
use crate::core::host::{FrameCallback, PendingFrame};

use super::storage::LocalStorage;

/// Page visibility from the document
pub struct DocumentVisibility {
    document: web_sys::Document,
    registry: Rc<VisibilityRegistry>,
}

impl DocumentVisibility {
    /// Listen for `visibilitychange`. `None` without a document.
    pub fn attach() -> Option<Self> {
        let document = web_sys::window()?.document()?;
        let registry = Rc::new(VisibilityRegistry::new());

        let registry_listener = registry.clone();
        let visibility_change = Closure::wrap(Box::new(move |_: web_sys::Event| {
            let hidden = web_sys::window()
                .and_then(|window| window.document())
                .map(|document| document.hidden())
                .unwrap_or(false);

            // A change to visible means the page was hidden before
            if !hidden {
                registry_listener.notify_restored();
            }
        }) as Box<dyn FnMut(web_sys::Event)>);

        document
            .add_event_listener_with_callback(
                "visibilitychange",
                visibility_change.as_ref().unchecked_ref(),
            )
            .ok()?;
        visibility_change.forget();

        Some(Self { document, registry })
    }
}

impl VisibilitySource for DocumentVisibility {
    fn is_hidden(&self) -> bool {
        self.document.hidden()
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

/// Frame-aligned pulse
#[derive(Debug, Clone, Copy, Default)]
pub struct AnimationFrames;

impl FrameSource for AnimationFrames {
    fn request_frame(&self, callback: FrameCallback) {
        let Some(window) = web_sys::window().filter(has_animation_frames) else {
            fallback_frame(callback);
            return;
        };

        let frame = PendingFrame::new(callback);
        let on_frame = frame.clone();
        let js_frame = Closure::once_into_js(move || {
            on_frame.run();
        });
        if window.request_animation_frame(js_frame.unchecked_ref()).is_err() {
            if let Some(callback) = frame.take() {
                leptos::logging::warn!("requestAnimationFrame failed, using a timer");
                fallback_frame(callback);
            }
        }
    }
}

fn has_animation_frames(window: &web_sys::Window) -> bool {
    js_sys::Reflect::has(window, &JsValue::from_str("requestAnimationFrame")).unwrap_or(false)
}

fn fallback_frame(callback: FrameCallback) {
    Timeout::new(FRAME_INTERVAL_MS.round() as u32, callback).forget();
}

/// Current page URL
#[derive(Debug, Clone, Copy, Default)]
pub struct WindowLocation;

impl Location for WindowLocation {
    fn href(&self) -> String {
        web_sys::window()
            .and_then(|window| window.location().href().ok())
            .unwrap_or_default()
    }
}

/// Attaches gesture listeners to the live DOM
#[derive(Debug, Clone, Copy, Default)]
pub struct DomGestureBinder;

impl GestureBinder for DomGestureBinder {
    fn bind(&self, channels: GestureChannels, handler: GestureHandler) {
        let Some(window) = web_sys::window() else {
            return;
        };

        if channels.blur {
            let handler = handler.clone();
            let blur = Closure::wrap(Box::new(move |_: web_sys::Event| {
                handler(&GestureEvent::blur());
            }) as Box<dyn FnMut(web_sys::Event)>);
            listen(&window, "blur", blur.as_ref().unchecked_ref());
            blur.forget();
        }

        let Some(root) = window
            .document()
            .and_then(|document| document.document_element())
        else {
            return;
        };

        if channels.mouse_leave {
            let handler = handler.clone();
            let mouseleave = Closure::wrap(Box::new(move |e: web_sys::MouseEvent| {
                // Either coordinate at or above the edge counts
                let y = e.client_y().min(e.y());
                handler(&GestureEvent::mouse_leave(y as f64));
            }) as Box<dyn FnMut(web_sys::MouseEvent)>);
            listen(&root, "mouseleave", mouseleave.as_ref().unchecked_ref());
            mouseleave.forget();
        }

        if channels.mouse_move {
            let mousemove = Closure::wrap(Box::new(move |e: web_sys::MouseEvent| {
                handler(&GestureEvent::mouse_move(
                    e.client_y() as f64,
                    e.movement_y() as f64,
                ));
            }) as Box<dyn FnMut(web_sys::MouseEvent)>);
            listen(&root, "mousemove", mousemove.as_ref().unchecked_ref());
            mousemove.forget();
        }
    }
}

fn listen(target: &web_sys::EventTarget, event: &str, listener: &js_sys::Function) {
    if target.add_event_listener_with_callback(event, listener).is_err() {
        leptos::logging::warn!("Failed to attach {} listener, exit intent won't see it", event);
    }
}

thread_local! {
    static WEB_HOST: OnceCell<Option<DetectorHost>> = const { OnceCell::new() };
}

/// Browser capabilities, created once per page. `None` outside a window.
///
/// Missing pieces degrade: no visibility signal counts the page as always
/// visible, no localStorage disables persisted cooldowns.
pub fn web_host() -> Option<DetectorHost> {
    WEB_HOST.with(|cell| cell.get_or_init(detect_host).clone())
}

fn detect_host() -> Option<DetectorHost> {
    web_sys::window()?;

    let visibility: Rc<dyn VisibilitySource> = match DocumentVisibility::attach() {
        Some(visibility) => Rc::new(visibility),
        None => {
            leptos::logging::warn!("Page visibility unavailable, counting all time as active");
            Rc::new(AlwaysVisible)
        }
    };

    let storage: Option<Rc<dyn KeyValueStore>> = match LocalStorage::open() {
        Some(storage) => Some(Rc::new(storage)),
        None => {
            leptos::logging::warn!("localStorage unavailable, cooldowns won't persist");
            None
        }
    };

    Some(DetectorHost {
        clock: Rc::new(SystemClock),
        frames: Rc::new(AnimationFrames),
        visibility,
        storage,
        location: Rc::new(WindowLocation),
        binder: Rc::new(DomGestureBinder),
    })
}
