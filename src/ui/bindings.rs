//! JavaScript API
//!
//! ```js
//! const guard = new ExitIntent({ bindDelayMs: 5000, cooldownMinutes: 30 }, (event) => {
//!     showOffer();
//!     return true;
//! });
//! guard.onStorageBlock((pattern, remainingMs) => console.log(pattern, remainingMs));
//! guard.purgeBlocks("release-42");
//! ```

use std::rc::Rc;

use wasm_bindgen::prelude::*;

use crate::core::{
    ActionOutcome, DetectorConfig, DetectorOptions, ExitIntent, ExitIntentObserver, GestureEvent,
};
use crate::ui::browser::web_host;
use crate::ui::hook::HookSlot;

/// Forwards detector notifications to optional JS callbacks
#[derive(Default)]
struct JsObserver {
    bound: HookSlot<js_sys::Function>,
    trigger: HookSlot<js_sys::Function>,
    storage_block: HookSlot<js_sys::Function>,
}

impl ExitIntentObserver for JsObserver {
    fn on_bound(&self) {
        if let Some(hook) = self.bound.current() {
            report(hook.call0(&JsValue::NULL), "onBound");
        }
    }

    fn on_trigger(&self, event: &GestureEvent) {
        if let Some(hook) = self.trigger.current() {
            match serde_wasm_bindgen::to_value(event) {
                Ok(value) => report(hook.call1(&JsValue::NULL, &value), "onTrigger"),
                Err(e) => leptos::logging::warn!("Failed to serialize gesture: {}", e),
            }
        }
    }

    fn on_storage_block(&self, pattern: &str, remaining_ms: f64) {
        if let Some(hook) = self.storage_block.current() {
            report(
                hook.call2(
                    &JsValue::NULL,
                    &JsValue::from_str(pattern),
                    &JsValue::from_f64(remaining_ms),
                ),
                "onStorageBlock",
            );
        }
    }
}

fn report(result: Result<JsValue, JsValue>, hook: &str) {
    if let Err(e) = result {
        leptos::logging::error!("{} callback threw: {:?}", hook, e);
    }
}

/// `undefined`, `true` or anything truthy acts; `false` declines; a throw declines
fn call_action(action: &js_sys::Function, event: &GestureEvent) -> ActionOutcome {
    let value = match serde_wasm_bindgen::to_value(event) {
        Ok(value) => value,
        Err(e) => {
            leptos::logging::warn!("Failed to serialize gesture: {}", e);
            JsValue::UNDEFINED
        }
    };

    match action.call1(&JsValue::NULL, &value) {
        Ok(result) => match result.as_bool() {
            Some(false) => ActionOutcome::Declined,
            _ => ActionOutcome::Acted,
        },
        Err(e) => {
            leptos::logging::error!("Exit intent action threw: {:?}", e);
            ActionOutcome::Declined
        }
    }
}

#[wasm_bindgen(js_name = ExitIntent)]
pub struct ExitIntentHandle {
    detector: ExitIntent,
    observer: Rc<JsObserver>,
}

#[wasm_bindgen(js_class = ExitIntent)]
impl ExitIntentHandle {
    /// Start a detector on the current page
    #[wasm_bindgen(constructor)]
    pub fn new(options: JsValue, on_action: js_sys::Function) -> Result<ExitIntentHandle, JsValue> {
        let options: DetectorOptions = if options.is_undefined() || options.is_null() {
            DetectorOptions::default()
        } else {
            serde_wasm_bindgen::from_value(options)
                .map_err(|e| JsValue::from_str(&format!("Invalid options: {}", e)))?
        };
        let config =
            DetectorConfig::from_options(&options).map_err(|e| JsValue::from_str(&e.to_string()))?;
        let host = web_host().ok_or_else(|| JsValue::from_str("No browser window available"))?;

        let observer = Rc::new(JsObserver::default());
        let detector = ExitIntent::init(config, &host, observer.clone(), move |event: &GestureEvent| {
            call_action(&on_action, event)
        });

        Ok(Self { detector, observer })
    }

    /// Drop all cooldowns unless `token` was already applied.
    /// Returns whether a purge happened.
    #[wasm_bindgen(js_name = purgeBlocks)]
    pub fn purge_blocks(&self, token: &str) -> bool {
        self.detector.purge_blocks(token)
    }

    #[wasm_bindgen(getter)]
    pub fn enabled(&self) -> bool {
        self.detector.enabled()
    }

    #[wasm_bindgen(setter)]
    pub fn set_enabled(&self, enabled: bool) {
        self.detector.set_enabled(enabled);
    }

    #[wasm_bindgen(getter)]
    pub fn acted(&self) -> bool {
        self.detector.acted()
    }

    /// Clearing the flag lets the action run again on this page
    #[wasm_bindgen(setter)]
    pub fn set_acted(&self, acted: bool) {
        self.detector.set_acted(acted);
    }

    #[wasm_bindgen(getter = bindDelayMs)]
    pub fn bind_delay_ms(&self) -> f64 {
        self.detector.config().bind_delay_ms
    }

    /// The effective options, every field filled in
    #[wasm_bindgen(getter)]
    pub fn options(&self) -> Result<JsValue, JsValue> {
        serde_wasm_bindgen::to_value(&self.detector.config().to_options())
            .map_err(|e| JsValue::from_str(&format!("Failed to serialize options: {}", e)))
    }

    #[wasm_bindgen(getter)]
    pub fn bound(&self) -> bool {
        self.detector.is_bound()
    }

    #[wasm_bindgen(js_name = onBound)]
    pub fn on_bound(&self, hook: Option<js_sys::Function>) {
        self.observer.bound.set(hook);
    }

    #[wasm_bindgen(js_name = onTrigger)]
    pub fn on_trigger(&self, hook: Option<js_sys::Function>) {
        self.observer.trigger.set(hook);
    }

    #[wasm_bindgen(js_name = onStorageBlock)]
    pub fn on_storage_block(&self, hook: Option<js_sys::Function>) {
        self.observer.storage_block.set(hook);
    }
}

/// Run `on_complete` after `ms` of visible time, calling
/// `on_tick(remainingMs, tickMs)` every frame until then.
#[wasm_bindgen(js_name = activeTimeout)]
pub fn active_timeout(
    on_complete: js_sys::Function,
    on_tick: Option<js_sys::Function>,
    ms: f64,
) -> Result<(), JsValue> {
    if !ms.is_finite() {
        return Err(JsValue::from_str("activeTimeout duration must be finite"));
    }
    let host = web_host().ok_or_else(|| JsValue::from_str("No browser window available"))?;

    let on_tick = on_tick.map(|hook| {
        move |remaining: f64, tick: f64| {
            report(
                hook.call2(
                    &JsValue::NULL,
                    &JsValue::from_f64(remaining),
                    &JsValue::from_f64(tick),
                ),
                "activeTimeout tick",
            );
        }
    });

    host.scheduler().schedule(
        move || report(on_complete.call0(&JsValue::NULL), "activeTimeout"),
        on_tick,
        ms,
    );
    Ok(())
}
