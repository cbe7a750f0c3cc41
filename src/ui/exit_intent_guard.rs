//! Exit-intent guard component
//!
//! Mount it anywhere in the page. Once the page has been actively visible for
//! the bind delay, leaving gestures (blur, pointer leaving through the top
//! edge, fast upward movement near it) call `on_action`, subject to the
//! persisted cooldowns.

use leptos::prelude::*;

use crate::core::{DetectorOptions, GestureEvent};

/// Exit-intent guard component
///
/// `on_action` returns whether it acted; `false` leaves no cooldown behind.
/// Changing `purge_token` between deployments drops cooldowns written by older
/// versions.
#[component]
pub fn ExitIntentGuard(
    #[prop(optional)] options: DetectorOptions,
    on_action: Callback<GestureEvent, bool>,
    #[prop(optional, into)] purge_token: Option<String>,
) -> impl IntoView {
    #[cfg(feature = "hydrate")]
    {
        use std::rc::Rc;

        use crate::core::{DetectorConfig, ExitIntent, NoopObserver};
        use crate::ui::browser::web_host;

        Effect::new(move |_| {
            let Some(host) = web_host() else {
                return;
            };

            let config = match DetectorConfig::from_options(&options) {
                Ok(config) => config,
                Err(e) => {
                    leptos::logging::error!("Exit intent disabled: {}", e);
                    return;
                }
            };

            if let Some(token) = purge_token.as_deref() {
                host.cooldowns().purge(token);
            }

            // Listeners keep the detector alive once bound
            let _detector = ExitIntent::init(
                config,
                &host,
                Rc::new(NoopObserver),
                move |event: &GestureEvent| on_action.run(*event),
            );
        });
    }

    #[cfg(not(feature = "hydrate"))]
    {
        let _ = (options, on_action, purge_token);
    }

    view! { <div class="hidden"></div> }
}
