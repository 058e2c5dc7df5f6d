use crate::event::Event;

#[cfg(target_arch = "wasm32")]
mod wasm_log {
    use wasm_bindgen::prelude::*;

    #[wasm_bindgen]
    extern "C" {
        #[wasm_bindgen(js_namespace = console)]
        fn log(message: &str);
    }

    pub fn log_line(message: &str) {
        log(message);
    }
}

#[cfg(target_arch = "wasm32")]
pub use wasm_log::log_line;

#[cfg(not(target_arch = "wasm32"))]
pub fn log_line(message: &str) {
    tracing::trace!(target: "musical_spells::event", "{message}");
}

/// Queues an event for the host and mirrors it as a JSON line.
pub fn push_event(outbox: &mut Vec<Event>, event: Event) {
    log_line(&event.to_json_line());
    outbox.push(event);
}
