// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! `tracing` events to the browser console

use std::fmt::{self, Write as _};
use std::sync::OnceLock;

use tracing::field::{Field, Visit};
use tracing::{Event, Level, Subscriber};
use tracing_subscriber::filter::LevelFilter;
use tracing_subscriber::layer::{Context, Layer};
use tracing_subscriber::prelude::*;
use tracing_subscriber::{reload, Registry};
use wasm_bindgen::JsValue;

type FilterHandle = reload::Handle<LevelFilter, Registry>;

static FILTER: OnceLock<FilterHandle> = OnceLock::new();

/// Registry with a reloadable level filter in front of the console layer
fn subscriber(level: LevelFilter) -> (impl Subscriber + Send + Sync, FilterHandle) {
    let (filter, handle) = reload::Layer::new(level);
    let subscriber = tracing_subscriber::registry().with(filter).with(ConsoleLayer);
    (subscriber, handle)
}

/// Install the console subscriber at `info`. Later calls are no-ops.
pub fn init() {
    let (subscriber, handle) = subscriber(LevelFilter::INFO);
    if subscriber.try_init().is_ok() {
        let _ = FILTER.set(handle);
    }
}

/// Change the console level. A no-op before [`init`].
pub fn set_max_level(level: LevelFilter) -> Result<(), reload::Error> {
    match FILTER.get() {
        Some(handle) => handle.reload(level),
        None => Ok(()),
    }
}

#[derive(Default)]
struct Fields {
    message: String,
    rest: String,
}

impl Visit for Fields {
    fn record_str(&mut self, field: &Field, value: &str) {
        if field.name() == "message" {
            self.message.push_str(value);
        } else {
            let _ = write!(self.rest, " {}={}", field.name(), value);
        }
    }

    fn record_debug(&mut self, field: &Field, value: &dyn fmt::Debug) {
        if field.name() == "message" {
            let _ = write!(self.message, "{:?}", value);
        } else {
            let _ = write!(self.rest, " {}={:?}", field.name(), value);
        }
    }
}

/// Writes each event as `[target] message key=value ...`
pub struct ConsoleLayer;

impl ConsoleLayer {
    pub fn format(event: &Event<'_>) -> String {
        let mut fields = Fields::default();
        event.record(&mut fields);
        format!("[{}] {}{}", event.metadata().target(), fields.message, fields.rest)
    }
}

impl<S: Subscriber> Layer<S> for ConsoleLayer {
    fn on_event(&self, event: &Event<'_>, _ctx: Context<'_, S>) {
        let level = event.metadata().level();
        let line = JsValue::from_str(&Self::format(event));
        match *level {
            Level::ERROR => web_sys::console::error_1(&line),
            Level::WARN => web_sys::console::warn_1(&line),
            Level::INFO => web_sys::console::info_1(&line),
            _ => web_sys::console::debug_1(&line),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_level_names() {
        assert_eq!("DEBUG".parse::<LevelFilter>().unwrap(), LevelFilter::DEBUG);
        assert_eq!("off".parse::<LevelFilter>().unwrap(), LevelFilter::OFF);
        assert!("loud".parse::<LevelFilter>().is_err());
    }

    #[test]
    fn test_filter_reloads_while_installed() {
        let (subscriber, handle) = subscriber(LevelFilter::INFO);
        assert_eq!(handle.clone_current(), Some(LevelFilter::INFO));

        handle.reload(LevelFilter::DEBUG).unwrap();
        assert_eq!(handle.clone_current(), Some(LevelFilter::DEBUG));

        drop(subscriber);
        assert!(handle.reload(LevelFilter::WARN).is_err());
    }

    #[test]
    fn test_set_level_before_init_is_accepted() {
        assert!(set_max_level(LevelFilter::TRACE).is_ok());
    }
}
