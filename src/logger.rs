/*!
Logging for the extension.

The engine core only ever talks to the `log` facade. [install] routes those
records to the Godot console and keeps a copy in memory, [Logger] is the named
handle that nodes and GDScript use.
*/

use std::{collections::VecDeque, fmt::Display, sync::Mutex};

use godot::prelude::*;
use log::{Level, LevelFilter, Log, Metadata, Record};
use once_cell::sync::Lazy;

/// Oldest entries are dropped once the store grows past this.
const LOG_STORE_CAPACITY: usize = 1_000;

/// The most recent log lines, oldest first.
#[derive(Debug)]
struct LogStore {
    entries: VecDeque<String>,
    capacity: usize,
}

impl LogStore {
    fn new(capacity: usize) -> Self {
        Self {
            entries: VecDeque::with_capacity(capacity),
            capacity,
        }
    }

    fn push(&mut self, message: String) {
        while self.entries.len() >= self.capacity.max(1) {
            self.entries.pop_front();
        }
        self.entries.push_back(message);
    }

    fn to_vec(&self) -> Vec<String> {
        self.entries.iter().cloned().collect()
    }
}

static LOG_STORE: Lazy<Mutex<LogStore>> =
    Lazy::new(|| Mutex::new(LogStore::new(LOG_STORE_CAPACITY)));

fn add_to_log_store(message: String) {
    if let Ok(mut store) = LOG_STORE.lock() {
        store.push(message);
    }
}

/// A copy of every message logged so far.
pub fn log_store() -> Vec<String> {
    LOG_STORE.lock().map(|v| v.to_vec()).unwrap_or_default()
}

fn format_record(level: Level, target: &str, message: impl Display) -> String {
    format!("[{level}] {target}: {message}")
}

struct GodotLog;

impl Log for GodotLog {
    fn enabled(&self, metadata: &Metadata) -> bool {
        metadata.level() <= log::max_level()
    }

    fn log(&self, record: &Record) {
        if !self.enabled(record.metadata()) {
            return;
        }

        let message = format_record(record.level(), record.target(), record.args());
        match record.level() {
            Level::Error => godot_error!("{message}"),
            Level::Warn => godot_warn!("{message}"),
            _ => godot_print!("{message}"),
        }

        add_to_log_store(message);
    }

    fn flush(&self) {}
}

static GODOT_LOG: GodotLog = GodotLog;

/// Send `log` records to Godot. Installing twice only changes the level.
pub fn install(level: LevelFilter) {
    // Fails when a logger is already set, which is fine
    let _ = log::set_logger(&GODOT_LOG);
    log::set_max_level(level);
}

/// A named logger usable from both Rust and GDScript.
#[derive(Debug, Clone, GodotClass)]
pub struct Logger {
    name: String,
}

#[godot_api]
impl RefCountedVirtual for Logger {
    fn init(_base: godot::obj::Base<Self::Base>) -> Self {
        Self {
            name: "Logger".to_string(),
        }
    }
}

#[godot_api]
impl Logger {
    #[func]
    pub fn create(name: GodotString) -> Gd<Logger> {
        Gd::new(Self {
            name: name.to_string(),
        })
    }

    #[func(rename = debug)]
    fn debug_bound(&self, message: Variant) {
        self.debug(message.stringify());
    }

    #[func(rename = info)]
    fn info_bound(&self, message: Variant) {
        self.info(message.stringify());
    }

    #[func(rename = warn)]
    fn warn_bound(&self, message: Variant) {
        self.warn(message.stringify());
    }

    #[func(rename = error)]
    fn error_bound(&self, message: Variant) {
        self.error(message.stringify());
    }

    #[func]
    fn get_log_store() -> PackedStringArray {
        let mut r = PackedStringArray::new();
        for message in log_store() {
            r.push(GodotString::from(&message));
        }

        r
    }
}

impl Logger {
    pub fn debug(&self, message: impl Display) {
        log::debug!(target: self.name.as_str(), "{message}");
    }

    pub fn info(&self, message: impl Display) {
        log::info!(target: self.name.as_str(), "{message}");
    }

    pub fn warn(&self, message: impl Display) {
        log::warn!(target: self.name.as_str(), "{message}");
    }

    pub fn error(&self, message: impl Display) {
        log::error!(target: self.name.as_str(), "{message}");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn record_format() {
        assert_eq!(
            format_record(Level::Warn, "TalkingPuppet", "no skeleton"),
            "[WARN] TalkingPuppet: no skeleton"
        );
    }

    #[test]
    fn store_drops_oldest() {
        let mut store = LogStore::new(3);
        for i in 0..5 {
            store.push(format!("message {i}"));
        }

        assert_eq!(store.to_vec(), vec!["message 2", "message 3", "message 4"]);
    }

    #[test]
    fn global_store_is_bounded() {
        for i in 0..LOG_STORE_CAPACITY + 10 {
            add_to_log_store(format!("message {i}"));
        }

        let store = log_store();
        assert_eq!(store.len(), LOG_STORE_CAPACITY);
        assert_eq!(
            store.last().map(String::as_str),
            Some(format!("message {}", LOG_STORE_CAPACITY + 9).as_str())
        );
    }
}
