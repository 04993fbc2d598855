use std::sync::Mutex;

use log::Level;

/// Destination of the diagnostics emitted by the pipeline components.
///
/// Every component receives its sink at construction so that tests can swap
/// [`LogSink`] for a [`MemorySink`].
pub trait EventSink: Send + Sync {
    fn record(&self, level: Level, target: &str, message: &str);
}

/// Emits a formatted message on an [`EventSink`], tagged with the caller's module.
#[macro_export]
macro_rules! emit {
    ($sink:expr, $level:expr, $($arg:tt)+) => {
        $sink.record($level, module_path!(), &format!($($arg)+))
    };
}

/// Forwards to the `log` facade.
#[derive(Debug, Default, Clone, Copy)]
pub struct LogSink;

impl EventSink for LogSink {
    fn record(&self, level: Level, target: &str, message: &str) {
        log::log!(target: target, level, "{message}");
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Event {
    pub level: Level,
    pub target: String,
    pub message: String,
}

/// Keeps every event in memory.
#[derive(Debug, Default)]
pub struct MemorySink {
    events: Mutex<Vec<Event>>,
}

impl MemorySink {
    pub fn events(&self) -> Vec<Event> {
        self.events
            .lock()
            .map(|events| events.clone())
            .unwrap_or_default()
    }

    pub fn contains(&self, level: Level, needle: &str) -> bool {
        self.events()
            .iter()
            .any(|e| e.level == level && e.message.contains(needle))
    }
}

impl EventSink for MemorySink {
    fn record(&self, level: Level, target: &str, message: &str) {
        match self.events.lock() {
            Ok(mut events) => events.push(Event {
                level,
                target: target.to_string(),
                message: message.to_string(),
            }),
            Err(e) => log::error!("Couldn't record event: {e}"),
        }
    }
}
