//! Per-source diagnostics for a check run: start/finish messages and the
//! measured response time. Used for operator output only; the checker never
//! branches on what is recorded here.

use std::collections::HashMap;
use std::sync::Mutex;
use std::time::{Duration, Instant};

use crate::source::Source;

pub trait CheckRecorder: Send + Sync {
    /// A check of `source` starts now.
    fn begin(&self, source: &Source);

    /// Final verdict text for `url`; also stops its clock.
    fn final_message(&self, url: &str, text: &str);

    /// Elapsed time between `begin` and `final_message` for `url`.
    fn response_time(&self, url: &str) -> Duration;

    /// The run is over; forget everything.
    fn end(&self);
}

#[derive(Debug, Clone)]
struct Entry {
    started: Instant,
    elapsed: Option<Duration>,
}

/// In-memory recorder that mirrors every transition to `tracing`.
#[derive(Debug)]
pub struct CheckLog {
    entries: Mutex<HashMap<String, Entry>>,
    /// Reported for sources that were never measured.
    unmeasured: Duration,
}

impl CheckLog {
    pub fn new(unmeasured: Duration) -> Self {
        Self {
            entries: Mutex::new(HashMap::new()),
            unmeasured,
        }
    }
}

impl CheckRecorder for CheckLog {
    fn begin(&self, source: &Source) {
        tracing::debug!(source = %source.url, name = %source.name, "check started");
        self.entries.lock().unwrap_or_else(|e| e.into_inner()).insert(
            source.url.clone(),
            Entry {
                started: Instant::now(),
                elapsed: None,
            },
        );
    }

    fn final_message(&self, url: &str, text: &str) {
        let mut entries = self.entries.lock().unwrap_or_else(|e| e.into_inner());
        let Some(entry) = entries.get_mut(url) else {
            tracing::debug!(source = %url, "final message for a source that never started");
            return;
        };
        let elapsed = entry.started.elapsed();
        entry.elapsed = Some(elapsed);
        tracing::info!(
            source = %url,
            elapsed_ms = elapsed.as_millis() as u64,
            "{}",
            text
        );
    }

    fn response_time(&self, url: &str) -> Duration {
        self.entries
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .get(url)
            .and_then(|e| e.elapsed)
            .unwrap_or(self.unmeasured)
    }

    fn end(&self) {
        self.entries.lock().unwrap_or_else(|e| e.into_inner()).clear();
    }
}
