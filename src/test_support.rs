//! Shared fixtures for unit tests.

use chrono::{DateTime, Days, Local, NaiveDate, TimeZone, Utc};
use mockable::Clock;
use std::io;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, PoisonError};
use tokio::sync::Notify;
use tracing::subscriber::DefaultGuard;
use tracing_subscriber::EnvFilter;

/// Routes engine logs to the test harness, filtered by `RUST_LOG`.
pub(crate) fn init_tracing() {
    // A subscriber may already be installed by another test in the binary.
    let _installed = tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_test_writer()
        .try_init()
        .is_ok();
}

/// Log sink for asserting on emitted events.
///
/// The subscriber is installed for the current thread only, so tests using
/// it run on the current-thread runtime.
#[derive(Debug, Clone, Default)]
pub(crate) struct LogCapture {
    buffer: Arc<Mutex<Vec<u8>>>,
}

impl LogCapture {
    /// Routes every event at `DEBUG` or above into this capture until the
    /// guard drops.
    pub(crate) fn install(&self) -> DefaultGuard {
        let writer = self.clone();
        let subscriber = tracing_subscriber::fmt()
            .with_writer(move || writer.clone())
            .with_ansi(false)
            .with_max_level(tracing::Level::DEBUG)
            .finish();
        tracing::subscriber::set_default(subscriber)
    }

    /// Returns everything logged so far.
    pub(crate) fn contents(&self) -> String {
        let buffer = self.buffer.lock().unwrap_or_else(PoisonError::into_inner);
        String::from_utf8_lossy(&buffer).into_owned()
    }
}

impl io::Write for LogCapture {
    fn write(&mut self, bytes: &[u8]) -> io::Result<usize> {
        self.buffer
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .extend_from_slice(bytes);
        Ok(bytes.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

/// One-shot pause point for interleaving concurrent operations.
///
/// Once armed, the first caller of [`Gate::pass`] parks until the test
/// calls [`Gate::open`].
#[derive(Debug, Default)]
pub(crate) struct Gate {
    armed: AtomicBool,
    reached: Notify,
    release: Notify,
}

impl Gate {
    pub(crate) fn arm(&self) {
        self.armed.store(true, Ordering::SeqCst);
    }

    pub(crate) async fn pass(&self) {
        if self.armed.swap(false, Ordering::SeqCst) {
            self.reached.notify_one();
            self.release.notified().await;
        }
    }

    /// Waits until a caller is parked at the gate.
    pub(crate) async fn reached(&self) {
        self.reached.notified().await;
    }

    pub(crate) fn open(&self) {
        self.release.notify_one();
    }
}

/// Clock frozen at a settable instant.
#[derive(Debug)]
pub(crate) struct FixedClock {
    now: Mutex<DateTime<Utc>>,
}

impl FixedClock {
    /// Freezes the clock at 09:00 UTC on `date`.
    pub(crate) fn on(date: NaiveDate) -> Self {
        let now = date
            .and_hms_opt(9, 0, 0)
            .map(|naive| Utc.from_utc_datetime(&naive))
            .expect("09:00 exists on every date");
        Self {
            now: Mutex::new(now),
        }
    }

    /// Moves the clock forward by whole days.
    pub(crate) fn advance_days(&self, days: u64) {
        let mut now = self.now.lock().unwrap_or_else(PoisonError::into_inner);
        *now = now
            .checked_add_days(Days::new(days))
            .expect("advanced time should stay in range");
    }

    /// Returns the frozen calendar date.
    pub(crate) fn today(&self) -> NaiveDate {
        self.utc().date_naive()
    }
}

impl Clock for FixedClock {
    fn local(&self) -> DateTime<Local> {
        self.utc().with_timezone(&Local)
    }

    fn utc(&self) -> DateTime<Utc> {
        *self.now.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// Builds a calendar date, panicking on invalid input.
pub(crate) fn date(year: i32, month: u32, day: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(year, month, day).expect("test dates should be valid")
}
