//! Shared test support: a scripted location source the tests pump by hand,
//! plus pipeline construction helpers.

#![allow(dead_code)]

use std::path::PathBuf;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use tempfile::TempDir;

use blackbox::{
    CaptureConfig, FixCallback, JourneyTracker, LocationSource, RawFix, Result, TelemetryError,
    TelemetryStore,
};

struct SourceInner {
    callback: Mutex<Option<FixCallback>>,
    subscribe_count: AtomicU32,
}

/// Fix source driven entirely by the test: a fix is delivered only when the
/// test calls `SourceHandle::deliver`, so capture scenarios are deterministic.
pub struct ScriptedSource {
    inner: Arc<SourceInner>,
    permission_granted: bool,
}

/// Test-side handle for pumping fixes into whatever is subscribed.
#[derive(Clone)]
pub struct SourceHandle {
    inner: Arc<SourceInner>,
}

impl ScriptedSource {
    pub fn granted() -> (Self, SourceHandle) {
        Self::with_permission(true)
    }

    pub fn denied() -> (Self, SourceHandle) {
        Self::with_permission(false)
    }

    fn with_permission(permission_granted: bool) -> (Self, SourceHandle) {
        let inner = Arc::new(SourceInner {
            callback: Mutex::new(None),
            subscribe_count: AtomicU32::new(0),
        });
        (
            Self {
                inner: Arc::clone(&inner),
                permission_granted,
            },
            SourceHandle { inner },
        )
    }
}

impl LocationSource for ScriptedSource {
    fn subscribe(&mut self, _interval: Duration, on_fix: FixCallback) -> Result<()> {
        if !self.permission_granted {
            return Err(TelemetryError::PermissionDenied(
                "location access not granted".to_string(),
            ));
        }
        self.inner.subscribe_count.fetch_add(1, Ordering::SeqCst);
        *self.inner.callback.lock().unwrap() = Some(on_fix);
        Ok(())
    }

    fn unsubscribe(&mut self) {
        self.inner.callback.lock().unwrap().take();
    }
}

impl SourceHandle {
    /// Push one fix at the current subscriber. Returns false when nothing is
    /// subscribed (after stop, or when permission was denied).
    pub fn deliver(&self, fix: RawFix) -> bool {
        match self.inner.callback.lock().unwrap().as_mut() {
            Some(on_fix) => {
                on_fix(fix);
                true
            }
            None => false,
        }
    }

    pub fn is_subscribed(&self) -> bool {
        self.inner.callback.lock().unwrap().is_some()
    }

    pub fn subscribe_count(&self) -> u32 {
        self.inner.subscribe_count.load(Ordering::SeqCst)
    }
}

pub fn fix(latitude: f64, longitude: f64, speed_m_s: f64, timestamp_ms: i64) -> RawFix {
    RawFix {
        latitude,
        longitude,
        speed_m_s,
        timestamp_ms,
    }
}

/// Build a tracker over a temp-file store and return it with the database
/// path, so tests can open their own reader handles against the same medium.
pub fn tracker_over(tmp: &TempDir, source: ScriptedSource) -> (JourneyTracker, PathBuf) {
    let _ = env_logger::builder().is_test(true).try_init();

    let db_path = tmp.path().join("blackbox.sqlite");
    let store = TelemetryStore::open(&db_path).expect("failed to open store");
    let tracker = JourneyTracker::new(Box::new(source), store, CaptureConfig::default())
        .expect("failed to build tracker");
    (tracker, db_path)
}
