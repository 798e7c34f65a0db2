//! # Location Sampler
//!
//! Thin subscription wrapper over an external fix source. The sampler does
//! no transformation; it tags each delivered fix with the journey id that
//! was active at subscribe time and forwards it to the recorder. The id is
//! deliberately captured once, not re-read per fix, so a fix can never be
//! tagged with a journey that already stopped.

use std::time::Duration;

use log::debug;

use crate::error::Result;
use crate::recorder::RecorderHandle;
use crate::types::RawFix;

/// Callback the external source invokes for each delivered fix. May be
/// called from an arbitrary source-internal thread.
pub type FixCallback = Box<dyn FnMut(RawFix) + Send>;

/// The external fix-producing capability (platform location services, a
/// replay file, a simulator). `subscribe` must fail with `PermissionDenied`
/// when access is not granted, and `unsubscribe` must synchronously stop
/// deliveries: once it returns, the callback is never invoked again.
pub trait LocationSource: Send {
    fn subscribe(&mut self, interval: Duration, on_fix: FixCallback) -> Result<()>;
    fn unsubscribe(&mut self);
}

/// Owns the subscription lifecycle against a `LocationSource`.
pub struct LocationSampler {
    source: Box<dyn LocationSource>,
    interval: Duration,
    subscribed: bool,
}

impl LocationSampler {
    pub fn new(source: Box<dyn LocationSource>, interval: Duration) -> Self {
        Self {
            source,
            interval,
            subscribed: false,
        }
    }

    /// Subscribe and route fixes for `journey_id` into the recorder.
    /// A `PermissionDenied` from the source propagates to the caller and no
    /// fixes are ever delivered.
    pub fn begin(&mut self, journey_id: &str, recorder: RecorderHandle) -> Result<()> {
        let journey_id = journey_id.to_string();
        self.source.subscribe(
            self.interval,
            Box::new(move |fix| recorder.submit(&journey_id, &fix)),
        )?;
        self.subscribed = true;
        debug!("[Sampler] subscribed at {:?} interval", self.interval);
        Ok(())
    }

    /// Sever the subscription. Safe to call when not subscribed.
    pub fn end(&mut self) {
        if self.subscribed {
            self.source.unsubscribe();
            self.subscribed = false;
            debug!("[Sampler] unsubscribed");
        }
    }
}
