//! # Journey Lifecycle
//!
//! Two-state machine (`Idle` / `Tracking`) owning the notion of "current
//! journey". Journey ids are minted here and only here, one per explicit
//! `start()`; the sampler and recorder receive the id as a parameter and
//! never read shared state.
//!
//! Every transition takes `&mut self`, so a `start()` cannot interleave with
//! an in-flight `stop()` flush.

use log::{debug, info, warn};
use uuid::Uuid;

use crate::error::Result;
use crate::persistence::TelemetryStore;
use crate::recorder::Recorder;
use crate::sampler::{LocationSampler, LocationSource};
use crate::types::CaptureConfig;

enum TrackingState {
    Idle,
    Tracking { journey_id: String },
}

/// Journey lifecycle manager. Wires the sampler, recorder and store together
/// and exposes the start/stop surface the UI layer calls.
pub struct JourneyTracker {
    sampler: LocationSampler,
    recorder: Recorder,
    state: TrackingState,
    config: CaptureConfig,
}

impl JourneyTracker {
    /// Build the capture pipeline over an external fix source and a store
    /// handle. The store handle moves into the recorder's writer thread,
    /// which becomes the only writer in the process.
    pub fn new(
        source: Box<dyn LocationSource>,
        store: TelemetryStore,
        config: CaptureConfig,
    ) -> Result<Self> {
        let recorder = Recorder::spawn(store, config.queue_capacity)?;
        let sampler = LocationSampler::new(source, config.interval());

        Ok(Self {
            sampler,
            recorder,
            state: TrackingState::Idle,
            config,
        })
    }

    /// Start capturing a new journey and return its freshly minted id.
    ///
    /// Calling `start()` while already tracking stops the prior journey
    /// first; no two journeys ever capture concurrently. Fails with
    /// `PermissionDenied` when the source cannot deliver fixes, in which
    /// case the state remains `Idle`.
    pub fn start(&mut self) -> Result<String> {
        if self.is_tracking() {
            info!("[JourneyTracker] start() while tracking, restarting with a fresh id");
            self.stop();
        }

        let journey_id = Uuid::new_v4().to_string();
        self.sampler.begin(&journey_id, self.recorder.handle())?;

        info!("[JourneyTracker] tracking started, journey {}", journey_id);
        self.state = TrackingState::Tracking {
            journey_id: journey_id.clone(),
        };
        Ok(journey_id)
    }

    /// Stop capturing. No-op when idle.
    ///
    /// Unsubscribes the sampler first, guaranteeing nothing new is enqueued,
    /// then drains pending writes bounded by the configured timeout. A
    /// flush timeout is logged and shutdown proceeds; the remaining queued
    /// points are discarded.
    pub fn stop(&mut self) {
        let journey_id = match &self.state {
            TrackingState::Idle => {
                debug!("[JourneyTracker] stop() while idle, nothing to do");
                return;
            }
            TrackingState::Tracking { journey_id } => journey_id.clone(),
        };

        self.sampler.end();
        if let Err(err) = self.recorder.flush(self.config.flush_timeout()) {
            warn!("[JourneyTracker] {}", err);
        }

        self.state = TrackingState::Idle;
        info!("[JourneyTracker] tracking stopped, journey {}", journey_id);
    }

    /// Poll accessor for the current journey id; `None` when idle. The UI
    /// layer reads this for display, it is never pushed.
    pub fn current_journey(&self) -> Option<&str> {
        match &self.state {
            TrackingState::Idle => None,
            TrackingState::Tracking { journey_id } => Some(journey_id),
        }
    }

    pub fn is_tracking(&self) -> bool {
        matches!(self.state, TrackingState::Tracking { .. })
    }

    /// Points dropped so far because the recorder queue was full.
    pub fn overflow_count(&self) -> u64 {
        self.recorder.overflow_count()
    }
}

impl Drop for JourneyTracker {
    fn drop(&mut self) {
        // Make drop of a still-tracking tracker behave like an explicit stop
        // so the writer thread is flushed and joined.
        self.stop();
    }
}
