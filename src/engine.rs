/*!
 # Schedule engine

 Owns the schedule clock. Each [`ScheduleEngine::tick`] evaluates every
 device's [`crate::Schedule`] against the elapsed time and toggles the
 devices whose desired power state changed. Toggles go through the
 connection managers and never wait for the write to complete.
*/

use std::time::Duration;

use tokio::time::Instant;
use tracing::{debug, info, instrument};

use crate::config::EngineConfig;
use crate::connection::DispatchOutcome;
use crate::registry::DeviceRegistry;
use crate::transport::Transport;

pub struct ScheduleEngine {
    config: EngineConfig,
    /// Time accumulated before the current run
    accumulated: Duration,
    /// Set while running
    resumed_at: Option<Instant>,
}

impl ScheduleEngine {
    /// Creates a paused engine at zero elapsed time
    pub fn new(config: EngineConfig) -> Self {
        Self {
            config,
            accumulated: Duration::ZERO,
            resumed_at: None,
        }
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn elapsed(&self) -> Duration {
        self.accumulated + self.resumed_at.map_or(Duration::ZERO, |t| t.elapsed())
    }

    pub fn elapsed_seconds(&self) -> f32 {
        self.elapsed().as_secs_f32()
    }

    pub fn is_paused(&self) -> bool {
        self.resumed_at.is_none()
    }

    /// True once time has accumulated since the last reset
    pub fn is_running(&self) -> bool {
        self.elapsed() > Duration::ZERO
    }

    pub fn pause(&mut self) {
        if let Some(resumed_at) = self.resumed_at.take() {
            self.accumulated += resumed_at.elapsed();
            debug!("Schedule paused at {:.2}s", self.accumulated.as_secs_f32());
        }
    }

    /// Continues from the previously accumulated time
    pub fn resume(&mut self) {
        if self.resumed_at.is_none() {
            debug!("Schedule resumed at {:.2}s", self.accumulated.as_secs_f32());
            self.resumed_at = Some(Instant::now());
        }
    }

    /// Zeroes the clock and every schedule's progress, then pauses
    #[instrument(skip_all)]
    pub fn reset<T: Transport>(&mut self, registry: &mut DeviceRegistry<T>) {
        self.accumulated = Duration::ZERO;
        self.resumed_at = None;
        for device in registry.iter_mut() {
            device.schedule.reset();
            device.power_pending = false;
        }
        info!("Schedule reset");
    }

    /// Advances the clock and applies schedules. Returns false while paused.
    pub fn tick<T: Transport>(&mut self, registry: &mut DeviceRegistry<T>) -> bool {
        if self.is_paused() {
            return false;
        }
        self.evaluate_at(self.elapsed_seconds(), registry);
        true
    }

    /// Applies every schedule at an explicit elapsed time.
    /// Returns the number of devices toggled.
    pub fn evaluate_at<T: Transport>(&self, elapsed: f32, registry: &mut DeviceRegistry<T>) -> usize {
        let mut toggled = 0;
        for device in registry.iter_mut() {
            let Some(desired) = device.schedule.advance(elapsed) else {
                continue;
            };

            if desired != device.profile.is_on {
                debug!(
                    device = device.identity(),
                    "Schedule wants {} at {:.2}s",
                    if desired { "on" } else { "off" },
                    elapsed
                );
                let outcome = device.toggle();
                device.power_pending =
                    self.config.resync_dropped_toggles && outcome != DispatchOutcome::Sent;
                toggled += 1;
            } else if device.power_pending && device.set_power() == DispatchOutcome::Sent {
                debug!(device = device.identity(), "Resent dropped power command");
                device.power_pending = false;
            }
        }
        toggled
    }
}
