/*!
 # Schedule windows

 A schedule describes when a device should be active: within every cycle of
 `window_end` seconds the device is active on `[window_start, window_end)`,
 repeated `repeat_count` times. Inverted schedules switch the device off
 during the window and on outside it.
*/

use tracing::warn;

use crate::Error;

/// Time window driving a device's power state
#[derive(Debug, Clone, PartialEq)]
pub struct Schedule {
    window_start: f32,
    window_end: f32,
    repeat_count: u32,
    /// Active window means OFF instead of ON
    pub inverted: bool,
    /// Disabled schedules are skipped without being marked done
    pub enabled: bool,
    progress: f32,
    done: bool,
}

impl Default for Schedule {
    fn default() -> Self {
        Self::new(0.0, 10.0, 1, false)
    }
}

impl Schedule {
    /// Creates a schedule. An invalid window is accepted but the schedule
    /// starts out done and never drives a toggle.
    pub fn new(window_start: f32, window_end: f32, repeat_count: u32, inverted: bool) -> Self {
        let mut schedule = Self {
            window_start,
            window_end,
            repeat_count: repeat_count.max(1),
            inverted,
            enabled: true,
            progress: 0.0,
            done: false,
        };
        if let Err(e) = schedule.validate() {
            warn!("{}, schedule will never toggle", e);
            schedule.done = true;
        }
        schedule
    }

    /// Checks `0 <= window_start < window_end`
    pub fn validate(&self) -> Result<(), Error> {
        let valid = self.window_start >= 0.0
            && self.window_end > 0.0
            && self.window_start < self.window_end;
        if valid {
            Ok(())
        } else {
            Err(Error::InvalidScheduleWindow {
                start: self.window_start,
                end: self.window_end,
            })
        }
    }

    /// Offset into each cycle where the active window opens (seconds)
    pub fn window_start(&self) -> f32 {
        self.window_start
    }

    /// End of the active window, which is also the cycle length (seconds)
    pub fn window_end(&self) -> f32 {
        self.window_end
    }

    /// Number of cycles before the schedule is done
    pub fn repeat_count(&self) -> u32 {
        self.repeat_count
    }

    /// Replaces the window, re-validating it and clearing progress
    pub fn set_window(&mut self, window_start: f32, window_end: f32) {
        *self = Self {
            inverted: self.inverted,
            enabled: self.enabled,
            ..Self::new(window_start, window_end, self.repeat_count, self.inverted)
        };
    }

    /// Sets the cycle count, at least one
    pub fn set_repeat_count(&mut self, repeat_count: u32) {
        self.repeat_count = repeat_count.max(1);
    }

    /// Elapsed time divided by cycle length, as of the last evaluation
    pub fn progress(&self) -> f32 {
        self.progress
    }

    /// Fraction of the whole schedule (all repeats) that has elapsed
    pub fn total_progress(&self) -> f32 {
        (self.progress / self.repeat_count as f32).min(1.0)
    }

    /// Whether all repeats have run or the window is invalid
    pub fn is_done(&self) -> bool {
        self.done
    }

    /// Total scheduled duration in seconds
    pub fn span(&self) -> f32 {
        self.window_end * self.repeat_count as f32
    }

    /// Whether `elapsed` falls inside the active part of its cycle
    pub fn in_window(&self, elapsed: f32) -> bool {
        if self.window_end <= 0.0 || elapsed < 0.0 {
            return false;
        }
        let phase = elapsed % self.window_end;
        phase >= self.window_start && phase < self.window_end
    }

    /// Power state the schedule asks for at `elapsed`, or `None` once the
    /// schedule no longer drives the device.
    pub fn desired_state(&self, elapsed: f32) -> Option<bool> {
        if self.done || !self.enabled || self.validate().is_err() || elapsed >= self.span() {
            return None;
        }
        Some(self.in_window(elapsed) != self.inverted)
    }

    /// Updates progress for `elapsed` and returns the desired power state.
    /// Marks the schedule done once all repeats have run.
    pub(crate) fn advance(&mut self, elapsed: f32) -> Option<bool> {
        if self.done || !self.enabled {
            return None;
        }
        self.progress = elapsed / self.window_end;
        if elapsed >= self.span() {
            self.done = true;
            return None;
        }
        self.desired_state(elapsed)
    }

    /// Clears progress; invalid windows stay done
    pub(crate) fn reset(&mut self) {
        self.progress = 0.0;
        self.done = self.validate().is_err();
    }
}
