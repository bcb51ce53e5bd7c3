use anyhow::{bail, Result};
use chrono::{NaiveTime, Timelike};
use std::time::{Duration, Instant};

use crate::config::Options;
use crate::models::{AlarmDefinition, AlarmKind};
use crate::sched::{ScheduleHandle, Scheduler};
use crate::utils::format_remaining;

/// Period of the display update tick while a timer runs.
pub const TICK_INTERVAL: Duration = Duration::from_millis(2000);

/// Progress indicator and tooltip surface the engine reports into.
pub trait Display {
    fn set_remaining_text(&mut self, text: &str);
    fn set_progress_fraction(&mut self, fraction: f64);
    fn show_attention_dialog(&mut self, message: &str);
    fn set_tooltip_enabled(&mut self, enabled: bool);
}

/// External process launcher. Fire and forget: the engine never observes
/// completion or exit status.
pub trait Launcher {
    fn launch_async(&mut self, command_line: &str);
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EngineStatus {
    Idle,
    Running,
    Paused,
    Repeating,
}

/// The one timer that may run at a time. Elapsed time excludes paused spans:
/// while paused, the clock is frozen at the pause instant.
struct RunningTimer {
    start: Instant,
    target_secs: u32,
    command: String,
    pausable: bool,
    paused_at: Option<Instant>,
    paused_total: Duration,
}

impl RunningTimer {
    fn elapsed_secs(&self, now: Instant) -> u64 {
        let frozen = self.paused_at.unwrap_or(now);
        frozen
            .saturating_duration_since(self.start)
            .saturating_sub(self.paused_total)
            .as_secs()
    }
}

/// Post-expiry command repetition. The first trigger fires at expiry time
/// itself; each trigger launches before decrementing, and the trigger that
/// finds the count at zero only stops.
struct RepeatState {
    remaining: u32,
    handle: ScheduleHandle,
    command: String,
}

/// The alarm lifecycle state machine: Idle -> Running -> (Paused <-> Running)
/// -> expired or stopped -> Idle, with Repeating reachable from expiry and
/// returning to Idle.
///
/// The engine is single-threaded and callback-driven. It owns no clock and
/// no threads: the host invokes `tick` and `repeat_fire` when the handles it
/// got from the scheduler come due, and the discrete commands directly. All
/// observable output goes through the registered collaborators.
pub struct Engine {
    display: Box<dyn Display>,
    launcher: Box<dyn Launcher>,
    scheduler: Box<dyn Scheduler>,
    options: Options,
    running: Option<RunningTimer>,
    tick_handle: Option<ScheduleHandle>,
    repeat: Option<RepeatState>,
}

/// Seconds until the next occurrence of a time of day given as minutes after
/// midnight. Zero when that time is exactly now; wraps across midnight when
/// it has already passed today.
pub fn daily_target_secs(minutes: u32, wall: NaiveTime) -> u32 {
    let target = minutes as i64 * 60;
    let now_secs = wall.num_seconds_from_midnight() as i64;
    (target - now_secs).rem_euclid(86_400) as u32
}

impl Engine {
    pub fn new(
        display: Box<dyn Display>,
        launcher: Box<dyn Launcher>,
        scheduler: Box<dyn Scheduler>,
        options: Options,
    ) -> Self {
        Self {
            display,
            launcher,
            scheduler,
            options: options.sanitized(),
            running: None,
            tick_handle: None,
            repeat: None,
        }
    }

    pub fn status(&self) -> EngineStatus {
        if let Some(running) = &self.running {
            if running.paused_at.is_some() {
                EngineStatus::Paused
            } else {
                EngineStatus::Running
            }
        } else if self.repeat.is_some() {
            EngineStatus::Repeating
        } else {
            EngineStatus::Idle
        }
    }

    /// Handle whose firing should be routed to `tick`.
    pub fn tick_handle(&self) -> Option<ScheduleHandle> {
        self.tick_handle
    }

    /// Handle whose firing should be routed to `repeat_fire`.
    pub fn repeat_handle(&self) -> Option<ScheduleHandle> {
        self.repeat.as_ref().map(|r| r.handle)
    }

    /// Whether the pause command is currently accepted. Daily alarms cannot
    /// be paused.
    pub fn can_pause(&self) -> bool {
        matches!(&self.running, Some(r) if r.paused_at.is_none() && r.pausable)
    }

    /// Arm the given alarm. `wall` is the current local time of day, used to
    /// resolve daily alarms; `now` anchors the monotonic countdown clock.
    pub fn arm(&mut self, alarm: &AlarmDefinition, wall: NaiveTime, now: Instant) -> Result<()> {
        if self.running.is_some() || self.repeat.is_some() {
            bail!("cannot arm: a timer is already active");
        }
        let (target_secs, pausable) = match alarm.kind {
            AlarmKind::Countdown { seconds } => (seconds, true),
            AlarmKind::DailyTime { minutes } => (daily_target_secs(minutes, wall), false),
        };
        self.running = Some(RunningTimer {
            start: now,
            target_secs,
            command: alarm.command.clone(),
            pausable,
            paused_at: None,
            paused_total: Duration::ZERO,
        });
        self.display.set_remaining_text(&alarm.info_text());
        self.display.set_tooltip_enabled(true);
        self.tick_handle = Some(self.scheduler.schedule_periodic(TICK_INTERVAL));
        Ok(())
    }

    /// Stop the running timer early and return to idle.
    pub fn stop(&mut self) -> Result<()> {
        if self.running.take().is_none() {
            bail!("cannot stop: no timer is running");
        }
        if let Some(handle) = self.tick_handle.take() {
            self.scheduler.cancel(handle);
        }
        self.display.set_remaining_text("");
        self.display.set_tooltip_enabled(false);
        self.display.set_progress_fraction(0.0);
        Ok(())
    }

    pub fn pause(&mut self, now: Instant) -> Result<()> {
        let Some(running) = self.running.as_mut() else {
            bail!("cannot pause: no timer is running");
        };
        if running.paused_at.is_some() {
            bail!("timer is already paused");
        }
        if !running.pausable {
            bail!("daily alarms cannot be paused");
        }
        running.paused_at = Some(now);
        Ok(())
    }

    pub fn resume(&mut self, now: Instant) -> Result<()> {
        let Some(running) = self.running.as_mut() else {
            bail!("cannot resume: no timer is running");
        };
        let Some(paused_at) = running.paused_at.take() else {
            bail!("timer is not paused");
        };
        running.paused_total += now.saturating_duration_since(paused_at);
        Ok(())
    }

    /// Periodic update while a timer is armed. Reports remaining time and
    /// progress until the target is reached, then fires expiry exactly once.
    /// A no-op with no timer armed.
    pub fn tick(&mut self, now: Instant) {
        let Some(running) = &self.running else {
            return;
        };
        let elapsed = running.elapsed_secs(now);
        let target = running.target_secs as u64;
        if elapsed < target {
            let remaining = (target - elapsed) as u32;
            let paused = running.paused_at.is_some();
            self.display
                .set_remaining_text(&format_remaining(remaining, paused));
            self.display
                .set_progress_fraction(1.0 - elapsed as f64 / target as f64);
            return;
        }
        self.expire();
    }

    fn expire(&mut self) {
        let Some(running) = self.running.take() else {
            return;
        };
        if let Some(handle) = self.tick_handle.take() {
            self.scheduler.cancel(handle);
        }

        let command = running.command;
        if command.is_empty() || !self.options.suppress_popup_when_command_set {
            self.display.set_progress_fraction(1.0);
            self.display.show_attention_dialog("Time is up!");
        }

        if !command.is_empty() {
            if self.options.repeat_enabled {
                let interval = Duration::from_secs(self.options.repeat_interval_secs as u64);
                let handle = self.scheduler.schedule_periodic(interval);
                self.repeat = Some(RepeatState {
                    remaining: self.options.repeat_count,
                    handle,
                    command,
                });
                // First trigger fires right at expiry, not one interval out.
                self.repeat_fire();
            } else {
                self.launcher.launch_async(&command);
            }
        }

        self.display.set_tooltip_enabled(false);
        self.display.set_progress_fraction(0.0);
    }

    /// Periodic trigger while repeating. Launches then decrements; once the
    /// count is exhausted the trigger only cancels itself. A no-op when not
    /// repeating.
    pub fn repeat_fire(&mut self) {
        let Some(repeat) = self.repeat.as_mut() else {
            return;
        };
        if repeat.remaining == 0 {
            let handle = repeat.handle;
            self.repeat = None;
            self.scheduler.cancel(handle);
            return;
        }
        self.launcher.launch_async(&repeat.command);
        repeat.remaining -= 1;
    }

    /// Cancel a repeating command immediately. A no-op when not repeating.
    pub fn stop_repeating(&mut self) {
        let Some(repeat) = self.repeat.take() else {
            return;
        };
        self.scheduler.cancel(repeat.handle);
    }
}
