// src/quiz/countdown.rs

use std::{sync::Arc, time::Duration};

use chrono::{DateTime, Utc};
use tokio::{sync::watch, task::JoinHandle, time::MissedTickBehavior};

use crate::config::TICK_INTERVAL_MS;

/// Source of wall-clock time. Remaining time is always recomputed from the
/// wall clock, so a delayed tick never accumulates drift.
pub trait Clock: Send + Sync + 'static {
    fn now(&self) -> DateTime<Utc>;
}

#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// Seconds left for an attempt, never negative.
///
/// Partial seconds round up, so 0.2 s left still counts as one second. A
/// start time in the future counts as just started. Arithmetic saturates, so
/// an absurd duration from the server reads as a very long attempt.
pub fn remaining_seconds(start: DateTime<Utc>, duration_minutes: i64, now: DateTime<Utc>) -> i64 {
    let total_ms = duration_minutes.saturating_mul(60_000);
    let elapsed_ms = now.signed_duration_since(start).num_milliseconds().max(0);
    let remaining_ms = total_ms.saturating_sub(elapsed_ms);
    if remaining_ms <= 0 {
        return 0;
    }
    (remaining_ms - 1) / 1000 + 1
}

/// `MM:SS`, minutes not wrapped at 60.
pub fn format_mm_ss(seconds: i64) -> String {
    let seconds = seconds.max(0);
    format!("{:02}:{:02}", seconds / 60, seconds % 60)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Countdown {
    pub start: DateTime<Utc>,
    pub duration_minutes: i64,
}

impl Countdown {
    pub fn new(start: DateTime<Utc>, duration_minutes: i64) -> Self {
        Self {
            start,
            duration_minutes,
        }
    }

    pub fn remaining(&self, now: DateTime<Utc>) -> i64 {
        remaining_seconds(self.start, self.duration_minutes, now)
    }

    /// Starts ticking once per second on the tokio runtime.
    ///
    /// `on_time_up` runs exactly once, when the remaining time reaches zero,
    /// and the ticker stops afterwards. Dropping the handle stops the ticker
    /// without firing the callback.
    pub fn spawn<C, F>(self, clock: Arc<C>, on_time_up: F) -> CountdownHandle
    where
        C: Clock,
        F: FnOnce() + Send + 'static,
    {
        let initial = self.remaining(clock.now());
        let (tx, rx) = watch::channel(initial);

        let task = tokio::spawn(async move {
            let mut interval = tokio::time::interval(Duration::from_millis(TICK_INTERVAL_MS));
            interval.set_missed_tick_behavior(MissedTickBehavior::Skip);

            loop {
                interval.tick().await;
                let remaining = self.remaining(clock.now());
                let _ = tx.send(remaining);

                if remaining <= 0 {
                    tracing::info!("Countdown reached zero, submitting attempt");
                    on_time_up();
                    break;
                }
            }
        });

        CountdownHandle {
            task,
            remaining: rx,
        }
    }
}

/// Owner of a running countdown. The ticker is aborted on drop.
#[derive(Debug)]
pub struct CountdownHandle {
    task: JoinHandle<()>,
    remaining: watch::Receiver<i64>,
}

impl CountdownHandle {
    /// Most recent remaining-seconds value.
    pub fn remaining(&self) -> i64 {
        *self.remaining.borrow()
    }

    /// Receiver that observes every tick.
    pub fn subscribe(&self) -> watch::Receiver<i64> {
        self.remaining.clone()
    }

    pub fn is_finished(&self) -> bool {
        self.task.is_finished()
    }

    pub fn stop(&self) {
        self.task.abort();
    }
}

impl Drop for CountdownHandle {
    fn drop(&mut self) {
        self.task.abort();
    }
}
