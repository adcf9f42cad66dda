use std::time::Duration;

use tracing::{debug, info};

use crate::schedule::{Cadence, Pending, Scheduler, Token};

/// Interval between countdown ticks
pub const TICK_PERIOD: Duration = Duration::from_secs(1);

/// Upper bound for the minutes and seconds fields
const FIELD_MAX: u64 = 59;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Field {
    Hours,
    Minutes,
    Seconds,
}

impl Field {
    pub fn next(self) -> Self {
        match self {
            Field::Hours => Field::Minutes,
            Field::Minutes => Field::Seconds,
            Field::Seconds => Field::Hours,
        }
    }

    pub fn prev(self) -> Self {
        match self {
            Field::Hours => Field::Seconds,
            Field::Minutes => Field::Hours,
            Field::Seconds => Field::Minutes,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Field::Hours => "Hours",
            Field::Minutes => "Minutes",
            Field::Seconds => "Seconds",
        }
    }

    fn clamp(self, value: u64) -> u64 {
        match self {
            Field::Hours => value,
            Field::Minutes | Field::Seconds => value.min(FIELD_MAX),
        }
    }
}

/// Result of a tick that was accepted by the countdown
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Tick {
    Counting,
    Finished,
}

/// Countdown timer state
///
/// `pending` holds the tick handle and is `Some` exactly while the countdown
/// is running, so every path that stops the run also cancels the tick.
#[derive(Debug, Default)]
pub struct Countdown {
    hours: u64,
    minutes: u64,
    seconds: u64,
    total_seconds: u64,
    time_left: u64,
    running: bool,
    pending: Option<Pending>,
}

impl Countdown {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn total_seconds(&self) -> u64 {
        self.total_seconds
    }

    pub fn time_left(&self) -> u64 {
        self.time_left
    }

    pub fn is_running(&self) -> bool {
        self.running
    }

    /// Duration fields can only change before a run starts or after a reset
    pub fn is_editable(&self) -> bool {
        !self.running && self.time_left == 0
    }

    /// A run completed on its own (as opposed to never having started)
    pub fn is_finished(&self) -> bool {
        self.time_left == 0 && self.total_seconds > 0
    }

    pub fn owns(&self, token: Token) -> bool {
        self.pending.as_ref().is_some_and(|p| p.owns(token))
    }

    pub fn field(&self, field: Field) -> u64 {
        match field {
            Field::Hours => self.hours,
            Field::Minutes => self.minutes,
            Field::Seconds => self.seconds,
        }
    }

    pub fn set_field(&mut self, field: Field, value: u64) {
        if !self.is_editable() {
            debug!(?field, value, "duration locked while a run is in progress");
            return;
        }
        let value = field.clamp(value);
        match field {
            Field::Hours => self.hours = value,
            Field::Minutes => self.minutes = value,
            Field::Seconds => self.seconds = value,
        }
    }

    /// Set a field from raw text, the way a numeric input box would
    pub fn set_field_input(&mut self, field: Field, input: &str) {
        self.set_field(field, parse_number_input(input));
    }

    pub fn set_hours(&mut self, hours: u64) {
        self.set_field(Field::Hours, hours);
    }

    pub fn set_minutes(&mut self, minutes: u64) {
        self.set_field(Field::Minutes, minutes);
    }

    pub fn set_seconds(&mut self, seconds: u64) {
        self.set_field(Field::Seconds, seconds);
    }

    /// Duration described by the configured fields
    pub fn configured_total(&self) -> u64 {
        self.hours
            .saturating_mul(3600)
            .saturating_add(self.minutes * 60)
            .saturating_add(self.seconds)
    }

    /// Start a fresh run, or resume a paused one
    pub fn start(&mut self, scheduler: &dyn Scheduler) {
        if self.running {
            return;
        }

        if self.time_left == 0 {
            let total = self.configured_total();
            if total == 0 {
                debug!("start ignored: duration is zero");
                return;
            }
            self.total_seconds = total;
            self.time_left = total;
            info!(total, "countdown started");
        } else {
            info!(remaining = self.time_left, "countdown resumed");
        }

        self.running = true;
        self.pending = Some(scheduler.schedule(Cadence::Every(TICK_PERIOD)));
    }

    pub fn pause(&mut self) {
        if self.running {
            info!(remaining = self.time_left, "countdown paused");
        }
        self.running = false;
        self.pending = None;
    }

    pub fn reset(&mut self) {
        self.running = false;
        self.pending = None;
        self.time_left = 0;
        self.total_seconds = 0;
        debug!("countdown reset");
    }

    /// Start/pause as a single control
    pub fn toggle(&mut self, scheduler: &dyn Scheduler) {
        if self.running {
            self.pause();
        } else {
            self.start(scheduler);
        }
    }

    /// Apply one tick if `token` belongs to the current run
    pub fn on_wakeup(&mut self, token: Token) -> Option<Tick> {
        if !self.owns(token) {
            return None;
        }
        if !self.running || self.time_left == 0 {
            self.pending = None;
            return None;
        }

        self.time_left -= 1;
        if self.time_left == 0 {
            self.running = false;
            self.pending = None;
            info!(total = self.total_seconds, "countdown finished");
            Some(Tick::Finished)
        } else {
            Some(Tick::Counting)
        }
    }

    /// Fraction of the run already elapsed, in `[0, 1]`
    pub fn progress(&self) -> f64 {
        if self.total_seconds == 0 {
            return 0.0;
        }
        (self.total_seconds - self.time_left) as f64 / self.total_seconds as f64
    }
}

/// Format seconds as `HH:MM:SS`
pub fn format_hms(total_secs: u64) -> String {
    let hours = total_secs / 3600;
    let minutes = (total_secs % 3600) / 60;
    let seconds = total_secs % 60;
    format!("{:02}:{:02}:{:02}", hours, minutes, seconds)
}

/// Parse the leading integer of `input`; anything non-numeric or negative is 0
pub fn parse_number_input(input: &str) -> u64 {
    let s = input.trim();
    let (negative, rest) = match s.strip_prefix('-') {
        Some(rest) => (true, rest),
        None => (false, s.strip_prefix('+').unwrap_or(s)),
    };

    let end = rest.find(|c: char| !c.is_ascii_digit()).unwrap_or(rest.len());
    let digits = &rest[..end];
    if negative || digits.is_empty() {
        return 0;
    }
    digits.parse().unwrap_or(u64::MAX)
}
