use std::time::{Duration, Instant};

/// Tick resolution the event loop drives the timer with
pub const TICK_RATE: Duration = Duration::from_millis(100);

/// Durations offered by the timer cycle key, in seconds (0 = untimed)
pub const TIMER_CHOICES: [u64; 7] = [0, 10, 15, 20, 30, 45, 60];

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TimerTick {
    /// Elapsed share of the duration, clamped to [0, 100]
    pub progress: f64,
    /// True on the single tick that crosses the deadline
    pub expired: bool,
}

/// Countdown for a single card.
///
/// Time is passed in rather than read, so the event loop owns the clock.
#[derive(Debug, Default)]
pub struct CountdownTimer {
    duration: Option<Duration>,
    started_at: Option<Instant>,
    progress: f64,
}

impl CountdownTimer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn start(&mut self, duration_secs: u64, now: Instant) {
        self.stop();
        if duration_secs == 0 {
            return;
        }
        self.duration = Some(Duration::from_secs(duration_secs));
        self.started_at = Some(now);
    }

    pub fn stop(&mut self) {
        self.duration = None;
        self.started_at = None;
        self.progress = 0.0;
    }

    pub fn is_running(&self) -> bool {
        self.started_at.is_some()
    }

    /// Last reported progress, for rendering between ticks
    pub fn progress(&self) -> f64 {
        self.progress
    }

    pub fn remaining(&self, now: Instant) -> Option<Duration> {
        let (duration, started_at) = (self.duration?, self.started_at?);
        Some(duration.saturating_sub(now.saturating_duration_since(started_at)))
    }

    pub fn tick(&mut self, now: Instant) -> TimerTick {
        let (Some(duration), Some(started_at)) = (self.duration, self.started_at) else {
            return TimerTick {
                progress: self.progress,
                expired: false,
            };
        };

        let elapsed = now.saturating_duration_since(started_at);
        if elapsed >= duration {
            // Stops itself; later ticks are inert until the next start
            self.stop();
            return TimerTick {
                progress: 100.0,
                expired: true,
            };
        }

        self.progress = (elapsed.as_secs_f64() / duration.as_secs_f64() * 100.0).clamp(0.0, 100.0);
        TimerTick {
            progress: self.progress,
            expired: false,
        }
    }
}

/// Next entry of [`TIMER_CHOICES`] after `current`, wrapping around
pub fn next_timer_choice(current: u64) -> u64 {
    TIMER_CHOICES
        .iter()
        .copied()
        .find(|&secs| secs > current)
        .unwrap_or(TIMER_CHOICES[0])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_zero_duration_never_runs() {
        let now = Instant::now();
        let mut timer = CountdownTimer::new();
        timer.start(0, now);
        assert!(!timer.is_running());
        let tick = timer.tick(now + Duration::from_secs(100));
        assert!(!tick.expired);
        assert_eq!(tick.progress, 0.0);
    }

    #[test]
    fn test_progress_and_single_expiry() {
        let start = Instant::now();
        let mut timer = CountdownTimer::new();
        timer.start(10, start);

        let tick = timer.tick(start + Duration::from_secs(5));
        assert!(!tick.expired);
        assert!((tick.progress - 50.0).abs() < 0.001);
        assert_eq!(timer.remaining(start + Duration::from_secs(5)), Some(Duration::from_secs(5)));

        let mut expiries = 0;
        for ms in (5_100..=20_000).step_by(100) {
            if timer.tick(start + Duration::from_millis(ms)).expired {
                expiries += 1;
            }
        }
        assert_eq!(expiries, 1);
        assert!(!timer.is_running());
        assert_eq!(timer.progress(), 0.0);
    }

    #[test]
    fn test_stop_is_idempotent() {
        let now = Instant::now();
        let mut timer = CountdownTimer::new();
        timer.stop();
        timer.start(15, now);
        timer.tick(now + Duration::from_secs(3));
        timer.stop();
        timer.stop();
        assert!(!timer.is_running());
        assert_eq!(timer.progress(), 0.0);
        assert!(!timer.tick(now + Duration::from_secs(60)).expired);
    }

    #[test]
    fn test_restart_resets_progress() {
        let now = Instant::now();
        let mut timer = CountdownTimer::new();
        timer.start(10, now);
        timer.tick(now + Duration::from_secs(9));
        timer.start(10, now + Duration::from_secs(9));
        assert_eq!(timer.progress(), 0.0);
        assert!(!timer.tick(now + Duration::from_secs(10)).expired);
    }

    #[test]
    fn test_next_timer_choice_cycles() {
        assert_eq!(next_timer_choice(0), 10);
        assert_eq!(next_timer_choice(45), 60);
        assert_eq!(next_timer_choice(60), 0);
        assert_eq!(next_timer_choice(25), 30);
    }
}
