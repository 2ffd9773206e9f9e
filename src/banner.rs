//! Hero banner rotation: a small state machine driven by a cancellable timer

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use log::{debug, warn};
use serde::{Deserialize, Serialize};
use tokio::task::JoinHandle;
use tokio::time::{interval_at, Instant, MissedTickBehavior};

pub const DEFAULT_INTERVAL_MS: u64 = 7000;
pub const DEFAULT_TRANSITION_MS: u64 = 700;

fn default_interval_ms() -> u64 {
    DEFAULT_INTERVAL_MS
}

fn default_transition_ms() -> u64 {
    DEFAULT_TRANSITION_MS
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BannerTiming {
    /// Time between the start of consecutive transitions
    #[serde(default = "default_interval_ms")]
    pub interval_ms: u64,
    /// Length of the exit animation before the index advances
    #[serde(default = "default_transition_ms")]
    pub transition_ms: u64,
}

impl Default for BannerTiming {
    fn default() -> Self {
        Self {
            interval_ms: DEFAULT_INTERVAL_MS,
            transition_ms: DEFAULT_TRANSITION_MS,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RotatorState {
    Showing(usize),
    Transitioning { from: usize, to: usize },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BannerRotator {
    slide_count: usize,
    state: RotatorState,
}

impl BannerRotator {
    pub fn new(slide_count: usize) -> Self {
        Self {
            slide_count,
            state: RotatorState::Showing(0),
        }
    }

    pub fn state(&self) -> RotatorState {
        self.state
    }

    pub fn slide_count(&self) -> usize {
        self.slide_count
    }

    /// The slide currently on screen. During a transition this is still the outgoing slide.
    pub fn active_index(&self) -> usize {
        match self.state {
            RotatorState::Showing(i) => i,
            RotatorState::Transitioning { from, .. } => from,
        }
    }

    pub fn is_exiting(&self) -> bool {
        matches!(self.state, RotatorState::Transitioning { .. })
    }

    /// Starts the exit animation. No-op without slides or while already transitioning.
    pub fn begin_transition(&mut self) -> bool {
        match self.state {
            RotatorState::Showing(i) if self.slide_count > 0 => {
                self.state = RotatorState::Transitioning {
                    from: i,
                    to: (i + 1) % self.slide_count,
                };
                true
            }
            _ => false,
        }
    }

    /// Lands on the next slide.
    pub fn complete_transition(&mut self) -> bool {
        match self.state {
            RotatorState::Transitioning { to, .. } => {
                self.state = RotatorState::Showing(to);
                true
            }
            RotatorState::Showing(_) => false,
        }
    }

    /// Abandons an in-progress transition, staying on the outgoing slide.
    pub fn cancel_transition(&mut self) {
        if let RotatorState::Transitioning { from, .. } = self.state {
            self.state = RotatorState::Showing(from);
        }
    }

    /// Tracks a slide list edit. `position` is where the slide on screen now sits, or
    /// None when it was removed; only then is the index clamped.
    pub fn relocate(&mut self, slide_count: usize, position: Option<usize>) {
        match position {
            Some(index) if index < slide_count => {
                if self.slide_count == slide_count && self.active_index() == index {
                    return;
                }
                self.slide_count = slide_count;
                self.state = RotatorState::Showing(index);
            }
            _ => self.set_slide_count(slide_count),
        }
    }

    /// Tracks slide list edits, clamping the index into range.
    pub fn set_slide_count(&mut self, slide_count: usize) {
        self.slide_count = slide_count;
        let index = self.active_index();
        let clamped = if slide_count == 0 || index >= slide_count { 0 } else { index };
        self.state = RotatorState::Showing(clamped);
    }
}

pub type SharedRotator = Arc<Mutex<BannerRotator>>;

pub(crate) fn lock_rotator(rotator: &SharedRotator) -> MutexGuard<'_, BannerRotator> {
    rotator.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Drives a [`BannerRotator`] on the tokio runtime. At most one task runs at a time;
/// stopping aborts it so no callback fires afterwards.
pub struct BannerTimer {
    rotator: SharedRotator,
    timing: BannerTiming,
    task: Option<JoinHandle<()>>,
}

impl BannerTimer {
    pub fn new(rotator: SharedRotator, timing: BannerTiming) -> Self {
        Self {
            rotator,
            timing,
            task: None,
        }
    }

    pub fn is_running(&self) -> bool {
        self.task.as_ref().is_some_and(|t| !t.is_finished())
    }

    /// Arms the timer. Returns false if no tokio runtime is available.
    pub fn start(&mut self) -> bool {
        if self.is_running() {
            return true;
        }
        let handle = match tokio::runtime::Handle::try_current() {
            Ok(handle) => handle,
            Err(e) => {
                warn!("[banner] Cannot start rotation without a runtime: {}", e);
                return false;
            }
        };

        let rotator = self.rotator.clone();
        let interval = Duration::from_millis(self.timing.interval_ms.max(1));
        let transition = Duration::from_millis(self.timing.transition_ms);
        debug!("[banner] Rotation armed ({:?} + {:?})", interval, transition);

        self.task = Some(handle.spawn(async move {
            let mut ticker = interval_at(Instant::now() + interval, interval);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            loop {
                ticker.tick().await;
                if !lock_rotator(&rotator).begin_transition() {
                    continue;
                }
                tokio::time::sleep(transition).await;
                lock_rotator(&rotator).complete_transition();
            }
        }));
        true
    }

    /// Cancels the timer, including a pending end-of-transition step.
    pub fn stop(&mut self) {
        if let Some(task) = self.task.take() {
            task.abort();
            lock_rotator(&self.rotator).cancel_transition();
            debug!("[banner] Rotation cancelled");
        }
    }
}

impl Drop for BannerTimer {
    fn drop(&mut self) {
        self.stop();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn shared(count: usize) -> SharedRotator {
        Arc::new(Mutex::new(BannerRotator::new(count)))
    }

    #[test]
    fn five_cycles_return_to_start() {
        let mut rotator = BannerRotator::new(5);
        for expected in [1, 2, 3, 4, 0] {
            assert!(rotator.begin_transition());
            assert!(rotator.is_exiting());
            assert!(rotator.complete_transition());
            assert_eq!(rotator.active_index(), expected);
        }
    }

    #[test]
    fn empty_rotator_never_transitions() {
        let mut rotator = BannerRotator::new(0);
        assert!(!rotator.begin_transition());
        assert_eq!(rotator.state(), RotatorState::Showing(0));
    }

    #[test]
    fn shrinking_the_list_clamps_the_index() {
        let mut rotator = BannerRotator::new(5);
        for _ in 0..4 {
            rotator.begin_transition();
            rotator.complete_transition();
        }
        assert_eq!(rotator.active_index(), 4);
        rotator.set_slide_count(3);
        assert_eq!(rotator.active_index(), 0);
    }

    #[test]
    fn relocating_follows_the_slide_on_screen() {
        let mut rotator = BannerRotator::new(5);
        for _ in 0..2 {
            rotator.begin_transition();
            rotator.complete_transition();
        }
        rotator.relocate(4, Some(1));
        assert_eq!(rotator.state(), RotatorState::Showing(1));
        assert_eq!(rotator.slide_count(), 4);

        // An in-place edit of the same list keeps a running transition.
        rotator.begin_transition();
        rotator.relocate(4, Some(1));
        assert!(rotator.is_exiting());

        rotator.relocate(3, None);
        assert_eq!(rotator.state(), RotatorState::Showing(1));
        rotator.relocate(1, None);
        assert_eq!(rotator.state(), RotatorState::Showing(0));
    }

    #[test]
    fn start_without_runtime_is_refused() {
        let mut timer = BannerTimer::new(shared(5), BannerTiming::default());
        assert!(!timer.start());
        assert!(!timer.is_running());
    }

    #[tokio::test(start_paused = true)]
    async fn timer_advances_after_interval_plus_transition() {
        let rotator = shared(5);
        let mut timer = BannerTimer::new(rotator.clone(), BannerTiming::default());
        assert!(timer.start());

        tokio::time::sleep(Duration::from_millis(7350)).await;
        assert_eq!(
            lock_rotator(&rotator).state(),
            RotatorState::Transitioning { from: 0, to: 1 }
        );

        tokio::time::sleep(Duration::from_millis(400)).await;
        assert_eq!(lock_rotator(&rotator).state(), RotatorState::Showing(1));

        // Four more transitions land at 14.7s, 21.7s, 28.7s and 35.7s.
        tokio::time::sleep(Duration::from_millis(35_800 - 7_750)).await;
        assert_eq!(lock_rotator(&rotator).state(), RotatorState::Showing(0));
        timer.stop();
    }

    #[tokio::test(start_paused = true)]
    async fn stopping_mid_transition_leaves_no_pending_callback() {
        let rotator = shared(5);
        let mut timer = BannerTimer::new(rotator.clone(), BannerTiming::default());
        timer.start();

        tokio::time::sleep(Duration::from_millis(7100)).await;
        assert!(lock_rotator(&rotator).is_exiting());
        timer.stop();
        assert!(!timer.is_running());

        tokio::time::sleep(Duration::from_millis(60_000)).await;
        assert_eq!(lock_rotator(&rotator).state(), RotatorState::Showing(0));
    }

    #[tokio::test(start_paused = true)]
    async fn restarting_rearms_a_full_interval() {
        let rotator = shared(3);
        let mut timer = BannerTimer::new(rotator.clone(), BannerTiming::default());
        timer.start();
        tokio::time::sleep(Duration::from_millis(5000)).await;
        timer.stop();
        timer.start();

        tokio::time::sleep(Duration::from_millis(6000)).await;
        assert_eq!(lock_rotator(&rotator).active_index(), 0);
        tokio::time::sleep(Duration::from_millis(1800)).await;
        assert_eq!(lock_rotator(&rotator).active_index(), 1);
    }
}
