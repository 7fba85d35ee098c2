//! Single-shot auto-continue countdown.
//!
//! Each open session arms exactly one scheduler. If the human responds first
//! the countdown is disarmed; if a partial interaction happens (a checkbox
//! toggle, fresh command output) the countdown is reset instead, because a
//! partial update must not count as responding. When the countdown runs out
//! the fire callback delivers the auto-continue event: at most once per
//! armed countdown, even when a disarm races the timer task.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;

/// Default countdown, chosen to stay under common IDE idle timeouts.
pub const DEFAULT_TIMEOUT_SECS: u64 = 290;

/// Environment override for the countdown, in whole seconds.
pub const TIMEOUT_ENV_VAR: &str = "INTERACTIVE_FEEDBACK_TIMEOUT_SECONDS";

/// Resolve the countdown from the environment, defaulting to 290 seconds.
///
/// Non-numeric or non-positive values are ignored silently.
pub fn default_timeout() -> Duration {
    timeout_from_env(|name| std::env::var(name).ok())
}

/// Env-injected variant of [`default_timeout`] so tests need no real env.
pub fn timeout_from_env<FEnv>(env_lookup: FEnv) -> Duration
where
    FEnv: Fn(&str) -> Option<String>,
{
    let fallback = Duration::from_secs(DEFAULT_TIMEOUT_SECS);
    let Some(raw) = env_lookup(TIMEOUT_ENV_VAR) else {
        return fallback;
    };
    match raw.trim().parse::<i64>() {
        Ok(secs) if secs > 0 => Duration::from_secs(secs as u64),
        _ => fallback,
    }
}

/// One single-shot countdown owned by a session.
pub struct TimeoutScheduler {
    on_fire: Arc<dyn Fn() + Send + Sync>,
    /// Bumped on every arm/disarm; a timer task only fires while its own
    /// generation is still current.
    generation: Arc<AtomicU64>,
    task: Option<JoinHandle<()>>,
}

impl TimeoutScheduler {
    /// Create a disarmed scheduler with the given fire callback.
    pub fn new(on_fire: impl Fn() + Send + Sync + 'static) -> Self {
        Self {
            on_fire: Arc::new(on_fire),
            generation: Arc::new(AtomicU64::new(0)),
            task: None,
        }
    }

    /// Start (or restart) the countdown.
    pub fn arm(&mut self, duration: Duration) {
        self.cancel_current();
        let my_generation = self.generation.load(Ordering::SeqCst);
        let generation = Arc::clone(&self.generation);
        let on_fire = Arc::clone(&self.on_fire);
        self.task = Some(tokio::spawn(async move {
            tokio::time::sleep(duration).await;
            // A disarm or reset that lands after the sleep wins this race by
            // bumping the generation before the check.
            if generation.load(Ordering::SeqCst) == my_generation {
                on_fire();
            }
        }));
    }

    /// Cancel the countdown without firing.
    pub fn disarm(&mut self) {
        self.cancel_current();
    }

    /// Restart the countdown; used for partial UI updates.
    pub fn reset(&mut self, duration: Duration) {
        self.arm(duration);
    }

    /// True while a countdown is pending.
    pub fn is_armed(&self) -> bool {
        self.task.as_ref().is_some_and(|task| !task.is_finished())
    }

    fn cancel_current(&mut self) {
        self.generation.fetch_add(1, Ordering::SeqCst);
        if let Some(task) = self.task.take() {
            task.abort();
        }
    }
}

impl Drop for TimeoutScheduler {
    fn drop(&mut self) {
        self.cancel_current();
    }
}

impl std::fmt::Debug for TimeoutScheduler {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TimeoutScheduler")
            .field("armed", &self.task.is_some())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::AtomicUsize;
    use tokio::time::sleep;

    fn counting_scheduler() -> (TimeoutScheduler, Arc<AtomicUsize>) {
        let fired = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&fired);
        let scheduler = TimeoutScheduler::new(move || {
            counter.fetch_add(1, Ordering::SeqCst);
        });
        (scheduler, fired)
    }

    // Ensures a countdown left alone fires exactly once.
    #[tokio::test]
    async fn armed_countdown_fires_exactly_once() {
        let (mut scheduler, fired) = counting_scheduler();
        scheduler.arm(Duration::from_millis(30));
        sleep(Duration::from_millis(150)).await;
        assert_eq!(fired.load(Ordering::SeqCst), 1);
    }

    // Ensures disarming halfway through suppresses the fire entirely.
    #[tokio::test]
    async fn disarm_before_fire_never_invokes_callback() {
        let (mut scheduler, fired) = counting_scheduler();
        scheduler.arm(Duration::from_millis(100));
        sleep(Duration::from_millis(50)).await;
        scheduler.disarm();
        sleep(Duration::from_millis(150)).await;
        assert_eq!(fired.load(Ordering::SeqCst), 0);
    }

    // Ensures reset restarts the countdown instead of stacking timers.
    #[tokio::test]
    async fn reset_restarts_the_countdown() {
        let (mut scheduler, fired) = counting_scheduler();
        scheduler.arm(Duration::from_millis(80));
        sleep(Duration::from_millis(40)).await;
        scheduler.reset(Duration::from_millis(120));
        // Past the original deadline but inside the reset window.
        sleep(Duration::from_millis(60)).await;
        assert_eq!(fired.load(Ordering::SeqCst), 0);
        sleep(Duration::from_millis(150)).await;
        assert_eq!(fired.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn rearming_does_not_double_fire() {
        let (mut scheduler, fired) = counting_scheduler();
        scheduler.arm(Duration::from_millis(30));
        scheduler.arm(Duration::from_millis(30));
        scheduler.arm(Duration::from_millis(30));
        sleep(Duration::from_millis(150)).await;
        assert_eq!(fired.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn dropping_the_scheduler_cancels_the_countdown() {
        let (mut scheduler, fired) = counting_scheduler();
        scheduler.arm(Duration::from_millis(30));
        drop(scheduler);
        sleep(Duration::from_millis(100)).await;
        assert_eq!(fired.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn is_armed_tracks_countdown_state() {
        let (mut scheduler, _fired) = counting_scheduler();
        assert!(!scheduler.is_armed());
        scheduler.arm(Duration::from_millis(200));
        assert!(scheduler.is_armed());
        scheduler.disarm();
        assert!(!scheduler.is_armed());
    }

    #[test]
    fn timeout_env_accepts_positive_integers() {
        let timeout = timeout_from_env(|name| {
            (name == TIMEOUT_ENV_VAR).then(|| "5".to_string())
        });
        assert_eq!(timeout, Duration::from_secs(5));
    }

    #[test]
    fn timeout_env_ignores_non_numeric_values() {
        let timeout = timeout_from_env(|_| Some("abc".to_string()));
        assert_eq!(timeout, Duration::from_secs(DEFAULT_TIMEOUT_SECS));
    }

    #[test]
    fn timeout_env_ignores_non_positive_values() {
        assert_eq!(
            timeout_from_env(|_| Some("0".to_string())),
            Duration::from_secs(DEFAULT_TIMEOUT_SECS)
        );
        assert_eq!(
            timeout_from_env(|_| Some("-30".to_string())),
            Duration::from_secs(DEFAULT_TIMEOUT_SECS)
        );
    }

    #[test]
    fn timeout_env_defaults_when_unset() {
        assert_eq!(
            timeout_from_env(|_| None),
            Duration::from_secs(DEFAULT_TIMEOUT_SECS)
        );
    }

    #[cfg(feature = "fuzz-tests")]
    mod prop_tests {
        use super::*;
        use proptest::prelude::*;

        proptest! {
            #[test]
            fn timeout_env_never_returns_non_positive(raw in ".*") {
                let timeout = timeout_from_env(|_| Some(raw.clone()));
                prop_assert!(timeout >= Duration::from_secs(1));
            }

            #[test]
            fn timeout_env_parses_all_positive_seconds(secs in 1i64..1_000_000) {
                let timeout = timeout_from_env(|_| Some(secs.to_string()));
                prop_assert_eq!(timeout, Duration::from_secs(secs as u64));
            }
        }
    }
}
