//! Session statistics

use std::sync::{Mutex, PoisonError};
use std::time::{Duration, Instant};

/// Monotonic byte counters of the current session, as reported by the tunnel
/// client.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SessionStats {
    pub bytes_sent: u64,
    pub bytes_received: u64,
}

/// Records per-session traffic counters and wall-clock boundaries.
///
/// Implementations may additionally forward samples to a remote endpoint;
/// the manager neither observes nor waits for that.
pub trait SessionStatsKeeper: Send + Sync {
    /// Overwrite the counters for the current session.
    fn save(&self, stats: SessionStats);

    fn retrieve(&self) -> SessionStats;

    /// Record the session start. Idempotent within a session.
    fn mark_session_start(&self);

    /// Elapsed session time; frozen once the session end is marked.
    fn session_duration(&self) -> Duration;

    fn mark_session_end(&self);
}

#[derive(Default)]
struct TrackerState {
    stats: SessionStats,
    started_at: Option<Instant>,
    frozen_duration: Option<Duration>,
}

/// In-memory [`SessionStatsKeeper`].
#[derive(Default)]
pub struct StatsTracker {
    state: Mutex<TrackerState>,
}

impl StatsTracker {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, TrackerState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl SessionStatsKeeper for StatsTracker {
    fn save(&self, stats: SessionStats) {
        self.lock().stats = stats;
    }

    fn retrieve(&self) -> SessionStats {
        self.lock().stats
    }

    fn mark_session_start(&self) {
        let mut state = self.lock();
        if state.started_at.is_some() && state.frozen_duration.is_none() {
            // Session already running, e.g. a reconnect completed.
            return;
        }
        state.started_at = Some(Instant::now());
        state.frozen_duration = None;
        state.stats = SessionStats::default();
    }

    fn session_duration(&self) -> Duration {
        let state = self.lock();
        if let Some(frozen) = state.frozen_duration {
            return frozen;
        }
        state
            .started_at
            .map(|started_at| started_at.elapsed())
            .unwrap_or_default()
    }

    fn mark_session_end(&self) {
        let mut state = self.lock();
        let elapsed = state
            .started_at
            .map(|started_at| started_at.elapsed())
            .unwrap_or_default();
        state.frozen_duration = Some(elapsed);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::thread::sleep;

    #[test]
    fn test_duration_is_zero_before_session_start() {
        let tracker = StatsTracker::new();
        assert_eq!(tracker.session_duration(), Duration::ZERO);
    }

    #[test]
    fn test_duration_grows_while_session_runs() {
        let tracker = StatsTracker::new();
        tracker.mark_session_start();
        sleep(Duration::from_millis(5));
        assert!(tracker.session_duration() >= Duration::from_millis(5));
    }

    #[test]
    fn test_duration_freezes_on_session_end() {
        let tracker = StatsTracker::new();
        tracker.mark_session_start();
        tracker.mark_session_end();
        let frozen = tracker.session_duration();
        sleep(Duration::from_millis(5));
        assert_eq!(tracker.session_duration(), frozen);
    }

    #[test]
    fn test_mark_start_is_idempotent_within_session() {
        let tracker = StatsTracker::new();
        tracker.mark_session_start();
        tracker.save(SessionStats {
            bytes_sent: 10,
            bytes_received: 20,
        });
        tracker.mark_session_start();
        assert_eq!(
            tracker.retrieve(),
            SessionStats {
                bytes_sent: 10,
                bytes_received: 20
            }
        );
    }

    #[test]
    fn test_new_session_resets_counters() {
        let tracker = StatsTracker::new();
        tracker.mark_session_start();
        tracker.save(SessionStats {
            bytes_sent: 10,
            bytes_received: 20,
        });
        tracker.mark_session_end();

        tracker.mark_session_start();
        assert_eq!(tracker.retrieve(), SessionStats::default());
    }
}
