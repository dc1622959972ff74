use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

/// Minimal counters for operational visibility.
/// Cloning shares the underlying values.
#[derive(Clone, Default)]
pub struct Counters {
    pub ticks: Arc<AtomicU64>,
    pub sweeps: Arc<AtomicU64>,
    pub points_written: Arc<AtomicU64>,

    // per-asset fetch failures
    pub fetch_failures: Arc<AtomicU64>,
    pub fetch_timeouts: Arc<AtomicU64>,

    pub moves_fired: Arc<AtomicU64>,
    pub alerts_triggered: Arc<AtomicU64>,
    /// Alert already flipped by a concurrent evaluation path.
    pub alerts_claim_lost: Arc<AtomicU64>,

    pub notify_failures: Arc<AtomicU64>,
    pub store_failures: Arc<AtomicU64>,
}

impl Counters {
    pub fn incr(counter: &AtomicU64) {
        counter.fetch_add(1, Ordering::Relaxed);
    }

    pub fn get(counter: &AtomicU64) -> u64 {
        counter.load(Ordering::Relaxed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn clones_share_values() {
        let a = Counters::default();
        let b = a.clone();
        Counters::incr(&a.ticks);
        Counters::incr(&b.ticks);
        assert_eq!(Counters::get(&a.ticks), 2);
    }
}
