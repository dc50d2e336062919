use std::num::NonZero;

use strum::{AsRefStr, Display};

use crate::{
    datatypes::{Attitude, CorrectedOffset},
    store::SampleStore,
};

/// Number of records averaged by the default estimator
pub const WINDOW: usize = 10;

pub const DEFAULT_WINDOW: NonZero<usize> = match NonZero::new(WINDOW) {
    Some(w) => w,
    None => panic!("WINDOW must not be zero"),
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, AsRefStr, Display)]
pub enum SessionPhase {
    /// No attitude received yet
    AwaitingBaseline,
    /// Baseline known, not enough history for a full window
    Accumulating,
    /// Every new attitude produces an offset
    Estimating,
}

/// Windowed drift filter.
///
/// Averages the `window` records that precede the newest one and subtracts
/// the store baseline. The newest record never takes part in the average.
/// Holds no state between calls.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DriftEstimator {
    window: NonZero<usize>,
}

impl Default for DriftEstimator {
    fn default() -> Self {
        Self {
            window: DEFAULT_WINDOW,
        }
    }
}

impl DriftEstimator {
    pub fn new(window: NonZero<usize>) -> Self {
        Self { window }
    }

    pub fn window(&self) -> usize {
        self.window.get()
    }

    /// Returns `None` until the store has a baseline and strictly more than
    /// `window` records.
    pub fn estimate(&self, store: &SampleStore) -> Option<CorrectedOffset> {
        let baseline = store.baseline()?;
        let n = self.window();

        if store.len() <= n {
            return None;
        }

        let records = store.tail(n + 1);
        let (_newest, window) = records.split_last()?;

        let sum = window
            .iter()
            .try_fold(Attitude::default(), |acc, r| Some(acc + r.attitude?))?;

        Some(CorrectedOffset::between(sum / n as f64, baseline))
    }

    pub fn phase(&self, store: &SampleStore) -> SessionPhase {
        if store.baseline().is_none() {
            SessionPhase::AwaitingBaseline
        } else if store.len() <= self.window() {
            SessionPhase::Accumulating
        } else {
            SessionPhase::Estimating
        }
    }
}

/// Entry point run after every attitude arrival, with the default window
pub fn estimate_on_attitude(store: &SampleStore) -> Option<CorrectedOffset> {
    DriftEstimator::default().estimate(store)
}

#[cfg(test)]
mod tests {
    use approx::assert_relative_eq;

    use super::*;
    use crate::datatypes::MotionVector;

    fn store_with(attitudes: &[Attitude]) -> SampleStore {
        let mut store = SampleStore::default();
        for a in attitudes {
            store.ingest_attitude(*a);
        }
        store
    }

    #[test]
    fn test_none_below_eleven_records() {
        let mut store = SampleStore::default();
        assert_eq!(estimate_on_attitude(&store), None);

        for i in 0..=WINDOW {
            assert_eq!(estimate_on_attitude(&store), None, "{i} records");
            store.ingest_attitude(Attitude::new(i as f64, 0.0, 0.0));
        }

        assert_eq!(store.len(), 11);
        assert!(estimate_on_attitude(&store).is_some());
    }

    #[test]
    fn test_zero_offset_at_baseline() {
        let a = Attitude::new(1.0, 2.0, 3.0);
        let store = store_with(&[a; 11]);

        let offset = estimate_on_attitude(&store).unwrap();

        assert_relative_eq!(offset.roll, 0.0);
        assert_relative_eq!(offset.pitch, 0.0);
        assert_relative_eq!(offset.yaw, 0.0);
    }

    #[test]
    fn test_alternating_window() {
        // Baseline, then ten alternating records, then the newest
        let mut attitudes = vec![Attitude::default()];
        for i in 0..10 {
            let roll = if i % 2 == 0 { 10.0 } else { 0.0 };
            attitudes.push(Attitude::new(roll, 0.0, 0.0));
        }
        attitudes.push(Attitude::new(1000.0, 0.0, 0.0));

        let store = store_with(&attitudes);
        let offset = estimate_on_attitude(&store).unwrap();

        assert_relative_eq!(offset.roll, 5.0);
        assert_relative_eq!(offset.pitch, 0.0);
        assert_relative_eq!(offset.yaw, 0.0);
    }

    #[test]
    fn test_newest_record_is_excluded() {
        // Records 0..=10: window is records 0..10, mean roll 4.5
        let attitudes: Vec<_> = (0..11)
            .map(|i| Attitude::new(i as f64, -(i as f64), 0.5))
            .collect();
        let mut store = store_with(&attitudes);

        let offset = estimate_on_attitude(&store).unwrap();
        assert_relative_eq!(offset.roll, 4.5);
        assert_relative_eq!(offset.pitch, -4.5);
        assert_relative_eq!(offset.yaw, 0.0);

        // Window slides to records 1..11
        store.ingest_attitude(Attitude::new(11.0, -11.0, 0.5));
        let offset = estimate_on_attitude(&store).unwrap();
        assert_relative_eq!(offset.roll, 5.5);
        assert_relative_eq!(offset.pitch, -5.5);
    }

    #[test]
    fn test_baseline_subtracted() {
        let mut attitudes = vec![Attitude::new(2.0, -3.0, 90.0)];
        attitudes.extend([Attitude::new(4.0, 1.0, 95.0); 11]);

        let store = store_with(&attitudes);
        let offset = estimate_on_attitude(&store).unwrap();

        assert_relative_eq!(offset.roll, 2.0);
        assert_relative_eq!(offset.pitch, 4.0);
        assert_relative_eq!(offset.yaw, 5.0);
    }

    #[test]
    fn test_nan_poisons_component() {
        let mut attitudes = vec![Attitude::default(); 5];
        attitudes.push(Attitude::new(f64::NAN, 1.0, 1.0));
        attitudes.extend(vec![Attitude::default(); 5]);

        let store = store_with(&attitudes);
        let offset = estimate_on_attitude(&store).unwrap();

        assert!(offset.roll.is_nan());
        assert_relative_eq!(offset.pitch, 0.1);
        assert!(!offset.is_finite());
    }

    #[test]
    fn test_estimate_is_pure() {
        let attitudes: Vec<_> = (0..20).map(|i| Attitude::new(i as f64, 0.0, 0.0)).collect();
        let store = store_with(&attitudes);

        assert_eq!(estimate_on_attitude(&store), estimate_on_attitude(&store));
    }

    #[test]
    fn test_custom_window() {
        let estimator = DriftEstimator::new(NonZero::new(3).unwrap());
        let attitudes: Vec<_> = (0..4).map(|i| Attitude::new(i as f64, 0.0, 0.0)).collect();

        let store = store_with(&attitudes[..3]);
        assert_eq!(estimator.estimate(&store), None);

        let store = store_with(&attitudes);
        let offset = estimator.estimate(&store).unwrap();
        assert_relative_eq!(offset.roll, 1.0);
    }

    #[test]
    fn test_motion_only_store() {
        let mut store = SampleStore::default();
        for _ in 0..20 {
            store.ingest_accel(MotionVector::new(0.0, 0.0, 1.0));
        }

        assert_eq!(estimate_on_attitude(&store), None);
        assert_eq!(
            DriftEstimator::default().phase(&store),
            SessionPhase::AwaitingBaseline
        );
    }

    #[test]
    fn test_phases() {
        let estimator = DriftEstimator::default();
        let mut store = SampleStore::default();
        assert_eq!(estimator.phase(&store), SessionPhase::AwaitingBaseline);

        store.ingest_attitude(Attitude::default());
        assert_eq!(estimator.phase(&store), SessionPhase::Accumulating);

        for _ in 0..9 {
            store.ingest_attitude(Attitude::default());
        }
        assert_eq!(estimator.phase(&store), SessionPhase::Accumulating);

        store.ingest_attitude(Attitude::default());
        assert_eq!(estimator.phase(&store), SessionPhase::Estimating);
    }

    #[test]
    fn test_fresh_store_has_no_baseline() {
        let attitudes = vec![Attitude::new(7.0, 7.0, 7.0); 12];
        let old_session = store_with(&attitudes);
        assert!(estimate_on_attitude(&old_session).is_some());

        let new_session = store_with(&[Attitude::new(1.0, 1.0, 1.0)]);
        assert_eq!(new_session.baseline(), Some(Attitude::new(1.0, 1.0, 1.0)));
        assert_eq!(estimate_on_attitude(&new_session), None);
    }
}
