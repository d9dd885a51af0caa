//! Per-run freshness tracking against the chain head.
//!
//! A run is watched while its target height lies ahead of the chain. Once the chain is
//! two or more blocks past a previously pending target, one listing invalidation is
//! requested and tracking resets. Runs first seen in the past are never tracked.

/// Outcome of one observation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Reconcile {
    /// Nothing to do.
    Idle,
    /// Refetch the scheduled-run listing.
    Invalidate,
}

/// Tracks the last positive `target - head` distance of one displayed run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FreshnessReconciler {
    last_positive_diff: Option<i64>,
}

impl FreshnessReconciler {
    /// Reconciler that is not tracking anything yet.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether a future target height has been observed and not yet reconciled.
    #[must_use]
    pub fn is_tracking(&self) -> bool {
        self.last_positive_diff.is_some()
    }

    /// Most recent positive distance to the target, while tracking.
    #[must_use]
    pub fn last_positive_diff(&self) -> Option<i64> {
        self.last_positive_diff
    }

    /// Feed `item_height - current_height`.
    pub fn observe_diff(&mut self, diff: i64) -> Reconcile {
        if diff > 0 {
            self.last_positive_diff = Some(diff);
        } else if diff < -1 && self.last_positive_diff.take().is_some() {
            return Reconcile::Invalidate;
        }
        Reconcile::Idle
    }

    /// Feed a run's target height and the latest chain height.
    pub fn observe(&mut self, item_height: i64, current_height: i64) -> Reconcile {
        self.observe_diff(item_height.saturating_sub(current_height))
    }
}
