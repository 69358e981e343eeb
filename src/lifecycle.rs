//! Pay period lifecycle management.
//!
//! Pay periods move forward-only through Open → Closed → Locked →
//! Exported. Skipping a state or touching an Exported period is rejected
//! before any write, leaving the original state untouched.

use std::sync::Arc;

use chrono::Utc;
use tracing::info;
use uuid::Uuid;

use crate::error::{EngineError, EngineResult};
use crate::models::{PayPeriod, PayPeriodStatus};
use crate::store::PayrollStore;

/// Enforces the pay period state machine.
pub struct PayPeriodLifecycleManager {
    store: Arc<dyn PayrollStore>,
}

impl PayPeriodLifecycleManager {
    /// Creates a manager over the given store.
    pub fn new(store: Arc<dyn PayrollStore>) -> Self {
        PayPeriodLifecycleManager { store }
    }

    /// Transitions a period to the given target state.
    ///
    /// Only the immediate next state is ever legal. The transition
    /// timestamp for the entered state is recorded on the period.
    pub fn transition(
        &self,
        period_id: Uuid,
        target: PayPeriodStatus,
    ) -> EngineResult<PayPeriod> {
        let mut period = self.store.get_pay_period(period_id)?;

        if period.status.next() != Some(target) {
            return Err(EngineError::InvalidLifecycleTransition {
                from: period.status,
                attempted: format!("transition to {:?}", target),
            });
        }

        let now = Utc::now();
        period.status = target;
        match target {
            PayPeriodStatus::Closed => period.closed_at = Some(now),
            PayPeriodStatus::Locked => period.locked_at = Some(now),
            PayPeriodStatus::Exported => period.exported_at = Some(now),
            PayPeriodStatus::Open => {}
        }

        self.store.update_pay_period(period.clone())?;
        info!(
            period_id = %period_id,
            status = ?period.status,
            "Pay period transitioned"
        );
        Ok(period)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryStore;
    use chrono::NaiveDate;

    fn manager_and_period() -> (PayPeriodLifecycleManager, Uuid) {
        let store = Arc::new(MemoryStore::new());
        let period = store.ensure_period_for(NaiveDate::from_ymd_opt(2026, 3, 1).unwrap());
        (PayPeriodLifecycleManager::new(store), period.id)
    }

    /// LC-001: full forward walk succeeds
    #[test]
    fn test_full_forward_walk() {
        let (manager, id) = manager_and_period();
        assert_eq!(
            manager.transition(id, PayPeriodStatus::Closed).unwrap().status,
            PayPeriodStatus::Closed
        );
        assert_eq!(
            manager.transition(id, PayPeriodStatus::Locked).unwrap().status,
            PayPeriodStatus::Locked
        );
        let exported = manager.transition(id, PayPeriodStatus::Exported).unwrap();
        assert_eq!(exported.status, PayPeriodStatus::Exported);
        assert!(exported.closed_at.is_some());
        assert!(exported.locked_at.is_some());
        assert!(exported.exported_at.is_some());
    }

    /// LC-002: skipping a state is rejected with no change
    #[test]
    fn test_skipping_a_state_is_rejected() {
        let (manager, id) = manager_and_period();
        let result = manager.transition(id, PayPeriodStatus::Locked);
        assert!(matches!(
            result,
            Err(EngineError::InvalidLifecycleTransition {
                from: PayPeriodStatus::Open,
                ..
            })
        ));
        // original state untouched
        let period = manager.store.get_pay_period(id).unwrap();
        assert_eq!(period.status, PayPeriodStatus::Open);
        assert!(period.locked_at.is_none());
    }

    /// LC-003: exported is terminal
    #[test]
    fn test_exported_is_terminal() {
        let (manager, id) = manager_and_period();
        manager.transition(id, PayPeriodStatus::Closed).unwrap();
        manager.transition(id, PayPeriodStatus::Locked).unwrap();
        manager.transition(id, PayPeriodStatus::Exported).unwrap();

        for target in [
            PayPeriodStatus::Open,
            PayPeriodStatus::Closed,
            PayPeriodStatus::Locked,
            PayPeriodStatus::Exported,
        ] {
            assert!(manager.transition(id, target).is_err());
        }
    }

    /// LC-004: backward transitions are never legal
    #[test]
    fn test_no_backward_transitions() {
        let (manager, id) = manager_and_period();
        manager.transition(id, PayPeriodStatus::Closed).unwrap();
        assert!(manager.transition(id, PayPeriodStatus::Open).is_err());
    }
}
