//! Reconnect backoff policy.
//!
//! The policy maps the retry counter to the delay before the next attempt.
//! Two explicit variants exist and are never combined:
//!
//! | Variant | Delays | Exhausts |
//! |---------|--------|----------|
//! | [`ReconnectPolicy::Fixed`] | table lookup, default 1s, 2s, 3s, 5s, 8s | after the last step |
//! | [`ReconnectPolicy::CappedDoubling`] | `initial * 2^retry`, capped | never |

// ============================================================================
// Imports
// ============================================================================

use std::time::Duration;

use crate::error::{Error, Result};

// ============================================================================
// Constants
// ============================================================================

/// Default fixed backoff table.
pub const DEFAULT_BACKOFF_STEPS: [Duration; 5] = [
    Duration::from_secs(1),
    Duration::from_secs(2),
    Duration::from_secs(3),
    Duration::from_secs(5),
    Duration::from_secs(8),
];

// ============================================================================
// ReconnectPolicy
// ============================================================================

/// Delay schedule for reconnect attempts.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReconnectPolicy {
    /// Ordered, non-decreasing delays. Retrying stops after the last step.
    Fixed(Vec<Duration>),

    /// Doubling delay starting at `initial`, capped at `max`. Never stops.
    CappedDoubling {
        /// Delay before the first attempt.
        initial: Duration,
        /// Upper bound for any delay.
        max: Duration,
    },
}

impl Default for ReconnectPolicy {
    fn default() -> Self {
        Self::Fixed(DEFAULT_BACKOFF_STEPS.to_vec())
    }
}

impl ReconnectPolicy {
    /// Creates a fixed-table policy.
    #[inline]
    #[must_use]
    pub fn fixed(steps: impl Into<Vec<Duration>>) -> Self {
        Self::Fixed(steps.into())
    }

    /// Creates a capped doubling policy.
    #[inline]
    #[must_use]
    pub const fn capped_doubling(initial: Duration, max: Duration) -> Self {
        Self::CappedDoubling { initial, max }
    }

    /// Returns the delay before the attempt following `retry_count`
    /// dispatched attempts, or `None` once the policy is exhausted.
    #[must_use]
    pub fn delay_for(&self, retry_count: u32) -> Option<Duration> {
        match self {
            Self::Fixed(steps) => steps.get(retry_count as usize).copied(),
            Self::CappedDoubling { initial, max } => {
                let factor = 1u32.checked_shl(retry_count).unwrap_or(u32::MAX);
                Some(initial.saturating_mul(factor).min(*max))
            }
        }
    }

    /// Maximum number of attempts, if bounded.
    #[must_use]
    pub fn max_attempts(&self) -> Option<u32> {
        match self {
            Self::Fixed(steps) => Some(u32::try_from(steps.len()).unwrap_or(u32::MAX)),
            Self::CappedDoubling { .. } => None,
        }
    }

    /// Checks the policy is usable.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Config`] if a fixed table is empty or decreasing, or if
    /// a doubling policy has a zero initial delay or `max < initial`.
    pub fn validate(&self) -> Result<()> {
        match self {
            Self::Fixed(steps) => {
                if steps.is_empty() {
                    return Err(Error::config("reconnect policy needs at least one delay step"));
                }
                if steps.windows(2).any(|pair| pair[1] < pair[0]) {
                    return Err(Error::config(
                        "reconnect delay steps must be non-decreasing",
                    ));
                }
                Ok(())
            }
            Self::CappedDoubling { initial, max } => {
                if initial.is_zero() {
                    return Err(Error::config("initial reconnect delay must be non-zero"));
                }
                if max < initial {
                    return Err(Error::config(
                        "maximum reconnect delay must not be below the initial delay",
                    ));
                }
                Ok(())
            }
        }
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    use proptest::prelude::*;

    #[test]
    fn test_default_table() {
        let policy = ReconnectPolicy::default();
        assert_eq!(policy.delay_for(0), Some(Duration::from_millis(1000)));
        assert_eq!(policy.delay_for(4), Some(Duration::from_secs(8)));
        assert_eq!(policy.delay_for(5), None);
        assert_eq!(policy.max_attempts(), Some(5));
    }

    #[test]
    fn test_capped_doubling() {
        let policy =
            ReconnectPolicy::capped_doubling(Duration::from_secs(1), Duration::from_secs(30));
        assert_eq!(policy.delay_for(0), Some(Duration::from_secs(1)));
        assert_eq!(policy.delay_for(3), Some(Duration::from_secs(8)));
        assert_eq!(policy.delay_for(5), Some(Duration::from_secs(30)));
        assert_eq!(policy.delay_for(1000), Some(Duration::from_secs(30)));
        assert_eq!(policy.max_attempts(), None);
    }

    #[test]
    fn test_validate_rejects_bad_tables() {
        assert!(ReconnectPolicy::fixed(Vec::<Duration>::new()).validate().is_err());
        assert!(
            ReconnectPolicy::fixed([Duration::from_secs(2), Duration::from_secs(1)])
                .validate()
                .is_err()
        );
        assert!(
            ReconnectPolicy::capped_doubling(Duration::ZERO, Duration::from_secs(1))
                .validate()
                .is_err()
        );
        assert!(
            ReconnectPolicy::capped_doubling(Duration::from_secs(5), Duration::from_secs(1))
                .validate()
                .is_err()
        );
        assert!(ReconnectPolicy::default().validate().is_ok());
    }

    proptest! {
        #[test]
        fn prop_doubling_is_non_decreasing(initial_ms in 1u64..5_000, max_ms in 5_000u64..120_000, retry in 0u32..64) {
            let policy = ReconnectPolicy::capped_doubling(
                Duration::from_millis(initial_ms),
                Duration::from_millis(max_ms),
            );
            let current = policy.delay_for(retry).unwrap();
            let next = policy.delay_for(retry + 1).unwrap();
            prop_assert!(next >= current);
            prop_assert!(next <= Duration::from_millis(max_ms));
        }
    }
}
