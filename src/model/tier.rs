//! Loyalty tiers and the policy that derives them from order counts.
//!
//! The policy is a pure threshold table with no memory of the previous tier:
//!
//! | Order count | Tier       |
//! |-------------|------------|
//! | `0..=9`     | `REGULAR`  |
//! | `10..=19`   | `GOLD`     |
//! | `20..`      | `PLATINUM` |

use serde::{Deserialize, Serialize};
use std::fmt::Display;

/// Order count at which a customer becomes [`Tier::Gold`].
pub const GOLD_THRESHOLD: u32 = 10;

/// Order count at which a customer becomes [`Tier::Platinum`].
pub const PLATINUM_THRESHOLD: u32 = 20;

/// Discrete loyalty level derived from cumulative order count.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Tier {
    Regular,
    Gold,
    Platinum,
}

impl Tier {
    /// The tier a customer with `order_count` orders belongs to.
    pub fn for_order_count(order_count: u32) -> Self {
        if order_count >= PLATINUM_THRESHOLD {
            Tier::Platinum
        } else if order_count >= GOLD_THRESHOLD {
            Tier::Gold
        } else {
            Tier::Regular
        }
    }

    /// The next tier up and the order count that reaches it, if any.
    pub fn next(self) -> Option<(Tier, u32)> {
        match self {
            Tier::Regular => Some((Tier::Gold, GOLD_THRESHOLD)),
            Tier::Gold => Some((Tier::Platinum, PLATINUM_THRESHOLD)),
            Tier::Platinum => None,
        }
    }
}

impl Display for Tier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Tier::Regular => "REGULAR",
            Tier::Gold => "GOLD",
            Tier::Platinum => "PLATINUM",
        };
        f.write_str(name)
    }
}

/// Shorthand for [`Tier::for_order_count`].
pub fn tier_for(order_count: u32) -> Tier {
    Tier::for_order_count(order_count)
}

/// If `order_count` is exactly one order short of a promotion, the tier it would
/// reach with one more order.
pub fn milestone(order_count: u32) -> Option<Tier> {
    let (next_tier, threshold) = tier_for(order_count).next()?;
    (order_count + 1 == threshold).then_some(next_tier)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_threshold_boundaries() {
        assert_eq!(tier_for(0), Tier::Regular);
        assert_eq!(tier_for(9), Tier::Regular);
        assert_eq!(tier_for(10), Tier::Gold);
        assert_eq!(tier_for(19), Tier::Gold);
        assert_eq!(tier_for(20), Tier::Platinum);
        assert_eq!(tier_for(u32::MAX), Tier::Platinum);
    }

    #[test]
    fn test_policy_is_monotonic() {
        let mut previous = tier_for(0);
        for count in 1..=1_000 {
            let current = tier_for(count);
            assert!(current >= previous, "tier dropped at {count}");
            previous = current;
        }
    }

    #[test]
    fn test_milestones_are_one_short_of_a_threshold() {
        let hits: Vec<u32> = (0..=100).filter(|c| milestone(*c).is_some()).collect();
        assert_eq!(hits, vec![9, 19]);
        assert_eq!(milestone(9), Some(Tier::Gold));
        assert_eq!(milestone(19), Some(Tier::Platinum));
        assert_eq!(milestone(u32::MAX), None);
    }

    #[test]
    fn test_wire_names() {
        assert_eq!(serde_json::to_string(&Tier::Platinum).unwrap(), "\"PLATINUM\"");
        let tier: Tier = serde_json::from_str("\"GOLD\"").unwrap();
        assert_eq!(tier, Tier::Gold);
        assert_eq!(Tier::Regular.to_string(), "REGULAR");
    }
}
