//! Core domain types for the loyalty ledger.

use std::fmt;

use crate::Amount;

/// Loyalty points balance.
pub type Points = u64;

/// An input the ledger knows how to apply.
#[derive(Debug, Clone, PartialEq)]
pub enum LoyaltyEvent {
    /// A completed order; accrues one point per 10 KES spent.
    Purchase { amount: Amount },
    /// A manual or promotional point adjustment. Additive only.
    Grant { points: i64 },
    /// A named promotional grant.
    Bonus(Bonus),
    /// Spend points from the balance.
    Redeem { points: i64 },
}

/// Promotional grants with fixed values.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Bonus {
    /// A referred friend completed their first purchase.
    Referral,
    /// Granted once during the customer's birthday month.
    Birthday,
}

impl Bonus {
    pub const fn points(self) -> Points {
        match self {
            Bonus::Referral => 100,
            Bonus::Birthday => 500,
        }
    }
}

impl fmt::Display for Bonus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Bonus::Referral => f.write_str("referral"),
            Bonus::Birthday => f.write_str("birthday"),
        }
    }
}

/// How much of an order can be paid with points.
///
/// One point is worth one KES of discount.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RedemptionQuote {
    pub points: Points,
    pub discount: Amount,
}
