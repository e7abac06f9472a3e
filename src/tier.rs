//! Membership tiers and the static benefits table.
//!
//! A tier is never stored on its own: it is always derived from a points
//! balance with [`tier_for`].

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::model::Points;

/// Ordered loyalty membership level.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Tier {
    Bronze,
    Silver,
    Gold,
    Platinum,
}

impl Tier {
    /// All tiers, lowest first.
    pub const ALL: [Tier; 4] = [Tier::Bronze, Tier::Silver, Tier::Gold, Tier::Platinum];

    /// Minimum balance at which this tier begins.
    pub const fn breakpoint(self) -> Points {
        match self {
            Tier::Bronze => 0,
            Tier::Silver => 1_000,
            Tier::Gold => 3_000,
            Tier::Platinum => 5_000,
        }
    }

    /// The tier above this one, `None` for platinum.
    pub const fn next(self) -> Option<Tier> {
        match self {
            Tier::Bronze => Some(Tier::Silver),
            Tier::Silver => Some(Tier::Gold),
            Tier::Gold => Some(Tier::Platinum),
            Tier::Platinum => None,
        }
    }

    pub const fn as_str(self) -> &'static str {
        match self {
            Tier::Bronze => "bronze",
            Tier::Silver => "silver",
            Tier::Gold => "gold",
            Tier::Platinum => "platinum",
        }
    }

    pub fn benefits(self) -> &'static TierBenefits {
        benefits_for(self)
    }
}

impl fmt::Display for Tier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Tier for a points balance. Exact breakpoints belong to the higher tier.
pub const fn tier_for(points: Points) -> Tier {
    if points >= Tier::Platinum.breakpoint() {
        Tier::Platinum
    } else if points >= Tier::Gold.breakpoint() {
        Tier::Gold
    } else if points >= Tier::Silver.breakpoint() {
        Tier::Silver
    } else {
        Tier::Bronze
    }
}

/// Presentation metadata and discount eligibility of a tier.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TierBenefits {
    pub display_name: &'static str,
    /// CSS-style color used for badges.
    pub color_token: &'static str,
    pub perks: &'static [&'static str],
    /// Largest share of an order total that may be paid with points.
    pub max_discount_percent: u8,
}

static BRONZE: TierBenefits = TierBenefits {
    display_name: "Bronze Member",
    color_token: "#CD7F32",
    perks: &["Earn 1 point per 10 KES", "Birthday discount"],
    max_discount_percent: 5,
};

static SILVER: TierBenefits = TierBenefits {
    display_name: "Silver Member",
    color_token: "#C0C0C0",
    perks: &[
        "Earn 1.5 points per 10 KES",
        "10% discount on purchases",
        "Free shipping",
    ],
    max_discount_percent: 10,
};

static GOLD: TierBenefits = TierBenefits {
    display_name: "Gold Member",
    color_token: "#FFD700",
    perks: &[
        "Earn 2 points per 10 KES",
        "15% discount on purchases",
        "Free shipping",
        "Early access to sales",
    ],
    max_discount_percent: 15,
};

static PLATINUM: TierBenefits = TierBenefits {
    display_name: "Platinum Member",
    color_token: "#E5E4E2",
    perks: &[
        "Earn 3 points per 10 KES",
        "20% discount on purchases",
        "Free shipping",
        "VIP support",
        "Exclusive products",
    ],
    max_discount_percent: 20,
};

/// Benefits table lookup.
pub fn benefits_for(tier: Tier) -> &'static TierBenefits {
    match tier {
        Tier::Bronze => &BRONZE,
        Tier::Silver => &SILVER,
        Tier::Gold => &GOLD,
        Tier::Platinum => &PLATINUM,
    }
}
