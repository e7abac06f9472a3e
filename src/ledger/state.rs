use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::Amount;
use crate::model::Points;
use crate::tier::{Tier, tier_for};

/// A customer's loyalty standing.
///
/// The tier is cached alongside the balance and recomputed by every mutator,
/// so `tier == tier_for(points)` always holds.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LoyaltyRecord {
    points: Points,
    tier: Tier,
    total_spent: Amount,
    join_date: DateTime<Utc>,
}

/// Why a stored payload could not be turned back into a record.
#[derive(Debug, Error)]
pub enum DecodeError {
    #[error("malformed record: {0}")]
    Json(#[from] serde_json::Error),
    #[error("negative total spent {0}")]
    NegativeSpend(Amount),
}

/// Wire shape of a stored record. The tier is optional and only compared
/// against the recomputed one.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct StoredRecord {
    points: Points,
    #[serde(default)]
    tier: Option<Tier>,
    total_spent: Amount,
    join_date: DateTime<Utc>,
}

impl LoyaltyRecord {
    /// Fresh record with zero points and spend.
    pub fn new(join_date: DateTime<Utc>) -> Self {
        Self {
            points: 0,
            tier: Tier::Bronze,
            total_spent: Amount::ZERO,
            join_date,
        }
    }

    pub fn points(&self) -> Points {
        self.points
    }

    pub fn tier(&self) -> Tier {
        self.tier
    }

    pub fn total_spent(&self) -> Amount {
        self.total_spent
    }

    pub fn join_date(&self) -> DateTime<Utc> {
        self.join_date
    }

    /// Add points. `None` on overflow, leaving the record untouched.
    pub(crate) fn credit(&mut self, points: Points) -> Option<()> {
        self.points = self.points.checked_add(points)?;
        self.tier = tier_for(self.points);
        Some(())
    }

    /// Remove points. `None` if the balance is too small, leaving the record
    /// untouched.
    pub(crate) fn debit(&mut self, points: Points) -> Option<()> {
        self.points = self.points.checked_sub(points)?;
        self.tier = tier_for(self.points);
        Some(())
    }

    /// Grow the spend total. `None` on overflow.
    pub(crate) fn accrue_spend(&mut self, amount: Amount) -> Option<()> {
        self.total_spent = self.total_spent.checked_add(amount)?;
        Some(())
    }

    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }

    /// Parse a stored payload. The returned flag is `true` when the stored
    /// tier disagreed with the balance and was recomputed.
    pub fn from_json(payload: &str) -> Result<(Self, bool), DecodeError> {
        let stored: StoredRecord = serde_json::from_str(payload)?;
        if stored.total_spent < Amount::ZERO {
            return Err(DecodeError::NegativeSpend(stored.total_spent));
        }

        let tier = tier_for(stored.points);
        let corrected = stored.tier.is_some_and(|t| t != tier);
        let record = Self {
            points: stored.points,
            tier,
            total_spent: stored.total_spent,
            join_date: stored.join_date,
        };
        Ok((record, corrected))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn joined() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 3, 14, 9, 30, 0).unwrap()
    }

    #[test]
    fn new_record_is_zeroed_bronze() {
        let record = LoyaltyRecord::new(joined());
        assert_eq!(record.points(), 0);
        assert_eq!(record.tier(), Tier::Bronze);
        assert_eq!(record.total_spent(), Amount::ZERO);
        assert_eq!(record.join_date(), joined());
    }

    #[test]
    fn credit_recomputes_tier() {
        let mut record = LoyaltyRecord::new(joined());
        record.credit(3_000).unwrap();
        assert_eq!(record.tier(), Tier::Gold);
    }

    #[test]
    fn credit_overflow_leaves_record_untouched() {
        let mut record = LoyaltyRecord::new(joined());
        record.credit(10).unwrap();
        assert!(record.credit(Points::MAX).is_none());
        assert_eq!(record.points(), 10);
    }

    #[test]
    fn debit_can_demote() {
        let mut record = LoyaltyRecord::new(joined());
        record.credit(1_200).unwrap();
        record.debit(500).unwrap();
        assert_eq!(record.points(), 700);
        assert_eq!(record.tier(), Tier::Bronze);
    }

    #[test]
    fn debit_beyond_balance_is_refused() {
        let mut record = LoyaltyRecord::new(joined());
        record.credit(100).unwrap();
        assert!(record.debit(101).is_none());
        assert_eq!(record.points(), 100);
    }

    #[test]
    fn json_uses_camel_case_fields() {
        let mut record = LoyaltyRecord::new(joined());
        record.credit(25).unwrap();
        record.accrue_spend(Amount::from_float(250.0).unwrap()).unwrap();

        let value: serde_json::Value = serde_json::from_str(&record.to_json().unwrap()).unwrap();
        assert_eq!(value["points"], 25);
        assert_eq!(value["tier"], "bronze");
        assert_eq!(value["totalSpent"], 250.0);
        assert_eq!(value["joinDate"], "2025-03-14T09:30:00Z");
    }

    #[test]
    fn json_round_trip_reproduces_record() {
        let mut record = LoyaltyRecord::new(joined());
        record.credit(4_321).unwrap();
        record.accrue_spend(Amount::from_float(43_215.75).unwrap()).unwrap();

        let (back, corrected) = LoyaltyRecord::from_json(&record.to_json().unwrap()).unwrap();
        assert_eq!(back, record);
        assert!(!corrected);
    }

    #[test]
    fn stale_stored_tier_is_recomputed() {
        let payload = r#"{"points":1200,"tier":"bronze","totalSpent":12000,"joinDate":"2025-03-14T09:30:00Z"}"#;
        let (record, corrected) = LoyaltyRecord::from_json(payload).unwrap();
        assert_eq!(record.tier(), Tier::Silver);
        assert!(corrected);
    }

    #[test]
    fn missing_tier_is_derived() {
        let payload = r#"{"points":5000,"totalSpent":0,"joinDate":"2025-03-14T09:30:00Z"}"#;
        let (record, corrected) = LoyaltyRecord::from_json(payload).unwrap();
        assert_eq!(record.tier(), Tier::Platinum);
        assert!(!corrected);
    }

    #[test]
    fn malformed_payloads_are_rejected() {
        let cases = [
            "",
            "not json",
            r#"{"points":-5,"totalSpent":0,"joinDate":"2025-03-14T09:30:00Z"}"#,
            r#"{"points":1.5,"totalSpent":0,"joinDate":"2025-03-14T09:30:00Z"}"#,
            r#"{"points":5,"totalSpent":0}"#,
            r#"{"points":5,"totalSpent":0,"joinDate":"yesterday"}"#,
            r#"{"points":5,"tier":"diamond","totalSpent":0,"joinDate":"2025-03-14T09:30:00Z"}"#,
            r#"{"points":1,"totalSpent":1e300,"joinDate":"2025-03-14T09:30:00Z"}"#,
        ];
        for payload in cases {
            assert!(
                matches!(LoyaltyRecord::from_json(payload), Err(DecodeError::Json(_))),
                "accepted {payload:?}"
            );
        }
    }

    #[test]
    fn negative_spend_is_rejected() {
        let payload = r#"{"points":5,"totalSpent":-1,"joinDate":"2025-03-14T09:30:00Z"}"#;
        assert!(matches!(
            LoyaltyRecord::from_json(payload),
            Err(DecodeError::NegativeSpend(_))
        ));
    }
}
