//! Loyalty points ledger.
//!
//! The ledger owns one customer's [`LoyaltyRecord`], applies purchases,
//! grants and redemptions to it, and persists every change through a
//! [`Storage`] backend before exposing it.
//! Also supports an async stream of loyalty events.

use chrono::{DateTime, Utc};
use tokio_stream::{Stream, StreamExt};
use tracing::{info, warn};

use crate::Amount;
use crate::model::{Bonus, LoyaltyEvent, Points, RedemptionQuote};
use crate::storage::{Storage, StorageError};
use crate::tier::TierBenefits;

mod state;
pub use state::{DecodeError, LoyaltyRecord};

mod error;
pub use error::{GrantError, LedgerError, PurchaseError, RedemptionError};

/// KES spent per point earned.
pub const SPEND_PER_POINT: u64 = 10;

/// The loyalty ledger for a single customer.
///
/// Mutations are applied to a copy of the record, saved, and only then
/// swapped in. A failed save leaves the in-memory record at the last value
/// that reached storage.
#[derive(Debug)]
pub struct Ledger<S> {
    storage: S,
    record: LoyaltyRecord,
}

/// Public API
impl<S: Storage> Ledger<S> {
    /// Load the customer's record from `storage`, or start a fresh one.
    pub fn initialize(storage: S) -> Result<Self, StorageError> {
        Self::initialize_at(storage, Utc::now())
    }

    /// Like [`Ledger::initialize`], with an explicit join date for a fresh
    /// record.
    ///
    /// A missing or unreadable payload yields the same default record. The
    /// result is always written back so storage and memory agree.
    pub fn initialize_at(mut storage: S, now: DateTime<Utc>) -> Result<Self, StorageError> {
        let record = match storage.load()? {
            None => {
                info!("no stored loyalty record, starting fresh");
                LoyaltyRecord::new(now)
            }
            Some(payload) => match LoyaltyRecord::from_json(&payload) {
                Ok((record, corrected)) => {
                    if corrected {
                        warn!(
                            points = record.points(),
                            tier = %record.tier(),
                            "stored tier did not match balance, recomputed"
                        );
                    }
                    record
                }
                Err(e) => {
                    warn!(reason = %e, "discarding unreadable loyalty record");
                    LoyaltyRecord::new(now)
                }
            },
        };

        storage.save(&record.to_json()?)?;
        Ok(Self { storage, record })
    }

    /// Current state of the record.
    pub fn record(&self) -> &LoyaltyRecord {
        &self.record
    }

    pub fn storage(&self) -> &S {
        &self.storage
    }

    /// Accrue a completed purchase: one point per full 10 KES, and the amount
    /// is added to the spend total. Returns the points earned.
    ///
    /// Calling this twice for the same order counts it twice.
    pub fn record_purchase(&mut self, amount: Amount) -> Result<Points, LedgerError> {
        if !amount.is_positive() {
            return Err(PurchaseError::NonPositiveAmount(amount).into());
        }

        let earned = amount.whole_blocks_of(SPEND_PER_POINT);
        let mut next = self.record.clone();
        next.accrue_spend(amount).ok_or(PurchaseError::Overflow)?;
        next.credit(earned).ok_or(PurchaseError::Overflow)?;

        self.commit(next)?;
        Ok(earned)
    }

    /// Add a point adjustment. Only positive grants are accepted; spending
    /// goes through [`Ledger::redeem_points`].
    pub fn add_points(&mut self, points: i64) -> Result<(), LedgerError> {
        let requested = Points::try_from(points)
            .ok()
            .filter(|p| *p > 0)
            .ok_or(GrantError::NonPositive(points))?;
        self.credit(requested)
    }

    /// Grant a promotional bonus.
    pub fn add_bonus(&mut self, bonus: Bonus) -> Result<(), LedgerError> {
        self.credit(bonus.points())
    }

    /// Spend points. Either the full amount is deducted or nothing is.
    /// Redemption may drop the customer into a lower tier.
    pub fn redeem_points(&mut self, points: i64) -> Result<(), LedgerError> {
        let requested = Points::try_from(points)
            .ok()
            .filter(|p| *p > 0)
            .ok_or(RedemptionError::NonPositive(points))?;

        let mut next = self.record.clone();
        next.debit(requested)
            .ok_or(RedemptionError::InsufficientPoints {
                available: self.record.points(),
                requested,
            })?;

        self.commit(next)?;
        Ok(())
    }

    /// Benefits of the current tier.
    pub fn benefits(&self) -> &'static TierBenefits {
        self.record.tier().benefits()
    }

    /// Points still needed to reach the next tier, `None` at platinum.
    pub fn points_to_next_tier(&self) -> Option<Points> {
        let next = self.record.tier().next()?;
        Some(next.breakpoint().saturating_sub(self.record.points()))
    }

    /// Percentage of the current tier band already covered, `None` at
    /// platinum.
    pub fn tier_progress(&self) -> Option<u8> {
        let tier = self.record.tier();
        let next = tier.next()?;
        let band = next.breakpoint() - tier.breakpoint();
        let covered = self.record.points().saturating_sub(tier.breakpoint());
        let percent = covered.saturating_mul(100) / band;
        Some(percent.min(100) as u8)
    }

    /// Points that may be spent on an order of `order_total`, capped by the
    /// balance and by the tier's maximum discount share.
    pub fn quote_redemption(&self, order_total: Amount) -> RedemptionQuote {
        let cap = order_total
            .percent(self.benefits().max_discount_percent)
            .whole_blocks_of(1);
        let points = self.record.points().min(cap);
        RedemptionQuote {
            points,
            discount: Amount::from_units(points),
        }
    }

    /// Apply a single event on top of the current record.
    pub fn apply(&mut self, event: LoyaltyEvent) -> Result<(), LedgerError> {
        match event {
            LoyaltyEvent::Purchase { amount } => {
                let result = self.record_purchase(amount);
                match &result {
                    Ok(earned) => info!(amount = %amount, earned, "purchase applied"),
                    Err(e) => info!(amount = %amount, reason = %e, "purchase skipped"),
                }
                result?;
            }
            LoyaltyEvent::Grant { points } => {
                let result = self.add_points(points);
                self.log_result("grant", points, &result);
                result?;
            }
            LoyaltyEvent::Bonus(bonus) => {
                let result = self.add_bonus(bonus);
                match &result {
                    Ok(()) => info!(%bonus, balance = self.record.points(), "bonus applied"),
                    Err(e) => info!(%bonus, reason = %e, "bonus skipped"),
                }
                result?;
            }
            LoyaltyEvent::Redeem { points } => {
                let result = self.redeem_points(points);
                self.log_result("redemption", points, &result);
                result?;
            }
        }
        Ok(())
    }

    /// Run the ledger over the given event stream. Rejected events are logged
    /// and skipped.
    pub async fn run(&mut self, mut stream: impl Stream<Item = LoyaltyEvent> + Unpin) {
        while let Some(event) = stream.next().await {
            let _ = self.apply(event);
        }
    }
}

/// Private API
impl<S: Storage> Ledger<S> {
    fn credit(&mut self, requested: Points) -> Result<(), LedgerError> {
        let mut next = self.record.clone();
        next.credit(requested).ok_or(GrantError::Overflow {
            current: self.record.points(),
            requested,
        })?;

        self.commit(next)?;
        Ok(())
    }

    /// Persist `next`, then make it the current record.
    fn commit(&mut self, next: LoyaltyRecord) -> Result<(), LedgerError> {
        if let Err(e) = self.storage.save(&next.to_json()?) {
            warn!(reason = %e, "save failed, keeping last persisted record");
            return Err(e.into());
        }
        self.record = next;
        Ok(())
    }

    fn log_result(&self, kind: &str, points: i64, result: &Result<(), LedgerError>) {
        match result {
            Ok(()) => info!(
                points,
                balance = self.record.points(),
                tier = %self.record.tier(),
                "{kind} applied"
            ),
            Err(e) => info!(points, reason = %e, "{kind} skipped"),
        }
    }
}
