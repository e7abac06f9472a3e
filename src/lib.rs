pub mod amount;
pub mod csv;
pub mod ledger;
pub mod model;
pub mod storage;
pub mod tier;

pub use amount::Amount;
pub use ledger::{Ledger, LedgerError, LoyaltyRecord};
pub use model::{Bonus, LoyaltyEvent, Points, RedemptionQuote};
pub use storage::{FileStorage, MemoryStorage, Storage, StorageError};
pub use tier::{Tier, TierBenefits, benefits_for, tier_for};
