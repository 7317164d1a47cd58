//! zkyc Settlement Layer
//!
//! Moves verification fees between accounts: requester to escrow when a
//! request is created, escrow to subject and treasury when it is settled.

pub mod adapters;
pub mod error;
pub mod fee;
pub mod traits;
pub mod types;

pub use adapters::internal::InternalRail;
pub use error::SettlementError;
pub use fee::FeeSplit;
pub use traits::PaymentRail;
pub use types::{SettlementId, SettlementReceipt, SettlementStatus, TransferLeg};
