//! Core types shared by every ledger component
//!
//! - `Address` identities for workers and receipt holders
//! - Fixed-point helpers (basis points, exchange-rate scale)
//! - The `PoolError` taxonomy
//! - `AdminCap` capability checks

pub mod address;
pub mod authority;
pub mod error;
pub mod math;

pub use address::{AccountId, Address, AddressParseError, WorkerId};
pub use authority::{AdminCap, Authority, AuthorityId};
pub use error::{PoolError, PoolResult};
pub use math::{apply_bps, bps_of, mul_div, BPS_DENOMINATOR, INITIAL_EXCHANGE_RATE, RATE_SCALE};
