//! Types module
//!
//! Contains core data structures used throughout the application.
//! This module organizes types into logical submodules:
//! - `account`: Account state and identifiers
//! - `operation`: The operations cashiers execute
//! - `error`: Error taxonomy for failed operations

pub mod account;
pub mod error;
pub mod operation;

pub use account::{Account, AccountId, Currency};
pub use error::BankError;
pub use operation::{Operation, OperationKind};
