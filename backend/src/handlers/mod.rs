//! HTTP handlers for the Costbook ledger API

pub mod catalog;
pub mod health;
pub mod ingredients;
pub mod ledger;
pub mod purchases;
pub mod reports;
pub mod sales;
pub mod waste;

pub use catalog::*;
pub use health::*;
pub use ingredients::*;
pub use ledger::*;
pub use purchases::*;
pub use reports::*;
pub use sales::*;
pub use waste::*;
