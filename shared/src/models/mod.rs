//! Domain models for the Costbook ledger

mod extraction;
mod ingredient;
mod product;
mod recipe;
mod sale;
mod transaction;
mod waste;

pub use extraction::*;
pub use ingredient::*;
pub use product::*;
pub use recipe::*;
pub use sale::*;
pub use transaction::*;
pub use waste::*;
