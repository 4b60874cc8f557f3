//! Business logic services for the Costbook ledger

pub mod catalog;
pub mod costing;
pub mod ledger;
pub mod merge;
pub mod purchase;
pub mod registry;
pub mod reporting;
pub mod sales;
pub mod waste;

pub use catalog::CatalogService;
pub use costing::CostingService;
pub use ledger::LedgerService;
pub use merge::MergeService;
pub use purchase::PurchaseService;
pub use registry::IngredientService;
pub use reporting::ReportingService;
pub use sales::SaleService;
pub use waste::WasteService;

/// Bounded retry count for optimistic-concurrency commits. A commit that
/// still conflicts after this many fresh reads surfaces
/// `AppError::ConcurrencyConflict` to the caller.
pub const MAX_COMMIT_RETRIES: u32 = 5;
