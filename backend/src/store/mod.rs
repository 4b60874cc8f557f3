//! Persistence contract
//!
//! The core does not depend on a concrete storage technology. It requires a
//! document store with per-key optimistic-concurrency writes on ingredients,
//! durable append semantics for the ledger, and range queries by ingredient
//! and timestamp. [`MemoryStore`] is the shipped implementation; a database
//! adapter implements the same trait.

mod memory;

pub use memory::MemoryStore;

use shared::{Ingredient, Product, Recipe, Sale, StockTransaction, TimeRange, WasteEvent};
use thiserror::Error;
use uuid::Uuid;

/// Failures of conditional writes, kept separate from `AppError` so callers
/// can retry version conflicts from a fresh read
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum StoreError {
    #[error("version conflict on ingredient {0}")]
    VersionConflict(Uuid),

    #[error("ingredient {0} does not exist")]
    UnknownIngredient(Uuid),

    #[error("ingredient {0} already exists")]
    DuplicateIngredient(Uuid),
}

/// Storage contract for the ledger core.
///
/// `commit` is the only way registry state and ledger entries change
/// together: it validates every updated ingredient's version (expected to be
/// exactly one above the stored version) and applies updates plus appends
/// all-or-nothing. The ledger itself is append-only; no update or delete
/// operation exists, with the single exception of the bulk reference rewrite
/// used by ingredient merges.
pub trait Store: Send + Sync {
    // --- Ingredient registry ---

    fn insert_ingredient(&self, ingredient: Ingredient) -> Result<(), StoreError>;

    fn get_ingredient(&self, id: Uuid) -> Option<Ingredient>;

    /// Exact-name lookup. When a merged alias and an active ingredient carry
    /// the same name, the active one wins.
    fn find_ingredient_by_name(&self, name: &str) -> Option<Ingredient>;

    fn list_ingredients(&self) -> Vec<Ingredient>;

    /// Atomically apply registry updates and append ledger entries.
    ///
    /// Every update must carry `version == stored version + 1`; otherwise the
    /// whole commit is rejected with [`StoreError::VersionConflict`] and
    /// nothing is written. Appends whose transaction id already exists are
    /// skipped, making replayed commits idempotent at the ledger level.
    fn commit(
        &self,
        updates: Vec<Ingredient>,
        appends: Vec<StockTransaction>,
    ) -> Result<(), StoreError>;

    // --- Ledger (append-only) ---

    fn get_transaction(&self, id: Uuid) -> Option<StockTransaction>;

    /// Transactions for one ingredient, in recorded_at order
    fn transactions_for_ingredient(&self, ingredient_id: Uuid) -> Vec<StockTransaction>;

    /// Transactions within a time range, in recorded_at order
    fn transactions_in_range(&self, range: &TimeRange) -> Vec<StockTransaction>;

    /// Full ledger in append order
    fn all_transactions(&self) -> Vec<StockTransaction>;

    fn transaction_count(&self) -> usize;

    /// Merge commit: validates both ingredients' versions, rewrites the
    /// ingredient reference of every transaction of `source_id` to the
    /// target in place, applies both updated ingredients and appends the
    /// merge-adjustment marker, all atomically. Returns the number of
    /// rewritten transactions.
    fn commit_merge(
        &self,
        source: Ingredient,
        target: Ingredient,
        marker: StockTransaction,
    ) -> Result<usize, StoreError>;

    // --- Documents ---

    fn put_recipe(&self, recipe: Recipe);
    fn get_recipe(&self, id: Uuid) -> Option<Recipe>;
    fn list_recipes(&self) -> Vec<Recipe>;
    fn delete_recipe(&self, id: Uuid) -> bool;

    fn put_product(&self, product: Product);
    fn get_product(&self, id: Uuid) -> Option<Product>;
    fn list_products(&self) -> Vec<Product>;

    fn put_sale(&self, sale: Sale);
    fn get_sale(&self, id: Uuid) -> Option<Sale>;
    fn list_sales(&self) -> Vec<Sale>;

    /// Atomically flip a sale's reversed flag. Returns the updated sale, or
    /// `None` when the sale is missing or the flag already holds `reversed`.
    /// Concurrent reversals race on this claim, not on a read of the flag.
    fn set_sale_reversed(&self, id: Uuid, reversed: bool) -> Option<Sale>;

    fn put_waste_event(&self, event: WasteEvent);
    fn get_waste_event(&self, id: Uuid) -> Option<WasteEvent>;
    fn list_waste_events(&self) -> Vec<WasteEvent>;

    /// Atomically flip a waste event's reversed flag; same contract as
    /// [`Store::set_sale_reversed`].
    fn set_waste_reversed(&self, id: Uuid, reversed: bool) -> Option<WasteEvent>;
}
