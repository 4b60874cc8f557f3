//! In-memory store
//!
//! Reference implementation of the [`Store`] contract backed by RwLock'd
//! maps. Multi-key commits validate every version under one write lock, so
//! the all-or-nothing guarantee holds without compensating rollback.

use std::collections::HashMap;
use std::sync::RwLock;

use shared::{Ingredient, Product, Recipe, Sale, StockTransaction, TimeRange, WasteEvent};
use uuid::Uuid;

use super::{Store, StoreError};

#[derive(Default)]
struct Inner {
    ingredients: HashMap<Uuid, Ingredient>,
    /// Ledger in append order; entries are never updated or removed, only
    /// the merge rewrite may change their ingredient reference in place
    ledger: Vec<StockTransaction>,
    ledger_index: HashMap<Uuid, usize>,
    recipes: HashMap<Uuid, Recipe>,
    products: HashMap<Uuid, Product>,
    sales: HashMap<Uuid, Sale>,
    waste_events: HashMap<Uuid, WasteEvent>,
}

/// In-memory document store with per-ingredient optimistic concurrency
#[derive(Default)]
pub struct MemoryStore {
    inner: RwLock<Inner>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl Inner {
    fn check_updates(&self, updates: &[Ingredient]) -> Result<(), StoreError> {
        for update in updates {
            let stored = self
                .ingredients
                .get(&update.id)
                .ok_or(StoreError::UnknownIngredient(update.id))?;
            if update.version != stored.version + 1 {
                return Err(StoreError::VersionConflict(update.id));
            }
        }
        Ok(())
    }

    fn apply(&mut self, updates: Vec<Ingredient>, appends: Vec<StockTransaction>) {
        for update in updates {
            self.ingredients.insert(update.id, update);
        }
        for txn in appends {
            if self.ledger_index.contains_key(&txn.id) {
                continue;
            }
            self.ledger_index.insert(txn.id, self.ledger.len());
            self.ledger.push(txn);
        }
    }
}

fn sorted_by_time(mut txns: Vec<StockTransaction>) -> Vec<StockTransaction> {
    txns.sort_by_key(|t| t.recorded_at);
    txns
}

impl Store for MemoryStore {
    fn insert_ingredient(&self, ingredient: Ingredient) -> Result<(), StoreError> {
        let mut inner = self.inner.write().unwrap();
        if inner.ingredients.contains_key(&ingredient.id) {
            return Err(StoreError::DuplicateIngredient(ingredient.id));
        }
        inner.ingredients.insert(ingredient.id, ingredient);
        Ok(())
    }

    fn get_ingredient(&self, id: Uuid) -> Option<Ingredient> {
        self.inner.read().unwrap().ingredients.get(&id).cloned()
    }

    fn find_ingredient_by_name(&self, name: &str) -> Option<Ingredient> {
        // a merged alias may share its name with a later active ingredient;
        // the active one is the canonical answer
        self.inner
            .read()
            .unwrap()
            .ingredients
            .values()
            .filter(|i| i.name == name)
            .max_by_key(|i| i.is_active())
            .cloned()
    }

    fn list_ingredients(&self) -> Vec<Ingredient> {
        let mut all: Vec<_> = self
            .inner
            .read()
            .unwrap()
            .ingredients
            .values()
            .cloned()
            .collect();
        all.sort_by(|a, b| a.name.cmp(&b.name));
        all
    }

    fn commit(
        &self,
        updates: Vec<Ingredient>,
        appends: Vec<StockTransaction>,
    ) -> Result<(), StoreError> {
        let mut inner = self.inner.write().unwrap();
        inner.check_updates(&updates)?;
        inner.apply(updates, appends);
        Ok(())
    }

    fn get_transaction(&self, id: Uuid) -> Option<StockTransaction> {
        let inner = self.inner.read().unwrap();
        inner
            .ledger_index
            .get(&id)
            .map(|&idx| inner.ledger[idx].clone())
    }

    fn transactions_for_ingredient(&self, ingredient_id: Uuid) -> Vec<StockTransaction> {
        let inner = self.inner.read().unwrap();
        sorted_by_time(
            inner
                .ledger
                .iter()
                .filter(|t| t.ingredient_id == ingredient_id)
                .cloned()
                .collect(),
        )
    }

    fn transactions_in_range(&self, range: &TimeRange) -> Vec<StockTransaction> {
        let inner = self.inner.read().unwrap();
        sorted_by_time(
            inner
                .ledger
                .iter()
                .filter(|t| range.contains(t.recorded_at))
                .cloned()
                .collect(),
        )
    }

    fn all_transactions(&self) -> Vec<StockTransaction> {
        self.inner.read().unwrap().ledger.clone()
    }

    fn transaction_count(&self) -> usize {
        self.inner.read().unwrap().ledger.len()
    }

    fn commit_merge(
        &self,
        source: Ingredient,
        target: Ingredient,
        marker: StockTransaction,
    ) -> Result<usize, StoreError> {
        let source_id = source.id;
        let mut inner = self.inner.write().unwrap();
        let updates = vec![source, target];
        inner.check_updates(&updates)?;

        let target_id = updates[1].id;
        let mut rewritten = 0;
        for txn in inner.ledger.iter_mut() {
            if txn.ingredient_id == source_id {
                txn.ingredient_id = target_id;
                rewritten += 1;
            }
        }
        inner.apply(updates, vec![marker]);
        Ok(rewritten)
    }

    fn put_recipe(&self, recipe: Recipe) {
        self.inner.write().unwrap().recipes.insert(recipe.id, recipe);
    }

    fn get_recipe(&self, id: Uuid) -> Option<Recipe> {
        self.inner.read().unwrap().recipes.get(&id).cloned()
    }

    fn list_recipes(&self) -> Vec<Recipe> {
        let mut all: Vec<_> = self
            .inner
            .read()
            .unwrap()
            .recipes
            .values()
            .cloned()
            .collect();
        all.sort_by(|a, b| a.name.cmp(&b.name));
        all
    }

    fn delete_recipe(&self, id: Uuid) -> bool {
        self.inner.write().unwrap().recipes.remove(&id).is_some()
    }

    fn put_product(&self, product: Product) {
        self.inner
            .write()
            .unwrap()
            .products
            .insert(product.id, product);
    }

    fn get_product(&self, id: Uuid) -> Option<Product> {
        self.inner.read().unwrap().products.get(&id).cloned()
    }

    fn list_products(&self) -> Vec<Product> {
        let mut all: Vec<_> = self
            .inner
            .read()
            .unwrap()
            .products
            .values()
            .cloned()
            .collect();
        all.sort_by(|a, b| a.name.cmp(&b.name));
        all
    }

    fn put_sale(&self, sale: Sale) {
        self.inner.write().unwrap().sales.insert(sale.id, sale);
    }

    fn get_sale(&self, id: Uuid) -> Option<Sale> {
        self.inner.read().unwrap().sales.get(&id).cloned()
    }

    fn set_sale_reversed(&self, id: Uuid, reversed: bool) -> Option<Sale> {
        let mut inner = self.inner.write().unwrap();
        let sale = inner.sales.get_mut(&id)?;
        if sale.reversed == reversed {
            return None;
        }
        sale.reversed = reversed;
        Some(sale.clone())
    }

    fn list_sales(&self) -> Vec<Sale> {
        let mut all: Vec<_> = self.inner.read().unwrap().sales.values().cloned().collect();
        all.sort_by_key(|s| s.recorded_at);
        all
    }

    fn put_waste_event(&self, event: WasteEvent) {
        self.inner
            .write()
            .unwrap()
            .waste_events
            .insert(event.id, event);
    }

    fn get_waste_event(&self, id: Uuid) -> Option<WasteEvent> {
        self.inner.read().unwrap().waste_events.get(&id).cloned()
    }

    fn set_waste_reversed(&self, id: Uuid, reversed: bool) -> Option<WasteEvent> {
        let mut inner = self.inner.write().unwrap();
        let event = inner.waste_events.get_mut(&id)?;
        if event.reversed == reversed {
            return None;
        }
        event.reversed = reversed;
        Some(event.clone())
    }

    fn list_waste_events(&self) -> Vec<WasteEvent> {
        let mut all: Vec<_> = self
            .inner
            .read()
            .unwrap()
            .waste_events
            .values()
            .cloned()
            .collect();
        all.sort_by_key(|w| w.recorded_at);
        all
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use rust_decimal::Decimal;
    use shared::{CustomerInfo, TransactionKind, UnitCategory};

    fn ingredient(name: &str) -> Ingredient {
        Ingredient::new(name.to_string(), UnitCategory::Mass)
    }

    #[test]
    fn test_commit_rejects_stale_version() {
        let store = MemoryStore::new();
        let ing = ingredient("FARINHA");
        store.insert_ingredient(ing.clone()).unwrap();

        // stale: version not bumped
        let stale = ing.clone();
        assert_eq!(
            store.commit(vec![stale], vec![]),
            Err(StoreError::VersionConflict(ing.id))
        );

        let mut fresh = ing.clone();
        fresh.version += 1;
        assert!(store.commit(vec![fresh], vec![]).is_ok());
    }

    #[test]
    fn test_commit_is_all_or_nothing() {
        let store = MemoryStore::new();
        let a = ingredient("ACUCAR");
        let b = ingredient("OVOS");
        store.insert_ingredient(a.clone()).unwrap();
        store.insert_ingredient(b.clone()).unwrap();

        let mut good = a.clone();
        good.version += 1;
        good.quantity = Decimal::from(100);
        let stale_b = b.clone();

        let txn = StockTransaction::new(TransactionKind::Purchase, a.id, Decimal::from(100));
        let result = store.commit(vec![good, stale_b], vec![txn]);
        assert!(result.is_err());

        // nothing applied
        assert_eq!(store.get_ingredient(a.id).unwrap().quantity, Decimal::ZERO);
        assert_eq!(store.transaction_count(), 0);
    }

    #[test]
    fn test_reversed_flag_flip_is_a_single_claim() {
        let store = MemoryStore::new();
        let sale = Sale {
            id: Uuid::new_v4(),
            product_id: Uuid::new_v4(),
            quantity: Decimal::ONE,
            unit_price: Decimal::TEN,
            total: Decimal::TEN,
            customer: CustomerInfo::default(),
            consumption_txns: vec![],
            reversed: false,
            recorded_at: Utc::now(),
        };
        store.put_sale(sale.clone());

        // first flip wins, the second sees the flag already set
        assert!(store.set_sale_reversed(sale.id, true).is_some());
        assert!(store.set_sale_reversed(sale.id, true).is_none());
        assert!(store.set_sale_reversed(Uuid::new_v4(), true).is_none());

        // releasing the claim re-arms it
        assert!(store.set_sale_reversed(sale.id, false).is_some());
        assert!(store.set_sale_reversed(sale.id, true).is_some());
    }

    #[test]
    fn test_duplicate_append_is_skipped() {
        let store = MemoryStore::new();
        let ing = ingredient("LEITE");
        store.insert_ingredient(ing.clone()).unwrap();

        let txn = StockTransaction::new(TransactionKind::Purchase, ing.id, Decimal::from(10));
        store.commit(vec![], vec![txn.clone()]).unwrap();
        store.commit(vec![], vec![txn]).unwrap();
        assert_eq!(store.transaction_count(), 1);
    }
}
