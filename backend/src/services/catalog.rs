//! Recipe and product catalog
//!
//! Recipes are editable working documents; products are frozen snapshots of
//! a recipe taken at publish time. Pricing on both sides keeps margin and
//! price consistent through the solver: the caller supplies exactly one and
//! the other is derived.

use std::sync::Arc;

use chrono::Utc;
use rust_decimal::Decimal;
use serde::Deserialize;
use shared::{
    normalize_name, normalize_raw, validate_quantity, ExtraCost, PricingInput, Product, Recipe,
    RecipeEntry,
};
use uuid::Uuid;

use crate::error::{AppError, AppResult};
use crate::store::Store;

use super::costing::{solve_from_margin, solve_from_price, CostBreakdown, CostingService};
use super::registry::IngredientService;

/// One ingredient line as submitted, quantity in any supported unit of the
/// ingredient's category
#[derive(Debug, Clone, Deserialize)]
pub struct EntryInput {
    pub ingredient_id: Uuid,
    pub quantity: Decimal,
    pub unit: String,
}

/// Exactly one pricing field, the one the caller is setting
#[derive(Debug, Clone, Copy, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PricingSpec {
    Margin(Decimal),
    Price(Decimal),
}

/// Input for creating or replacing a recipe
#[derive(Debug, Deserialize)]
pub struct RecipeInput {
    pub name: String,
    pub entries: Vec<EntryInput>,
    #[serde(default)]
    pub extra_costs: Vec<ExtraCost>,
    pub pricing: PricingSpec,
}

/// A recipe together with its current cost breakdown
#[derive(Debug, Clone, serde::Serialize)]
pub struct PricedRecipe {
    pub recipe: Recipe,
    pub breakdown: CostBreakdown,
}

/// Catalog service for recipes and published products
#[derive(Clone)]
pub struct CatalogService {
    store: Arc<dyn Store>,
    registry: IngredientService,
    costing: CostingService,
}

impl CatalogService {
    pub fn new(store: Arc<dyn Store>) -> Self {
        Self {
            registry: IngredientService::new(store.clone()),
            costing: CostingService::new(store.clone()),
            store,
        }
    }

    /// Normalize submitted entries into base units against each ingredient's
    /// category, resolving merge aliases and combining duplicate lines.
    async fn normalize_entries(&self, entries: &[EntryInput]) -> AppResult<Vec<RecipeEntry>> {
        if entries.is_empty() {
            return Err(AppError::Validation {
                field: "entries".to_string(),
                message: "A recipe needs at least one ingredient".to_string(),
                message_pt: "A receita precisa de pelo menos um ingrediente".to_string(),
            });
        }
        let mut normalized: Vec<RecipeEntry> = Vec::with_capacity(entries.len());
        for entry in entries {
            validate_quantity(entry.quantity).map_err(|msg| AppError::Validation {
                field: "quantity".to_string(),
                message: msg.to_string(),
                message_pt: "A quantidade deve ser positiva".to_string(),
            })?;
            let ingredient = self.registry.resolve_canonical(entry.ingredient_id).await?;
            let quantity = normalize_raw(entry.quantity, &entry.unit, ingredient.category)?;
            match normalized
                .iter_mut()
                .find(|e| e.ingredient_id == ingredient.id)
            {
                Some(existing) => existing.quantity += quantity,
                None => normalized.push(RecipeEntry {
                    ingredient_id: ingredient.id,
                    quantity,
                }),
            }
        }
        Ok(normalized)
    }

    /// Solve the pricing pair from a unit cost and the supplied field
    fn solve_pricing(
        unit_cost: Decimal,
        pricing: PricingSpec,
    ) -> AppResult<(Decimal, Decimal, PricingInput)> {
        match pricing {
            PricingSpec::Margin(margin) => {
                let price = solve_from_margin(unit_cost, margin)?;
                Ok((margin, price, PricingInput::Margin))
            }
            PricingSpec::Price(price) => {
                let margin = solve_from_price(unit_cost, price)?;
                Ok((margin, price, PricingInput::Price))
            }
        }
    }

    pub async fn create_recipe(&self, input: RecipeInput) -> AppResult<PricedRecipe> {
        let name = normalize_name(&input.name);
        if name.is_empty() {
            return Err(AppError::Validation {
                field: "name".to_string(),
                message: "Recipe name is required".to_string(),
                message_pt: "O nome da receita é obrigatório".to_string(),
            });
        }
        if self
            .store
            .list_recipes()
            .iter()
            .any(|r| r.name == name)
        {
            return Err(AppError::DuplicateEntry(name));
        }

        let entries = self.normalize_entries(&input.entries).await?;
        let breakdown = self.costing.cost_entries(&entries, &input.extra_costs).await?;
        let (margin_percent, sale_price, pricing_input) =
            Self::solve_pricing(breakdown.total, input.pricing)?;

        let now = Utc::now();
        let recipe = Recipe {
            id: Uuid::new_v4(),
            name,
            entries,
            extra_costs: input.extra_costs,
            unit_cost: breakdown.total,
            margin_percent,
            sale_price,
            pricing_input,
            created_at: now,
            updated_at: now,
        };
        self.store.put_recipe(recipe.clone());
        tracing::info!(recipe = %recipe.name, id = %recipe.id, "recipe created");
        Ok(PricedRecipe { recipe, breakdown })
    }

    /// Replace a recipe's contents and re-solve its pricing from the field
    /// the caller supplied
    pub async fn update_recipe(&self, id: Uuid, input: RecipeInput) -> AppResult<PricedRecipe> {
        let existing = self
            .store
            .get_recipe(id)
            .ok_or_else(|| AppError::NotFound("Recipe".to_string()))?;

        let name = normalize_name(&input.name);
        if name.is_empty() {
            return Err(AppError::Validation {
                field: "name".to_string(),
                message: "Recipe name is required".to_string(),
                message_pt: "O nome da receita é obrigatório".to_string(),
            });
        }
        if self
            .store
            .list_recipes()
            .iter()
            .any(|r| r.name == name && r.id != id)
        {
            return Err(AppError::DuplicateEntry(name));
        }

        let entries = self.normalize_entries(&input.entries).await?;
        let breakdown = self.costing.cost_entries(&entries, &input.extra_costs).await?;
        let (margin_percent, sale_price, pricing_input) =
            Self::solve_pricing(breakdown.total, input.pricing)?;

        let recipe = Recipe {
            id,
            name,
            entries,
            extra_costs: input.extra_costs,
            unit_cost: breakdown.total,
            margin_percent,
            sale_price,
            pricing_input,
            created_at: existing.created_at,
            updated_at: Utc::now(),
        };
        self.store.put_recipe(recipe.clone());
        Ok(PricedRecipe { recipe, breakdown })
    }

    /// Re-cost a recipe at current registry prices without editing it,
    /// re-deriving the non-authoritative pricing field.
    ///
    /// Registry costs drift as purchases land; this recomputation is how a
    /// stored recipe's numbers catch up.
    pub async fn reprice_recipe(&self, id: Uuid) -> AppResult<PricedRecipe> {
        let mut recipe = self
            .store
            .get_recipe(id)
            .ok_or_else(|| AppError::NotFound("Recipe".to_string()))?;
        let breakdown = self
            .costing
            .cost_entries(&recipe.entries, &recipe.extra_costs)
            .await?;

        recipe.unit_cost = breakdown.total;
        match recipe.pricing_input {
            PricingInput::Margin => {
                recipe.sale_price = solve_from_margin(breakdown.total, recipe.margin_percent)?;
            }
            PricingInput::Price => {
                recipe.margin_percent = solve_from_price(breakdown.total, recipe.sale_price)?;
            }
        }
        recipe.updated_at = Utc::now();
        self.store.put_recipe(recipe.clone());
        Ok(PricedRecipe { recipe, breakdown })
    }

    pub async fn get_recipe(&self, id: Uuid) -> AppResult<Recipe> {
        self.store
            .get_recipe(id)
            .ok_or_else(|| AppError::NotFound("Recipe".to_string()))
    }

    pub async fn list_recipes(&self) -> Vec<Recipe> {
        let mut recipes = self.store.list_recipes();
        recipes.sort_by(|a, b| a.name.cmp(&b.name));
        recipes
    }

    pub async fn delete_recipe(&self, id: Uuid) -> AppResult<()> {
        if self.store.delete_recipe(id) {
            Ok(())
        } else {
            Err(AppError::NotFound("Recipe".to_string()))
        }
    }

    /// Publish a recipe as a sellable product: a frozen snapshot priced at
    /// current costs. Later recipe edits never touch published products.
    pub async fn publish_product(&self, recipe_id: Uuid) -> AppResult<Product> {
        let priced = self.reprice_recipe(recipe_id).await?;
        let recipe = priced.recipe;

        let product = Product {
            id: Uuid::new_v4(),
            recipe_id: recipe.id,
            name: recipe.name.clone(),
            entries: recipe.entries.clone(),
            unit_cost: recipe.unit_cost,
            margin_percent: recipe.margin_percent,
            sale_price: recipe.sale_price,
            published_at: Utc::now(),
        };
        self.store.put_product(product.clone());
        tracing::info!(product = %product.name, id = %product.id, "product published");
        Ok(product)
    }

    pub async fn get_product(&self, id: Uuid) -> AppResult<Product> {
        self.store
            .get_product(id)
            .ok_or_else(|| AppError::NotFound("Product".to_string()))
    }

    pub async fn list_products(&self) -> Vec<Product> {
        let mut products = self.store.list_products();
        products.sort_by(|a, b| a.name.cmp(&b.name));
        products
    }
}
