//! Route definitions for the Costbook ledger API

use axum::{
    routing::{get, post},
    Router,
};

use crate::{handlers, AppState};

/// Create API routes
pub fn api_routes() -> Router<AppState> {
    Router::new()
        // Health check
        .route("/health", get(handlers::health_check))
        // Ingredient registry
        .nest("/ingredients", ingredient_routes())
        // Ledger queries and recovery
        .nest("/ledger", ledger_routes())
        // Purchase intake
        .nest("/purchases", purchase_routes())
        // Recipes and published products
        .nest("/recipes", recipe_routes())
        .nest("/products", product_routes())
        // Sales
        .nest("/sales", sale_routes())
        // Waste events
        .nest("/waste", waste_routes())
        // Reports
        .nest("/reports", report_routes())
}

/// Ingredient registry routes
fn ingredient_routes() -> Router<AppState> {
    Router::new()
        .route(
            "/",
            get(handlers::list_ingredients).post(handlers::create_ingredient),
        )
        .route("/merge", post(handlers::merge_ingredients))
        .route("/:ingredient_id", get(handlers::get_ingredient))
        .route("/:ingredient_id/canonical", get(handlers::resolve_ingredient))
        .route("/:ingredient_id/cost", get(handlers::get_ingredient_cost))
        .route(
            "/:ingredient_id/corrections",
            post(handlers::record_correction),
        )
        .route(
            "/:ingredient_id/transactions",
            get(handlers::get_ingredient_transactions),
        )
}

/// Ledger routes
fn ledger_routes() -> Router<AppState> {
    Router::new()
        .route("/transactions", get(handlers::list_transactions))
        .route("/transactions/:transaction_id", get(handlers::get_transaction))
        .route(
            "/ingredients/:ingredient_id/rebuild",
            get(handlers::rebuild_ingredient_state),
        )
        .route(
            "/ingredients/:ingredient_id/verify",
            get(handlers::verify_ingredient),
        )
        .route(
            "/ingredients/:ingredient_id/restore",
            post(handlers::restore_ingredient),
        )
}

/// Purchase intake routes
fn purchase_routes() -> Router<AppState> {
    Router::new()
        .route("/", post(handlers::record_purchase))
        .route("/receipt/extract", post(handlers::extract_receipt))
        .route("/receipt/process", post(handlers::process_receipt))
        .route("/receipt/confirm", post(handlers::confirm_receipt_line))
}

/// Recipe routes
fn recipe_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(handlers::list_recipes).post(handlers::create_recipe))
        .route(
            "/:recipe_id",
            get(handlers::get_recipe)
                .put(handlers::update_recipe)
                .delete(handlers::delete_recipe),
        )
        .route("/:recipe_id/reprice", post(handlers::reprice_recipe))
        .route("/:recipe_id/publish", post(handlers::publish_product))
}

/// Product routes
fn product_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(handlers::list_products))
        .route("/:product_id", get(handlers::get_product))
}

/// Sale routes
fn sale_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(handlers::list_sales).post(handlers::register_sale))
        .route("/:sale_id", get(handlers::get_sale))
        .route("/:sale_id/reverse", post(handlers::reverse_sale))
}

/// Waste routes
fn waste_routes() -> Router<AppState> {
    Router::new()
        .route(
            "/ingredients",
            post(handlers::register_ingredient_waste),
        )
        .route("/products", post(handlers::register_product_waste))
        .route("/", get(handlers::list_waste_events))
        .route("/reasons", get(handlers::list_waste_reasons))
        .route("/:event_id", get(handlers::get_waste_event))
        .route("/:event_id/reverse", post(handlers::reverse_waste_event))
}

/// Report routes
fn report_routes() -> Router<AppState> {
    Router::new()
        .route("/inventory", get(handlers::inventory_overview))
        .route("/sales", get(handlers::sales_summary))
        .route("/waste", get(handlers::waste_summary))
        .route("/ledger.csv", get(handlers::export_ledger))
}
