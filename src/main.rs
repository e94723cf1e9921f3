use std::collections::BTreeMap;
use std::sync::Arc;

use sqlx::postgres::PgPoolOptions;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use storefront_core::config::AppConfig;
use storefront_core::domain::cart::CartService;
use storefront_core::domain::catalog::{CatalogService, Category, NewProduct, ProductSize};
use storefront_core::domain::order::{OrderWorkflow, PlaceOrderRequest};
use storefront_core::domain::user::{NewUser, UserService};
use storefront_core::gateway::HttpPaymentGateway;
use storefront_core::repository::PgStore;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Structured logging, overridable with RUST_LOG
    tracing_subscriber::registry()
        .with(fmt::layer().with_target(true))
        .with(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("info,storefront_core=debug")),
        )
        .init();

    tracing::info!("🚀 Starting storefront core demo");

    let config = AppConfig::from_env();

    // === 1. Connect to Postgres and bootstrap the schema ===
    tracing::info!("Connecting to Postgres...");
    let pool = PgPoolOptions::new()
        .max_connections(5)
        .connect(&config.database_url)
        .await?;

    let store = Arc::new(PgStore::new(pool));
    store.init_schema().await?;

    // === 2. Wire services ===
    let gateway = Arc::new(HttpPaymentGateway::new(&config.gateway)?);

    let users = UserService::new(store.clone());
    let catalog = CatalogService::new(store.clone());
    let carts = CartService::new(store.clone(), store.clone(), store.clone());
    let orders = OrderWorkflow::new(store.clone(), store.clone(), store.clone(), gateway);

    // === 3. Walk through the core flows ===
    let user = users
        .register(NewUser {
            name: "demo shopper".to_string(),
            email: format!("demo-{}@example.com", uuid::Uuid::new_v4()),
            phone_number: "010-1234-1234".to_string(),
        })
        .await?;
    tracing::info!("✅ User registered: {}", user.id);

    let product = catalog
        .create_product(NewProduct {
            name: "padded jacket".to_string(),
            description: "warm winter jacket".to_string(),
            unit_price: 50_000,
            stock_quantity: 10,
            category: Category::Outer,
            size: ProductSize::M,
            shop_displayable: true,
        })
        .await?;
    tracing::info!("✅ Product created: {}", product.id);

    carts.update_line_quantity(user.id, product.id, 3).await?;
    carts.update_line_quantity(user.id, product.id, 2).await?;

    let cart = carts.get_cart(user.id).await?;
    tracing::info!(
        user_id = user.id,
        lines = cart.lines.len(),
        quantity = cart.line(product.id).map(|l| l.quantity),
        "✅ Cart updated (absolute quantity, not accumulated)"
    );

    // Checkout needs a real payment reference confirmed by the gateway;
    // only attempt it when one is supplied.
    match std::env::var("DEMO_PAYMENT_REFERENCE") {
        Ok(reference) => {
            let order_id = orders
                .place_order(
                    &reference,
                    PlaceOrderRequest {
                        user_id: user.id,
                        total_price: product.unit_price * 2,
                        products: BTreeMap::from([(product.id, 2)]),
                    },
                )
                .await?;
            tracing::info!("✅ Order placed: {}", order_id);
        }
        Err(_) => {
            tracing::info!("DEMO_PAYMENT_REFERENCE not set; skipping checkout");
        }
    }

    tracing::info!("🎉 Demo complete");
    Ok(())
}
