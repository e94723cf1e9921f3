use std::sync::Arc;

use crate::domain::{Page, Paged};
use crate::repository::ProductRepository;

use super::errors::CatalogError;
use super::product::{NewProduct, Product, ProductPatch};

// ============================================================================
// Catalog Service - Admin CRUD and Listing
// ============================================================================

pub struct CatalogService {
    products: Arc<dyn ProductRepository>,
}

impl CatalogService {
    pub fn new(products: Arc<dyn ProductRepository>) -> Self {
        Self { products }
    }

    pub async fn create_product(&self, new_product: NewProduct) -> Result<Product, CatalogError> {
        if new_product.unit_price <= 0 {
            return Err(CatalogError::InvalidPrice(new_product.unit_price));
        }
        if new_product.stock_quantity < 0 {
            return Err(CatalogError::InvalidStock(new_product.stock_quantity));
        }

        let product = self.products.insert(new_product).await?;
        tracing::info!(product_id = product.id, name = %product.name, "product created");
        Ok(product)
    }

    pub async fn get_product(&self, id: i64) -> Result<Product, CatalogError> {
        self.products
            .find_by_id(id)
            .await?
            .ok_or(CatalogError::NotFound(id))
    }

    pub async fn update_product(
        &self,
        id: i64,
        patch: ProductPatch,
    ) -> Result<Product, CatalogError> {
        if let Some(unit_price) = patch.unit_price {
            if unit_price <= 0 {
                return Err(CatalogError::InvalidPrice(unit_price));
            }
        }
        if let Some(stock_quantity) = patch.stock_quantity {
            if stock_quantity < 0 {
                return Err(CatalogError::InvalidStock(stock_quantity));
            }
        }

        let product = self.get_product(id).await?;
        let updated = product.apply_update(&patch);
        self.products.update(&updated).await?;
        Ok(updated)
    }

    pub async fn delete_product(&self, id: i64) -> Result<(), CatalogError> {
        if !self.products.delete(id).await? {
            return Err(CatalogError::NotFound(id));
        }
        tracing::info!(product_id = id, "product deleted");
        Ok(())
    }

    pub async fn list_products(&self, page: Page) -> Result<Paged<Product>, CatalogError> {
        Ok(self.products.list(page).await?)
    }

    /// Only products flagged for shop display.
    pub async fn list_displayable(&self, page: Page) -> Result<Paged<Product>, CatalogError> {
        Ok(self.products.list_displayable(page).await?)
    }
}
