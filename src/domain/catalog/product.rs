use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

// ============================================================================
// Product Entity and Value Objects
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Category {
    Pants,
    Tops,
    Outer,
    Shoes,
    Accessory,
}

impl Category {
    pub fn as_str(&self) -> &'static str {
        match self {
            Category::Pants => "PANTS",
            Category::Tops => "TOPS",
            Category::Outer => "OUTER",
            Category::Shoes => "SHOES",
            Category::Accessory => "ACCESSORY",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "PANTS" => Some(Category::Pants),
            "TOPS" => Some(Category::Tops),
            "OUTER" => Some(Category::Outer),
            "SHOES" => Some(Category::Shoes),
            "ACCESSORY" => Some(Category::Accessory),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ProductSize {
    S,
    M,
    L,
    Xl,
}

impl ProductSize {
    pub fn as_str(&self) -> &'static str {
        match self {
            ProductSize::S => "S",
            ProductSize::M => "M",
            ProductSize::L => "L",
            ProductSize::Xl => "XL",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "S" => Some(ProductSize::S),
            "M" => Some(ProductSize::M),
            "L" => Some(ProductSize::L),
            "XL" => Some(ProductSize::Xl),
            _ => None,
        }
    }
}

/// Authoritative product record. Prices are integer minor-currency units.
///
/// State changes go through the pure transition methods below; callers get a
/// new value back and decide whether to persist it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Product {
    pub id: i64,
    pub name: String,
    pub description: String,
    pub unit_price: i64,
    pub stock_quantity: i32,
    pub category: Category,
    pub size: ProductSize,
    pub shop_displayable: bool,
    pub avg_rating: f32,
    pub created_at: DateTime<Utc>,
}

impl Product {
    pub fn line_price(&self, quantity: i32) -> i64 {
        self.unit_price * i64::from(quantity)
    }

    /// Stock policy: a request for `quantity` units is satisfiable iff
    /// `stock_quantity >= quantity`; stock may reach exactly zero.
    pub fn has_stock_for(&self, quantity: i32) -> bool {
        self.stock_quantity >= quantity
    }

    /// Stock decrement as a pure transition. Returns `None` when the
    /// remaining stock does not cover `quantity`.
    pub fn decremented(&self, quantity: i32) -> Option<Product> {
        if quantity < 0 || !self.has_stock_for(quantity) {
            return None;
        }
        Some(Product {
            stock_quantity: self.stock_quantity - quantity,
            ..self.clone()
        })
    }

    pub fn with_rating(&self, avg_rating: f32) -> Product {
        Product {
            avg_rating,
            ..self.clone()
        }
    }

    /// Apply a partial admin update, leaving unset fields untouched.
    pub fn apply_update(&self, patch: &ProductPatch) -> Product {
        let mut next = self.clone();
        if let Some(name) = &patch.name {
            next.name = name.clone();
        }
        if let Some(description) = &patch.description {
            next.description = description.clone();
        }
        if let Some(unit_price) = patch.unit_price {
            next.unit_price = unit_price;
        }
        if let Some(stock_quantity) = patch.stock_quantity {
            next.stock_quantity = stock_quantity;
        }
        if let Some(shop_displayable) = patch.shop_displayable {
            next.shop_displayable = shop_displayable;
        }
        next
    }
}

/// A product as submitted for creation, before storage assigns identity.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewProduct {
    pub name: String,
    pub description: String,
    pub unit_price: i64,
    pub stock_quantity: i32,
    pub category: Category,
    pub size: ProductSize,
    pub shop_displayable: bool,
}

/// Partial update for admin product edits.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ProductPatch {
    pub name: Option<String>,
    pub description: Option<String>,
    pub unit_price: Option<i64>,
    pub stock_quantity: Option<i32>,
    pub shop_displayable: Option<bool>,
}
