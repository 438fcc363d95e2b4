use serde::{Deserialize, Serialize};
use validator::{Validate, ValidationError};

use crate::models::generate_id;

/// A product name watched under a price ceiling.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct WatchedProduct {
    // Files written before ids existed still load
    #[serde(default = "generate_id")]
    pub id: String,
    pub name: String,
    pub max_price: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct NewWatchedProduct {
    #[validate(length(min = 1, message = "Product name must not be empty"))]
    pub name: String,
    #[validate(custom(function = "validate_max_price"))]
    pub max_price: f64,
}

fn validate_max_price(value: f64) -> Result<(), ValidationError> {
    if value.is_finite() && value > 0.0 {
        Ok(())
    } else {
        let mut err = ValidationError::new("max_price");
        err.message = Some("Maximum price must be greater than 0".into());
        Err(err)
    }
}

impl NewWatchedProduct {
    pub fn new(name: &str, max_price: f64) -> Self {
        Self {
            name: name.trim().to_string(),
            max_price,
        }
    }
}

impl WatchedProduct {
    pub fn new(new_product: NewWatchedProduct) -> Self {
        Self {
            id: generate_id(),
            name: new_product.name,
            max_price: new_product.max_price,
        }
    }
}
