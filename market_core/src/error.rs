use thiserror::Error;

/// A submitted form failed a field rule. The message is user-facing.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[error("{0}")]
pub struct ValidationError(pub String);

impl ValidationError {
    pub fn new(message: impl Into<String>) -> Self {
        Self(message.into())
    }
}

/// Trimmed, non-empty text field.
pub fn required(field: &str, value: &str) -> Result<String, ValidationError> {
    let value = value.trim();
    if value.is_empty() {
        return Err(ValidationError::new(format!("{field} is required")));
    }
    Ok(value.to_string())
}

/// Prices must be strictly positive and finite.
pub fn positive_price(price: f64) -> Result<f64, ValidationError> {
    if !price.is_finite() || price <= 0.0 {
        return Err(ValidationError::new("price must be greater than zero"));
    }
    Ok(price)
}

pub fn positive_quantity(field: &str, quantity: i32) -> Result<i32, ValidationError> {
    if quantity < 1 {
        return Err(ValidationError::new(format!("{field} must be at least 1")));
    }
    Ok(quantity)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn required_trims_and_rejects_blank() {
        assert_eq!(required("title", "  lamp ").unwrap(), "lamp");
        assert_eq!(
            required("title", "   ").unwrap_err().to_string(),
            "title is required"
        );
    }

    #[test]
    fn price_and_quantity_bounds() {
        assert!(positive_price(0.01).is_ok());
        assert!(positive_price(0.0).is_err());
        assert!(positive_price(f64::NAN).is_err());
        assert!(positive_quantity("stock", 1).is_ok());
        assert!(positive_quantity("stock", 0).is_err());
    }
}
