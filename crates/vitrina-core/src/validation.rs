//! # Validation Module
//!
//! Input boundary parsing for the product editor.
//!
//! ## Validation Strategy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                      Input Boundary                                     │
//! │                                                                         │
//! │  Cell text typed by the admin ("12.5", "", "12a")                      │
//! │           │                                                             │
//! │           ▼                                                             │
//! │  is_decimal_text ← ^[0-9]*\.?[0-9]*$                                   │
//! │  ├── no match → ValidationError::InvalidFormat (product untouched)     │
//! │  └── match    → parse_decimal_or_zero ("" and "." become 0)            │
//! │           │                                                             │
//! │           ▼                                                             │
//! │  Pricing calculator (never sees text, never fails)                     │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Usage
//! ```rust
//! use vitrina_core::validation::{parse_decimal_or_zero, validate_decimal_input};
//!
//! assert_eq!(validate_decimal_input("costo_usdt", "12.5").unwrap(), 12.5);
//! assert!(validate_decimal_input("costo_usdt", "12a").is_err());
//! assert_eq!(parse_decimal_or_zero(""), 0.0);
//! ```

use regex::Regex;
use std::sync::OnceLock;

use crate::error::ValidationError;
use crate::MAX_PRODUCT_IMAGES;

/// Result type for validation operations.
pub type ValidationResult<T> = Result<T, ValidationError>;

/// Longest accepted product name.
pub const MAX_NAME_LEN: usize = 200;

/// Longest accepted description or category.
pub const MAX_TEXT_LEN: usize = 2000;

fn decimal_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    // ASCII digits only, at most one decimal point
    PATTERN.get_or_init(|| {
        Regex::new(r"^[0-9]*\.?[0-9]*$").expect("DECIMAL_PATTERN should compile - this is a bug")
    })
}

// =============================================================================
// Numeric Input
// =============================================================================

/// True when `raw` is acceptable text for a numeric cell.
///
/// Only digits and at most one decimal point. Blank text is accepted (it
/// means 0). Signs, exponents and grouping separators are not.
///
/// ## Example
/// ```rust
/// use vitrina_core::validation::is_decimal_text;
///
/// assert!(is_decimal_text("12.50"));
/// assert!(is_decimal_text(".5"));
/// assert!(is_decimal_text(""));
/// assert!(!is_decimal_text("1.2.3"));
/// assert!(!is_decimal_text("-4"));
/// ```
pub fn is_decimal_text(raw: &str) -> bool {
    decimal_pattern().is_match(raw)
}

/// Parses numeric text, treating anything unusable as 0.
///
/// This is the single coercion point for numeric cells: blank, a lone `.`,
/// garbage and negatives all become 0.
pub fn parse_decimal_or_zero(raw: &str) -> f64 {
    raw.trim()
        .parse::<f64>()
        .ok()
        .filter(|v| v.is_finite() && *v > 0.0)
        .unwrap_or(0.0)
}

/// Gates and parses the text of a numeric cell.
///
/// ## Arguments
/// * `field` - Column name, used in the error
/// * `raw` - Text exactly as typed
///
/// ## Returns
/// The parsed value, or `InvalidFormat` when the text fails the gate.
pub fn validate_decimal_input(field: &str, raw: &str) -> ValidationResult<f64> {
    let trimmed = raw.trim();

    if !is_decimal_text(trimmed) {
        return Err(ValidationError::InvalidFormat {
            field: field.to_string(),
            reason: "only digits and a single decimal point are allowed".to_string(),
        });
    }

    Ok(parse_decimal_or_zero(trimmed))
}

// =============================================================================
// Text Input
// =============================================================================

/// Validates a product name.
///
/// Drafts start unnamed, so an empty name is accepted here; only the length
/// is bounded.
///
/// ## Returns
/// The trimmed name.
pub fn validate_product_name(name: &str) -> ValidationResult<String> {
    check_name_length(name)?;
    Ok(name.trim().to_string())
}

/// Length check alone, for callers that keep the text as typed.
///
/// Surrounding whitespace does not count toward the limit.
pub fn check_name_length(name: &str) -> ValidationResult<()> {
    if name.trim().chars().count() > MAX_NAME_LEN {
        return Err(ValidationError::TooLong {
            field: "nombre".to_string(),
            max: MAX_NAME_LEN,
        });
    }
    Ok(())
}

/// Validates optional free text (description, category).
///
/// Blank text clears the field.
pub fn validate_optional_text(field: &str, raw: &str) -> ValidationResult<Option<String>> {
    let text = raw.trim();

    if text.is_empty() {
        return Ok(None);
    }

    if text.chars().count() > MAX_TEXT_LEN {
        return Err(ValidationError::TooLong {
            field: field.to_string(),
            max: MAX_TEXT_LEN,
        });
    }

    Ok(Some(text.to_string()))
}

/// Parses a yes/no cell.
pub fn parse_flag(field: &str, raw: &str) -> ValidationResult<bool> {
    match raw.trim().to_lowercase().as_str() {
        "true" | "1" | "si" | "sí" | "yes" => Ok(true),
        "false" | "0" | "no" | "" => Ok(false),
        _ => Err(ValidationError::InvalidFormat {
            field: field.to_string(),
            reason: "expected true or false".to_string(),
        }),
    }
}

// =============================================================================
// Collection Validators
// =============================================================================

/// Validates a product's image list.
///
/// ## Rules
/// - At most MAX_PRODUCT_IMAGES (3) entries
/// - No blank entries
pub fn validate_images(images: &[String]) -> ValidationResult<()> {
    if images.len() > MAX_PRODUCT_IMAGES {
        return Err(ValidationError::TooMany {
            field: "imagenes".to_string(),
            max: MAX_PRODUCT_IMAGES,
        });
    }

    if images.iter().any(|url| url.trim().is_empty()) {
        return Err(ValidationError::Required {
            field: "imagenes".to_string(),
        });
    }

    Ok(())
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decimal_gate() {
        for ok in ["", "0", "12", "12.", ".5", "12.50", "0007"] {
            assert!(is_decimal_text(ok), "expected {:?} to pass", ok);
        }
        for bad in ["12a", "1.2.3", "-4", "+4", "1e5", "1,5", " 1", "abc", "١٢"] {
            assert!(!is_decimal_text(bad), "expected {:?} to fail", bad);
        }
    }

    #[test]
    fn test_parse_decimal_or_zero() {
        assert_eq!(parse_decimal_or_zero("12.5"), 12.5);
        assert_eq!(parse_decimal_or_zero("12."), 12.0);
        assert_eq!(parse_decimal_or_zero(".5"), 0.5);
        assert_eq!(parse_decimal_or_zero(""), 0.0);
        assert_eq!(parse_decimal_or_zero("."), 0.0);
        assert_eq!(parse_decimal_or_zero("nope"), 0.0);
        assert_eq!(parse_decimal_or_zero("-3"), 0.0);
    }

    #[test]
    fn test_validate_decimal_input() {
        assert_eq!(validate_decimal_input("ganancia", " 30 ").unwrap(), 30.0);
        assert_eq!(validate_decimal_input("ganancia", "").unwrap(), 0.0);

        let err = validate_decimal_input("ganancia", "3o").unwrap_err();
        assert!(matches!(err, ValidationError::InvalidFormat { ref field, .. } if field == "ganancia"));
    }

    #[test]
    fn test_validate_product_name() {
        assert_eq!(validate_product_name("  Harina PAN 1kg ").unwrap(), "Harina PAN 1kg");
        assert_eq!(validate_product_name("").unwrap(), "");
        assert!(validate_product_name(&"A".repeat(300)).is_err());
    }

    #[test]
    fn test_check_name_length_ignores_padding() {
        let padded = format!("  {}  ", "A".repeat(MAX_NAME_LEN));
        assert!(check_name_length(&padded).is_ok());
        assert!(matches!(
            check_name_length(&"A".repeat(MAX_NAME_LEN + 1)),
            Err(ValidationError::TooLong { max: MAX_NAME_LEN, .. })
        ));
    }

    #[test]
    fn test_validate_optional_text() {
        assert_eq!(validate_optional_text("categoria", "   ").unwrap(), None);
        assert_eq!(
            validate_optional_text("categoria", " Víveres ").unwrap(),
            Some("Víveres".to_string())
        );
        assert!(validate_optional_text("descripcion", &"x".repeat(2001)).is_err());
    }

    #[test]
    fn test_parse_flag() {
        assert!(parse_flag("activo", "true").unwrap());
        assert!(parse_flag("activo", "Sí").unwrap());
        assert!(!parse_flag("activo", "0").unwrap());
        assert!(parse_flag("activo", "maybe").is_err());
    }

    #[test]
    fn test_validate_images() {
        let urls = |n: usize| (0..n).map(|i| format!("https://cdn.test/{}.webp", i)).collect::<Vec<_>>();
        assert!(validate_images(&urls(0)).is_ok());
        assert!(validate_images(&urls(3)).is_ok());
        assert!(matches!(
            validate_images(&urls(4)),
            Err(ValidationError::TooMany { max: 3, .. })
        ));
        assert!(validate_images(&["".to_string()]).is_err());
    }
}
