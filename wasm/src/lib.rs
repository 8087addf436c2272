//! WebAssembly module for the Apple Yield Platform
//!
//! Provides client-side computation for:
//! - Yield estimate preview while a cart is being edited
//! - Per-condition proximity coefficients
//! - Submit-readiness checks before hitting the API

use rust_decimal::Decimal;
use wasm_bindgen::prelude::*;

// Re-export shared types for use in JavaScript
pub use shared::models::*;
pub use shared::validation::*;

/// Initialize the WASM module
#[wasm_bindgen(start)]
pub fn init() {
    // Set up panic hook for better error messages in browser console
    #[cfg(feature = "console_error_panic_hook")]
    console_error_panic_hook::set_once();
}

/// Estimate the total yield from a JSON array of factor rows.
/// Decimals go in and out as strings so the preview matches the
/// server-side result digit for digit.
#[wasm_bindgen]
pub fn estimate_order_yield(factors_json: &str) -> Result<String, JsValue> {
    let factors: Vec<YieldFactors> = serde_json::from_str(factors_json)
        .map_err(|e| JsValue::from_str(&format!("Invalid factors JSON: {}", e)))?;

    Ok(estimate_yield(&factors).to_string())
}

/// Proximity coefficient for one observed condition
#[wasm_bindgen]
pub fn condition_proximity(ideal: &str, actual: &str) -> Result<String, JsValue> {
    let ideal: Decimal = ideal
        .parse()
        .map_err(|_| JsValue::from_str("Invalid ideal value"))?;
    let actual: Decimal = actual
        .parse()
        .map_err(|_| JsValue::from_str("Invalid actual value"))?;

    Ok(condition_coef(ideal, actual).to_string())
}

/// Whether an order with these fields would pass the submit checks
#[wasm_bindgen]
pub fn can_submit_order(item_count: u32, location: Option<String>, person: Option<String>) -> bool {
    let location = location.as_deref().and_then(Location::from_str);
    let person = person.as_deref().and_then(Person::from_str);
    validate_submission(item_count as i64, location, person).is_ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_estimate_preview_matches_domain() {
        let json = r#"[
            {"base_yield": "100.00", "ideal_temp": "20", "ideal_precip": "50",
             "avg_temp": "20", "sum_precipitation": "50"}
        ]"#;
        assert_eq!(estimate_order_yield(json).unwrap(), "100.00");
    }

    #[test]
    fn test_condition_proximity() {
        assert_eq!(condition_proximity("0", "3").unwrap(), "0.25");
        assert_eq!(condition_proximity("20", "40").unwrap(), "0");
    }

    #[test]
    fn test_can_submit_order() {
        assert!(can_submit_order(
            2,
            Some("valley".to_string()),
            Some("agronomist".to_string())
        ));
        assert!(!can_submit_order(0, Some("valley".to_string()), Some("agronomist".to_string())));
        assert!(!can_submit_order(2, None, Some("agronomist".to_string())));
        assert!(!can_submit_order(2, Some("valley".to_string()), None));
    }
}
