//! Validation utilities for the Apple Yield Platform

use rust_decimal::Decimal;

use crate::models::{Location, Person};

// ============================================================================
// Catalog Validations
// ============================================================================

/// Validate fields of a new or updated catalog month
pub fn validate_month_fields(
    name: &str,
    base_yield: Decimal,
    ideal_precip: i32,
) -> Result<(), &'static str> {
    if name.trim().is_empty() {
        return Err("Month name is required");
    }
    if base_yield < Decimal::ZERO {
        return Err("Base yield cannot be negative");
    }
    if ideal_precip < 0 {
        return Err("Ideal precipitation cannot be negative");
    }
    Ok(())
}

// ============================================================================
// Order Validations
// ============================================================================

/// Check the submit preconditions: at least one line item plus both
/// categorical fields filled in.
pub fn validate_submission(
    item_count: i64,
    location: Option<Location>,
    person: Option<Person>,
) -> Result<(), &'static str> {
    if item_count == 0 {
        return Err("Order has no months selected");
    }
    if location.is_none() {
        return Err("Location is required before submission");
    }
    if person.is_none() {
        return Err("Responsible person is required before submission");
    }
    Ok(())
}

/// Observed precipitation is a physical sum and cannot go below zero;
/// observed temperature may (winter months).
pub fn validate_indicator_values(sum_precipitation: Decimal) -> Result<(), &'static str> {
    if sum_precipitation < Decimal::ZERO {
        return Err("Precipitation sum cannot be negative");
    }
    Ok(())
}

// ============================================================================
// General Validations
// ============================================================================

/// Validate email format (basic check)
pub fn validate_email(email: &str) -> Result<(), &'static str> {
    if email.contains('@') && email.contains('.') && email.len() >= 5 {
        Ok(())
    } else {
        Err("Invalid email format")
    }
}

/// Validate password strength (minimum length only)
pub fn validate_password(password: &str) -> Result<(), &'static str> {
    if password.len() < 8 {
        return Err("Password must be at least 8 characters");
    }
    Ok(())
}
