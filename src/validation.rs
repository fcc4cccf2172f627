use rust_decimal::Decimal;
use validator::{Validate, ValidationError, ValidationErrors};

use crate::error::{AppError, ValidationDetail};

/// Maximum number of fractional digits accepted for monetary amounts.
pub const AMOUNT_SCALE: u32 = 2;

/// Largest amount the `NUMERIC(18, 2)` amount column holds, in hundredths.
const MAX_AMOUNT_CENTS: i64 = 9_999_999_999_999_999_99;

/// Run the schema-level checks of a request and aggregate every failure.
///
/// Validation never short-circuits: all violated fields are reported at once.
pub fn validate_request<T: Validate>(request: &T) -> Result<(), AppError> {
    request
        .validate()
        .map_err(|errors| AppError::Validation(collect_field_errors(&errors)))
}

fn collect_field_errors(errors: &ValidationErrors) -> ValidationDetail {
    let mut detail = ValidationDetail::new();
    for (field, field_errors) in errors.field_errors() {
        let field: &str = &field;
        // struct-level rules are reported by validator under `__all__`
        let key = if field == "__all__" {
            String::new()
        } else {
            to_camel_case(field)
        };
        for error in field_errors.iter() {
            let message = error
                .message
                .as_ref()
                .map(|m| m.to_string())
                .unwrap_or_else(|| error.code.to_string());
            detail.add(&key, message);
        }
    }
    detail
}

fn to_camel_case(field: &str) -> String {
    let mut out = String::with_capacity(field.len());
    let mut upper = false;
    for c in field.chars() {
        if c == '_' {
            upper = true;
        } else if upper {
            out.extend(c.to_uppercase());
            upper = false;
        } else {
            out.push(c);
        }
    }
    out
}

/// Validates that a currency code is exactly three ASCII letters (any case)
pub fn validate_currency_code(code: &str) -> Result<(), ValidationError> {
    if code.len() == 3 && code.chars().all(|c| c.is_ascii_alphabetic()) {
        return Ok(());
    }
    let mut error = ValidationError::new("invalid_currency");
    error.message = Some(format!("'{}' is not a three-letter currency code", code).into());
    Err(error)
}

/// Validates that an amount is positive (greater than 0) and has currency precision
pub fn validate_positive_amount(amount: &Decimal) -> Result<(), ValidationError> {
    if *amount <= Decimal::ZERO {
        let mut error = ValidationError::new("invalid_amount");
        error.message = Some("Amount must be greater than 0".into());
        return Err(error);
    }
    if amount.normalize().scale() > AMOUNT_SCALE {
        let mut error = ValidationError::new("invalid_amount");
        error.message =
            Some(format!("Amount must have at most {} decimal places", AMOUNT_SCALE).into());
        return Err(error);
    }
    let max = Decimal::new(MAX_AMOUNT_CENTS, AMOUNT_SCALE);
    if *amount > max {
        let mut error = ValidationError::new("invalid_amount");
        error.message = Some(format!("Amount must not exceed {}", max).into());
        return Err(error);
    }
    Ok(())
}

/// Validates that a required text field holds something other than whitespace
pub fn validate_not_blank(value: &str) -> Result<(), ValidationError> {
    if value.trim().is_empty() {
        let mut error = ValidationError::new("required");
        error.message = Some("Must not be empty".into());
        return Err(error);
    }
    Ok(())
}

pub fn validate_not_nil(id: &uuid::Uuid) -> Result<(), ValidationError> {
    if id.is_nil() {
        let mut error = ValidationError::new("required");
        error.message = Some("Must not be empty".into());
        return Err(error);
    }
    Ok(())
}
