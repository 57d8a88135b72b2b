//! Integer arithmetic tools.

use crate::error::{Result, SvarError};

fn overflow(op: &str, a: i64, b: i64) -> SvarError {
    SvarError::Tool(format!("Integer overflow in {}({}, {})", op, a, b))
}

pub fn add(a: i64, b: i64) -> Result<String> {
    a.checked_add(b)
        .map(|v| v.to_string())
        .ok_or_else(|| overflow("add", a, b))
}

pub fn subtract(a: i64, b: i64) -> Result<String> {
    a.checked_sub(b)
        .map(|v| v.to_string())
        .ok_or_else(|| overflow("subtract", a, b))
}

pub fn multiply(a: i64, b: i64) -> Result<String> {
    a.checked_mul(b)
        .map(|v| v.to_string())
        .ok_or_else(|| overflow("multiply", a, b))
}

/// True division: `7 / 2` is `3.5`.
pub fn divide(a: i64, b: i64) -> Result<String> {
    if b == 0 {
        return Err(SvarError::Tool("Cannot divide by zero.".to_string()));
    }
    Ok((a as f64 / b as f64).to_string())
}

/// Remainder taking the sign of the divisor: `-7 mod 3` is `2`, `7 mod -3` is `-2`.
pub fn modulus(a: i64, b: i64) -> Result<String> {
    if b == 0 {
        return Err(SvarError::Tool("Cannot take modulus by zero.".to_string()));
    }
    let r = a.checked_rem(b).ok_or_else(|| overflow("modulus", a, b))?;
    let r = if r != 0 && (r < 0) != (b < 0) { r + b } else { r };
    Ok(r.to_string())
}
