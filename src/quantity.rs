// Copyright 2022 VMware, Inc.
// SPDX-License-Identifier: MIT
use crate::error::Error;

pub const BYTES_PER_GB: u64 = 1_000_000_000;

/// Converts a Kubernetes quantity string into whole bytes, truncating any fraction.
pub fn parse_bytes(quantity: &str) -> Result<u64, Error> {
    let invalid = || Error::InvalidQuantity(quantity.to_string());
    let trimmed = quantity.trim();
    let split = trimmed
        .find(|c: char| !(c.is_ascii_digit() || c == '.'))
        .unwrap_or(trimmed.len());
    let (number, suffix) = trimmed.split_at(split);
    if number.is_empty() || number == "." {
        return Err(invalid());
    }

    let (whole, fraction) = match number.split_once('.') {
        Some((whole, fraction)) => (whole, fraction),
        None => (number, ""),
    };
    // value = mantissa / 10^scale
    let digits = format!("{}{}", whole, fraction);
    let mantissa: u128 = digits.parse().map_err(|_| invalid())?;
    let scale = u32::try_from(fraction.len()).map_err(|_| invalid())?;

    let (multiplier, divisor): (u128, u128) = match suffix {
        "" => (1, 1),
        "m" => (1, 1000),
        "k" => (1_000, 1),
        "M" => (1_000u128.pow(2), 1),
        "G" => (1_000u128.pow(3), 1),
        "T" => (1_000u128.pow(4), 1),
        "P" => (1_000u128.pow(5), 1),
        "E" => (1_000u128.pow(6), 1),
        "Ki" => (1 << 10, 1),
        "Mi" => (1 << 20, 1),
        "Gi" => (1 << 30, 1),
        "Ti" => (1 << 40, 1),
        "Pi" => (1 << 50, 1),
        "Ei" => (1 << 60, 1),
        exp if exp.starts_with('e') || exp.starts_with('E') => {
            let power: u32 = exp[1..].parse().map_err(|_| invalid())?;
            (10u128.checked_pow(power).ok_or_else(invalid)?, 1)
        }
        _ => return Err(invalid()),
    };

    let denominator = 10u128
        .checked_pow(scale)
        .and_then(|d| d.checked_mul(divisor))
        .ok_or_else(invalid)?;
    let bytes = mantissa
        .checked_mul(multiplier)
        .ok_or_else(invalid)?
        / denominator;
    u64::try_from(bytes).map_err(|_| invalid())
}

pub fn bytes_to_gb(bytes: u64) -> u64 {
    bytes / BYTES_PER_GB
}
