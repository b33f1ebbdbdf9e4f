//! Size resolution
//!
//! Converts a `(magnitude, unit)` pair into an exact byte count.  Units are
//! chained powers of 1024; SI decimal units are never used.
//!
//! ## Authors
//!
//! The fillgen Development Team.
//!
//! ## Licensing and copyright notice
//!
//! See the `LICENSE.md` file in the fillgen root directory for
//! information on licensing and copyright.

use crate::error::ValidationError;
use std::{fmt, str::FromStr};

/// Each unit is this many of the next-smaller one.
pub const UNIT_STEP: u64 = 1024;

/// The four supported size units.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SizeUnit {
    Byte,
    Kilobyte,
    Megabyte,
    Gigabyte,
}

impl SizeUnit {
    /// The unit one step below this one, or `None` for `Byte`.
    pub fn smaller(self) -> Option<SizeUnit> {
        match self {
            SizeUnit::Byte => None,
            SizeUnit::Kilobyte => Some(SizeUnit::Byte),
            SizeUnit::Megabyte => Some(SizeUnit::Kilobyte),
            SizeUnit::Gigabyte => Some(SizeUnit::Megabyte),
        }
    }
}

impl Default for SizeUnit {
    fn default() -> Self {
        SizeUnit::Byte
    }
}

impl fmt::Display for SizeUnit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            SizeUnit::Byte => "B",
            SizeUnit::Kilobyte => "KB",
            SizeUnit::Megabyte => "MB",
            SizeUnit::Gigabyte => "GB",
        };
        f.write_str(name)
    }
}

impl FromStr for SizeUnit {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "b" | "byte" | "bytes" => Ok(SizeUnit::Byte),
            "k" | "kb" | "kilobyte" | "kilobytes" => Ok(SizeUnit::Kilobyte),
            "m" | "mb" | "megabyte" | "megabytes" => Ok(SizeUnit::Megabyte),
            "g" | "gb" | "gigabyte" | "gigabytes" => Ok(SizeUnit::Gigabyte),
            _ => Err(ValidationError::UnknownUnit(s.to_string())),
        }
    }
}

/// Resolves `magnitude` expressed in `unit` into a byte count, multiplying by
/// 1024 once per step down to `SizeUnit::Byte`.  Fails with
/// `ValidationError::SizeOverflow` rather than wrapping.
pub fn resolve(magnitude: u64, unit: SizeUnit) -> Result<u64, ValidationError> {
    let mut bytes = magnitude;
    let mut current = unit;

    while let Some(next) = current.smaller() {
        bytes = bytes
            .checked_mul(UNIT_STEP)
            .ok_or(ValidationError::SizeOverflow(magnitude, unit))?;
        current = next;
    }

    Ok(bytes)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resolve_powers_of_1024() {
        for magnitude in [0u64, 1, 3, 1000, 4096] {
            assert_eq!(resolve(magnitude, SizeUnit::Byte).unwrap(), magnitude);
            assert_eq!(
                resolve(magnitude, SizeUnit::Kilobyte).unwrap(),
                magnitude * 1024
            );
            assert_eq!(
                resolve(magnitude, SizeUnit::Megabyte).unwrap(),
                magnitude * 1024 * 1024
            );
            assert_eq!(
                resolve(magnitude, SizeUnit::Gigabyte).unwrap(),
                magnitude * 1024 * 1024 * 1024
            );
        }
    }

    #[test]
    fn test_resolve_is_not_decimal() {
        assert_eq!(resolve(1, SizeUnit::Kilobyte).unwrap(), 1024);
        assert_ne!(resolve(1, SizeUnit::Megabyte).unwrap(), 1_000_000);
    }

    #[test]
    fn test_resolve_overflow() {
        match resolve(u64::MAX, SizeUnit::Kilobyte) {
            Err(ValidationError::SizeOverflow(m, SizeUnit::Kilobyte)) => assert_eq!(m, u64::MAX),
            other => panic!("expected an overflow, got {:?}", other),
        }
        // 2^34 GB is exactly 2^64 bytes.
        assert!(resolve(1 << 34, SizeUnit::Gigabyte).is_err());
        assert!(resolve((1 << 34) - 1, SizeUnit::Gigabyte).is_ok());
    }

    #[test]
    fn test_parse_unit() {
        assert_eq!("b".parse::<SizeUnit>().unwrap(), SizeUnit::Byte);
        assert_eq!("KB".parse::<SizeUnit>().unwrap(), SizeUnit::Kilobyte);
        assert_eq!("megabytes".parse::<SizeUnit>().unwrap(), SizeUnit::Megabyte);
        assert_eq!("g".parse::<SizeUnit>().unwrap(), SizeUnit::Gigabyte);
        assert!("tb".parse::<SizeUnit>().is_err());
    }
}
