//! Fixed-point amount codecs
//!
//! On-chain amounts are integers with implied decimals:
//!
//! - USDC rewards use 6 decimals (`500_000_000` is `500`)
//! - Scores use 18 decimals ("WAD"), stored as decimal integer strings

use std::fmt;
use std::str::FromStr;

use alloy_primitives::U256;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::error::{CoreError, CoreResult};

/// USDC token decimals
pub const USDC_DECIMALS: u32 = 6;

/// WAD fixed-point decimals
pub const WAD_DECIMALS: u32 = 18;

/// Convert raw USDC units into a decimal amount.
pub fn usdc_from_units(raw: U256) -> CoreResult<Decimal> {
    scaled_to_decimal(raw, USDC_DECIMALS)
}

fn scaled_to_decimal(raw: U256, scale: u32) -> CoreResult<Decimal> {
    let value = u128::try_from(raw)
        .ok()
        .and_then(|v| i128::try_from(v).ok())
        .ok_or_else(|| CoreError::amount(format!("{raw} exceeds the decimal range")))?;

    Decimal::try_from_i128_with_scale(value, scale)
        .map(|d| d.normalize())
        .map_err(|e| CoreError::amount(format!("{raw} with scale {scale}: {e}")))
}

/// 18-decimal fixed-point integer.
///
/// Serializes as its decimal integer string, e.g. `"1500000000000000000"` for `1.5`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(into = "String", try_from = "String")]
pub struct Wad(U256);

impl Wad {
    /// Wrap a raw on-chain integer
    pub fn from_raw(raw: U256) -> Self {
        Self(raw)
    }

    /// Decimal value (`raw / 10^18`)
    pub fn to_decimal(&self) -> CoreResult<Decimal> {
        scaled_to_decimal(self.0, WAD_DECIMALS)
    }

    /// Encode a decimal value, rejecting negatives and sub-WAD precision
    pub fn from_decimal(value: Decimal) -> CoreResult<Self> {
        if value.is_sign_negative() && !value.is_zero() {
            return Err(CoreError::amount(format!("negative WAD value {value}")));
        }

        let value = value.normalize();
        let scale = value.scale();
        if scale > WAD_DECIMALS {
            return Err(CoreError::amount(format!(
                "{value} has more than {WAD_DECIMALS} decimals"
            )));
        }

        let mantissa = u128::try_from(value.mantissa())
            .map_err(|_| CoreError::amount(format!("invalid mantissa for {value}")))?;
        let factor = U256::from(10u64).pow(U256::from(WAD_DECIMALS - scale));

        Ok(Self(U256::from(mantissa) * factor))
    }
}

impl fmt::Display for Wad {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for Wad {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        if s.is_empty() || !s.bytes().all(|b| b.is_ascii_digit()) {
            return Err(CoreError::amount(format!("not a WAD integer: {s:?}")));
        }
        U256::from_str_radix(s, 10)
            .map(Self)
            .map_err(|e| CoreError::amount(format!("{s}: {e}")))
    }
}

impl From<Wad> for String {
    fn from(wad: Wad) -> Self {
        wad.to_string()
    }
}

impl TryFrom<String> for Wad {
    type Error = CoreError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<U256> for Wad {
    fn from(raw: U256) -> Self {
        Self(raw)
    }
}
