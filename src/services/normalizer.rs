use ethers::types::U256;

use crate::{errors::CustomError, models::balance::NormalizedBalance};

/// Convert a raw token amount (smallest unit) into display units by shifting
/// the decimal point `decimals` places. Exact for any amount; trailing
/// fractional zeros are trimmed.
pub fn normalize(raw_balance: U256, decimals: u8) -> Result<NormalizedBalance, CustomError> {
    if decimals == 0 {
        return Err(CustomError::InvalidDecimals(decimals));
    }

    let decimals = decimals as usize;
    let mut digits = raw_balance.to_string();
    if digits.len() <= decimals {
        digits.insert_str(0, &"0".repeat(decimals - digits.len() + 1));
    }

    let (whole, fraction) = digits.split_at(digits.len() - decimals);
    let fraction = fraction.trim_end_matches('0');

    let text = if fraction.is_empty() {
        whole.to_string()
    } else {
        format!("{}.{}", whole, fraction)
    };

    Ok(NormalizedBalance::from_canonical(text))
}
