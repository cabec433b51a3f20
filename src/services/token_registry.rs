use std::collections::HashSet;
use std::str::FromStr;

use ethers::types::Address;

use crate::{errors::CustomError, models::token::TokenDescriptor};

// Yearn v2 vault tokens. Decimals follow the underlying asset.
const YEARN_VAULTS: [(&str, &str, u8); 3] = [
    ("yvDAI", "0xdA816459F1AB5631232FE5e97a05BBBb94970c95", 18),
    ("yvUSDC", "0x5f18c75abdae578b483e5f43f12a39cf75b973a9", 6),
    ("yvUSDT", "0x7Da96a3891Add058AdA2E826306D812C638D87a7", 6),
];

/// Ordered, immutable set of tokens keyed by symbol.
#[derive(Clone, Debug)]
pub struct TokenRegistry {
    tokens: Vec<TokenDescriptor>,
}

impl TokenRegistry {
    pub fn new(tokens: Vec<TokenDescriptor>) -> Result<Self, CustomError> {
        if tokens.is_empty() {
            return Err(CustomError::InvalidRegistry("no tokens registered".to_string()));
        }

        let mut symbols = HashSet::new();
        let mut addresses = HashSet::new();
        for token in &tokens {
            if token.decimals == 0 {
                return Err(CustomError::InvalidRegistry(format!(
                    "{} has zero decimals",
                    token.symbol
                )));
            }
            if !symbols.insert(token.symbol.as_str()) {
                return Err(CustomError::InvalidRegistry(format!(
                    "duplicate symbol {}",
                    token.symbol
                )));
            }
            if !addresses.insert(token.contract_address) {
                return Err(CustomError::InvalidRegistry(format!(
                    "duplicate contract address {:#x}",
                    token.contract_address
                )));
            }
        }

        Ok(Self { tokens })
    }

    pub fn yearn_vaults() -> Result<Self, CustomError> {
        let tokens = YEARN_VAULTS
            .iter()
            .map(|(symbol, address, decimals)| -> Result<TokenDescriptor, CustomError> {
                let contract_address = Address::from_str(address)
                    .map_err(|_| CustomError::InvalidAddressError(address.to_string()))?;
                Ok(TokenDescriptor::new(symbol, contract_address, *decimals))
            })
            .collect::<Result<Vec<_>, _>>()?;

        Self::new(tokens)
    }

    pub fn describe(&self, symbol: &str) -> Result<&TokenDescriptor, CustomError> {
        self.tokens
            .iter()
            .find(|token| token.symbol == symbol)
            .ok_or_else(|| CustomError::TokenNotFoundError(symbol.to_string()))
    }

    pub fn all(&self) -> &[TokenDescriptor] {
        &self.tokens
    }

    pub fn contract_addresses(&self) -> Vec<Address> {
        self.tokens.iter().map(|token| token.contract_address).collect()
    }
}
