use ethers::types::Address;
use serde::Serialize;

/// An ERC20 token the reader reports on.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct TokenDescriptor {
    pub symbol: String,
    pub contract_address: Address,
    pub decimals: u8,
}

impl TokenDescriptor {
    pub fn new(symbol: &str, contract_address: Address, decimals: u8) -> Self {
        Self {
            symbol: symbol.to_string(),
            contract_address,
            decimals,
        }
    }
}

/// Full lowercase hex form, `0x` prefixed.
pub fn format_address(address: &Address) -> String {
    format!("{:#x}", address)
}
