use std::str::FromStr;
use std::time::Duration;

use ethers::types::Address;

use crate::errors::CustomError;

const DEFAULT_WALLET_RPC_URL: &str = "http://127.0.0.1:1248";
// eth-balance-checker deployment on Ethereum mainnet
const DEFAULT_BALANCE_CHECKER: &str = "0xb1f8e55c7f64d203c1400b9d8555d050f94adf39";

#[derive(Clone, Debug)]
pub struct Config {
    pub port: u16,
    pub wallet_rpc_url: String,
    pub balance_checker: Address,
    pub poll_interval: Duration,
}

impl Config {
    pub fn from_env() -> Result<Self, CustomError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup<F>(lookup: F) -> Result<Self, CustomError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let port = lookup("PORT")
            .unwrap_or_else(|| "8080".to_string())
            .parse()
            .map_err(|e| CustomError::ConfigError(format!("PORT: {}", e)))?;

        let wallet_rpc_url =
            lookup("WALLET_RPC_URL").unwrap_or_else(|| DEFAULT_WALLET_RPC_URL.to_string());

        let checker = lookup("BALANCE_CHECKER_ADDRESS")
            .unwrap_or_else(|| DEFAULT_BALANCE_CHECKER.to_string());
        let balance_checker = Address::from_str(&checker)
            .map_err(|_| CustomError::ConfigError(format!("BALANCE_CHECKER_ADDRESS: {}", checker)))?;

        let poll_ms: u64 = lookup("PROVIDER_POLL_INTERVAL_MS")
            .unwrap_or_else(|| "1000".to_string())
            .parse()
            .map_err(|e| CustomError::ConfigError(format!("PROVIDER_POLL_INTERVAL_MS: {}", e)))?;
        if poll_ms == 0 {
            return Err(CustomError::ConfigError(
                "PROVIDER_POLL_INTERVAL_MS must be positive".to_string(),
            ));
        }

        Ok(Self {
            port,
            wallet_rpc_url,
            balance_checker,
            poll_interval: Duration::from_millis(poll_ms),
        })
    }
}
