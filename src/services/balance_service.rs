use std::collections::{BTreeMap, HashMap};

use async_trait::async_trait;
use ethers::types::{Address, U256};
use log::debug;

use crate::{
    errors::CustomError,
    models::balance::BalanceSnapshot,
    services::{normalizer::normalize, token_registry::TokenRegistry},
};

/// Reads raw ERC20 balances from the chain.
#[async_trait]
pub trait ChainBalanceQuery: Send + Sync {
    /// Raw balances of `account` for every contract, in a single round-trip.
    async fn batch_get_balances(
        &self,
        account: Address,
        contracts: &[Address],
    ) -> Result<HashMap<Address, U256>, CustomError>;
}

/// Fetch and normalize the balances of every registered token.
///
/// All-or-nothing: a contract missing from the query result fails the whole
/// fetch. Extra entries returned by the query are ignored, so the snapshot's
/// keys are exactly the registry's contract addresses.
pub async fn fetch_balances(
    query: &dyn ChainBalanceQuery,
    account: Address,
    registry: &TokenRegistry,
) -> Result<BalanceSnapshot, CustomError> {
    let contracts = registry.contract_addresses();
    let raw_balances = query.batch_get_balances(account, &contracts).await?;

    let mut balances = BTreeMap::new();
    for token in registry.all() {
        let raw = raw_balances.get(&token.contract_address).ok_or_else(|| {
            CustomError::FetchFailed(format!("no balance returned for {}", token.symbol))
        })?;
        balances.insert(token.contract_address, normalize(*raw, token.decimals)?);
    }

    debug!("Fetched {} balances for {:#x}", balances.len(), account);
    Ok(BalanceSnapshot::new(balances))
}
