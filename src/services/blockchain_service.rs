use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use ethers::{
    contract::{abigen, ContractError},
    core::types::{Address, U256},
    providers::{Http, Provider},
};

use crate::errors::CustomError;

use super::{balance_service::ChainBalanceQuery, wallet_provider::rpc_error_message};

// eth-balance-checker: balances(users, tokens)[i * tokens.len() + j]
abigen!(
    BalanceChecker,
    r#"[
        function balances(address[] users, address[] tokens) view returns (uint256[])
    ]"#
);

/// Batched ERC20 balance reader backed by a deployed balance checker
/// contract, one `eth_call` per query.
pub struct BalanceCheckerClient {
    checker: BalanceChecker<Provider<Http>>,
}

impl BalanceCheckerClient {
    pub fn new(provider: Arc<Provider<Http>>, checker_address: Address) -> Self {
        Self {
            checker: BalanceChecker::new(checker_address, provider),
        }
    }
}

#[async_trait]
impl ChainBalanceQuery for BalanceCheckerClient {
    async fn batch_get_balances(
        &self,
        account: Address,
        contracts: &[Address],
    ) -> Result<HashMap<Address, U256>, CustomError> {
        let raw: Vec<U256> = self
            .checker
            .balances(vec![account], contracts.to_vec())
            .call()
            .await
            .map_err(|e| CustomError::FetchFailed(contract_error_message(&e)))?;

        zip_balances(contracts, raw)
    }
}

// RPC failures carry the node's message the same way wallet requests do.
fn contract_error_message(err: &ContractError<Provider<Http>>) -> String {
    match err {
        ContractError::MiddlewareError { e } => rpc_error_message(e),
        ContractError::ProviderError { e } => rpc_error_message(e),
        other => other.to_string(),
    }
}

fn zip_balances(
    contracts: &[Address],
    raw: Vec<U256>,
) -> Result<HashMap<Address, U256>, CustomError> {
    if raw.len() != contracts.len() {
        return Err(CustomError::FetchFailed(format!(
            "balance checker returned {} values for {} tokens",
            raw.len(),
            contracts.len()
        )));
    }

    Ok(contracts.iter().copied().zip(raw).collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::wallet_provider::tests::provider_error;

    #[test]
    fn zips_results_positionally() {
        let contracts = vec![Address::repeat_byte(1), Address::repeat_byte(2)];
        let map = zip_balances(&contracts, vec![U256::from(10u64), U256::from(20u64)]).unwrap();
        assert_eq!(map[&Address::repeat_byte(1)], U256::from(10u64));
        assert_eq!(map[&Address::repeat_byte(2)], U256::from(20u64));
    }

    #[test]
    fn short_result_is_a_failed_fetch() {
        let contracts = vec![Address::repeat_byte(1), Address::repeat_byte(2)];
        assert!(matches!(
            zip_balances(&contracts, vec![U256::one()]),
            Err(CustomError::FetchFailed(_))
        ));
    }

    #[test]
    fn rpc_failure_surfaces_nested_message() {
        let err = ContractError::<Provider<Http>>::MiddlewareError {
            e: provider_error(
                -32603,
                "Internal JSON-RPC error.",
                Some(serde_json::json!({ "message": "execution reverted: not a token" })),
            ),
        };
        assert_eq!(contract_error_message(&err), "execution reverted: not a token");
    }

    #[test]
    fn rpc_failure_without_data_uses_rpc_message() {
        let err = ContractError::<Provider<Http>>::ProviderError {
            e: provider_error(-32000, "header not found", None),
        };
        assert_eq!(contract_error_message(&err), "header not found");
    }
}
