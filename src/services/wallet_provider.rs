use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use ethers::{
    providers::{Http, Middleware, Provider, ProviderError, RpcError},
    types::Address,
};
use log::{debug, info, warn};
use tokio::sync::broadcast;

use crate::{errors::CustomError, models::connection::ProviderEvent};

use super::{balance_service::ChainBalanceQuery, blockchain_service::BalanceCheckerClient};

// EIP-1193 "User Rejected Request"
const USER_REJECTED_CODE: i64 = 4001;
const EVENT_CHANNEL_CAPACITY: usize = 64;

/// The user's wallet: account access plus change notifications.
#[async_trait]
pub trait WalletProvider: Send + Sync {
    /// Whether a wallet answers at all.
    async fn is_present(&self) -> bool;

    /// Ask the user to expose their accounts. The first one is the selected
    /// account.
    async fn request_accounts(&self) -> Result<Vec<Address>, CustomError>;

    /// Account and network change notifications, in delivery order.
    fn subscribe(&self) -> broadcast::Receiver<ProviderEvent>;

    /// A fresh chain handle for balance queries through this wallet.
    fn balance_query(&self) -> Result<Arc<dyn ChainBalanceQuery>, CustomError>;
}

/// Wallet reached over JSON-RPC (Frame, or any node exposing
/// `eth_requestAccounts`).
pub struct RpcWalletProvider {
    url: String,
    provider: Arc<Provider<Http>>,
    balance_checker: Address,
    events: broadcast::Sender<ProviderEvent>,
}

impl RpcWalletProvider {
    pub fn new(url: &str, balance_checker: Address) -> Result<Self, CustomError> {
        let provider = Provider::<Http>::try_from(url)
            .map_err(|e| CustomError::ConfigError(format!("WALLET_RPC_URL: {}", e)))?;
        let (events, _) = broadcast::channel(EVENT_CHANNEL_CAPACITY);

        Ok(Self {
            url: url.to_string(),
            provider: Arc::new(provider),
            balance_checker,
            events,
        })
    }

    /// Poll the wallet for account and chain changes and publish one event
    /// per observed change. The first sample only sets the baseline.
    pub fn spawn_event_watcher(self: &Arc<Self>, interval: Duration) -> tokio::task::JoinHandle<()> {
        let this = Arc::clone(self);
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(interval);
            let mut watcher = ChangeWatcher::default();
            loop {
                ticker.tick().await;

                match this.provider.get_accounts().await {
                    Ok(accounts) => {
                        if let Some(event) = watcher.observe_accounts(accounts) {
                            this.publish(event);
                        }
                    }
                    Err(e) => debug!("eth_accounts poll failed: {}", e),
                }

                match this.provider.get_chainid().await {
                    Ok(chain_id) => {
                        if let Some(event) = watcher.observe_chain(chain_id.low_u64()) {
                            this.publish(event);
                        }
                    }
                    Err(e) => debug!("eth_chainId poll failed: {}", e),
                }
            }
        })
    }

    fn publish(&self, event: ProviderEvent) {
        info!("Wallet event: {:?}", event);
        // No subscribers yet is fine
        let _ = self.events.send(event);
    }
}

#[async_trait]
impl WalletProvider for RpcWalletProvider {
    async fn is_present(&self) -> bool {
        match self.provider.get_chainid().await {
            Ok(chain_id) => {
                info!("Wallet provider at {} on chain {}", self.url, chain_id);
                true
            }
            Err(e) => {
                warn!("No wallet provider at {}: {}", self.url, e);
                false
            }
        }
    }

    async fn request_accounts(&self) -> Result<Vec<Address>, CustomError> {
        self.provider
            .request::<_, Vec<Address>>("eth_requestAccounts", ())
            .await
            .map_err(map_request_error)
    }

    fn subscribe(&self) -> broadcast::Receiver<ProviderEvent> {
        self.events.subscribe()
    }

    fn balance_query(&self) -> Result<Arc<dyn ChainBalanceQuery>, CustomError> {
        Ok(Arc::new(BalanceCheckerClient::new(
            self.provider.clone(),
            self.balance_checker,
        )))
    }
}

/// Human readable message for an RPC failure: the wallet's nested
/// `data.message` first, then the JSON-RPC message, then the transport error.
pub(crate) fn rpc_error_message(err: &ProviderError) -> String {
    match err.as_error_response() {
        Some(response) => response
            .data
            .as_ref()
            .and_then(|data| data.get("message"))
            .and_then(|message| message.as_str())
            .map(str::to_string)
            .unwrap_or_else(|| response.message.clone()),
        None => err.to_string(),
    }
}

fn map_request_error(err: ProviderError) -> CustomError {
    let message = rpc_error_message(&err);
    match err.as_error_response() {
        Some(response) if response.code == USER_REJECTED_CODE => {
            CustomError::UserRejectedConnection(message)
        }
        _ => CustomError::StringifiedProviderError(message),
    }
}

#[derive(Debug, Default)]
struct ChangeWatcher {
    accounts: Option<Vec<Address>>,
    chain_id: Option<u64>,
}

impl ChangeWatcher {
    fn observe_accounts(&mut self, accounts: Vec<Address>) -> Option<ProviderEvent> {
        match self.accounts.replace(accounts.clone()) {
            Some(previous) if previous != accounts => Some(ProviderEvent::AccountsChanged(accounts)),
            _ => None,
        }
    }

    fn observe_chain(&mut self, chain_id: u64) -> Option<ProviderEvent> {
        match self.chain_id.replace(chain_id) {
            Some(previous) if previous != chain_id => Some(ProviderEvent::NetworkChanged(chain_id)),
            _ => None,
        }
    }
}
