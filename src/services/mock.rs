//! In-memory wallet and chain collaborators for tests.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use ethers::types::{Address, U256};
use tokio::sync::{broadcast, Notify};

use crate::{
    errors::CustomError,
    models::connection::ProviderEvent,
    services::{balance_service::ChainBalanceQuery, wallet_provider::WalletProvider},
};

#[derive(Default)]
struct ChainState {
    balances: HashMap<(Address, Address), U256>,
    failure: Option<String>,
    calls: usize,
    last_request: Option<Vec<Address>>,
    gates: HashMap<Address, Arc<Notify>>,
}

/// Chain query backed by a shared balance table. Clones share state.
#[derive(Clone, Default)]
pub struct MockChainQuery {
    state: Arc<Mutex<ChainState>>,
}

impl MockChainQuery {
    pub fn set_balance(&self, account: Address, contract: Address, raw: U256) {
        self.state
            .lock()
            .unwrap()
            .balances
            .insert((account, contract), raw);
    }

    pub fn fail_with(&self, message: &str) {
        self.state.lock().unwrap().failure = Some(message.to_string());
    }

    /// Hold queries for `account` until the returned handle is notified.
    pub fn gate(&self, account: Address) -> Arc<Notify> {
        let notify = Arc::new(Notify::new());
        self.state
            .lock()
            .unwrap()
            .gates
            .insert(account, notify.clone());
        notify
    }

    pub fn calls(&self) -> usize {
        self.state.lock().unwrap().calls
    }

    pub fn last_request(&self) -> Option<Vec<Address>> {
        self.state.lock().unwrap().last_request.clone()
    }
}

#[async_trait]
impl ChainBalanceQuery for MockChainQuery {
    async fn batch_get_balances(
        &self,
        account: Address,
        contracts: &[Address],
    ) -> Result<HashMap<Address, U256>, CustomError> {
        let gate = {
            let mut state = self.state.lock().unwrap();
            state.calls += 1;
            state.last_request = Some(contracts.to_vec());
            state.gates.get(&account).cloned()
        };
        if let Some(gate) = gate {
            gate.notified().await;
        }

        let state = self.state.lock().unwrap();
        if let Some(message) = &state.failure {
            return Err(CustomError::FetchFailed(message.clone()));
        }
        Ok(state
            .balances
            .iter()
            .filter(|((owner, _), _)| *owner == account)
            .map(|((_, contract), raw)| (*contract, *raw))
            .collect())
    }
}

/// Wallet that grants or rejects on demand and lets tests push events.
pub struct MockWalletProvider {
    present: AtomicBool,
    accounts: Mutex<Result<Vec<Address>, String>>,
    accounts_gate: Mutex<Option<Arc<Notify>>>,
    chain: MockChainQuery,
    handles: AtomicUsize,
    events: broadcast::Sender<ProviderEvent>,
}

impl MockWalletProvider {
    pub fn new(chain: MockChainQuery) -> Self {
        let (events, _) = broadcast::channel(16);
        Self {
            present: AtomicBool::new(true),
            accounts: Mutex::new(Ok(Vec::new())),
            accounts_gate: Mutex::new(None),
            chain,
            handles: AtomicUsize::new(0),
            events,
        }
    }

    pub fn set_present(&self, present: bool) {
        self.present.store(present, Ordering::SeqCst);
    }

    pub fn grant(&self, accounts: Vec<Address>) {
        *self.accounts.lock().unwrap() = Ok(accounts);
    }

    pub fn reject(&self, message: &str) {
        *self.accounts.lock().unwrap() = Err(message.to_string());
    }

    /// Hold account requests until the returned handle is notified.
    pub fn hold_accounts(&self) -> Arc<Notify> {
        let notify = Arc::new(Notify::new());
        *self.accounts_gate.lock().unwrap() = Some(notify.clone());
        notify
    }

    pub fn emit(&self, event: ProviderEvent) {
        let _ = self.events.send(event);
    }

    /// Number of chain handles handed out so far.
    pub fn handles(&self) -> usize {
        self.handles.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl WalletProvider for MockWalletProvider {
    async fn is_present(&self) -> bool {
        self.present.load(Ordering::SeqCst)
    }

    async fn request_accounts(&self) -> Result<Vec<Address>, CustomError> {
        let gate = self.accounts_gate.lock().unwrap().clone();
        if let Some(gate) = gate {
            gate.notified().await;
        }
        self.accounts
            .lock()
            .unwrap()
            .clone()
            .map_err(CustomError::UserRejectedConnection)
    }

    fn subscribe(&self) -> broadcast::Receiver<ProviderEvent> {
        self.events.subscribe()
    }

    fn balance_query(&self) -> Result<Arc<dyn ChainBalanceQuery>, CustomError> {
        self.handles.fetch_add(1, Ordering::SeqCst);
        Ok(Arc::new(self.chain.clone()))
    }
}
