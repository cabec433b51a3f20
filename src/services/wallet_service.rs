use std::sync::Arc;

use ethers::types::Address;
use log::{debug, error, info, warn};
use tokio::sync::{broadcast::error::RecvError, Mutex};
use tokio::task::JoinHandle;

use crate::{
    errors::CustomError,
    models::connection::{ConnectionState, PresentationView, ProviderEvent},
    services::{
        balance_service::{fetch_balances, ChainBalanceQuery},
        token_registry::TokenRegistry,
        wallet_provider::WalletProvider,
    },
};

/// A balance fetch started by a (re)connection. It only lands if no newer
/// transition happened while it was in flight.
pub struct PendingFetch {
    generation: u64,
    account: Address,
    query: Arc<dyn ChainBalanceQuery>,
}

struct SessionInner {
    state: ConnectionState,
    // Bumped by every transition that starts or invalidates a fetch.
    generation: u64,
}

/// Owns the wallet connection lifecycle and the latest balance snapshot.
pub struct WalletSession {
    provider: Arc<dyn WalletProvider>,
    registry: Arc<TokenRegistry>,
    inner: Mutex<SessionInner>,
}

impl WalletSession {
    pub fn new(provider: Arc<dyn WalletProvider>, registry: Arc<TokenRegistry>) -> Self {
        Self {
            provider,
            registry,
            inner: Mutex::new(SessionInner {
                state: ConnectionState::Disconnected,
                generation: 0,
            }),
        }
    }

    /// Probe for the wallet once and start consuming its events.
    pub async fn start(self: &Arc<Self>) -> JoinHandle<()> {
        if !self.provider.is_present().await {
            let mut inner = self.inner.lock().await;
            inner.generation += 1;
            inner.state = ConnectionState::NoProvider;
        }
        self.listen()
    }

    pub fn registry(&self) -> &TokenRegistry {
        &self.registry
    }

    pub async fn state(&self) -> ConnectionState {
        self.inner.lock().await.state.clone()
    }

    pub async fn view(&self) -> PresentationView {
        let inner = self.inner.lock().await;
        PresentationView::render(&inner.state, self.registry.all())
    }

    /// Explicit re-detection of the wallet, the only way out of `NoProvider`.
    pub async fn retry_provider_detection(&self) -> ConnectionState {
        let present = self.provider.is_present().await;
        let mut inner = self.inner.lock().await;
        let was_missing = inner.state == ConnectionState::NoProvider;
        match (present, was_missing) {
            (true, true) => {
                info!("Wallet provider detected");
                inner.generation += 1;
                inner.state = ConnectionState::Disconnected;
            }
            (false, false) => {
                warn!("Wallet provider disappeared");
                inner.generation += 1;
                inner.state = ConnectionState::NoProvider;
            }
            _ => {}
        }
        inner.state.clone()
    }

    /// User-initiated connect. Resolves once the first balance fetch has
    /// settled (or the connection failed). The flow runs on its own task so a
    /// caller that stops waiting cannot leave the session half connected.
    pub async fn request_connection(self: &Arc<Self>) -> Result<ConnectionState, CustomError> {
        let session = Arc::clone(self);
        tokio::spawn(async move { session.connect().await })
            .await
            .map_err(|e| CustomError::InternalError(format!("connect task failed: {}", e)))?
    }

    async fn connect(&self) -> Result<ConnectionState, CustomError> {
        let generation = {
            let mut inner = self.inner.lock().await;
            match &inner.state {
                ConnectionState::Disconnected => {}
                ConnectionState::NoProvider => return Err(CustomError::NoProviderDetected),
                other => {
                    return Err(CustomError::InvalidStateTransition(format!(
                        "cannot connect while {}",
                        other.name()
                    )))
                }
            }
            inner.generation += 1;
            inner.state = ConnectionState::Connecting;
            inner.generation
        };

        info!("Requesting wallet accounts");
        let granted = self.provider.request_accounts().await.and_then(|accounts| {
            accounts.first().copied().ok_or_else(|| {
                CustomError::StringifiedProviderError("wallet returned no accounts".to_string())
            })
        });

        let pending = {
            let mut inner = self.inner.lock().await;
            if inner.generation != generation {
                debug!("Discarding superseded connection response");
                return Ok(inner.state.clone());
            }
            match granted {
                Ok(account) => {
                    info!("Wallet connected: {:#x}", account);
                    self.begin_fetch(&mut inner, account)
                }
                Err(e) => {
                    warn!("Wallet connection failed: {}", e);
                    inner.state = ConnectionState::Error {
                        message: e.to_string(),
                    };
                    None
                }
            }
        };

        if let Some(pending) = pending {
            self.complete_fetch(pending).await;
        }
        Ok(self.state().await)
    }

    /// Feed one provider notification into the state machine. Returns the
    /// fetch the caller must drive when the event selected a new account.
    pub async fn apply_event(&self, event: ProviderEvent) -> Option<PendingFetch> {
        let mut inner = self.inner.lock().await;
        match event {
            ProviderEvent::AccountsChanged(accounts) => {
                if !inner.state.is_connected() {
                    debug!("Ignoring account change while {}", inner.state.name());
                    return None;
                }
                match accounts.first() {
                    Some(&account) if inner.state.account() == Some(account) => {
                        debug!("Account {:#x} unchanged, keeping current fetch", account);
                        None
                    }
                    Some(&account) => {
                        info!("Account changed to {:#x}", account);
                        self.begin_fetch(&mut inner, account)
                    }
                    None => {
                        info!("Wallet revoked access, resetting session");
                        Self::reset_locked(&mut inner);
                        None
                    }
                }
            }
            ProviderEvent::NetworkChanged(chain_id) => {
                if matches!(
                    inner.state,
                    ConnectionState::Connecting
                        | ConnectionState::Loading { .. }
                        | ConnectionState::Ready { .. }
                ) {
                    info!("Network changed to {}, resetting session", chain_id);
                    Self::reset_locked(&mut inner);
                } else {
                    debug!("Ignoring network change while {}", inner.state.name());
                }
                None
            }
        }
    }

    /// Run a pending fetch and store its outcome unless it went stale.
    pub async fn complete_fetch(&self, pending: PendingFetch) {
        let result = fetch_balances(pending.query.as_ref(), pending.account, &self.registry).await;

        let mut inner = self.inner.lock().await;
        if inner.generation != pending.generation {
            debug!(
                "Discarding stale balances for {:#x} (generation {} < {})",
                pending.account, pending.generation, inner.generation
            );
            return;
        }

        match result {
            Ok(snapshot) => {
                info!("Balances loaded for {:#x}", pending.account);
                inner.state = ConnectionState::Ready {
                    account: pending.account,
                    snapshot,
                };
            }
            Err(e) => {
                error!("Balance fetch for {:#x} failed: {}", pending.account, e);
                inner.state = ConnectionState::Error {
                    message: e.to_string(),
                };
            }
        }
    }

    pub async fn dismiss_error(&self) -> Result<ConnectionState, CustomError> {
        let mut inner = self.inner.lock().await;
        if !matches!(inner.state, ConnectionState::Error { .. }) {
            return Err(CustomError::InvalidStateTransition(format!(
                "no error to dismiss while {}",
                inner.state.name()
            )));
        }
        Self::reset_locked(&mut inner);
        Ok(inner.state.clone())
    }

    pub async fn reset(&self) -> ConnectionState {
        let mut inner = self.inner.lock().await;
        Self::reset_locked(&mut inner);
        inner.state.clone()
    }

    // A visible error stays until the user dismisses it.
    async fn reset_after_missed_events(&self) {
        let mut inner = self.inner.lock().await;
        if !matches!(inner.state, ConnectionState::Error { .. }) {
            Self::reset_locked(&mut inner);
        }
    }

    /// Consume provider events in delivery order. Fetches run on their own
    /// tasks so a slow fetch never delays the next event.
    pub fn listen(self: &Arc<Self>) -> JoinHandle<()> {
        let mut events = self.provider.subscribe();
        let session = Arc::clone(self);
        tokio::spawn(async move {
            loop {
                match events.recv().await {
                    Ok(event) => {
                        if let Some(pending) = session.apply_event(event).await {
                            let session = Arc::clone(&session);
                            tokio::spawn(async move { session.complete_fetch(pending).await });
                        }
                    }
                    Err(RecvError::Lagged(missed)) => {
                        warn!("Missed {} wallet events, resetting session", missed);
                        session.reset_after_missed_events().await;
                    }
                    Err(RecvError::Closed) => {
                        debug!("Wallet event stream closed");
                        break;
                    }
                }
            }
        })
    }

    fn begin_fetch(&self, inner: &mut SessionInner, account: Address) -> Option<PendingFetch> {
        inner.generation += 1;
        // New chain handle per connection; older fetches keep their own.
        match self.provider.balance_query() {
            Ok(query) => {
                inner.state = ConnectionState::Loading { account };
                Some(PendingFetch {
                    generation: inner.generation,
                    account,
                    query,
                })
            }
            Err(e) => {
                inner.state = ConnectionState::Error {
                    message: e.to_string(),
                };
                None
            }
        }
    }

    fn reset_locked(inner: &mut SessionInner) {
        inner.generation += 1;
        if inner.state != ConnectionState::NoProvider {
            inner.state = ConnectionState::Disconnected;
        }
    }
}
