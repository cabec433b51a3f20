use chrono::{DateTime, Utc};
use ethers::types::Address;
use serde::Serialize;

use super::balance::{BalanceSnapshot, NormalizedBalance};
use super::token::{format_address, TokenDescriptor};

/// Lifecycle of the wallet session. Each variant carries exactly the data
/// valid in that state, so a ready session always has its snapshot.
#[derive(Clone, Debug, PartialEq)]
pub enum ConnectionState {
    NoProvider,
    Disconnected,
    Connecting,
    Loading {
        account: Address,
    },
    Ready {
        account: Address,
        snapshot: BalanceSnapshot,
    },
    Error {
        message: String,
    },
}

impl ConnectionState {
    pub fn account(&self) -> Option<Address> {
        match self {
            ConnectionState::Loading { account } | ConnectionState::Ready { account, .. } => {
                Some(*account)
            }
            _ => None,
        }
    }

    pub fn is_connected(&self) -> bool {
        self.account().is_some()
    }

    pub fn name(&self) -> &'static str {
        match self {
            ConnectionState::NoProvider => "no_provider",
            ConnectionState::Disconnected => "disconnected",
            ConnectionState::Connecting => "connecting",
            ConnectionState::Loading { .. } => "loading",
            ConnectionState::Ready { .. } => "ready",
            ConnectionState::Error { .. } => "error",
        }
    }
}

/// Notifications pushed by the wallet provider.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ProviderEvent {
    /// New account list; empty when the site lost access to the wallet.
    AccountsChanged(Vec<Address>),
    NetworkChanged(u64),
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct TokenBalanceView {
    pub symbol: String,
    pub contract_address: String,
    pub decimals: u8,
    pub balance: NormalizedBalance,
}

/// What the UI should render for the current state.
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(tag = "view", rename_all = "snake_case")]
pub enum PresentationView {
    NoProvider,
    ConnectPrompt {
        error: Option<String>,
    },
    Loading {
        account: Option<String>,
        tokens: Vec<String>,
    },
    Loaded {
        account: String,
        balances: Vec<TokenBalanceView>,
        fetched_at: DateTime<Utc>,
    },
}

impl PresentationView {
    pub fn render(state: &ConnectionState, tokens: &[TokenDescriptor]) -> Self {
        match state {
            ConnectionState::NoProvider => PresentationView::NoProvider,
            ConnectionState::Disconnected => PresentationView::ConnectPrompt { error: None },
            ConnectionState::Error { message } => PresentationView::ConnectPrompt {
                error: Some(message.clone()),
            },
            ConnectionState::Connecting => PresentationView::Loading {
                account: None,
                tokens: tokens.iter().map(|t| t.symbol.clone()).collect(),
            },
            ConnectionState::Loading { account } => PresentationView::Loading {
                account: Some(format_address(account)),
                tokens: tokens.iter().map(|t| t.symbol.clone()).collect(),
            },
            ConnectionState::Ready { account, snapshot } => PresentationView::Loaded {
                account: format_address(account),
                balances: tokens
                    .iter()
                    .filter_map(|token| {
                        snapshot
                            .balances()
                            .get(&token.contract_address)
                            .map(|balance| TokenBalanceView {
                                symbol: token.symbol.clone(),
                                contract_address: format_address(&token.contract_address),
                                decimals: token.decimals,
                                balance: balance.clone(),
                            })
                    })
                    .collect(),
                fetched_at: snapshot.fetched_at(),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeMap;

    fn token(symbol: &str, byte: u8, decimals: u8) -> TokenDescriptor {
        TokenDescriptor::new(symbol, Address::repeat_byte(byte), decimals)
    }

    #[test]
    fn disconnected_and_error_prompt_for_connection() {
        let tokens = vec![token("yvDAI", 1, 18)];
        assert_eq!(
            PresentationView::render(&ConnectionState::Disconnected, &tokens),
            PresentationView::ConnectPrompt { error: None }
        );
        let error = ConnectionState::Error {
            message: "User rejected the request.".to_string(),
        };
        assert_eq!(
            PresentationView::render(&error, &tokens),
            PresentationView::ConnectPrompt {
                error: Some("User rejected the request.".to_string())
            }
        );
    }

    #[test]
    fn ready_lists_balances_in_registry_order() {
        let tokens = vec![token("yvDAI", 2, 18), token("yvUSDC", 1, 6)];
        let mut balances = BTreeMap::new();
        balances.insert(
            Address::repeat_byte(1),
            NormalizedBalance::from_canonical("2.5".to_string()),
        );
        balances.insert(
            Address::repeat_byte(2),
            NormalizedBalance::from_canonical("1.5".to_string()),
        );
        let state = ConnectionState::Ready {
            account: Address::repeat_byte(9),
            snapshot: BalanceSnapshot::new(balances),
        };

        match PresentationView::render(&state, &tokens) {
            PresentationView::Loaded {
                account, balances, ..
            } => {
                assert_eq!(account, format_address(&Address::repeat_byte(9)));
                let symbols: Vec<_> = balances.iter().map(|b| b.symbol.as_str()).collect();
                assert_eq!(symbols, vec!["yvDAI", "yvUSDC"]);
                assert_eq!(balances[0].balance, "1.5");
                assert_eq!(balances[1].balance, "2.5");
            }
            other => panic!("unexpected view {:?}", other),
        }
    }

    #[test]
    fn no_provider_offers_no_connect_prompt() {
        let view = PresentationView::render(&ConnectionState::NoProvider, &[]);
        assert_eq!(view, PresentationView::NoProvider);
        let json = serde_json::to_value(&view).unwrap();
        assert_eq!(json["view"], "no_provider");
    }
}
