use std::collections::BTreeMap;
use std::fmt;

use chrono::{DateTime, Utc};
use ethers::types::Address;
use serde::Serialize;

/// A token amount in display units, kept as an exact base-10 string
/// (`"1.5"`, `"0"`, `"42.000001"`) so no precision is lost to floats.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize)]
#[serde(transparent)]
pub struct NormalizedBalance(String);

impl NormalizedBalance {
    pub(crate) fn from_canonical(text: String) -> Self {
        Self(text)
    }
}

impl fmt::Display for NormalizedBalance {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl PartialEq<&str> for NormalizedBalance {
    fn eq(&self, other: &&str) -> bool {
        self.0 == *other
    }
}

/// Balances of every registered token for one account, keyed by contract
/// address. Built only by the balance fetcher, which guarantees the key set
/// equals the registry's.
#[derive(Clone, Debug, PartialEq)]
pub struct BalanceSnapshot {
    balances: BTreeMap<Address, NormalizedBalance>,
    fetched_at: DateTime<Utc>,
}

impl BalanceSnapshot {
    pub(crate) fn new(balances: BTreeMap<Address, NormalizedBalance>) -> Self {
        Self {
            balances,
            fetched_at: Utc::now(),
        }
    }

    pub fn balances(&self) -> &BTreeMap<Address, NormalizedBalance> {
        &self.balances
    }

    pub fn fetched_at(&self) -> DateTime<Utc> {
        self.fetched_at
    }
}
