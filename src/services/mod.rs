pub mod balance_service;
pub mod blockchain_service;
pub mod normalizer;
pub mod token_registry;
pub mod wallet_provider;
pub mod wallet_service;

#[cfg(test)]
pub mod mock;
