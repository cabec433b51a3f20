pub mod api_response;
pub mod balance;
pub mod connection;
pub mod token;
