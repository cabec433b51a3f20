use std::sync::Arc;

use actix_cors::Cors;
use actix_web::http::header;
use actix_web::{web, App, HttpServer};
use dotenv::dotenv;
use log::info;

mod api;
mod config;
mod errors;
mod models;
mod services;

use services::{
    token_registry::TokenRegistry, wallet_provider::RpcWalletProvider,
    wallet_service::WalletSession,
};

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    dotenv().ok();
    env_logger::init();

    let config = config::Config::from_env().map_err(into_io)?;
    let registry = Arc::new(TokenRegistry::yearn_vaults().map_err(into_io)?);

    let wallet = Arc::new(
        RpcWalletProvider::new(&config.wallet_rpc_url, config.balance_checker).map_err(into_io)?,
    );
    wallet.spawn_event_watcher(config.poll_interval);

    let session = Arc::new(WalletSession::new(wallet, registry));
    session.start().await;
    info!(
        "Wallet session ready ({}), listening on port {}",
        session.state().await.name(),
        config.port
    );

    let session = web::Data::from(session);
    HttpServer::new(move || {
        let cors = Cors::default()
            .allowed_origin("http://localhost:8080")
            .allowed_origin("http://localhost:5173")
            .allowed_methods(vec!["GET", "POST"])
            .allowed_headers(vec![
                header::CONTENT_TYPE,
                header::AUTHORIZATION,
                header::ACCEPT,
            ])
            .supports_credentials();
        App::new()
            .app_data(session.clone())
            .configure(api::config)
            .wrap(cors)
    })
    .bind(("127.0.0.1", config.port))?
    .run()
    .await
}

fn into_io(err: errors::CustomError) -> std::io::Error {
    std::io::Error::new(std::io::ErrorKind::Other, err.to_string())
}
