use actix_web::{get, post, web, HttpResponse};
use serde::Serialize;

use crate::{
    errors::CustomError,
    models::{api_response::success_response, token::format_address},
    services::wallet_service::WalletSession,
};

#[derive(Debug, Serialize)]
pub struct TokenResponse {
    symbol: String,
    contract_address: String,
    decimals: u8,
}

#[get("/wallet")]
async fn get_wallet(session: web::Data<WalletSession>) -> HttpResponse {
    success_response(session.view().await)
}

#[post("/wallet/connect")]
async fn connect_wallet(session: web::Data<WalletSession>) -> Result<HttpResponse, CustomError> {
    let session = session.into_inner();
    session.request_connection().await?;
    Ok(success_response(session.view().await))
}

#[post("/wallet/dismiss")]
async fn dismiss_error(session: web::Data<WalletSession>) -> Result<HttpResponse, CustomError> {
    session.dismiss_error().await?;
    Ok(success_response(session.view().await))
}

#[post("/wallet/detect")]
async fn detect_provider(session: web::Data<WalletSession>) -> HttpResponse {
    session.retry_provider_detection().await;
    success_response(session.view().await)
}

#[get("/tokens")]
async fn list_tokens(session: web::Data<WalletSession>) -> HttpResponse {
    let tokens: Vec<TokenResponse> = session
        .registry()
        .all()
        .iter()
        .map(|token| TokenResponse {
            symbol: token.symbol.clone(),
            contract_address: format_address(&token.contract_address),
            decimals: token.decimals,
        })
        .collect();
    success_response(tokens)
}

#[get("/tokens/{symbol}")]
async fn get_token(
    session: web::Data<WalletSession>,
    symbol: web::Path<String>,
) -> Result<HttpResponse, CustomError> {
    let token = session.registry().describe(&symbol)?;
    Ok(success_response(TokenResponse {
        symbol: token.symbol.clone(),
        contract_address: format_address(&token.contract_address),
        decimals: token.decimals,
    }))
}
