use actix_web::web;
mod handlers;

pub fn config(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/api/v1")
            .service(handlers::get_wallet)
            .service(handlers::connect_wallet)
            .service(handlers::dismiss_error)
            .service(handlers::detect_provider)
            .service(handlers::list_tokens)
            .service(handlers::get_token),
    );
}
