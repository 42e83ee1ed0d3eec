use crate::api::service::{self, ApiError, CollectionQuery, HoldingsRequest};
use actix_web::{get, post, web, HttpResponse, Responder};
use memes_tracker::{types::TokenId, TrackerService};

#[get("/collection")]
async fn collection(
    tracker: web::Data<TrackerService>,
    query: web::Query<CollectionQuery>,
) -> impl Responder {
    log::info!("collection - {:?}", query);
    web::Json(service::collection(&tracker, query.into_inner()).await)
}

#[get("/token/{id}")]
async fn token(
    tracker: web::Data<TrackerService>,
    id: web::Path<TokenId>,
) -> Result<impl Responder, ApiError> {
    log::info!("token - {id}");
    Ok(web::Json(service::token(&tracker, id.into_inner()).await?))
}

#[get("/stats")]
async fn stats(tracker: web::Data<TrackerService>) -> impl Responder {
    web::Json(service::stats(&tracker).await)
}

#[get("/wallet/{address}")]
async fn wallet(
    tracker: web::Data<TrackerService>,
    address: web::Path<String>,
) -> Result<impl Responder, ApiError> {
    log::info!("wallet - {address}");
    Ok(web::Json(service::wallet(&tracker, &address).await?))
}

#[post("/holdings")]
async fn holdings(
    tracker: web::Data<TrackerService>,
    body: web::Json<HoldingsRequest>,
) -> Result<impl Responder, ApiError> {
    log::info!("holdings - {:?}", body);
    Ok(web::Json(service::holdings(&tracker, &body.wallets).await?))
}

#[post("/cache/clear")]
async fn clear_cache(tracker: web::Data<TrackerService>) -> impl Responder {
    service::clear_cache(&tracker).await;
    HttpResponse::NoContent()
}

pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.service(collection)
        .service(token)
        .service(stats)
        .service(wallet)
        .service(holdings)
        .service(clear_cache);
}
