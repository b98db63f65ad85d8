use actix_web::{web, HttpResponse, Responder};
use validator::Validate;
use crate::models::{CategoryQuery, ChatQuery, UrlQuery, WikipediaQuery};
use crate::routes::{resource, ApiError, AppState};
use crate::services::CacheKey;

/// Configure every scraper-backed route
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.service(web::scope("/ai").service(resource("/oss").route(web::get().to(oss_chat))))
        .service(
            web::scope("/random")
                .service(resource("/waifu").route(web::get().to(random_waifu)))
                .service(resource("/neko").route(web::get().to(random_neko)))
                .service(resource("/anime").route(web::get().to(random_anime))),
        )
        .service(web::scope("/search").service(resource("/wikipedia").route(web::get().to(wikipedia_summary))))
        .service(
            web::scope("/tools")
                .service(resource("/metadata").route(web::get().to(page_metadata)))
                .service(resource("/shortlink").route(web::get().to(shorten_url))),
        );
}

/// Chat completion
///
/// GET /ai/oss?text={message}&system={prompt}
async fn oss_chat(state: web::Data<AppState>, query: web::Query<ChatQuery>) -> impl Responder {
    if let Err(errors) = query.validate() {
        return state.fail(errors.into());
    }

    let result = state
        .scrapers
        .chat
        .complete(&query.text, query.system.as_deref())
        .await;

    state.respond(result.map_err(ApiError::from))
}

async fn random_waifu(state: web::Data<AppState>) -> impl Responder {
    random_image(&state, "waifu").await
}

async fn random_neko(state: web::Data<AppState>) -> impl Responder {
    random_image(&state, "neko").await
}

/// GET /random/anime?category={category}
async fn random_anime(state: web::Data<AppState>, query: web::Query<CategoryQuery>) -> impl Responder {
    if let Err(errors) = query.validate() {
        return state.fail(errors.into());
    }
    random_image(&state, &query.category).await
}

async fn random_image(state: &AppState, category: &str) -> HttpResponse {
    let result = state.scrapers.waifu.random(category).await;
    state.respond(result.map_err(ApiError::from))
}

/// Wikipedia article summary
///
/// GET /search/wikipedia?q={title}&lang={code}
async fn wikipedia_summary(state: web::Data<AppState>, query: web::Query<WikipediaQuery>) -> impl Responder {
    if let Err(errors) = query.validate() {
        return state.fail(errors.into());
    }

    let key = CacheKey::wikipedia(&query.q, &query.lang);
    let result = state
        .cached(key, state.scrapers.wikipedia.summary(&query.q, &query.lang))
        .await;

    state.respond(result)
}

/// Page metadata
///
/// GET /tools/metadata?url={url}
async fn page_metadata(state: web::Data<AppState>, query: web::Query<UrlQuery>) -> impl Responder {
    if let Err(errors) = query.validate() {
        return state.fail(errors.into());
    }

    let key = CacheKey::metadata(&query.url);
    let result = state
        .cached(key, state.scrapers.metadata.metadata(&query.url))
        .await;

    state.respond(result)
}

/// GET /tools/shortlink?url={url}
async fn shorten_url(state: web::Data<AppState>, query: web::Query<UrlQuery>) -> impl Responder {
    if let Err(errors) = query.validate() {
        return state.fail(errors.into());
    }

    let key = CacheKey::shortlink(&query.url);
    let result = state
        .cached(key, state.scrapers.shortlink.shorten(&query.url))
        .await;

    state.respond(result)
}
