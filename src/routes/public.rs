//! Read-only JSON feed for the public portfolio site.

use crate::helper::document_access;
use crate::helper::view_helpers::{sort_news, sort_services};
use crate::AppState;
use actix_web::{web, HttpResponse, Responder};
use serde::Deserialize;

#[derive(Deserialize)]
pub struct ApiQuery {
    limit: Option<usize>,
}

pub fn config_api(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/api")
            .route("/is_server_active", web::get().to(is_server_active))
            .route("/services", web::get().to(get_services))
            .route("/news", web::get().to(get_active_news)),
    );
}

async fn is_server_active() -> impl Responder {
    HttpResponse::Ok().body("active")
}

async fn get_services(state: web::Data<AppState>) -> impl Responder {
    match document_access::list_services(state.documents.as_ref()) {
        Some(mut services) => {
            sort_services(&mut services);
            HttpResponse::Ok().json(services)
        }
        None => HttpResponse::InternalServerError().finish(),
    }
}

/// Active items only, newest first.
async fn get_active_news(state: web::Data<AppState>, query: web::Query<ApiQuery>) -> impl Responder {
    match document_access::list_news(state.documents.as_ref()) {
        Some(mut news) => {
            news.retain(|n| n.is_active);
            sort_news(&mut news);
            if let Some(limit) = query.limit {
                news.truncate(limit);
            }
            HttpResponse::Ok().json(news)
        }
        None => HttpResponse::InternalServerError().finish(),
    }
}
