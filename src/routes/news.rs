use crate::helper::document_access;
use crate::helper::form_helpers::parse_form;
use crate::helper::news_form::NewsFormController;
use crate::helper::view_helpers::{news_card_rows, news_table_rows, sort_news};
use crate::middleware::{redirect_to, AuthenticatedAdmin};
use crate::models::document::Collection;
use crate::models::{Impact, NewsItem};
use crate::routes::{page_context, set_notification};
use crate::views::render;
use crate::AppState;
use actix_session::Session;
use actix_web::{web, HttpResponse, Responder};
use serde::{Deserialize, Serialize};
use tera::Tera;

const NEWS_PATH: &str = "/news";

#[derive(Deserialize)]
struct ToggleForm {
    is_active: bool,
}

#[derive(Serialize)]
struct ImpactOption {
    value: &'static str,
    label: &'static str,
}

pub fn config_news(cfg: &mut web::ServiceConfig) {
    cfg.route("/news", web::get().to(show_news))
        .route("/news/new", web::get().to(new_news))
        .route("/news/save", web::post().to(save_news))
        .route("/news/{id}/edit", web::get().to(edit_news))
        .route("/news/{id}/toggle", web::post().to(toggle_news))
        .route("/news/{id}/delete", web::post().to(delete_news));
}

fn load_news(session: &Session, state: &AppState) -> Vec<NewsItem> {
    match document_access::list_news(state.documents.as_ref()) {
        Some(mut news) => {
            sort_news(&mut news);
            news
        }
        None => {
            set_notification(session, "Failed to load news.", "error");
            Vec::new()
        }
    }
}

fn render_page(
    admin: &AuthenticatedAdmin,
    session: &Session,
    tera: &Tera,
    state: &AppState,
    form: &NewsFormController,
) -> HttpResponse {
    let news = load_news(session, state);
    let impacts: Vec<ImpactOption> = Impact::ALL
        .iter()
        .map(|i| ImpactOption { value: i.as_str(), label: i.label() })
        .collect();

    let mut ctx = page_context(session, admin, "news");
    ctx.insert("rows", &news_table_rows(&news));
    ctx.insert("card", &news_card_rows(&news));
    ctx.insert("impacts", &impacts);
    ctx.insert("form", form);
    render(tera, "news.html", &ctx)
}

async fn show_news(
    admin: AuthenticatedAdmin,
    session: Session,
    tera: web::Data<Tera>,
    state: web::Data<AppState>,
) -> impl Responder {
    render_page(&admin, &session, &tera, &state, &NewsFormController::closed())
}

async fn new_news(
    admin: AuthenticatedAdmin,
    session: Session,
    tera: web::Data<Tera>,
    state: web::Data<AppState>,
) -> impl Responder {
    render_page(&admin, &session, &tera, &state, &NewsFormController::creating())
}

async fn edit_news(
    admin: AuthenticatedAdmin,
    session: Session,
    tera: web::Data<Tera>,
    state: web::Data<AppState>,
    id: web::Path<String>,
) -> impl Responder {
    match document_access::find_news(state.documents.as_ref(), &id) {
        Some(item) => render_page(&admin, &session, &tera, &state, &NewsFormController::editing(&item)),
        None => {
            set_notification(&session, "News item not found.", "error");
            redirect_to(NEWS_PATH)
        }
    }
}

async fn save_news(
    admin: AuthenticatedAdmin,
    session: Session,
    tera: web::Data<Tera>,
    state: web::Data<AppState>,
    form: web::Bytes,
) -> impl Responder {
    let parsed = match parse_form(&form) {
        Ok(p) => p,
        Err(response) => return response,
    };
    let mut controller = NewsFormController::resume(&parsed);

    match controller.submit(state.documents.as_ref()) {
        Ok(true) => {
            log::info!("News item saved by {}.", admin.email);
            set_notification(&session, "News saved successfully.", "success");
            return redirect_to(NEWS_PATH);
        }
        Ok(false) => set_notification(&session, "Failed to save news.", "error"),
        Err(e) => log::info!("News form rejected: {}", e),
    }

    render_page(&admin, &session, &tera, &state, &controller)
}

/// The submitted flag is the status the admin saw; the stored value becomes its negation.
async fn toggle_news(
    _admin: AuthenticatedAdmin,
    session: Session,
    state: web::Data<AppState>,
    id: web::Path<String>,
    form: web::Form<ToggleForm>,
) -> impl Responder {
    if !document_access::toggle_news_active(state.documents.as_ref(), &id, form.is_active) {
        set_notification(&session, "Failed to update news status.", "error");
    }
    redirect_to(NEWS_PATH)
}

async fn delete_news(
    admin: AuthenticatedAdmin,
    session: Session,
    state: web::Data<AppState>,
    id: web::Path<String>,
) -> impl Responder {
    if document_access::delete(state.documents.as_ref(), Collection::News, &id) {
        log::info!("News item {} deleted by {}.", id, admin.email);
        set_notification(&session, "News item deleted.", "success");
    } else {
        set_notification(&session, "Failed to delete news item.", "error");
    }
    redirect_to(NEWS_PATH)
}
