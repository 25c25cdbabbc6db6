use crate::helper::document_access;
use crate::helper::form_helpers::{parse_form, ParsedForm};
use crate::helper::service_form::ServiceFormController;
use crate::helper::view_helpers::sort_services;
use crate::middleware::{redirect_to, AuthenticatedAdmin};
use crate::models::document::Collection;
use crate::models::Service;
use crate::routes::{page_context, set_notification};
use crate::views::render;
use crate::AppState;
use actix_session::Session;
use actix_web::{web, HttpResponse, Responder};
use tera::Tera;

const SERVICES_PATH: &str = "/services";

pub fn config_services(cfg: &mut web::ServiceConfig) {
    cfg.route("/services", web::get().to(show_services))
        .route("/services/new", web::get().to(new_service))
        .route("/services/save", web::post().to(save_service))
        .route("/services/{id}/edit", web::get().to(edit_service))
        .route("/services/{id}/delete", web::post().to(delete_service));
}

/// What the save button row asked for.
#[derive(Debug, PartialEq)]
enum FormAction {
    Save,
    AddHighlight,
    RemoveHighlight(usize),
}

impl FormAction {
    fn from_form(form: &ParsedForm) -> Self {
        match form.get("action") {
            Some("add_highlight") => FormAction::AddHighlight,
            Some(action) => action
                .strip_prefix("remove_highlight:")
                .and_then(|i| i.parse().ok())
                .map(FormAction::RemoveHighlight)
                .unwrap_or(FormAction::Save),
            None => FormAction::Save,
        }
    }
}

fn load_services(session: &Session, state: &AppState) -> Vec<Service> {
    match document_access::list_services(state.documents.as_ref()) {
        Some(mut services) => {
            sort_services(&mut services);
            services
        }
        None => {
            set_notification(session, "Failed to load services.", "error");
            Vec::new()
        }
    }
}

fn render_page(
    admin: &AuthenticatedAdmin,
    session: &Session,
    tera: &Tera,
    state: &AppState,
    form: &ServiceFormController,
) -> HttpResponse {
    let services = load_services(session, state);
    let mut ctx = page_context(session, admin, "services");
    ctx.insert("services", &services);
    ctx.insert("form", form);
    render(tera, "services.html", &ctx)
}

async fn show_services(
    admin: AuthenticatedAdmin,
    session: Session,
    tera: web::Data<Tera>,
    state: web::Data<AppState>,
) -> impl Responder {
    render_page(&admin, &session, &tera, &state, &ServiceFormController::closed())
}

async fn new_service(
    admin: AuthenticatedAdmin,
    session: Session,
    tera: web::Data<Tera>,
    state: web::Data<AppState>,
) -> impl Responder {
    render_page(&admin, &session, &tera, &state, &ServiceFormController::creating())
}

async fn edit_service(
    admin: AuthenticatedAdmin,
    session: Session,
    tera: web::Data<Tera>,
    state: web::Data<AppState>,
    id: web::Path<String>,
) -> impl Responder {
    match document_access::find_service(state.documents.as_ref(), &id) {
        Some(service) => render_page(&admin, &session, &tera, &state, &ServiceFormController::editing(&service)),
        None => {
            set_notification(&session, "Service not found.", "error");
            redirect_to(SERVICES_PATH)
        }
    }
}

async fn save_service(
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
    let mut controller = ServiceFormController::resume(&parsed);

    match FormAction::from_form(&parsed) {
        FormAction::AddHighlight => controller.add_highlight(),
        FormAction::RemoveHighlight(index) => controller.remove_highlight(index),
        FormAction::Save => match controller.submit(state.documents.as_ref()) {
            Ok(true) => {
                log::info!("Service saved by {}.", admin.email);
                set_notification(&session, "Service saved successfully.", "success");
                return redirect_to(SERVICES_PATH);
            }
            Ok(false) => set_notification(&session, "Failed to save service.", "error"),
            Err(e) => log::info!("Service form rejected: {}", e),
        },
    }

    render_page(&admin, &session, &tera, &state, &controller)
}

async fn delete_service(
    admin: AuthenticatedAdmin,
    session: Session,
    state: web::Data<AppState>,
    id: web::Path<String>,
) -> impl Responder {
    if document_access::delete(state.documents.as_ref(), Collection::Services, &id) {
        log::info!("Service {} deleted by {}.", id, admin.email);
        set_notification(&session, "Service deleted.", "success");
    } else {
        set_notification(&session, "Failed to delete service.", "error");
    }
    redirect_to(SERVICES_PATH)
}
