use crate::helper::dashboard_helpers::{placeholder_dashboard, settings_section, SETTINGS_SECTIONS};
use crate::identity::IdentityError;
use crate::middleware::{admin_guard, redirect_to, AuthenticatedAdmin, LOGIN_PATH};
use crate::models::document::Collection;
use crate::models::AccountRow;
use crate::routes::{page_context, set_notification};
use crate::session_store::SessionError;
use crate::views::render;
use crate::AppState;
use actix_csrf::extractor::{Csrf, CsrfGuarded, CsrfToken};
use actix_session::Session;
use actix_web::{web, HttpResponse, Responder};
use serde::Deserialize;
use tera::{Context, Tera};

const DASHBOARD_PATH: &str = "/dashboard";

#[derive(Deserialize)]
struct LoginForm {
    csrf_token: CsrfToken,
    email: String,
    password: String,
}

impl CsrfGuarded for LoginForm {
    fn csrf_token(&self) -> &CsrfToken {
        &self.csrf_token
    }
}

#[derive(Deserialize)]
struct SettingsQuery {
    section: Option<String>,
}

pub fn config_login(cfg: &mut web::ServiceConfig) {
    cfg.route("/", web::get().to(|| async { redirect_to(DASHBOARD_PATH) }))
        .route("/login", web::get().to(show_login_form))
        .route("/login", web::post().to(handle_login))
        .route("/logout", web::post().to(handle_logout));
}

pub fn config_console(cfg: &mut web::ServiceConfig) {
    cfg.route("/dashboard", web::get().to(show_dashboard))
        .route("/users", web::get().to(show_users))
        .route("/settings", web::get().to(show_settings));
}

fn login_error_message(err: &SessionError) -> String {
    match err {
        SessionError::Authentication(IdentityError::InvalidCredentials) => "Invalid email or password.".to_string(),
        SessionError::Authentication(_) => "Sign-in is unavailable right now. Please try again.".to_string(),
        other => other.to_string(),
    }
}

async fn show_login_form(
    session: Session,
    tera: web::Data<Tera>,
    token: CsrfToken,
    state: web::Data<AppState>,
) -> impl Responder {
    if admin_guard(&session, &state.session) {
        return redirect_to(DASHBOARD_PATH);
    }

    let mut ctx = Context::new();
    ctx.insert("csrf_token", token.get());

    let email = session.get::<String>("login_email").unwrap_or(None).unwrap_or_default();
    ctx.insert("email", &email);
    if let Ok(Some(error)) = session.get::<String>("error") {
        ctx.insert("error", &error);
        session.remove("error");
    }

    render(&tera, "login.html", &ctx)
}

async fn handle_login(
    session: Session,
    state: web::Data<AppState>,
    form: Csrf<web::Form<LoginForm>>,
) -> impl Responder {
    let login_data = form.into_inner().into_inner();

    match state.session.login(&login_data.email, &login_data.password) {
        Ok(user) => {
            session.renew();
            let stored = session
                .insert("uid", &user.uid)
                .and_then(|_| session.insert("email", &user.email));
            if let Err(e) = stored {
                log::error!("Failed to write login cookie for {}: {}", user.email, e);
                return HttpResponse::InternalServerError().body("Could not start the session.");
            }
            log::info!("Admin {} signed in.", user.email);
            redirect_to(DASHBOARD_PATH)
        }
        Err(e) => {
            log::warn!("Console sign-in failed for {}: {}", login_data.email, e);
            let _ = session.insert("login_email", login_data.email.trim());
            let _ = session.insert("error", login_error_message(&e));
            redirect_to(LOGIN_PATH)
        }
    }
}

/// Only the browser holding the live session can end it; anyone else just
/// loses their cookie.
async fn handle_logout(session: Session, state: web::Data<AppState>) -> impl Responder {
    if admin_guard(&session, &state.session) {
        if let Err(e) = state.session.logout() {
            log::error!("Sign-out failed: {}", e);
        }
    }
    session.purge();
    redirect_to(LOGIN_PATH)
}

async fn show_dashboard(admin: AuthenticatedAdmin, session: Session, tera: web::Data<Tera>) -> impl Responder {
    let mut ctx = page_context(&session, &admin, "dashboard");
    ctx.insert("dashboard", &placeholder_dashboard());
    render(&tera, "dashboard.html", &ctx)
}

async fn show_users(
    admin: AuthenticatedAdmin,
    session: Session,
    tera: web::Data<Tera>,
    state: web::Data<AppState>,
) -> impl Responder {
    let accounts = match state.identity.list_accounts() {
        Ok(accounts) => accounts,
        Err(e) => {
            log::error!("Failed to list accounts: {}", e);
            set_notification(&session, "Failed to load accounts.", "error");
            Vec::new()
        }
    };

    let rows: Vec<AccountRow> = accounts
        .into_iter()
        .map(|account| {
            let is_admin = match state.documents.get(Collection::Admins, &account.uid) {
                Ok(record) => record.is_some(),
                Err(e) => {
                    log::error!("Error checking admin status for {}: {}", account.uid, e);
                    false
                }
            };
            AccountRow { account, is_admin }
        })
        .collect();

    let mut ctx = page_context(&session, &admin, "users");
    ctx.insert("accounts", &rows);
    render(&tera, "users.html", &ctx)
}

async fn show_settings(
    admin: AuthenticatedAdmin,
    session: Session,
    tera: web::Data<Tera>,
    query: web::Query<SettingsQuery>,
) -> impl Responder {
    let mut ctx = page_context(&session, &admin, "settings");
    ctx.insert("sections", &SETTINGS_SECTIONS);
    ctx.insert("current", settings_section(query.section.as_deref()));
    render(&tera, "settings.html", &ctx)
}
