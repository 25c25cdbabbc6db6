use actix_session::Session;
use tera::Context;

use crate::middleware::AuthenticatedAdmin;
use crate::models::Notification;

pub mod admin;
pub mod news;
pub mod public;
pub mod services;

/// Queues a one-shot banner for the next rendered console page.
pub(crate) fn set_notification(session: &Session, message: &str, r#type: &str) {
    let notification = Notification { message: message.to_string(), r#type: r#type.to_string() };
    if let Err(e) = session.insert("notification", &notification) {
        log::error!("Failed to store notification in session: {}", e);
    }
}

/// Base context for pages rendered inside the console shell.
pub(crate) fn page_context(session: &Session, admin: &AuthenticatedAdmin, active_nav: &str) -> Context {
    let mut ctx = Context::new();
    ctx.insert("user", admin);
    ctx.insert("active_nav", active_nav);
    if let Ok(Some(notification)) = session.get::<Notification>("notification") {
        ctx.insert("notification", &notification);
        session.remove("notification");
    }
    ctx
}
