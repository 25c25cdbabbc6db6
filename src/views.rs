use actix_web::HttpResponse;
use tera::{Context, Tera};

const TEMPLATES: [(&str, &str); 7] = [
    ("base.html", include_str!("../templates/base.html")),
    ("login.html", include_str!("../templates/login.html")),
    ("dashboard.html", include_str!("../templates/dashboard.html")),
    ("services.html", include_str!("../templates/services.html")),
    ("news.html", include_str!("../templates/news.html")),
    ("users.html", include_str!("../templates/users.html")),
    ("settings.html", include_str!("../templates/settings.html")),
];

/// Compiles the console templates that are built into the binary.
pub fn build_tera() -> Result<Tera, tera::Error> {
    let mut tera = Tera::default();
    tera.add_raw_templates(TEMPLATES.to_vec())?;
    Ok(tera)
}

pub fn render(tera: &Tera, template: &str, ctx: &Context) -> HttpResponse {
    match tera.render(template, ctx) {
        Ok(rendered) => HttpResponse::Ok().content_type("text/html; charset=utf-8").body(rendered),
        Err(err) => {
            log::error!("Template rendering error in {}: {}", template, err);
            HttpResponse::InternalServerError().body("Template error")
        }
    }
}
