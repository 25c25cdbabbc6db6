use actix_cors::Cors;
use actix_csrf::CsrfMiddleware;
use actix_session::{storage::CookieSessionStore, SessionMiddleware};
use actix_web::{
    cookie::Key,
    middleware::{DefaultHeaders, Logger},
    web, App, HttpServer,
};
use clap::Parser;
use portfoliozz_admin::{
    config::Config,
    identity::LocalIdentityProvider,
    middleware::redirect_to,
    models::db_operations::documents_db_operations::RedbDocumentStore,
    routes, views, AppState,
};
use r2d2::Pool;
use r2d2_sqlite::SqliteConnectionManager;
use rand::prelude::StdRng;
use std::convert::TryFrom;
use std::path::PathBuf;
use std::sync::Arc;

#[derive(Parser, Debug)]
#[command(name = "admin_server", author, version, about = "Starts the Portfoliozz admin console.")]
struct Cli {
    /// Path to the .env configuration file.
    #[arg(long, required = true, value_name = "FILE")]
    env_file: PathBuf,
}

fn build_cors(config: &Config) -> Cors {
    let origins = config.cors_origins();
    let cors = if origins.iter().any(|o| o == "*") {
        Cors::default().allow_any_origin()
    } else {
        origins.iter().fold(Cors::default(), |cors, origin| cors.allowed_origin(origin))
    };
    cors.allowed_methods(vec!["GET"])
        .allowed_headers(vec![actix_web::http::header::ACCEPT, actix_web::http::header::CONTENT_TYPE])
        .max_age(3600)
}

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    let cli = Cli::parse();

    let config = Config::from_env(&cli.env_file).expect("FATAL: Failed to load or parse configuration.");

    env_logger::init_from_env(env_logger::Env::new().default_filter_or(&config.log_level));

    let tera = views::build_tera().expect("FATAL: Console templates failed to compile.");

    let identity_path = config.identity_db_path();
    let documents_path = config.documents_db_path();
    if !identity_path.exists() || !documents_path.exists() {
        panic!("FATAL: Databases not found under '{}'. Run 'setup_cli --env-file <path> db setup' first.", config.database_path);
    }

    let documents = RedbDocumentStore::open(&documents_path).expect("FATAL: Failed to open the documents database.");

    let pool = Pool::builder()
        .build(SqliteConnectionManager::file(&identity_path))
        .expect("FATAL: Failed to create Rusqlite connection pool.");
    let identity = LocalIdentityProvider::new(pool);

    let app_state = web::Data::new(AppState::new(Arc::new(documents), Arc::new(identity)));
    app_state.session.init();

    let session_key_bytes =
        hex::decode(&config.session_secret_key).expect("FATAL: SESSION_SECRET_KEY in .env is not a valid hex string.");
    let session_key = Key::try_from(session_key_bytes.as_slice())
        .expect("FATAL: The decoded SESSION_SECRET_KEY is not long enough (minimum 64 bytes required).");

    let server_address = format!("{}:{}", config.web.host, config.web.port);
    log::info!("Admin console starting at http://{}", server_address);

    let server_state = app_state.clone();
    let server = HttpServer::new(move || {
        let session_mw = SessionMiddleware::builder(CookieSessionStore::default(), session_key.clone())
            .cookie_secure(config.use_secure_cookies)
            .cookie_http_only(true)
            .cookie_same_site(actix_web::cookie::SameSite::Lax)
            .build();

        App::new()
            .wrap(build_cors(&config))
            .wrap(Logger::default())
            .wrap(
                DefaultHeaders::new()
                    .add(("X-Content-Type-Options", "nosniff"))
                    .add(("X-Frame-Options", "DENY"))
                    .add(("X-XSS-Protection", "1; mode=block")),
            )
            .app_data(web::Data::new(tera.clone()))
            .app_data(server_state.clone())
            .configure(routes::public::config_api)
            .service(
                web::scope("")
                    .wrap(CsrfMiddleware::<StdRng>::new().set_cookie(actix_web::http::Method::GET, "/login"))
                    .wrap(session_mw)
                    .configure(routes::admin::config_login)
                    .configure(routes::admin::config_console)
                    .configure(routes::services::config_services)
                    .configure(routes::news::config_news),
            )
            .default_service(web::to(|| async { redirect_to("/dashboard") }))
    })
    .bind(server_address)?
    .run();

    let result = server.await;
    app_state.session.teardown();
    log::info!("Admin console stopped.");
    result
}
