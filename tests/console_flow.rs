use actix_csrf::CsrfMiddleware;
use actix_session::{storage::CookieSessionStore, SessionMiddleware};
use actix_web::cookie::{Cookie, Key};
use actix_web::dev::ServiceResponse;
use actix_web::http::{Method, StatusCode};
use actix_web::{test, web, App};
use portfoliozz_admin::helper::document_access;
use portfoliozz_admin::identity::LocalIdentityProvider;
use portfoliozz_admin::models::db_operations::documents_db_operations::{DocumentStore, RedbDocumentStore};
use portfoliozz_admin::models::document::{Collection, DocumentWrite};
use portfoliozz_admin::models::Service;
use portfoliozz_admin::setup::db_setup;
use portfoliozz_admin::{routes, views, AppState};
use r2d2::Pool;
use r2d2_sqlite::SqliteConnectionManager;
use rand::rngs::StdRng;
use std::path::PathBuf;
use std::sync::Arc;

/// Removes the redb file once the test is done with it.
struct TempFile(PathBuf);

impl Drop for TempFile {
    fn drop(&mut self) {
        let _ = std::fs::remove_file(&self.0);
    }
}

struct Console {
    // Dropped before the file guard.
    state: web::Data<AppState>,
    _file: TempFile,
}

impl Console {
    fn new(name: &str) -> Self {
        let path = std::env::temp_dir().join(format!("portfoliozz-{}-{}.redb", name, std::process::id()));
        let _ = std::fs::remove_file(&path);
        let documents = RedbDocumentStore::open(&path).unwrap();

        let pool = Pool::builder()
            .max_size(1)
            .build(SqliteConnectionManager::memory())
            .unwrap();
        db_setup::setup_identity_db(&mut pool.get().unwrap()).unwrap();

        let state = AppState::new(Arc::new(documents), Arc::new(LocalIdentityProvider::new(pool)));
        state.session.init();
        Console { state: web::Data::new(state), _file: TempFile(path) }
    }
}

/// Carries cookies from one response to the next request.
#[derive(Default)]
struct CookieJar(Vec<Cookie<'static>>);

impl CookieJar {
    fn store<B>(&mut self, resp: &ServiceResponse<B>) {
        for cookie in resp.response().cookies() {
            self.0.retain(|c| c.name() != cookie.name());
            self.0.push(cookie.into_owned());
        }
    }

    fn attach(&self, mut req: test::TestRequest) -> test::TestRequest {
        for cookie in &self.0 {
            req = req.cookie(cookie.clone());
        }
        req
    }
}

fn location<B>(resp: &ServiceResponse<B>) -> String {
    resp.headers()
        .get("location")
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default()
        .to_string()
}

fn csrf_token(html: &str) -> String {
    let marker = "name=\"csrf_token\" value=\"";
    let start = html.find(marker).unwrap() + marker.len();
    let end = start + html[start..].find('"').unwrap();
    html[start..end].replace("&#x2F;", "/").replace("&amp;", "&")
}

fn grant_admin(state: &AppState, email: &str, password: &str) {
    let user = state.identity.create_account(email, password).unwrap();
    let record = DocumentWrite::new().set("email", user.email.as_str()).server_timestamp("grantedAt");
    state.documents.set(Collection::Admins, &user.uid, &record).unwrap();
}

fn seed_service(state: &AppState, title: &str, order: i64) {
    let write = DocumentWrite::new()
        .set("title", title)
        .set("duration", "1h")
        .set("highlights", Vec::<String>::new())
        .set("order", order)
        .set("price", 10.0)
        .set("whatsappNumber", "555");
    state.documents.create(Collection::Services, &write).unwrap();
}

macro_rules! console_app {
    ($state:expr) => {
        test::init_service(
            App::new()
                .app_data(web::Data::new(views::build_tera().unwrap()))
                .app_data($state.clone())
                .configure(routes::public::config_api)
                .service(
                    web::scope("")
                        .wrap(CsrfMiddleware::<StdRng>::new().set_cookie(Method::GET, "/login"))
                        .wrap(SessionMiddleware::new(CookieSessionStore::default(), Key::generate()))
                        .configure(routes::admin::config_login)
                        .configure(routes::admin::config_console)
                        .configure(routes::services::config_services)
                        .configure(routes::news::config_news),
                ),
        )
        .await
    };
}

/// Loads the login page for its CSRF token, then posts the credentials.
macro_rules! log_in {
    ($app:expr, $jar:expr, $email:expr, $password:expr) => {{
        let resp = test::call_service(&$app, $jar.attach(test::TestRequest::get().uri("/login")).to_request()).await;
        assert_eq!(resp.status(), StatusCode::OK);
        $jar.store(&resp);
        let html = String::from_utf8(test::read_body(resp).await.to_vec()).unwrap();
        let token = csrf_token(&html);

        let form = vec![("csrf_token", token.as_str()), ("email", $email), ("password", $password)];
        let req = $jar.attach(test::TestRequest::post().uri("/login")).set_form(&form);
        let resp = test::call_service(&$app, req.to_request()).await;
        $jar.store(&resp);
        resp
    }};
}

macro_rules! send {
    ($app:expr, $jar:expr, $req:expr) => {{
        let resp = test::call_service(&$app, $jar.attach($req).to_request()).await;
        $jar.store(&resp);
        resp
    }};
}

async fn body_text<B: actix_web::body::MessageBody>(resp: ServiceResponse<B>) -> String {
    String::from_utf8(test::read_body(resp).await.to_vec()).unwrap()
}

#[actix_web::test]
async fn server_reports_active() {
    let console = Console::new("health");
    let app = console_app!(console.state);

    let resp = test::call_service(&app, test::TestRequest::get().uri("/api/is_server_active").to_request()).await;
    assert_eq!(resp.status(), StatusCode::OK);
    assert_eq!(test::read_body(resp).await, "active");
}

#[actix_web::test]
async fn console_pages_redirect_to_login_without_a_session() {
    let console = Console::new("gate");
    let app = console_app!(console.state);

    for uri in ["/dashboard", "/services", "/news/new", "/users", "/settings"] {
        let resp = test::call_service(&app, test::TestRequest::get().uri(uri).to_request()).await;
        assert_eq!(resp.status(), StatusCode::FOUND, "{}", uri);
        assert_eq!(location(&resp), "/login");
    }

    let resp = test::call_service(&app, test::TestRequest::post().uri("/services/abc/delete").to_request()).await;
    assert_eq!(resp.status(), StatusCode::FOUND);
    assert_eq!(location(&resp), "/login");
}

#[actix_web::test]
async fn public_services_come_back_in_display_order() {
    let console = Console::new("feed");
    for (title, order) in [("Later", 9), ("First", 1), ("Middle", 4)] {
        seed_service(&console.state, title, order);
    }
    let app = console_app!(console.state);

    let services: Vec<Service> =
        test::call_and_read_body_json(&app, test::TestRequest::get().uri("/api/services").to_request()).await;
    let titles: Vec<&str> = services.iter().map(|s| s.title.as_str()).collect();
    assert_eq!(titles, vec!["First", "Middle", "Later"]);
    assert!(services.iter().all(|s| !s.id.is_empty()));
}

#[actix_web::test]
async fn public_news_hides_inactive_items() {
    let console = Console::new("news");
    let shown = DocumentWrite::new().set("title", "Shown").set("content", "c").set("impact", "low").set("isActive", true).server_timestamp("createdAt");
    let hidden = DocumentWrite::new().set("title", "Hidden").set("content", "c").set("impact", "low").set("isActive", false).server_timestamp("createdAt");
    console.state.documents.create(Collection::News, &shown).unwrap();
    console.state.documents.create(Collection::News, &hidden).unwrap();
    let app = console_app!(console.state);

    let news: serde_json::Value =
        test::call_and_read_body_json(&app, test::TestRequest::get().uri("/api/news").to_request()).await;
    let titles: Vec<&str> = news.as_array().unwrap().iter().filter_map(|n| n["title"].as_str()).collect();
    assert_eq!(titles, vec!["Shown"]);
}

#[actix_web::test]
async fn non_admin_login_returns_to_the_login_page_without_a_session() {
    let console = Console::new("non-admin");
    console.state.identity.create_account("user@example.com", "pw").unwrap();
    let app = console_app!(console.state);
    let mut jar = CookieJar::default();

    let resp = log_in!(app, jar, "user@example.com", "pw");
    assert_eq!(resp.status(), StatusCode::FOUND);
    assert_eq!(location(&resp), "/login");
    assert!(console.state.identity.current_user().is_none());
    assert!(console.state.session.snapshot().user.is_none());

    let resp = send!(app, jar, test::TestRequest::get().uri("/dashboard"));
    assert_eq!(location(&resp), "/login");

    let resp = send!(app, jar, test::TestRequest::get().uri("/login"));
    assert_eq!(resp.status(), StatusCode::OK);
    assert!(body_text(resp).await.contains("Access denied. Admin privileges required."));
}

#[actix_web::test]
async fn admin_saves_toggles_and_deletes_through_the_console() {
    let console = Console::new("admin-flow");
    let state = console.state.clone();
    grant_admin(&state, "admin@example.com", "pw");
    seed_service(&state, "First", 1);
    seed_service(&state, "Last", 9);
    let app = console_app!(state);
    let mut jar = CookieJar::default();

    let resp = log_in!(app, jar, "admin@example.com", "pw");
    assert_eq!(resp.status(), StatusCode::FOUND);
    assert_eq!(location(&resp), "/dashboard");
    let resp = send!(app, jar, test::TestRequest::get().uri("/dashboard"));
    assert_eq!(resp.status(), StatusCode::OK);

    // The highlight button re-renders the open form and writes nothing.
    let add = vec![("title", "Consult"), ("highlights", "A"), ("action", "add_highlight")];
    let resp = send!(app, jar, test::TestRequest::post().uri("/services/save").set_form(&add));
    assert_eq!(resp.status(), StatusCode::OK);
    assert_eq!(body_text(resp).await.matches("name=\"highlights\"").count(), 2);
    assert_eq!(document_access::list_services(state.documents.as_ref()).unwrap().len(), 2);

    let consult = vec![
        ("title", "Consult"),
        ("duration", "30m"),
        ("highlights", "A"),
        ("highlights", ""),
        ("highlights", "B"),
        ("order", "5"),
        ("price", "100"),
        ("contact_number", "+1555"),
        ("action", "save"),
    ];
    let resp = send!(app, jar, test::TestRequest::post().uri("/services/save").set_form(&consult));
    assert_eq!(resp.status(), StatusCode::FOUND);
    assert_eq!(location(&resp), "/services");

    let resp = send!(app, jar, test::TestRequest::get().uri("/services"));
    assert_eq!(resp.status(), StatusCode::OK);
    let html = body_text(resp).await;
    assert!(html.contains("Service saved successfully."));
    let first = html.find("<h3>First</h3>").unwrap();
    let middle = html.find("<h3>Consult</h3>").unwrap();
    let last = html.find("<h3>Last</h3>").unwrap();
    assert!(first < middle && middle < last);

    let saved = document_access::list_services(state.documents.as_ref())
        .unwrap()
        .into_iter()
        .find(|s| s.title == "Consult")
        .unwrap();
    assert_eq!(saved.highlights, vec!["A", "B"]);

    let launch = DocumentWrite::new()
        .set("title", "Launch")
        .set("content", "We are live")
        .set("impact", "high")
        .set("isActive", true)
        .server_timestamp("createdAt");
    let news_id = state.documents.create(Collection::News, &launch).unwrap();
    let before = document_access::find_news(state.documents.as_ref(), &news_id).unwrap();
    let toggle_uri = format!("/news/{}/toggle", news_id);

    let resp = send!(app, jar, test::TestRequest::post().uri(&toggle_uri).set_form(&[("is_active", "true")]));
    assert_eq!(location(&resp), "/news");
    assert!(!document_access::find_news(state.documents.as_ref(), &news_id).unwrap().is_active);

    let resp = send!(app, jar, test::TestRequest::post().uri(&toggle_uri).set_form(&[("is_active", "false")]));
    assert_eq!(location(&resp), "/news");
    assert_eq!(document_access::find_news(state.documents.as_ref(), &news_id).unwrap(), before);

    let resp = send!(app, jar, test::TestRequest::post().uri(&format!("/services/{}/delete", saved.id)));
    assert_eq!(location(&resp), "/services");
    let mut titles: Vec<String> = document_access::list_services(state.documents.as_ref())
        .unwrap()
        .into_iter()
        .map(|s| s.title)
        .collect();
    titles.sort();
    assert_eq!(titles, vec!["First", "Last"]);

    let resp = send!(app, jar, test::TestRequest::post().uri(&format!("/news/{}/delete", news_id)));
    assert_eq!(location(&resp), "/news");
    assert!(document_access::find_news(state.documents.as_ref(), &news_id).is_none());
}
