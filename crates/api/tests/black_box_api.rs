use std::{sync::Arc, time::Duration};

use axum::{Json, Router, http::StatusCode as AxumStatus, response::IntoResponse, routing::post};
use reqwest::{StatusCode, header};
use serde_json::{Value, json};

use propdesk_api::{app, client::HttpCredentialExchange};
use propdesk_auth::{AccessEvaluator, RoleRegistry, RouteTable, SessionConfig, UnmappedRoutes};

struct TestServer {
    base_url: String,
    handle: tokio::task::JoinHandle<()>,
}

impl TestServer {
    async fn spawn(app: Router) -> Self {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .expect("failed to bind ephemeral port");
        let addr = listener.local_addr().unwrap();
        let base_url = format!("http://{}", addr);

        let handle = tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        Self { base_url, handle }
    }
}

impl Drop for TestServer {
    fn drop(&mut self) {
        self.handle.abort();
    }
}

// -------------------------
// Fake credentials API
// -------------------------

fn user(id: &str, role: &str, email: &str) -> Value {
    json!({ "id": id, "role": role, "firstName": "Test", "lastName": "User", "email": email })
}

fn tokens(n: u32) -> Value {
    json!({ "accessToken": format!("access-{n}"), "refreshToken": format!("refresh-{n}") })
}

async fn fake_login(Json(body): Json<Value>) -> axum::response::Response {
    let email = body["email"].as_str().unwrap_or_default();
    let password = body["password"].as_str().unwrap_or_default();

    if email == "silent@example.com" {
        return AxumStatus::UNAUTHORIZED.into_response();
    }
    if password != "secret" {
        return (
            AxumStatus::UNAUTHORIZED,
            Json(json!({ "message": "Incorrect email or password" })),
        )
            .into_response();
    }

    let with_org = |user: Value| {
        Json(json!({
            "user": user,
            "tokens": tokens(1),
            "organizationId": "org-1",
            "organizationName": "Harbour Lets",
        }))
        .into_response()
    };

    match email {
        "pm@example.com" => with_org(user("u-pm", "Property Manager", email)),
        "fixit@example.com" => with_org(user("u-fix", "Maintenance", email)),
        "tenant@example.com" => with_org(user("u-ten", "Tenant", email)),
        "noorg@example.com" => Json(json!({
            "user": user("u-root", "Admin", email),
            "tokens": tokens(1),
        }))
        .into_response(),
        _ => (
            AxumStatus::NOT_FOUND,
            Json(json!({ "message": "No account for this email" })),
        )
            .into_response(),
    }
}

async fn fake_refresh(Json(body): Json<Value>) -> axum::response::Response {
    match body["refreshToken"].as_str() {
        Some("refresh-1") => Json(tokens(2)).into_response(),
        _ => (
            AxumStatus::UNAUTHORIZED,
            Json(json!({ "message": "Please authenticate" })),
        )
            .into_response(),
    }
}

fn fake_credentials_api() -> Router {
    Router::new()
        .route("/auth/login", post(fake_login))
        .route("/auth/refresh-tokens", post(fake_refresh))
}

// -------------------------
// Harness
// -------------------------

struct Harness {
    app: TestServer,
    _upstream: TestServer,
    client: reqwest::Client,
}

impl Harness {
    async fn spawn() -> Self {
        Self::spawn_with(AccessEvaluator::default()).await
    }

    async fn spawn_with(access: AccessEvaluator) -> Self {
        let upstream = TestServer::spawn(fake_credentials_api()).await;
        let exchange =
            HttpCredentialExchange::new(upstream.base_url.clone(), Duration::from_secs(5)).unwrap();

        let services = Arc::new(app::AppServices::new(
            access,
            SessionConfig::default(),
            Arc::new(exchange),
            false,
        ));
        let app = TestServer::spawn(app::build_app(services)).await;

        let client = reqwest::Client::builder()
            .redirect(reqwest::redirect::Policy::none())
            .build()
            .unwrap();

        Self {
            app,
            _upstream: upstream,
            client,
        }
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.app.base_url, path)
    }

    async fn sign_in(&self, email: &str, password: &str) -> reqwest::Response {
        self.client
            .post(self.url("/auth/signin"))
            .json(&json!({ "email": email, "password": password }))
            .send()
            .await
            .unwrap()
    }

    /// Sign in and return the `name=value` cookie pair.
    async fn session_cookie(&self, email: &str) -> String {
        let res = self.sign_in(email, "secret").await;
        assert_eq!(res.status(), StatusCode::OK);
        cookie_pair(&res).expect("sign-in must set the session cookie")
    }

    async fn get(&self, path: &str, cookie: Option<&str>) -> reqwest::Response {
        let mut req = self.client.get(self.url(path));
        if let Some(cookie) = cookie {
            req = req.header(header::COOKIE, cookie);
        }
        req.send().await.unwrap()
    }
}

fn cookie_pair(res: &reqwest::Response) -> Option<String> {
    res.headers()
        .get(header::SET_COOKIE)?
        .to_str()
        .ok()?
        .split(';')
        .next()
        .map(|pair| pair.trim().to_string())
}

fn location(res: &reqwest::Response) -> &str {
    res.headers()
        .get(header::LOCATION)
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default()
}

// -------------------------
// Tests
// -------------------------

#[tokio::test]
async fn health_is_public() {
    let h = Harness::spawn().await;
    let res = h.get("/health", None).await;
    assert_eq!(res.status(), StatusCode::OK);
}

#[tokio::test]
async fn sign_in_sets_cookie_and_exposes_session() {
    let h = Harness::spawn().await;

    let res = h.sign_in("pm@example.com", "secret").await;
    assert_eq!(res.status(), StatusCode::OK);
    let cookie = cookie_pair(&res).unwrap();
    assert!(cookie.starts_with("propdesk_session="));

    let body: Value = res.json().await.unwrap();
    assert_eq!(body["role"], "Property Manager");
    assert_eq!(body["organizationId"], "org-1");
    assert!(body.get("tokens").is_none());

    let res = h.get("/auth/session", Some(&cookie)).await;
    assert_eq!(res.status(), StatusCode::OK);
    let body: Value = res.json().await.unwrap();
    assert_eq!(body["user"]["email"], "pm@example.com");
    assert!(body["modules"].as_array().unwrap().iter().any(|m| m == "reports"));
}

#[tokio::test]
async fn rejection_message_is_passed_through() {
    let h = Harness::spawn().await;

    let res = h.sign_in("pm@example.com", "wrong").await;
    assert_eq!(res.status(), StatusCode::UNAUTHORIZED);
    assert!(res.headers().get(header::SET_COOKIE).is_none());
    let body: Value = res.json().await.unwrap();
    assert_eq!(body["error"], "invalid_credentials");
    assert_eq!(body["message"], "Incorrect email or password");
}

#[tokio::test]
async fn rejection_without_message_uses_default() {
    let h = Harness::spawn().await;

    let res = h.sign_in("silent@example.com", "secret").await;
    assert_eq!(res.status(), StatusCode::UNAUTHORIZED);
    let body: Value = res.json().await.unwrap();
    assert_eq!(body["message"], "Invalid email or password");
}

#[tokio::test]
async fn role_outside_allowed_set_is_refused() {
    let h = Harness::spawn().await;

    let res = h.sign_in("tenant@example.com", "secret").await;
    assert_eq!(res.status(), StatusCode::FORBIDDEN);
    assert!(res.headers().get(header::SET_COOKIE).is_none());
    let body: Value = res.json().await.unwrap();
    assert_eq!(body["error"], "role_not_allowed");
    assert_eq!(body["message"], "not authorized to access this application");
}

#[tokio::test]
async fn anonymous_requests_redirect_to_sign_in() {
    let h = Harness::spawn().await;

    let res = h.get("/listings?page=2", None).await;
    assert_eq!(res.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&res), "/auth/signin?callbackUrl=%2Flistings%3Fpage%3D2");
}

#[tokio::test]
async fn maintenance_role_is_kept_out_of_listings() {
    let h = Harness::spawn().await;
    let cookie = h.session_cookie("fixit@example.com").await;

    for path in ["/listings", "/listings/", "/listings?x=1", "/listings/portfolio/abc123"] {
        let res = h.get(path, Some(&cookie)).await;
        assert_eq!(res.status(), StatusCode::SEE_OTHER, "{path}");
        assert_eq!(location(&res), "/forbidden", "{path}");
    }

    let res = h.get("/maintenance/requests/7", Some(&cookie)).await;
    assert_eq!(res.status(), StatusCode::OK);
    let body: Value = res.json().await.unwrap();
    assert_eq!(body["module"], "maintenance");
    assert_eq!(body["organizationId"], "org-1");

    let res = h.get("/forbidden", Some(&cookie)).await;
    assert_eq!(res.status(), StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn unmapped_paths_pass_the_guard() {
    let h = Harness::spawn().await;
    let cookie = h.session_cookie("fixit@example.com").await;

    // Fail-open: not forbidden, there is simply no screen.
    let res = h.get("/help/contact", Some(&cookie)).await;
    assert_eq!(res.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn missing_organization_fails_loudly() {
    let h = Harness::spawn().await;
    let cookie = h.session_cookie("noorg@example.com").await;

    let res = h.get("/dashboard", Some(&cookie)).await;
    assert_eq!(res.status(), StatusCode::INTERNAL_SERVER_ERROR);
    let body: Value = res.json().await.unwrap();
    assert_eq!(body["error"], "missing_organization_scope");
}

#[tokio::test]
async fn sign_out_ends_the_session() {
    let h = Harness::spawn().await;
    let cookie = h.session_cookie("pm@example.com").await;

    let res = h
        .client
        .post(h.url("/auth/signout"))
        .header(header::COOKIE, &cookie)
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::NO_CONTENT);
    let cleared = res.headers().get(header::SET_COOKIE).unwrap().to_str().unwrap();
    assert!(cleared.contains("Max-Age=0"));

    let res = h.get("/dashboard", Some(&cookie)).await;
    assert_eq!(res.status(), StatusCode::SEE_OTHER);
    assert!(location(&res).starts_with("/auth/signin"));

    let res = h.get("/auth/session", Some(&cookie)).await;
    assert_eq!(res.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn refresh_issues_new_expiry() {
    let h = Harness::spawn().await;
    let res = h.sign_in("pm@example.com", "secret").await;
    let cookie = cookie_pair(&res).unwrap();
    let first: Value = res.json().await.unwrap();

    tokio::time::sleep(Duration::from_millis(20)).await;

    let res = h
        .client
        .post(h.url("/auth/refresh"))
        .header(header::COOKIE, &cookie)
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    let refreshed: Value = res.json().await.unwrap();
    assert_eq!(refreshed["user"], first["user"]);
    assert_ne!(refreshed["expiresAt"], first["expiresAt"]);
}

#[tokio::test]
async fn explain_endpoint_reports_decision() {
    let h = Harness::spawn().await;
    let cookie = h.session_cookie("fixit@example.com").await;

    let res = h
        .get("/access/explain?path=/listings/portfolio/abc123", Some(&cookie))
        .await;
    assert_eq!(res.status(), StatusCode::OK);
    let body: Value = res.json().await.unwrap();
    assert_eq!(body["granted"], false);
    assert_eq!(body["reason"], "module_not_granted");
    assert_eq!(body["module"], "listings");
    assert_eq!(body["match"]["kind"], "prefix");

    let res = h.get("/access/modules", Some(&cookie)).await;
    let body: Value = res.json().await.unwrap();
    assert_eq!(body["modules"], json!(["dashboard", "maintenance"]));
}

#[tokio::test]
async fn fail_closed_policy_denies_unmapped_screens_only() {
    let h = Harness::spawn_with(AccessEvaluator::new(
        RoleRegistry::default(),
        RouteTable::default(),
        UnmappedRoutes::Deny,
    ))
    .await;
    let cookie = h.session_cookie("pm@example.com").await;

    let res = h.get("/access/modules", Some(&cookie)).await;
    assert_eq!(res.status(), StatusCode::OK);

    let res = h.get("/access/explain?path=/help/contact", Some(&cookie)).await;
    assert_eq!(res.status(), StatusCode::OK);
    let body: Value = res.json().await.unwrap();
    assert_eq!(body["granted"], false);
    assert_eq!(body["reason"], "unmapped_denied");

    let res = h.get("/help/contact", Some(&cookie)).await;
    assert_eq!(res.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&res), "/forbidden");

    let res = h.get("/listings", Some(&cookie)).await;
    assert_eq!(res.status(), StatusCode::OK);
}

#[tokio::test]
async fn session_endpoints_still_require_sign_in() {
    let h = Harness::spawn().await;

    let res = h.get("/access/modules", None).await;
    assert_eq!(res.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&res), "/auth/signin?callbackUrl=%2Faccess%2Fmodules");
}
