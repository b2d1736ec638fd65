//! HTTP-level flows against the router with in-memory adapters.

use std::sync::Arc;

use auth::domain::repository::UserRepository;
use auth::domain::value_object::email::Email;
use auth::presentation::{CurrentIdentity, require_auth_allow_unverified};
use auth::{
    Argon2PasswordHasher, AuthAppState, AuthConfig, MemoryAuthRepository, RecordingEmailQueue,
    auth_router,
};
use axum::Router;
use axum::body::{Body, to_bytes};
use axum::http::{Request, StatusCode, header};
use axum::response::Response;
use axum::routing::get;
use platform::password::Argon2Hasher;
use serde_json::{Value, json};
use tower::ServiceExt;

const EMAIL: &str = "grace@example.com";
const PASSWORD: &str = "hopper-cobol-1959";

struct TestApp {
    state: AuthAppState<MemoryAuthRepository>,
    mailer: RecordingEmailQueue,
}

impl TestApp {
    fn new() -> Self {
        let mailer = RecordingEmailQueue::new();
        let hasher = Argon2PasswordHasher::new(Argon2Hasher::with_cost(1024, 1, 1).unwrap());
        let state = AuthAppState::new(
            MemoryAuthRepository::new(),
            AuthConfig::development(),
            Arc::new(hasher),
            Arc::new(mailer.clone()),
        );
        Self { state, mailer }
    }

    fn router(&self) -> Router {
        auth_router(self.state.clone())
    }

    async fn send(&self, req: Request<Body>) -> Response {
        self.router().oneshot(req).await.unwrap()
    }

    async fn post(&self, path: &str, body: Value) -> Response {
        self.send(json_request("POST", path, body)).await
    }

    async fn sign_up(&self) -> Response {
        self.post(
            "/sign-up",
            json!({
                "first_name": "Grace",
                "last_name": "Hopper",
                "email": EMAIL,
                "password": PASSWORD,
                "confirm_password": PASSWORD,
            }),
        )
        .await
    }

    async fn sign_in(&self) -> Response {
        self.post("/sign-in", json!({ "email": EMAIL, "password": PASSWORD }))
            .await
    }

    /// Sign up, verify, sign in; returns the sign-in body.
    async fn signed_in(&self) -> Value {
        assert_eq!(self.sign_up().await.status(), StatusCode::CREATED);
        let code = self.mailer.last_token().unwrap();
        let verified = self.post("/verify-email", json!({ "code": code })).await;
        assert_eq!(verified.status(), StatusCode::OK);

        let res = self.sign_in().await;
        assert_eq!(res.status(), StatusCode::OK);
        body_json(res).await
    }
}

fn json_request(method: &str, path: &str, body: Value) -> Request<Body> {
    Request::builder()
        .method(method)
        .uri(path)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

fn bearer(method: &str, path: &str, token: &str) -> Request<Body> {
    Request::builder()
        .method(method)
        .uri(path)
        .header(header::AUTHORIZATION, format!("Bearer {token}"))
        .body(Body::empty())
        .unwrap()
}

async fn body_json(res: Response) -> Value {
    let bytes = to_bytes(res.into_body(), usize::MAX).await.unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

fn set_cookies(res: &Response) -> Vec<String> {
    res.headers()
        .get_all(header::SET_COOKIE)
        .iter()
        .map(|v| v.to_str().unwrap().to_string())
        .collect()
}

#[tokio::test]
async fn sign_in_before_verification_is_forbidden() {
    let app = TestApp::new();
    assert_eq!(app.sign_up().await.status(), StatusCode::CREATED);

    let res = app.sign_in().await;
    assert_eq!(res.status(), StatusCode::FORBIDDEN);
    let body = body_json(res).await;
    assert_eq!(body["code"], "AUTH_USER_NOT_VERIFIED");
    assert_eq!(body["status"], 403);

    // One mail from sign-up, one from the refused sign-in.
    assert_eq!(app.mailer.jobs().len(), 2);
}

#[tokio::test]
async fn verified_sign_in_sets_both_cookies() {
    let app = TestApp::new();
    assert_eq!(app.sign_up().await.status(), StatusCode::CREATED);
    let code = app.mailer.last_token().unwrap();
    assert_eq!(
        app.post("/verify-email", json!({ "code": code })).await.status(),
        StatusCode::OK
    );

    let res = app.sign_in().await;
    assert_eq!(res.status(), StatusCode::OK);

    let cookies = set_cookies(&res);
    assert_eq!(cookies.len(), 2);
    assert!(cookies[0].starts_with("access_token="));
    assert!(cookies[0].contains("; Path=/;"));
    assert!(cookies[1].starts_with("refresh_token="));
    assert!(cookies[1].contains("; Path=/api/v1/auth/refresh"));
    assert!(cookies.iter().all(|c| c.contains("HttpOnly")));

    let body = body_json(res).await;
    assert!(body["access_token"].is_string());
    assert!(body["access_token_expires_at"].is_string());
    assert!(body["refresh_token"].is_string());
    assert!(body["refresh_token_expires_at"].is_string());
}

#[tokio::test]
async fn immediate_refreshes_reissue_access_only() {
    let app = TestApp::new();
    let body = app.signed_in().await;
    let refresh_token = body["refresh_token"].as_str().unwrap().to_string();

    for _ in 0..2 {
        let res = app
            .post("/refresh", json!({ "refresh_token": refresh_token }))
            .await;
        assert_eq!(res.status(), StatusCode::OK);

        let cookies = set_cookies(&res);
        assert_eq!(cookies.len(), 1);
        assert!(cookies[0].starts_with("access_token="));

        let body = body_json(res).await;
        assert!(body["access_token"].is_string());
        assert!(body.get("refresh_token").is_none());
    }
}

#[tokio::test]
async fn refresh_reads_cookie_when_body_is_empty() {
    let app = TestApp::new();
    let body = app.signed_in().await;
    let refresh_token = body["refresh_token"].as_str().unwrap();

    let req = Request::builder()
        .method("POST")
        .uri("/refresh")
        .header(header::COOKIE, format!("refresh_token={refresh_token}"))
        .body(Body::empty())
        .unwrap();
    assert_eq!(app.send(req).await.status(), StatusCode::OK);

    let missing = Request::builder()
        .method("POST")
        .uri("/refresh")
        .body(Body::empty())
        .unwrap();
    let res = app.send(missing).await;
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    assert_eq!(body_json(res).await["detail"], "missing refresh token");
}

#[tokio::test]
async fn forget_password_does_not_reveal_accounts() {
    let app = TestApp::new();
    app.signed_in().await;
    let mails_before = app.mailer.jobs().len();

    let unknown = app
        .post("/password/forget", json!({ "email": "nobody@example.com" }))
        .await;
    assert_eq!(unknown.status(), StatusCode::OK);
    let unknown = body_json(unknown).await;
    assert_eq!(app.mailer.jobs().len(), mails_before);

    let known = app.post("/password/forget", json!({ "email": EMAIL })).await;
    assert_eq!(known.status(), StatusCode::OK);
    assert_eq!(body_json(known).await, unknown);
    assert_eq!(app.mailer.jobs().len(), mails_before + 1);
}

#[tokio::test]
async fn password_reset_over_http() {
    let app = TestApp::new();
    app.signed_in().await;
    app.post("/password/forget", json!({ "email": EMAIL })).await;
    let code = app.mailer.last_token().unwrap();

    let res = app
        .post("/password/verify-email", json!({ "token": code }))
        .await;
    assert_eq!(res.status(), StatusCode::OK);
    let grant = body_json(res).await;
    let reset_token = grant["reset_token"].as_str().unwrap().to_string();
    assert!(grant["reset_token_expires_at"].is_string());

    let reused = app
        .post(
            "/password/reset",
            json!({ "token": reset_token, "password": PASSWORD }),
        )
        .await;
    assert_eq!(reused.status(), StatusCode::FORBIDDEN);
    assert_eq!(body_json(reused).await["code"], "AUTH_PASSWORD_REUSED");

    let res = app
        .post(
            "/password/reset",
            json!({ "token": reset_token, "password": "a-fresh-password" }),
        )
        .await;
    assert_eq!(res.status(), StatusCode::OK);
    assert_eq!(
        body_json(res).await["message"],
        "password resetted successfully"
    );

    let old = app.sign_in().await;
    assert_eq!(old.status(), StatusCode::NOT_FOUND);
    assert_eq!(body_json(old).await["code"], "AUTH_USER_NOT_FOUND");
}

#[tokio::test]
async fn logout_clears_cookies_and_kills_session() {
    let app = TestApp::new();
    let body = app.signed_in().await;
    let access = body["access_token"].as_str().unwrap();

    let res = app.send(bearer("DELETE", "/logout", access)).await;
    assert_eq!(res.status(), StatusCode::OK);
    let cookies = set_cookies(&res);
    assert_eq!(cookies.len(), 2);
    assert!(cookies.iter().all(|c| c.contains("Max-Age=0")));

    let again = app.send(bearer("DELETE", "/logout", access)).await;
    assert_eq!(again.status(), StatusCode::UNAUTHORIZED);
    assert_eq!(body_json(again).await["detail"], "unauthorized");
}

#[tokio::test]
async fn credential_transport_rules() {
    let app = TestApp::new();
    let body = app.signed_in().await;
    let access = body["access_token"].as_str().unwrap();

    let missing = Request::builder()
        .uri("/sessions")
        .body(Body::empty())
        .unwrap();
    let res = app.send(missing).await;
    assert_eq!(res.status(), StatusCode::UNAUTHORIZED);
    assert_eq!(body_json(res).await["detail"], "missing authentication token");

    let wrong_scheme = Request::builder()
        .uri("/sessions")
        .header(header::AUTHORIZATION, format!("Token {access}"))
        .body(Body::empty())
        .unwrap();
    let res = app.send(wrong_scheme).await;
    assert_eq!(res.status(), StatusCode::UNAUTHORIZED);
    assert_eq!(
        body_json(res).await["detail"],
        "invalid authentication type, use a Bearer token"
    );

    let forged = app.send(bearer("GET", "/sessions", "not.a.jwt")).await;
    assert_eq!(forged.status(), StatusCode::UNAUTHORIZED);

    // A valid cookie wins over a bad header.
    let cookie = Request::builder()
        .uri("/sessions")
        .header(header::COOKIE, format!("access_token={access}"))
        .header(header::AUTHORIZATION, "Bearer garbage")
        .body(Body::empty())
        .unwrap();
    assert_eq!(app.send(cookie).await.status(), StatusCode::OK);
}

#[tokio::test]
async fn sessions_list_and_revoke() {
    let app = TestApp::new();
    let first = app.signed_in().await;
    let second = body_json(app.sign_in().await).await;
    let access = second["access_token"].as_str().unwrap();

    let res = app.send(bearer("GET", "/sessions", access)).await;
    assert_eq!(res.status(), StatusCode::OK);
    let listed = body_json(res).await;
    let sessions = listed["sessions"].as_array().unwrap();
    assert_eq!(sessions.len(), 2);

    let other = sessions
        .iter()
        .find(|s| s["is_current"] == false)
        .unwrap()["id"]
        .as_str()
        .unwrap()
        .to_string();

    let path = format!("/sessions/{other}");
    assert_eq!(
        app.send(bearer("DELETE", &path, access)).await.status(),
        StatusCode::OK
    );
    assert_eq!(
        app.send(bearer("DELETE", &path, access)).await.status(),
        StatusCode::NOT_FOUND
    );

    let bad_id = app.send(bearer("DELETE", "/sessions/not-a-uuid", access)).await;
    assert_eq!(bad_id.status(), StatusCode::BAD_REQUEST);
    let problem = body_json(bad_id).await;
    assert_eq!(problem["code"], "VALIDATION_ERROR");
    assert!(problem["errors"]["path"][0].is_string());

    // The revoked session's own access token is dead now.
    let old_access = first["access_token"].as_str().unwrap();
    assert_eq!(
        app.send(bearer("GET", "/sessions", old_access)).await.status(),
        StatusCode::UNAUTHORIZED
    );
}

#[tokio::test]
async fn validation_errors_are_keyed_by_field() {
    let app = TestApp::new();
    let res = app
        .post(
            "/sign-up",
            json!({
                "first_name": "Grace",
                "last_name": "Hopper",
                "email": "not-an-email",
                "password": PASSWORD,
                "confirm_password": "something else",
            }),
        )
        .await;

    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    let body = body_json(res).await;
    assert_eq!(body["code"], "VALIDATION_ERROR");
    assert_eq!(body["errors"]["email"][0], "invalid email");
    assert_eq!(body["errors"]["confirm_password"][0], "password not a match");

    let malformed = app
        .send(
            Request::builder()
                .method("POST")
                .uri("/sign-in")
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from("{"))
                .unwrap(),
        )
        .await;
    assert_eq!(malformed.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn duplicate_sign_up_conflicts() {
    let app = TestApp::new();
    assert_eq!(app.sign_up().await.status(), StatusCode::CREATED);

    let res = app.sign_up().await;
    assert_eq!(res.status(), StatusCode::CONFLICT);
    assert_eq!(body_json(res).await["code"], "AUTH_EMAIL_ALREADY_EXISTS");
}

#[tokio::test]
async fn unverified_accounts_pass_the_lenient_guard() {
    let app = TestApp::new();
    let body = app.signed_in().await;
    let access = body["access_token"].as_str().unwrap();

    let mut user = app
        .state
        .repo
        .find_by_email(&Email::new(EMAIL).unwrap())
        .await
        .unwrap()
        .unwrap();
    user.email_verified_at = None;
    app.state.repo.update(&user).await.unwrap();

    let lenient: Router = Router::new()
        .route(
            "/me",
            get(|CurrentIdentity(identity): CurrentIdentity| async move {
                identity.user.email
            }),
        )
        .route_layer(axum::middleware::from_fn_with_state(
            app.state.clone(),
            require_auth_allow_unverified::<MemoryAuthRepository>,
        ))
        .with_state(app.state.clone());

    let res = lenient.oneshot(bearer("GET", "/me", access)).await.unwrap();
    assert_eq!(res.status(), StatusCode::OK);

    let strict = app.send(bearer("GET", "/sessions", access)).await;
    assert_eq!(strict.status(), StatusCode::FORBIDDEN);
    assert_eq!(body_json(strict).await["code"], "AUTH_USER_NOT_VERIFIED");
}
