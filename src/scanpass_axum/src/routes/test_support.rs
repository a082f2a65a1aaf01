use std::sync::Arc;

use axum::{
    Router,
    body::Body,
    http::{Request, StatusCode, header},
};
use chrono::Duration;
use http_body_util::BodyExt;
use scanpass_adapters::{
    Argon2PasswordHasher, BearerTokenValidator, DashMapQrSessionStore, HashMapUserStore,
    JwtConfig, JwtTokenCodec, ManualClock, PngQrCodeRenderer,
};
use scanpass_application::{LoginOrchestrator, QrLoginConfig};
use scanpass_core::{Email, NewUser, Password, PasswordHasher, Role, UserId, UserStore};
use secrecy::Secret;
use serde_json::Value;
use tower::ServiceExt;

use crate::{routes::router, state::AppState};

pub(crate) struct TestApp {
    pub router: Router,
    pub clock: ManualClock,
    users: HashMapUserStore,
    alice: UserId,
}

impl TestApp {
    pub const PASSWORD: &'static str = "correct horse";

    pub async fn new() -> Self {
        let users = HashMapUserStore::new();
        let sessions = DashMapQrSessionStore::new();
        let hasher = Arc::new(Argon2PasswordHasher::new().unwrap());
        let codec = Arc::new(JwtTokenCodec::new(&JwtConfig {
            secret: Secret::new("route-test-secret".to_owned()),
            time_to_live: Duration::hours(1),
        }));
        let clock = ManualClock::default();

        let password_hash = hasher
            .hash_password(Password::try_from(Secret::new(Self::PASSWORD.to_owned())).unwrap())
            .await
            .unwrap();
        let alice = users
            .add_user(NewUser {
                username: "alice".to_owned(),
                email: Email::try_from(Secret::new("alice@example.com".to_owned())).unwrap(),
                password_hash,
                first_name: "Alice".to_owned(),
                last_name: "Liddell".to_owned(),
                role: Role::User,
                is_active: true,
            })
            .await
            .unwrap()
            .id();

        let orchestrator = LoginOrchestrator::new(
            users.clone(),
            sessions,
            hasher,
            codec.clone(),
            Arc::new(PngQrCodeRenderer::default()),
            Arc::new(clock.clone()),
            QrLoginConfig::default(),
        );
        let state = AppState::new(orchestrator, BearerTokenValidator::new(codec));

        Self {
            router: router(state),
            clock,
            users,
            alice,
        }
    }

    pub fn alice_id(&self) -> UserId {
        self.alice
    }

    pub async fn deactivate_alice(&self) {
        self.users.set_active(self.alice, false).await.unwrap();
    }

    pub async fn login_alice(&self) -> String {
        let (status, body) = self
            .send(post_json(
                "/login",
                serde_json::json!({ "email": "alice@example.com", "password": Self::PASSWORD }),
            ))
            .await;
        assert_eq!(status, StatusCode::OK);
        body["token"].as_str().unwrap().to_owned()
    }

    /// Empty bodies come back as `Value::Null`.
    pub async fn send(&self, request: Request<Body>) -> (StatusCode, Value) {
        let response = self.router.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        let body = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap()
        };
        (status, body)
    }
}

pub(crate) fn post_json(uri: &str, body: Value) -> Request<Body> {
    Request::post(uri)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

pub(crate) fn post_empty(uri: &str, bearer: Option<&str>) -> Request<Body> {
    let request = Request::post(uri).body(Body::empty()).unwrap();
    match bearer {
        Some(token) => with_bearer(request, token),
        None => request,
    }
}

pub(crate) fn get(uri: &str) -> Request<Body> {
    Request::get(uri).body(Body::empty()).unwrap()
}

pub(crate) fn with_bearer(mut request: Request<Body>, token: &str) -> Request<Body> {
    request.headers_mut().insert(
        header::AUTHORIZATION,
        format!("Bearer {token}").parse().unwrap(),
    );
    request
}
