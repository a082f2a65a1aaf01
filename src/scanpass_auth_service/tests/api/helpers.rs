use std::sync::Arc;

use chrono::Duration;
use scanpass_adapters::{
    Argon2PasswordHasher, BearerTokenValidator, DashMapQrSessionStore, HashMapUserStore,
    JwtConfig, JwtTokenCodec, ManualClock, PngQrCodeRenderer, config::test,
};
use scanpass_application::{LoginOrchestrator, QrLoginConfig};
use scanpass_auth_service::AuthService;
use scanpass_axum::AppState;
use scanpass_core::{Email, NewUser, Password, PasswordHasher, Role, UserId, UserStore};
use secrecy::Secret;
use serde_json::{Value, json};

pub const EMAIL: &str = "phone.owner@example.com";
pub const PASSWORD: &str = "open sesame";

pub struct TestApp {
    pub address: String,
    pub http_client: reqwest::Client,
    pub clock: ManualClock,
    pub users: HashMapUserStore,
    pub sessions: DashMapQrSessionStore,
    pub orchestrator: LoginOrchestrator<HashMapUserStore, DashMapQrSessionStore>,
    pub user_id: UserId,
}

impl TestApp {
    pub async fn new() -> Self {
        let users = HashMapUserStore::new();
        let sessions = DashMapQrSessionStore::new();
        let clock = ManualClock::default();
        let hasher = Arc::new(Argon2PasswordHasher::new().unwrap());
        let codec = Arc::new(JwtTokenCodec::new(&JwtConfig {
            secret: Secret::new("api-test-secret".to_owned()),
            time_to_live: Duration::hours(24),
        }));

        let password_hash = hasher
            .hash_password(Password::try_from(Secret::new(PASSWORD.to_owned())).unwrap())
            .await
            .unwrap();
        let user_id = users
            .add_user(NewUser {
                username: "phone-owner".to_owned(),
                email: Email::try_from(Secret::new(EMAIL.to_owned())).unwrap(),
                password_hash,
                first_name: "Phone".to_owned(),
                last_name: "Owner".to_owned(),
                role: Role::User,
                is_active: true,
            })
            .await
            .unwrap()
            .id();

        let orchestrator = LoginOrchestrator::new(
            users.clone(),
            sessions.clone(),
            hasher,
            codec.clone(),
            Arc::new(PngQrCodeRenderer::default()),
            Arc::new(clock.clone()),
            QrLoginConfig::default(),
        );
        let state = AppState::new(orchestrator.clone(), BearerTokenValidator::new(codec));

        let listener = tokio::net::TcpListener::bind(test::APP_ADDRESS)
            .await
            .expect("Failed to bind address");
        let address = format!("http://{}", listener.local_addr().unwrap());

        tokio::spawn(AuthService::new(state).run_standalone(listener, None));

        Self {
            address,
            http_client: reqwest::Client::new(),
            clock,
            users,
            sessions,
            orchestrator,
            user_id,
        }
    }

    pub async fn post_login(&self, body: &Value) -> reqwest::Response {
        self.http_client
            .post(format!("{}/login", &self.address))
            .json(body)
            .send()
            .await
            .expect("Failed to execute request")
    }

    /// Password login for the test user, returning the app token.
    pub async fn app_token(&self) -> String {
        let response = self
            .post_login(&json!({ "email": EMAIL, "password": PASSWORD }))
            .await;
        assert_eq!(response.status().as_u16(), 200);
        let body: Value = response.json().await.unwrap();
        body["token"].as_str().unwrap().to_owned()
    }

    pub async fn post_refresh(&self, token: Option<&str>) -> reqwest::Response {
        let mut request = self.http_client.post(format!("{}/refresh", &self.address));
        if let Some(token) = token {
            request = request.bearer_auth(token);
        }
        request.send().await.expect("Failed to execute request")
    }

    pub async fn post_change_password(&self, token: &str, body: &Value) -> reqwest::Response {
        self.http_client
            .post(format!("{}/change-password", &self.address))
            .bearer_auth(token)
            .json(body)
            .send()
            .await
            .expect("Failed to execute request")
    }

    pub async fn post_logout(&self, token: &str) -> reqwest::Response {
        self.http_client
            .post(format!("{}/logout", &self.address))
            .bearer_auth(token)
            .send()
            .await
            .expect("Failed to execute request")
    }

    pub async fn generate_qr(&self) -> Value {
        let response = self
            .http_client
            .post(format!("{}/qr/generate", &self.address))
            .json(&json!({ "deviceInfo": "Chrome on macOS" }))
            .send()
            .await
            .expect("Failed to execute request");
        assert_eq!(response.status().as_u16(), 200);
        response.json().await.unwrap()
    }

    /// `action` is one of `scan`, `confirm` or `reject`.
    pub async fn post_qr_decision(
        &self,
        action: &str,
        session_id: &str,
        app_token: &str,
    ) -> reqwest::Response {
        self.http_client
            .post(format!("{}/qr/{action}", &self.address))
            .json(&json!({ "sessionId": session_id, "appToken": app_token }))
            .send()
            .await
            .expect("Failed to execute request")
    }

    pub async fn get_qr_status(&self, session_id: &str) -> reqwest::Response {
        self.http_client
            .get(format!("{}/qr/status", &self.address))
            .query(&[("session_id", session_id)])
            .send()
            .await
            .expect("Failed to execute request")
    }

    pub async fn deactivate_user(&self) {
        self.users.set_active(self.user_id, false).await.unwrap();
    }
}
