use axum::{
    Router,
    http::{HeaderValue, Method, header, request},
};
use scanpass_adapters::config::AllowedOrigins;
use scanpass_axum::{AppState, routes};
use scanpass_core::{QrSessionStore, UserStore};
use tokio::net::TcpListener;
use tower_http::{
    cors::{AllowOrigin, CorsLayer},
    trace::TraceLayer,
};

use crate::tracing::{make_span_with_request_id, on_request, on_response};

/// The login service: QR login, password login and the token routes.
pub struct AuthService {
    router: Router,
}

impl AuthService {
    /// Stores are `Clone` and share their backing state, so every route sees
    /// the same users and sessions.
    pub fn new<U, S>(state: AppState<U, S>) -> Self
    where
        U: UserStore + Clone + 'static,
        S: QrSessionStore + Clone + 'static,
    {
        Self {
            router: routes::router(state),
        }
    }

    fn with_trace_layer(mut self) -> Self {
        self.router = self.router.layer(
            TraceLayer::new_for_http()
                .make_span_with(make_span_with_request_id)
                .on_request(on_request)
                .on_response(on_response),
        );
        self
    }

    /// Convert the service into a router that can be nested into another
    /// application.
    ///
    /// When `allowed_origins` is given, cross-origin requests are only
    /// answered for those origins.
    pub fn as_nested_router(mut self, allowed_origins: Option<AllowedOrigins>) -> Router {
        if let Some(allowed_origins) = allowed_origins {
            let cors = CorsLayer::new()
                .allow_methods([Method::GET, Method::POST])
                .allow_headers([header::AUTHORIZATION, header::CONTENT_TYPE])
                .allow_credentials(true)
                .allow_origin(AllowOrigin::predicate(
                    move |origin: &HeaderValue, _request_parts: &request::Parts| {
                        allowed_origins.contains(origin)
                    },
                ));

            self.router = self.router.layer(cors);
        }
        self.with_trace_layer().router
    }

    /// Serve on `listener` until the process stops.
    pub async fn run_standalone(
        self,
        listener: TcpListener,
        allowed_origins: Option<AllowedOrigins>,
    ) -> Result<(), std::io::Error> {
        let router = self.as_nested_router(allowed_origins);

        tracing::info!("Auth service listening on {}", listener.local_addr()?);

        axum_server::Server::<std::net::SocketAddr>::from_listener(listener)
            .serve(router.into_make_service())
            .await
    }
}
