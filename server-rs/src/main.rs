use axum::{
    http::HeaderValue,
    middleware as axum_mw,
    routing::{delete, get, post, put},
    Router,
};
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tower_http::compression::CompressionLayer;
use tower_http::cors::{Any, CorsLayer};
use tower_http::timeout::TimeoutLayer;
use tower_http::trace::TraceLayer;

mod config;
mod db;
mod error;
mod middleware;
mod models;
mod routes;
mod services;
mod store;

use config::Config;
use middleware::rate_limit::RateLimiter;
use store::{PgStore, Store};

#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn Store>,
    pub config: Arc<Config>,
    pub rate_limiter: RateLimiter,
    pub auth_rate_limiter: RateLimiter,
}

impl AppState {
    pub fn new(store: Arc<dyn Store>, config: Config) -> Self {
        let rate_limiter =
            RateLimiter::new(config.rate_limit.max_requests, config.rate_limit.window_secs);
        let auth_rate_limiter =
            RateLimiter::new(config.rate_limit.auth_max, config.rate_limit.window_secs);
        Self {
            store,
            config: Arc::new(config),
            rate_limiter,
            auth_rate_limiter,
        }
    }
}

fn cors_layer(config: &Config) -> CorsLayer {
    let cors = CorsLayer::new().allow_methods(Any).allow_headers(Any);
    if config.cors_origins.is_empty() || config.cors_origins.iter().any(|o| o == "*") {
        return cors.allow_origin(Any);
    }
    let origins: Vec<HeaderValue> = config
        .cors_origins
        .iter()
        .filter_map(|o| o.parse().ok())
        .collect();
    cors.allow_origin(origins)
}

fn build_router(state: AppState) -> Router {
    let authenticated = || axum_mw::from_fn_with_state(state.clone(), middleware::auth::authenticate);
    let admin_only = || axum_mw::from_fn_with_state(state.clone(), middleware::admin::require_admin);

    // --- Auth routes ---
    let auth_routes = Router::new()
        .route("/signup", post(routes::auth::sign_up))
        .route("/signin", post(routes::auth::sign_in))
        .route("/refresh", post(routes::auth::refresh))
        .route("/reset-password", post(routes::auth::reset_password))
        .layer(axum_mw::from_fn_with_state(
            state.clone(),
            middleware::rate_limit::auth_rate_limit,
        ))
        .merge(
            Router::new()
                .route("/change-password", put(routes::auth::change_password))
                .layer(authenticated()),
        );

    let user_routes = Router::new()
        .route("/me", get(routes::users::me))
        .route("/:id", get(routes::users::get_user))
        .route("/:id/profile", put(routes::users::update_profile))
        .layer(authenticated())
        .route("/check-email", get(routes::users::check_email));

    let team_routes = Router::new()
        .route(
            "/",
            post(routes::teams::create_team).get(routes::teams::list_teams),
        )
        .route("/mine", get(routes::teams::my_teams))
        .route("/player/:id", get(routes::teams::player_teams))
        .route("/:id", get(routes::teams::get_team))
        .route("/:id/join", post(routes::teams::join_team))
        .route("/:id/leave", delete(routes::teams::leave_team))
        .layer(authenticated());

    let team_player_routes = Router::new()
        .route(
            "/team/:team/player/:player/activate",
            put(routes::team_players::activate),
        )
        .route(
            "/team/:team/player/:player/deactivate",
            put(routes::team_players::deactivate),
        )
        .route(
            "/team/:team/player/:player/status",
            get(routes::team_players::status),
        )
        .route(
            "/team/:team/player/:player/is-admin",
            get(routes::team_players::is_admin),
        )
        .route("/player/:player/teams", get(routes::team_players::player_teams))
        .route("/team/:team/players", get(routes::team_players::team_players))
        .layer(authenticated());

    // --- Fields ---
    let admin_field_routes = Router::new()
        .route("/all", get(routes::fields::admin_list))
        .route("/", post(routes::fields::create_field))
        .route(
            "/:id",
            put(routes::fields::update_field).delete(routes::fields::delete_field),
        )
        .route("/:id/status", put(routes::fields::set_status))
        .route("/:id/book", post(routes::fields::book))
        .layer(admin_only())
        .layer(authenticated());

    let field_routes = Router::new()
        .route("/", get(routes::fields::browse))
        .route("/:id", get(routes::fields::get_field))
        .route("/:id/details", get(routes::fields::download_details))
        .route("/:id/slots", get(routes::fields::list_slots))
        .route("/:id/availability", get(routes::fields::availability))
        .nest("/admin", admin_field_routes);

    let field_slot_routes = Router::new()
        .route("/", post(routes::field_slots::create_slot))
        .route(
            "/:id",
            put(routes::field_slots::update_slot).delete(routes::field_slots::delete_slot),
        )
        .layer(admin_only())
        .layer(authenticated());

    // --- Bookings ---
    let admin_booking_routes = Router::new()
        .route("/history", get(routes::bookings::history))
        .route("/pending", get(routes::bookings::pending))
        .route("/:id/status", put(routes::bookings::update_status))
        .layer(admin_only());

    let booking_routes = Router::new()
        .route("/", post(routes::bookings::request_booking))
        .route("/:id/status", get(routes::bookings::status_timeline))
        .route("/team/:id", get(routes::bookings::team_history))
        .route("/:id/review", post(routes::bookings::review))
        .nest("/admin", admin_booking_routes)
        .layer(authenticated());

    // --- Reviews ---
    let review_routes = Router::new()
        .route("/visible", get(routes::reviews::visible))
        .route("/visible/by-rating", get(routes::reviews::visible_by_rating))
        .route("/average-rating", get(routes::reviews::average_rating))
        .route("/count", get(routes::reviews::count))
        .route("/breakdown", get(routes::reviews::breakdown))
        .route("/recent", get(routes::reviews::recent))
        .route("/customers/:id/visible", get(routes::reviews::customer_reviews))
        .route(
            "/customers/:id/average-rating",
            get(routes::reviews::customer_average_rating),
        )
        .route("/:id", get(routes::reviews::get_review));

    let admin_review_routes = Router::new()
        .route("/all", get(routes::admin_reviews::all))
        .route("/visible", get(routes::admin_reviews::visible))
        .route("/hidden", get(routes::admin_reviews::hidden))
        .route("/search", get(routes::admin_reviews::search))
        .route("/low-ratings", get(routes::admin_reviews::low_ratings))
        .route("/customer/:id", get(routes::admin_reviews::by_customer))
        .route("/statistics", get(routes::admin_reviews::statistics))
        .route("/admins", get(routes::admin_reviews::admins))
        .route("/bulk/hide", put(routes::admin_reviews::bulk_hide))
        .route("/bulk/unhide", put(routes::admin_reviews::bulk_unhide))
        .route("/bulk", delete(routes::admin_reviews::bulk_delete))
        .route(
            "/:id",
            get(routes::admin_reviews::get_review).delete(routes::admin_reviews::delete),
        )
        .route("/:id/hide", put(routes::admin_reviews::hide))
        .route("/:id/unhide", put(routes::admin_reviews::unhide))
        .layer(admin_only())
        .layer(authenticated());

    // --- Enquiries ---
    let admin_enquiry_routes = Router::new()
        .route("/visible", get(routes::enquiries::visible))
        .route("/all", get(routes::enquiries::all))
        .route("/status/:status", get(routes::enquiries::by_status))
        .route("/:id/visibility", put(routes::enquiries::set_visibility))
        .route("/:id/status", put(routes::enquiries::set_status))
        .route("/:id/response", put(routes::enquiries::respond))
        .layer(admin_only());

    let enquiry_routes = Router::new()
        .route("/", post(routes::enquiries::submit))
        .route("/mine", get(routes::enquiries::mine))
        .route("/customer/:id", get(routes::enquiries::by_customer))
        .nest("/admin", admin_enquiry_routes)
        .layer(authenticated());

    // --- Settings ---
    let admin_settings_routes = Router::new()
        .route("/", put(routes::settings::update))
        .route("/preview", post(routes::settings::preview))
        .route("/logo", post(routes::settings::update_logo))
        .layer(admin_only())
        .layer(authenticated());

    let settings_routes = Router::new()
        .route("/", get(routes::settings::current))
        .route("/basic", get(routes::settings::basic))
        .route("/about", get(routes::settings::about))
        .route("/terms", get(routes::settings::terms))
        .route("/contact", get(routes::settings::contact))
        .merge(admin_settings_routes);

    // --- Compose full API ---
    let api = Router::new()
        .nest("/auth", auth_routes)
        .nest("/users", user_routes)
        .nest("/teams", team_routes)
        .nest("/team-players", team_player_routes)
        .nest("/fields", field_routes)
        .nest("/field-slots", field_slot_routes)
        .nest("/bookings", booking_routes)
        .nest("/reviews", review_routes)
        .nest("/admin/reviews", admin_review_routes)
        .nest("/enquiries", enquiry_routes)
        .nest("/settings", settings_routes);

    let timeout = Duration::from_secs(state.config.request_timeout_secs);
    let cors = cors_layer(&state.config);

    Router::new()
        .nest("/api", api)
        .route("/health", get(routes::health::health))
        // Global middleware
        .layer(axum_mw::from_fn_with_state(
            state.clone(),
            middleware::rate_limit::rate_limit,
        ))
        .layer(TimeoutLayer::new(timeout))
        .layer(CompressionLayer::new())
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("failed to listen for shutdown signal: {e}");
    }
    tracing::info!("shutdown signal received");
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let _ = dotenvy::dotenv();
    let config = Config::from_env();

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .json()
        .init();

    if let Err(e) = config.validate() {
        tracing::error!(error = %e, "refusing to start");
        return Err(e.into());
    }

    let pg = PgStore::connect(&config).await?;
    pg.migrate().await?;

    let addr = SocketAddr::from(([0, 0, 0, 0], config.port));
    let production = config.is_production();
    let state = AppState::new(Arc::new(pg.clone()), config);
    let router = build_router(state);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    tracing::info!(%addr, production, "Fields booking API listening");

    axum::serve(
        listener,
        router.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .with_graceful_shutdown(shutdown_signal())
    .await?;

    pg.close().await;
    tracing::info!("Fields booking API stopped");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::{to_bytes, Body};
    use axum::http::{header, Request, StatusCode};
    use serde_json::{json, Value};
    use tower::ServiceExt;

    use crate::middleware::auth::generate_tokens;
    use crate::models::{NewUser, Role};
    use crate::store::MemoryStore;

    struct Harness {
        router: Router,
        store: Arc<MemoryStore>,
        config: Config,
    }

    impl Harness {
        fn new() -> Self {
            let store = Arc::new(MemoryStore::new());
            let config = Config::for_tests();
            let state = AppState::new(store.clone(), config.clone());
            Self {
                router: build_router(state),
                store,
                config,
            }
        }

        async fn token_for(&self, email: &str, role: Role) -> (i32, String) {
            let user = self
                .store
                .create_user(NewUser {
                    name: "Seeded".into(),
                    email: email.into(),
                    phone: "01012345678".into(),
                    password_hash: bcrypt::hash("secret1", 4).unwrap(),
                    role,
                })
                .await
                .unwrap();
            let (access, _) = generate_tokens(user.id, role, &self.config.jwt).unwrap();
            (user.id, access)
        }

        async fn send(
            &self,
            method: &str,
            uri: &str,
            token: Option<&str>,
            body: Option<Value>,
        ) -> (StatusCode, Vec<u8>, Option<String>) {
            let mut req = Request::builder().method(method).uri(uri);
            if let Some(t) = token {
                req = req.header(header::AUTHORIZATION, format!("Bearer {t}"));
            }
            let req = match body {
                Some(b) => req
                    .header(header::CONTENT_TYPE, "application/json")
                    .body(Body::from(b.to_string()))
                    .unwrap(),
                None => req.body(Body::empty()).unwrap(),
            };
            let resp = self.router.clone().oneshot(req).await.unwrap();
            let status = resp.status();
            let content_type = resp
                .headers()
                .get(header::CONTENT_TYPE)
                .and_then(|v| v.to_str().ok())
                .map(String::from);
            let bytes = to_bytes(resp.into_body(), usize::MAX).await.unwrap();
            (status, bytes.to_vec(), content_type)
        }

        async fn json(
            &self,
            method: &str,
            uri: &str,
            token: Option<&str>,
            body: Option<Value>,
        ) -> (StatusCode, Value) {
            let (status, bytes, _) = self.send(method, uri, token, body).await;
            let value = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
            (status, value)
        }
    }

    #[tokio::test]
    async fn health_reports_store() {
        let h = Harness::new();
        let (status, body) = h.json("GET", "/health", None, None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["store"], true);
    }

    #[tokio::test]
    async fn protected_routes_need_a_token() {
        let h = Harness::new();
        let (status, body) = h.json("GET", "/api/teams", None, None).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_eq!(body["error"], "No token provided");

        let (status, _) = h.json("GET", "/api/teams", Some("garbage"), None).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn admin_routes_reject_players() {
        let h = Harness::new();
        let (_, token) = h.token_for("p@example.com", Role::Player).await;
        let (status, _) = h.json("GET", "/api/fields/admin/all", Some(&token), None).await;
        assert_eq!(status, StatusCode::FORBIDDEN);
        let (status, _) = h.json("GET", "/api/admin/reviews/all", Some(&token), None).await;
        assert_eq!(status, StatusCode::FORBIDDEN);
    }

    #[tokio::test]
    async fn admin_books_a_field_and_overlaps_conflict() {
        let h = Harness::new();
        let (_, admin) = h.token_for("admin@example.com", Role::Admin).await;

        let (status, field) = h
            .json(
                "POST",
                "/api/fields/admin",
                Some(&admin),
                Some(json!({
                    "name": "Pitch A",
                    "playersCapacity": 10,
                    "locationAddress": "Maadi, Cairo"
                })),
            )
            .await;
        assert_eq!(status, StatusCode::CREATED);
        let field_id = field["id"].as_i64().unwrap();

        let booking = |from: &str, to: &str| {
            json!({
                "weekDayId": 6,
                "from": from,
                "to": to,
                "price": 100.0,
                "date": "2024-06-01"
            })
        };
        let uri = format!("/api/fields/admin/{field_id}/book");

        let (status, body) = h.json("POST", &uri, Some(&admin), Some(booking("09:00", "10:00"))).await;
        assert_eq!(status, StatusCode::CREATED);
        assert!(body["message"].as_str().unwrap().contains("Field booked successfully"));
        assert_eq!(body["booking"]["from"], "09:00");

        let (status, body) = h.json("POST", &uri, Some(&admin), Some(booking("09:30", "10:30"))).await;
        assert_eq!(status, StatusCode::CONFLICT);
        assert_eq!(body["error"], "Field is already booked during this time.");

        let (status, body) = h
            .json(
                "GET",
                &format!("/api/fields/{field_id}/availability?date=2024-06-01&from=10:00&to=11:00"),
                None,
                None,
            )
            .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["available"], true);
    }

    #[tokio::test]
    async fn signup_signin_and_me() {
        let h = Harness::new();
        let (status, session) = h
            .json(
                "POST",
                "/api/auth/signup",
                None,
                Some(json!({
                    "name": "Omar",
                    "email": "omar@example.com",
                    "phone": "01098765432",
                    "password": "secret1"
                })),
            )
            .await;
        assert_eq!(status, StatusCode::CREATED);
        assert!(session["user"].get("passwordHash").is_none());

        let (status, session) = h
            .json(
                "POST",
                "/api/auth/signin",
                None,
                Some(json!({ "email": "omar@example.com", "password": "secret1" })),
            )
            .await;
        assert_eq!(status, StatusCode::OK);
        let token = session["token"].as_str().unwrap().to_string();

        let (status, me) = h.json("GET", "/api/users/me", Some(&token), None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(me["email"], "omar@example.com");

        let (status, body) = h
            .json("GET", "/api/users/check-email?email=omar@example.com", None, None)
            .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["exists"], true);
    }

    #[tokio::test]
    async fn field_details_download_as_text() {
        let h = Harness::new();
        let (_, admin) = h.token_for("admin@example.com", Role::Admin).await;
        let (_, field) = h
            .json(
                "POST",
                "/api/fields/admin",
                Some(&admin),
                Some(json!({
                    "name": "Pitch B",
                    "playersCapacity": 12,
                    "locationAddress": "Zamalek"
                })),
            )
            .await;
        let id = field["id"].as_i64().unwrap();

        let (status, bytes, content_type) = h
            .send("GET", &format!("/api/fields/{id}/details"), None, None)
            .await;
        assert_eq!(status, StatusCode::OK);
        assert!(content_type.unwrap().starts_with("text/plain"));
        let text = String::from_utf8(bytes).unwrap();
        assert!(text.contains("Field Name: Pitch B"));
    }

    #[tokio::test]
    async fn settings_are_public_and_admin_editable() {
        let h = Harness::new();
        let (_, admin) = h.token_for("admin@example.com", Role::Admin).await;

        let (status, body) = h
            .json("PUT", "/api/settings", Some(&admin), Some(json!({ "name": "Goal Arena" })))
            .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["name"], "Goal Arena");

        let (status, body) = h.json("GET", "/api/settings/basic", None, None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["name"], "Goal Arena");
    }
}
