pub mod bookings;
pub mod envelope;
pub mod extract;
pub mod health;
pub mod listings;
pub mod reviews;

use std::sync::Arc;
use std::time::Duration;

use axum::extract::FromRef;
use axum::http::header::CONTENT_TYPE;
use axum::http::{Method, StatusCode};
use axum::response::IntoResponse;
use axum::routing::get;
use axum::{Json, Router};
use tokio::net::TcpListener;
use tokio::signal::ctrl_c;
use tower_http::cors::{Any, CorsLayer};
use tracing::{error, info};

use crate::config::types::ServerConfig;
use crate::controllers::{BookingController, ListingController, ReviewController};
use crate::domain::listing::{Experience, Food, Lodging};
use crate::error::Result;
use crate::ports::store::TableStore;
use envelope::ApiResponse;

/// Everything a handler can reach. Cheap to clone.
#[derive(Clone)]
pub struct AppState {
    pub lodgings: ListingController<Lodging>,
    pub foods: ListingController<Food>,
    pub experiences: ListingController<Experience>,
    pub bookings: Arc<BookingController>,
    pub reviews: Arc<ReviewController>,
    pub environment: Arc<str>,
}

impl AppState {
    pub fn new(store: Arc<dyn TableStore>, environment: &str) -> Self {
        Self {
            lodgings: ListingController::new(Arc::clone(&store)),
            foods: ListingController::new(Arc::clone(&store)),
            experiences: ListingController::new(Arc::clone(&store)),
            bookings: Arc::new(BookingController::new(Arc::clone(&store))),
            reviews: Arc::new(ReviewController::new(store)),
            environment: Arc::from(environment),
        }
    }
}

impl FromRef<AppState> for ListingController<Lodging> {
    fn from_ref(state: &AppState) -> Self {
        state.lodgings.clone()
    }
}

impl FromRef<AppState> for ListingController<Food> {
    fn from_ref(state: &AppState) -> Self {
        state.foods.clone()
    }
}

impl FromRef<AppState> for ListingController<Experience> {
    fn from_ref(state: &AppState) -> Self {
        state.experiences.clone()
    }
}

fn listing_routes<L>() -> Router<AppState>
where
    L: crate::repository::ListingRecord,
    ListingController<L>: FromRef<AppState>,
{
    Router::new()
        .route(
            "/",
            get(listings::list::<L>)
                .post(listings::create::<L>)
                .put(listings::update_by_query::<L>)
                .delete(listings::delete_by_query::<L>),
        )
        .route(
            "/{id}",
            get(listings::get_one::<L>)
                .put(listings::update_by_path::<L>)
                .delete(listings::delete_by_path::<L>),
        )
}

pub fn router(state: AppState, cors_max_age: Duration) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::PATCH,
            Method::DELETE,
            Method::OPTIONS,
        ])
        .allow_headers([CONTENT_TYPE])
        .max_age(cors_max_age);

    let api = Router::new()
        .route("/health", get(health::health))
        .nest("/alojamientos", listing_routes::<Lodging>())
        .nest("/alimentos", listing_routes::<Food>())
        .nest("/experiencias", listing_routes::<Experience>())
        .route(
            "/reservas",
            get(bookings::list)
                .post(bookings::create)
                .patch(bookings::update_by_query)
                .delete(bookings::delete_by_query),
        )
        .route(
            "/reservas/{id}",
            get(bookings::get_one)
                .patch(bookings::update_by_path)
                .delete(bookings::delete_by_path),
        )
        .route(
            "/resenas",
            get(reviews::list)
                .post(reviews::create)
                .delete(reviews::delete_by_query),
        )
        .route(
            "/resenas/{id}",
            get(reviews::get_one).delete(reviews::delete_by_path),
        );

    Router::new()
        .nest("/api", api)
        .fallback(not_found)
        .method_not_allowed_fallback(method_not_allowed)
        .layer(cors)
        .with_state(state)
}

async fn not_found() -> impl IntoResponse {
    (
        StatusCode::NOT_FOUND,
        Json(ApiResponse::failure("Ruta no encontrada")),
    )
}

async fn method_not_allowed() -> impl IntoResponse {
    (
        StatusCode::METHOD_NOT_ALLOWED,
        Json(ApiResponse::failure("Método no permitido")),
    )
}

/// Bind and serve until Ctrl+C or SIGTERM.
pub async fn serve(config: &ServerConfig, state: AppState) -> Result<()> {
    let app = router(state, Duration::from_secs(config.cors_max_age_secs));

    let address = format!("{}:{}", config.host, config.port);
    info!("Binding to {address}");
    let listener = TcpListener::bind(&address).await?;
    info!("Server running on {address}");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Server shut down");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = ctrl_c().await {
            error!("Failed to install Ctrl+C handler: {e}");
            std::future::pending::<()>().await;
        }
        info!("Received Ctrl+C, shutting down");
    };

    #[cfg(unix)]
    let terminate = async {
        use tokio::signal::unix::{SignalKind, signal};
        match signal(SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
                info!("Received terminate signal, shutting down");
            }
            Err(e) => {
                error!("Failed to install signal handler: {e}");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {},
        () = terminate => {},
    }
}
