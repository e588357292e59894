//! services/api/src/bin/api.rs

use axum::{
    http::{
        header::{ACCEPT, CONTENT_TYPE},
        HeaderValue, Method,
    },
    routing::{get, post},
    Router,
};
use lifeguard_api::{
    adapters::{FileSurveyFlags, HttpBackendAdapter, OpenAiChatAdapter, SimulatedHealthAdapter},
    config::Config,
    error::ApiError,
    web::{
        health_signals_handler, historical_dashboard_handler, rest::ApiDoc, state::AppState,
        user_message_handler, ws_handler,
    },
};
use lifeguard_core::ports::{ChatService, HealthDataService, ReportService};
use std::sync::Arc;
use tower_http::cors::CorsLayer;
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

#[tokio::main]
async fn main() -> Result<(), ApiError> {
    // --- 1. Load Configuration & Set Up Logging ---
    let config = Config::from_env()?;
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(config.log_level.to_string()))
        .with(tracing_subscriber::fmt::layer())
        .init();
    info!("Configuration loaded. Starting server...");

    // --- 2. Initialize Service Adapters ---
    let backend = match &config.backend_url {
        Some(url) => {
            info!("Using the LifeGuard collaborator at {}", url);
            Some(Arc::new(HttpBackendAdapter::new(url.clone())?))
        }
        None => None,
    };

    let health: Arc<dyn HealthDataService> = match &backend {
        Some(backend) => backend.clone() as Arc<dyn HealthDataService>,
        None => {
            info!("Serving simulated wearable data");
            Arc::new(SimulatedHealthAdapter::new())
        }
    };

    let chat: Arc<dyn ChatService> = match (&backend, &config.openai_api_key) {
        (Some(backend), _) => backend.clone() as Arc<dyn ChatService>,
        (None, Some(key)) => Arc::new(OpenAiChatAdapter::with_timeout(
            key,
            config.chat_model.clone(),
            config.chat_timeout,
        )?),
        (None, None) => {
            return Err(ApiError::Internal(
                "A chat source (LIFEGUARD_BACKEND_URL or OPENAI_API_KEY) is required".to_string(),
            ))
        }
    };

    let reports: Option<Arc<dyn ReportService>> = match &backend {
        Some(backend) => Some(backend.clone() as Arc<dyn ReportService>),
        None => {
            warn!("No PDF collaborator configured; report downloads will fail");
            None
        }
    };

    let survey_flags = Arc::new(FileSurveyFlags::new(config.survey_flags_path.clone()));
    info!(
        "Survey flags stored in {}",
        config.survey_flags_path.display()
    );

    // --- 3. Build the Shared AppState ---
    let app_state = Arc::new(AppState {
        retry_policy: config.retry_policy(),
        health,
        chat,
        reports,
        survey_flags,
    });

    let origin = config.cors_origin.parse::<HeaderValue>().map_err(|e| {
        ApiError::Internal(format!("Invalid CORS origin '{}': {}", config.cors_origin, e))
    })?;
    let cors = CorsLayer::new()
        .allow_origin(origin)
        .allow_credentials(true)
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers([CONTENT_TYPE, ACCEPT]);

    // --- 4. Create the Web Router ---
    let api_router = Router::new()
        .route("/api/health-signals", get(health_signals_handler))
        .route("/api/historical-dashboard", get(historical_dashboard_handler))
        .route("/lg/user-message", post(user_message_handler))
        .route("/ws", get(ws_handler))
        .layer(cors)
        .with_state(app_state);

    // Merge the API router with the Swagger UI router for a complete application.
    let app = Router::new()
        .merge(api_router)
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()));

    // --- 5. Start the Server ---
    info!("Starting server on {}", config.bind_address);
    info!(
        "Swagger UI available at http://{}/swagger-ui",
        config.bind_address
    );
    let listener = tokio::net::TcpListener::bind(&config.bind_address).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
