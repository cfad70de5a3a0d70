use std::sync::Arc;

use axum::{
    extract::{DefaultBodyLimit, Multipart, State},
    routing::{get, post},
    Json, Router,
};
use serde_json::json;
use tower_http::cors::{Any, CorsLayer};
use tower_http::services::{ServeDir, ServeFile};
use tower_http::trace::TraceLayer;
use tracing::{debug, error, info, warn};

mod classify;
mod error;
mod model;
mod remedies;
mod utils;

use classify::PredictionResponse;
use error::ApiError;
use model::{Classifier, Model};
use remedies::RemedyTable;
use utils::{ensure_files_exist, get_env};

const MODEL_PATH: &str = "./model/frozen_graph.pb";
const REMEDY_PATH: &str = "./model/disease.json";

struct AppState {
    classifier: Option<Box<dyn Classifier>>,
    remedies: RemedyTable,
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_target(false)
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".parse().unwrap()),
        )
        .compact()
        .init();

    let config = get_env();
    ensure_files_exist(MODEL_PATH, REMEDY_PATH).await;

    let classifier: Option<Box<dyn Classifier>> = match Model::load(MODEL_PATH) {
        Ok(model) => {
            info!("Model loaded successfully.");
            Some(Box::new(model))
        }
        Err(err) => {
            // Degraded mode: the server stays up, /predict answers 500.
            error!("Failed to load model: {}", err);
            None
        }
    };

    let remedies = match RemedyTable::load(REMEDY_PATH) {
        Ok(table) => {
            info!("Remedy table loaded ({} entries).", table.len());
            table
        }
        Err(err) => {
            warn!("Remedy table not loaded, using empty fallback: {}", err);
            RemedyTable::default()
        }
    };

    let state = Arc::new(AppState {
        classifier,
        remedies,
    });
    let app = app(state, &config.static_dir, config.body_limit_bytes);

    info!("Listening on http://0.0.0.0:{}", config.port);
    axum::Server::bind(&format!("0.0.0.0:{}", config.port).parse().unwrap())
        .serve(app.into_make_service())
        .await
        .unwrap();
}

fn app(state: Arc<AppState>, static_dir: &str, body_limit_bytes: usize) -> Router {
    // Unmatched paths fall through to the front-end bundle; index.html
    // covers client-side routes.
    let spa = ServeDir::new(static_dir)
        .not_found_service(ServeFile::new(format!("{}/index.html", static_dir)));

    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/predict", post(predict_handler))
        .layer(DefaultBodyLimit::max(body_limit_bytes))
        .route("/health", get(health_check))
        .fallback_service(spa)
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}

async fn predict_handler(
    State(state): State<Arc<AppState>>,
    mut multipart: Multipart,
) -> Result<Json<PredictionResponse>, ApiError> {
    let classifier = state
        .classifier
        .as_deref()
        .ok_or(ApiError::ModelUnavailable)?;

    let mut image_data: Option<Vec<u8>> = None;

    // Process multipart form to find the image field
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|err| ApiError::BadInput(err.to_string()))?
    {
        if field.name() == Some("image") {
            if field.file_name().map_or(false, str::is_empty) {
                return Err(ApiError::BadInput("No file selected".to_string()));
            }
            let bytes = field
                .bytes()
                .await
                .map_err(|err| ApiError::BadInput(err.to_string()))?;
            image_data = Some(bytes.to_vec());
            break;
        }
    }

    let image_data =
        image_data.ok_or_else(|| ApiError::BadInput("No image provided".to_string()))?;
    if image_data.is_empty() {
        return Err(ApiError::BadInput("No file selected".to_string()));
    }

    debug!("Image received: {} bytes", image_data.len());

    let prediction_vector = classifier.probabilities(&image_data)?;
    debug!("Prediction vector: {:?}", prediction_vector);

    let result = classify::resolve(prediction_vector, &state.remedies)?;
    Ok(Json(result))
}

async fn health_check() -> Json<serde_json::Value> {
    Json(json!({ "status": "OK" }))
}
