//! REST API for the box recommendation service.
//!
//! Thin adapter over the recommender: validates requests, picks the
//! catalog, and maps outcomes to JSON. Uses Axum with permissive CORS.

use std::sync::{Arc, OnceLock};

use axum::extract::rejection::JsonRejection;
use axum::extract::{Json, State};
use axum::{
    Router,
    http::StatusCode,
    response::{Html, IntoResponse, Response},
    routing::{get, post},
};
use serde::{Deserialize, Serialize};
use serde_json::json;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::{DefaultMakeSpan, DefaultOnResponse, TraceLayer};
use tracing::Level;
use utoipa::{OpenApi, ToSchema};

use crate::config::ApiConfig;
use crate::error::BoxFitError;
use crate::model::{Container, Product, ValidationError, expand_products, validate_products};
use crate::packer::{
    PackEvent, PackResult, PackingConfig, PlacedItem, attempt_pack_with_config,
    attempt_pack_with_progress,
};
use crate::recommender::{Recommendation, recommend_with_config};
use crate::types::Vec3;

#[derive(Clone)]
pub struct ApiState {
    packing: PackingConfig,
    catalog: Arc<Vec<Container>>,
}

impl ApiState {
    pub fn new(packing: PackingConfig, catalog: Vec<Container>) -> Self {
        Self {
            packing,
            catalog: Arc::new(catalog),
        }
    }
}

static OPENAPI_DOC: OnceLock<utoipa::openapi::OpenApi> = OnceLock::new();

// SRI hashes verified against https://unpkg.com/swagger-ui-dist@5.17.14/ on 2025-10-29.
const SWAGGER_UI_HTML: &str = r##"<!DOCTYPE html>
<html lang="en">
    <head>
        <meta charset="utf-8" />
        <title>box_fit API Docs</title>
        <link
            rel="stylesheet"
            href="https://unpkg.com/swagger-ui-dist@5.17.14/swagger-ui.css"
            integrity="sha384-wxLW6kwyHktdDGr6Pv1zgm/VGJh99lfUbzSn6HNHBENZlCN7W602k9VkGdxuFvPn"
            crossorigin="anonymous"
        />
    </head>
    <body>
        <div id="swagger-ui"></div>
        <script
            src="https://unpkg.com/swagger-ui-dist@5.17.14/swagger-ui-bundle.js"
            integrity="sha384-wmyclcVGX/WhUkdkATwhaK1X1JtiNrr2EoYJ+diV3vj4v6OC5yCeSu+yW13SYJep"
            crossorigin="anonymous"
        ></script>
        <script>
            window.onload = function () {
                window.ui = SwaggerUIBundle({
                    url: "/docs/openapi.json",
                    dom_id: "#swagger-ui",
                });
            };
        </script>
    </body>
    </html>"##;

fn openapi_doc() -> &'static utoipa::openapi::OpenApi {
    OPENAPI_DOC.get_or_init(ApiDoc::openapi)
}

/// Request body for `POST /recommend`.
///
/// `boxes` replaces the configured catalog for this request only.
#[derive(Deserialize, Serialize, ToSchema)]
#[schema(
    example = json!({
        "products": [
            { "name": "Mug", "length": 12.0, "width": 9.0, "height": 10.0, "weight": 0.4, "quantity": 2 }
        ],
        "padding": 2.0
    })
)]
pub struct RecommendRequest {
    pub products: Vec<Product>,
    #[serde(default)]
    #[schema(nullable = true)]
    pub padding: Option<f64>,
    #[serde(default)]
    #[schema(nullable = true)]
    pub boxes: Option<Vec<Container>>,
}

#[derive(Debug)]
struct ValidatedRecommendRequest {
    products: Vec<Product>,
    padding: f64,
    boxes: Option<Vec<Container>>,
}

/// Interior dimensions for `POST /pack`.
#[derive(Deserialize, Serialize, Clone, Copy, ToSchema)]
pub struct InteriorRequest {
    pub length: f64,
    pub width: f64,
    pub height: f64,
}

impl InteriorRequest {
    fn as_vec3(&self) -> Vec3 {
        Vec3::new(self.length, self.width, self.height)
    }
}

/// Request body for `POST /pack`: one packing attempt for diagnostics.
///
/// With `trace` set, the response also lists every placement decision.
#[derive(Deserialize, Serialize, ToSchema)]
#[schema(
    example = json!({
        "products": [
            { "name": "Book", "length": 20.0, "width": 14.0, "height": 3.0, "weight": 0.5, "quantity": 3 }
        ],
        "container": { "length": 34.0, "width": 25.0, "height": 21.0 },
        "padding": 2.0,
        "trace": false
    })
)]
pub struct PackRequest {
    pub products: Vec<Product>,
    pub container: InteriorRequest,
    #[serde(default)]
    #[schema(nullable = true)]
    pub padding: Option<f64>,
    #[serde(default)]
    pub trace: bool,
}

#[derive(Debug)]
struct ValidatedPackRequest {
    products: Vec<Product>,
    interior: Vec3,
    padding: f64,
    trace: bool,
}

#[derive(Debug)]
enum RequestValidationError {
    Products(ValidationError),
    Padding(f64),
    Boxes(String),
    Interior,
}

impl std::fmt::Display for RequestValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RequestValidationError::Products(err) => write!(f, "{}", err),
            RequestValidationError::Padding(value) => {
                write!(f, "Padding must be a non-negative number, got: {}", value)
            }
            RequestValidationError::Boxes(msg) => write!(f, "{}", msg),
            RequestValidationError::Interior => {
                write!(f, "All box dimensions (length/width/height) must be positive")
            }
        }
    }
}

fn validate_padding(padding: Option<f64>, default: f64) -> Result<f64, RequestValidationError> {
    let padding = padding.unwrap_or(default);
    BoxFitError::check_padding(padding).map_err(|_| RequestValidationError::Padding(padding))?;
    Ok(padding)
}

impl RecommendRequest {
    fn into_validated(
        self,
        default_padding: f64,
    ) -> Result<ValidatedRecommendRequest, RequestValidationError> {
        validate_products(&self.products).map_err(RequestValidationError::Products)?;
        let padding = validate_padding(self.padding, default_padding)?;

        if let Some(boxes) = &self.boxes {
            for (idx, container) in boxes.iter().enumerate() {
                container
                    .validate()
                    .map_err(|err| RequestValidationError::Boxes(format!("boxes[{}]: {}", idx, err)))?;
            }
        }

        Ok(ValidatedRecommendRequest {
            products: self.products,
            padding,
            boxes: self.boxes,
        })
    }
}

impl PackRequest {
    fn into_validated(
        self,
        default_padding: f64,
    ) -> Result<ValidatedPackRequest, RequestValidationError> {
        validate_products(&self.products).map_err(RequestValidationError::Products)?;
        let padding = validate_padding(self.padding, default_padding)?;
        let interior = self.container.as_vec3();
        if !interior.is_valid_dimension() {
            return Err(RequestValidationError::Interior);
        }
        Ok(ValidatedPackRequest {
            products: self.products,
            interior,
            padding,
            trace: self.trace,
        })
    }
}

/// Response body for `POST /pack`.
#[derive(Serialize, ToSchema)]
pub struct PackResponse {
    #[serde(flatten)]
    pub result: PackResult,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub events: Vec<PackEvent>,
}

/// Response body for `POST /recommend`.
///
/// `no_fit` is set when nothing can be recommended. `success` is false only
/// when there is no active box to choose from.
#[derive(Serialize, Deserialize, ToSchema)]
pub struct RecommendResponse {
    pub success: bool,
    pub results: Vec<RecommendationView>,
    pub no_fit: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

/// Serialized form of a recommendation.
#[derive(Serialize, Deserialize, ToSchema)]
pub struct RecommendationView {
    #[serde(rename = "box")]
    pub container: Container,
    pub utilization: f64,
    pub total_item_volume: f64,
    pub total_weight: f64,
    pub container_volume: f64,
    pub usable_volume: f64,
    pub arrangement: Vec<PlacementView>,
}

#[derive(Serialize, Deserialize, ToSchema)]
pub struct PlacementView {
    pub name: String,
    pub x: f64,
    pub y: f64,
    pub z: f64,
    pub length: f64,
    pub width: f64,
    pub height: f64,
}

impl From<PlacedItem> for PlacementView {
    fn from(placed: PlacedItem) -> Self {
        Self {
            name: placed.label,
            x: placed.position.x,
            y: placed.position.y,
            z: placed.position.z,
            length: placed.dims.x,
            width: placed.dims.y,
            height: placed.dims.z,
        }
    }
}

impl From<Recommendation> for RecommendationView {
    fn from(rec: Recommendation) -> Self {
        Self {
            container: rec.container,
            utilization: rec.utilization,
            total_item_volume: rec.total_item_volume,
            total_weight: rec.total_weight,
            container_volume: rec.container_volume,
            usable_volume: rec.usable_volume,
            arrangement: rec.placements.into_iter().map(PlacementView::from).collect(),
        }
    }
}

impl RecommendResponse {
    fn no_catalog() -> Self {
        Self {
            success: false,
            results: Vec::new(),
            no_fit: true,
            message: Some("No boxes are registered.".to_string()),
        }
    }

    /// Maps ranked results to a response. An empty list means no box fits.
    fn from_results(results: Vec<Recommendation>) -> Self {
        if results.is_empty() {
            return Self {
                success: true,
                results: Vec::new(),
                no_fit: true,
                message: Some(
                    "No suitable box found. The products are too large or too heavy.".to_string(),
                ),
            };
        }
        Self {
            success: true,
            results: results.into_iter().map(RecommendationView::from).collect(),
            no_fit: false,
            message: None,
        }
    }
}

#[derive(Serialize, ToSchema)]
struct ErrorResponse {
    error: String,
    details: String,
}

impl ErrorResponse {
    fn new(error: impl Into<String>, details: impl Into<String>) -> Self {
        Self {
            error: error.into(),
            details: details.into(),
        }
    }
}

fn error_response(
    status: StatusCode,
    error: impl Into<String>,
    details: impl Into<String>,
) -> Response {
    (status, Json(ErrorResponse::new(error, details))).into_response()
}

fn json_deserialize_error(err: JsonRejection) -> Response {
    error_response(
        StatusCode::UNPROCESSABLE_ENTITY,
        "Invalid JSON data",
        err.to_string(),
    )
}

fn validation_error(err: RequestValidationError) -> Response {
    error_response(
        StatusCode::UNPROCESSABLE_ENTITY,
        "Invalid input data",
        err.to_string(),
    )
}

fn internal_error(details: impl Into<String>) -> Response {
    error_response(
        StatusCode::INTERNAL_SERVER_ERROR,
        "Internal error",
        details,
    )
}

#[derive(OpenApi)]
#[openapi(
    paths(handle_recommend, handle_pack, handle_boxes),
    components(
        schemas(
            RecommendRequest,
            RecommendResponse,
            RecommendationView,
            PlacementView,
            PackRequest,
            InteriorRequest,
            PackResponse,
            PackResult,
            PackEvent,
            PlacedItem,
            Product,
            Container,
            ErrorResponse
        )
    ),
    tags((name = "recommendation", description = "Box recommendation and packing"))
)]
struct ApiDoc;

/// Builds the router with all routes, CORS and request tracing.
pub fn router(state: ApiState) -> Router {
    let cors = CorsLayer::new()
        .allow_methods(Any)
        .allow_origin(Any)
        .allow_headers(Any);

    Router::new()
        .route("/recommend", post(handle_recommend))
        .route("/pack", post(handle_pack))
        .route("/boxes", get(handle_boxes))
        .route("/health", get(|| async { "ok" }))
        .route("/docs/openapi.json", get(serve_openapi_json))
        .route("/docs", get(serve_openapi_ui))
        .layer(cors)
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(DefaultMakeSpan::new().level(Level::INFO))
                .on_response(DefaultOnResponse::new().level(Level::INFO)),
        )
        .with_state(state)
}

/// Starts the API server and blocks until it terminates.
pub async fn start_api_server(config: ApiConfig, state: ApiState) -> std::io::Result<()> {
    let app = router(state);

    let addr = config.socket_addr();
    let listener = tokio::net::TcpListener::bind(addr).await?;

    tracing::info!(
        "Server running on http://{}:{}",
        config.display_host(),
        config.port()
    );
    if config.binds_to_all_interfaces() {
        tracing::info!("Local access: http://localhost:{}", config.port());
    }
    tracing::info!("Endpoints: POST /recommend, POST /pack, GET /boxes, GET /health, GET /docs");

    axum::serve(listener, app).await
}

/// Handler for POST /recommend.
///
/// Ranks every active box that holds all products, tightest fit first.
#[utoipa::path(
    post,
    path = "/recommend",
    request_body = RecommendRequest,
    responses(
        (status = 200, description = "Ranked recommendations (possibly empty)", body = RecommendResponse),
        (
            status = UNPROCESSABLE_ENTITY,
            description = "Invalid products, padding or boxes",
            body = ErrorResponse
        )
    ),
    tag = "recommendation"
)]
async fn handle_recommend(
    State(state): State<ApiState>,
    payload: Result<Json<RecommendRequest>, JsonRejection>,
) -> Response {
    let Json(payload) = match payload {
        Ok(payload) => payload,
        Err(err) => return json_deserialize_error(err),
    };
    let request = match payload.into_validated(state.packing.padding) {
        Ok(request) => request,
        Err(err) => return validation_error(err),
    };

    let ValidatedRecommendRequest {
        products,
        padding,
        boxes,
    } = request;
    let catalog: Arc<Vec<Container>> = match boxes {
        Some(boxes) => Arc::new(boxes),
        None => Arc::clone(&state.catalog),
    };

    if !catalog.iter().any(|c| c.is_active) {
        return (StatusCode::OK, Json(RecommendResponse::no_catalog())).into_response();
    }

    tracing::info!(
        products = products.len(),
        boxes = catalog.len(),
        padding,
        "new recommend request"
    );

    let config = PackingConfig {
        padding,
        ..state.packing
    };
    let outcome =
        tokio::task::spawn_blocking(move || recommend_with_config(&products, &catalog, &config))
            .await;

    match outcome {
        Ok(Ok(results)) => {
            (StatusCode::OK, Json(RecommendResponse::from_results(results))).into_response()
        }
        Ok(Err(err)) => error_response(
            StatusCode::UNPROCESSABLE_ENTITY,
            "Invalid input data",
            err.to_string(),
        ),
        Err(err) => {
            tracing::error!(error = %err, "recommendation task failed");
            internal_error(err.to_string())
        }
    }
}

/// Handler for POST /pack.
///
/// Runs one packing attempt and returns it as-is, including the partial
/// placement and the failing item when the products do not fit.
#[utoipa::path(
    post,
    path = "/pack",
    request_body = PackRequest,
    responses(
        (status = 200, description = "Packing attempt outcome", body = PackResponse),
        (
            status = UNPROCESSABLE_ENTITY,
            description = "Invalid products, padding or dimensions",
            body = ErrorResponse
        )
    ),
    tag = "recommendation"
)]
async fn handle_pack(
    State(state): State<ApiState>,
    payload: Result<Json<PackRequest>, JsonRejection>,
) -> Response {
    let Json(payload) = match payload {
        Ok(payload) => payload,
        Err(err) => return json_deserialize_error(err),
    };
    let ValidatedPackRequest {
        products,
        interior,
        padding,
        trace,
    } = match payload.into_validated(state.packing.padding) {
        Ok(request) => request,
        Err(err) => return validation_error(err),
    };

    let config = PackingConfig {
        padding,
        ..state.packing
    };
    let outcome = tokio::task::spawn_blocking(move || {
        let items = expand_products(&products);
        let mut events = Vec::new();
        let result = if trace {
            attempt_pack_with_progress(&items, interior, &config, |event| {
                events.push(event.clone())
            })
        } else {
            attempt_pack_with_config(&items, interior, &config)
        };
        result.map(|result| PackResponse { result, events })
    })
    .await;

    match outcome {
        Ok(Ok(response)) => {
            tracing::info!(
                feasible = response.result.feasible,
                placed = response.result.placed_count(),
                events = response.events.len(),
                "pack attempt finished"
            );
            (StatusCode::OK, Json(response)).into_response()
        }
        Ok(Err(err)) => error_response(
            StatusCode::UNPROCESSABLE_ENTITY,
            "Invalid input data",
            err.to_string(),
        ),
        Err(err) => {
            tracing::error!(error = %err, "pack task failed");
            internal_error(err.to_string())
        }
    }
}

/// Handler for GET /boxes: the configured catalog.
#[utoipa::path(
    get,
    path = "/boxes",
    responses((status = 200, description = "Configured box catalog", body = [Container])),
    tag = "recommendation"
)]
async fn handle_boxes(State(state): State<ApiState>) -> Json<Vec<Container>> {
    Json(state.catalog.as_ref().clone())
}

async fn serve_openapi_json() -> impl IntoResponse {
    Json(openapi_doc())
}

async fn serve_openapi_ui() -> impl IntoResponse {
    Html(SWAGGER_UI_HTML)
}
