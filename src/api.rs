//! REST API for the packing service.
//!
//! Builds bins and items from JSON, runs the packer on a blocking worker
//! and reports packed bins and unfit items. Uses Axum as the web framework
//! and supports CORS.

use std::sync::OnceLock;

use axum::extract::rejection::JsonRejection;
use axum::extract::{Json, State};
use axum::{
    Router,
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
};
use log::{error, info};
use serde::{Deserialize, Serialize};
use tower_http::cors::{Any, CorsLayer};
use utoipa::{OpenApi, ToSchema};

use crate::config::{ApiConfig, OptimizerConfig};
use crate::error::{PackError, ValidationError};
use crate::model::{Bin, Item};
use crate::packer::{Packer, PackingConfig, PackingSummary};
use crate::types::{Rotation, Weighted};

#[derive(Clone)]
pub struct ApiState {
    optimizer_config: OptimizerConfig,
}

impl ApiState {
    pub fn new(optimizer_config: OptimizerConfig) -> Self {
        Self { optimizer_config }
    }
}

static OPENAPI_DOC: OnceLock<utoipa::openapi::OpenApi> = OnceLock::new();

fn openapi_doc() -> &'static utoipa::openapi::OpenApi {
    OPENAPI_DOC.get_or_init(ApiDoc::openapi)
}

/// Bin definition in a pack request.
#[derive(Deserialize, Clone, ToSchema)]
pub struct BinRequest {
    pub name: Option<String>,
    /// Width, height, depth
    #[schema(value_type = [f64; 3], example = json!([120.0, 100.0, 80.0]))]
    pub dims: (f64, f64, f64),
    pub max_weight: f64,
}

impl BinRequest {
    fn into_bin(self, index: usize) -> Result<Bin, ValidationError> {
        let name = self.name.unwrap_or_else(|| format!("bin-{}", index + 1));
        let (w, h, d) = self.dims;
        Bin::new(name, w, h, d, self.max_weight)
    }
}

/// Item definition in a pack request.
#[derive(Deserialize, Clone, ToSchema)]
pub struct ItemRequest {
    pub name: Option<String>,
    /// Width, height, depth
    #[schema(value_type = [f64; 3], example = json!([30.0, 40.0, 20.0]))]
    pub dims: (f64, f64, f64),
    pub weight: f64,
}

impl ItemRequest {
    fn into_item(self, index: usize) -> Result<Item, ValidationError> {
        let name = self.name.unwrap_or_else(|| format!("item-{}", index + 1));
        let (w, h, d) = self.dims;
        Item::new(name, w, h, d, self.weight)
    }
}

#[derive(Deserialize, ToSchema)]
#[schema(
    example = json!({
        "bins": [
            { "name": "Standard crate", "dims": [120.0, 100.0, 80.0], "max_weight": 500.0 }
        ],
        "items": [
            { "name": "Parcel", "dims": [30.0, 40.0, 20.0], "weight": 5.0 }
        ],
        "fewest_boxes": true
    })
)]
pub struct PackRequest {
    pub bins: Vec<BinRequest>,
    pub items: Vec<ItemRequest>,
    /// Overrides the configured fewest-boxes setting
    #[serde(default)]
    #[schema(nullable = true)]
    pub fewest_boxes: Option<bool>,
}

#[derive(Debug)]
struct ValidatedPackRequest {
    bins: Vec<Bin>,
    items: Vec<Item>,
    fewest_boxes: Option<bool>,
}

#[derive(Debug)]
enum PackRequestValidationError {
    InvalidBin(ValidationError),
    InvalidItem(ValidationError),
}

impl PackRequest {
    fn into_validated(self) -> Result<ValidatedPackRequest, PackRequestValidationError> {
        let bins = self
            .bins
            .into_iter()
            .enumerate()
            .map(|(idx, spec)| spec.into_bin(idx))
            .collect::<Result<Vec<_>, ValidationError>>()
            .map_err(PackRequestValidationError::InvalidBin)?;

        let items = self
            .items
            .into_iter()
            .enumerate()
            .map(|(idx, spec)| spec.into_item(idx))
            .collect::<Result<Vec<_>, ValidationError>>()
            .map_err(PackRequestValidationError::InvalidItem)?;

        Ok(ValidatedPackRequest {
            bins,
            items,
            fewest_boxes: self.fewest_boxes,
        })
    }
}

/// Response with all bins after packing.
#[derive(Serialize, ToSchema)]
pub struct PackResponse {
    pub bins: Vec<PackedBin>,
    pub unfit: Vec<UnfitItem>,
    pub is_complete: bool,
    /// Set when some items could not be packed
    pub error: Option<String>,
    pub summary: PackingSummary,
}

/// Single bin with its packed items.
#[derive(Serialize, ToSchema)]
pub struct PackedBin {
    pub name: String,
    #[schema(value_type = [f64; 3], example = json!([120.0, 100.0, 80.0]))]
    pub dims: (f64, f64, f64),
    pub max_weight: f64,
    pub total_weight: f64,
    /// Percentage of the bin's volume in use
    pub volume_utilization: f64,
    pub items: Vec<PackedItem>,
}

/// Single placed item in the response.
///
/// # Fields
/// * `dims` - Intrinsic dimensions (width, height, depth)
/// * `placed_dims` - Extent along x, y, z after rotation
/// * `pivot` - Minimum corner inside the bin
#[derive(Serialize, ToSchema)]
pub struct PackedItem {
    pub name: String,
    #[schema(value_type = [f64; 3], example = json!([30.0, 40.0, 20.0]))]
    pub dims: (f64, f64, f64),
    pub weight: f64,
    pub rotation: Rotation,
    #[schema(value_type = [f64; 3], example = json!([0.0, 0.0, 0.0]))]
    pub pivot: (f64, f64, f64),
    #[schema(value_type = [f64; 3], example = json!([40.0, 30.0, 20.0]))]
    pub placed_dims: (f64, f64, f64),
}

#[derive(Serialize, ToSchema)]
pub struct UnfitItem {
    pub name: String,
    #[schema(value_type = [f64; 3], example = json!([35.0, 45.0, 25.0]))]
    pub dims: (f64, f64, f64),
    pub weight: f64,
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

fn parse_pack_request(
    payload: Result<Json<PackRequest>, JsonRejection>,
) -> Result<ValidatedPackRequest, Response> {
    let Json(payload) = payload.map_err(json_deserialize_error)?;

    payload.into_validated().map_err(|err| match err {
        PackRequestValidationError::InvalidBin(err) => error_response(
            StatusCode::UNPROCESSABLE_ENTITY,
            "Invalid bin configuration",
            err.to_string(),
        ),
        PackRequestValidationError::InvalidItem(err) => error_response(
            StatusCode::UNPROCESSABLE_ENTITY,
            "Invalid input data",
            err.to_string(),
        ),
    })
}

/// Runs a complete packing pass on freshly built bins and items.
pub fn run_packing(
    bins: Vec<Bin>,
    items: Vec<Item>,
    config: PackingConfig,
) -> (Packer, Result<(), PackError>) {
    let mut packer = Packer::with_config(config);
    packer.add_bins(bins);
    packer.add_items(items);
    let result = packer.pack();
    (packer, result)
}

impl PackResponse {
    /// Creates a PackResponse from a packer that has finished packing.
    pub fn from_packer(packer: Packer, error: Option<&PackError>) -> Self {
        let summary = packer.summary();
        let (bins, unfit) = packer.into_parts();

        Self {
            bins: bins.iter().map(PackedBin::from).collect(),
            is_complete: unfit.is_empty(),
            unfit: unfit
                .iter()
                .map(|item| UnfitItem {
                    name: item.name().to_string(),
                    dims: (item.width(), item.height(), item.depth()),
                    weight: item.weight(),
                })
                .collect(),
            error: error.map(ToString::to_string),
            summary,
        }
    }
}

impl From<&Bin> for PackedBin {
    fn from(bin: &Bin) -> Self {
        Self {
            name: bin.name().to_string(),
            dims: bin.bounds().as_tuple(),
            max_weight: bin.max_weight(),
            total_weight: bin.total_weight(),
            volume_utilization: bin.volume_utilization(),
            items: bin
                .items()
                .iter()
                .filter_map(|item| {
                    item.placement().map(|placement| PackedItem {
                        name: item.name().to_string(),
                        dims: (item.width(), item.height(), item.depth()),
                        weight: item.weight(),
                        rotation: placement.rotation,
                        pivot: placement.pivot.as_tuple(),
                        placed_dims: item.effective_dimension().as_tuple(),
                    })
                })
                .collect(),
        }
    }
}

#[derive(OpenApi)]
#[openapi(
    paths(handle_pack, handle_health),
    components(
        schemas(
            PackRequest,
            BinRequest,
            ItemRequest,
            PackResponse,
            PackedBin,
            PackedItem,
            UnfitItem,
            ErrorResponse,
            PackingSummary,
            Rotation
        )
    ),
    tags(
        (name = "packing", description = "Endpoints for 3D bin packing"),
        (name = "service", description = "Service status")
    )
)]
struct ApiDoc;

/// Builds the router with all routes and the CORS layer.
pub fn router(state: ApiState) -> Router {
    let cors = CorsLayer::new()
        .allow_methods(Any)
        .allow_origin(Any)
        .allow_headers(Any);

    Router::new()
        .route("/pack", post(handle_pack))
        .route("/health", get(handle_health))
        .route("/docs/openapi.json", get(serve_openapi_json))
        .layer(cors)
        .with_state(state)
}

/// Starts the API server and blocks until it terminates.
pub async fn start_api_server(
    config: ApiConfig,
    optimizer_config: OptimizerConfig,
) -> std::io::Result<()> {
    let app = router(ApiState::new(optimizer_config));

    let addr = config.socket_addr();
    let listener = tokio::net::TcpListener::bind(addr).await?;

    info!(
        "🚀 Server running on http://{}:{}",
        config.display_host(),
        config.port()
    );
    if config.binds_to_all_interfaces() {
        info!("💡 Local access: http://localhost:{}", config.port());
    }
    info!("📦 Endpoints: POST /pack, GET /health, GET /docs/openapi.json");

    axum::serve(listener, app).await
}

/// Handler for POST /pack endpoint.
///
/// Packs the given items into the given bins.
///
/// # Returns
/// 200 with the packed bins, also when some items were left unfit;
/// 422 for invalid input or infeasible volumes
#[utoipa::path(
    post,
    path = "/pack",
    request_body = PackRequest,
    responses(
        (status = 200, description = "Packing finished; check is_complete", body = PackResponse),
        (
            status = UNPROCESSABLE_ENTITY,
            description = "Invalid request, or packing rejected before placement",
            body = ErrorResponse
        )
    ),
    tag = "packing"
)]
async fn handle_pack(
    State(state): State<ApiState>,
    payload: Result<Json<PackRequest>, JsonRejection>,
) -> Response {
    let ValidatedPackRequest {
        bins,
        items,
        fewest_boxes,
    } = match parse_pack_request(payload) {
        Ok(request) => request,
        Err(response) => return response,
    };

    info!(
        "📥 New pack request: {} items, {} bins",
        items.len(),
        bins.len()
    );

    let mut packing_config = state.optimizer_config.packing_config();
    if let Some(fewest_boxes) = fewest_boxes {
        packing_config.fewest_boxes = fewest_boxes;
    }

    let outcome =
        tokio::task::spawn_blocking(move || run_packing(bins, items, packing_config)).await;
    let (packer, result) = match outcome {
        Ok(outcome) => outcome,
        Err(err) => {
            error!("Packing task failed: {err}");
            return error_response(
                StatusCode::INTERNAL_SERVER_ERROR,
                "Packing failed",
                err.to_string(),
            );
        }
    };

    match result {
        Ok(()) => {
            let response = PackResponse::from_packer(packer, None);
            (StatusCode::OK, Json(response)).into_response()
        }
        Err(err @ PackError::UnfitItemsExist { .. }) => {
            info!("📦 {}", err);
            let response = PackResponse::from_packer(packer, Some(&err));
            (StatusCode::OK, Json(response)).into_response()
        }
        Err(err) => {
            info!("📦 Packing rejected: {}", err);
            error_response(StatusCode::UNPROCESSABLE_ENTITY, err.code(), err.to_string())
        }
    }
}

/// Handler for GET /health endpoint.
#[utoipa::path(
    get,
    path = "/health",
    responses((status = 200, description = "Service is running", body = String)),
    tag = "service"
)]
async fn handle_health() -> &'static str {
    "ok"
}

async fn serve_openapi_json() -> impl IntoResponse {
    Json(openapi_doc())
}
