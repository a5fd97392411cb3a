use std::sync::Arc;

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::{delete, get, post, put};
use axum::{Json, Router};
use tokio::net::TcpListener;

use fleetsim_api::models::{
    CreateDeviceRequest, CreateMappingRequest, CreateSensorRequest, Id, SubmitReadingsRequest, UpdateSensorRequest,
};
use fleetsim_simulator::configs::Api;
use fleetsim_simulator::errors::TelemetryError;
use fleetsim_simulator::services::{HttpTelemetryService, SubmitOptions, TelemetryService};
use fleetsim_simulator::testing::MockTelemetryService;

type Store = Arc<MockTelemetryService>;

struct ApiError(TelemetryError);

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self
            .0
            .status()
            .and_then(|status| StatusCode::from_u16(status).ok())
            .unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);

        (status, self.0.to_string()).into_response()
    }
}

impl From<TelemetryError> for ApiError {
    fn from(error: TelemetryError) -> Self {
        Self(error)
    }
}

type ApiResult<T> = Result<T, ApiError>;

/// In-process telemetry API on an ephemeral port, backed by a
/// [`MockTelemetryService`] the test can inspect.
pub struct MockApp {
    pub store: Store,
    pub base_url: String,
}

impl MockApp {
    pub async fn new() -> Self {
        let store = Arc::new(MockTelemetryService::new());
        let base_url = serve(create_router(store.clone())).await;

        Self { store, base_url }
    }

    pub fn client(&self) -> Arc<HttpTelemetryService> {
        client(&self.base_url)
    }
}

/// Client for a service that stores readings but answers with plain text.
#[allow(dead_code)]
pub async fn text_echo_client() -> Arc<HttpTelemetryService> {
    let api = Router::new().route(
        "/sensor-readings/:device_id",
        post(|| async { (StatusCode::CREATED, "Readings stored") }),
    );

    client(&serve(Router::new().nest("/api", api)).await)
}

async fn serve(router: Router) -> String {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let address = listener.local_addr().unwrap();

    tokio::spawn(async move {
        axum::serve(listener, router).await.unwrap();
    });

    format!("http://{address}/api")
}

fn client(base_url: &str) -> Arc<HttpTelemetryService> {
    Arc::new(
        HttpTelemetryService::new(&Api {
            base_url: base_url.to_string(),
            timeout_ms: 5000,
            connect_timeout_ms: 1000,
        })
        .unwrap(),
    )
}

fn create_router(store: Store) -> Router {
    let api = Router::new()
        .route("/devices", get(list_devices).post(create_device))
        .route("/devices/:id", delete(delete_device))
        .route("/sensors", get(list_sensors).post(create_sensor))
        .route("/sensors/:id", put(update_sensor))
        .route("/device-sensors", get(list_mappings))
        .route("/device-sensors/:device_id", get(list_device_mappings))
        .route("/device-sensor", post(create_mapping))
        .route("/device-sensor/:device_id/:sensor_id", delete(delete_mapping))
        .route("/sensor-readings/:device_id", post(submit_readings));

    Router::new().nest("/api", api).with_state(store)
}

async fn list_devices(State(store): State<Store>) -> ApiResult<impl IntoResponse> {
    Ok(Json(store.list_devices().await?))
}

async fn create_device(State(store): State<Store>, Json(body): Json<CreateDeviceRequest>) -> ApiResult<impl IntoResponse> {
    Ok(Json(store.register_device(&body.name, &body.device_type).await?))
}

async fn delete_device(State(store): State<Store>, Path(id): Path<Id>) -> ApiResult<impl IntoResponse> {
    store.delete_device(id).await?;
    Ok(StatusCode::NO_CONTENT)
}

async fn list_sensors(State(store): State<Store>) -> ApiResult<impl IntoResponse> {
    Ok(Json(store.list_sensors().await?))
}

async fn create_sensor(State(store): State<Store>, Json(body): Json<CreateSensorRequest>) -> ApiResult<impl IntoResponse> {
    Ok(Json(store.register_sensor(&body.sensor_type, &body.unit).await?))
}

async fn update_sensor(
    State(store): State<Store>,
    Path(id): Path<Id>,
    Json(body): Json<UpdateSensorRequest>,
) -> ApiResult<impl IntoResponse> {
    Ok(Json(store.update_sensor(id, &body).await?))
}

async fn list_mappings(State(store): State<Store>) -> ApiResult<impl IntoResponse> {
    Ok(Json(store.list_device_sensor_mappings(None).await?))
}

async fn list_device_mappings(State(store): State<Store>, Path(device_id): Path<Id>) -> ApiResult<impl IntoResponse> {
    Ok(Json(store.list_device_sensor_mappings(Some(device_id)).await?))
}

async fn create_mapping(State(store): State<Store>, Json(body): Json<CreateMappingRequest>) -> ApiResult<impl IntoResponse> {
    store.map_sensor_to_device(body.device_id, body.sensor_id).await?;
    Ok(StatusCode::CREATED)
}

async fn delete_mapping(State(store): State<Store>, Path((device_id, sensor_id)): Path<(Id, Id)>) -> ApiResult<impl IntoResponse> {
    store.unmap_sensor_from_device(device_id, sensor_id).await?;
    Ok(StatusCode::NO_CONTENT)
}

async fn submit_readings(
    State(store): State<Store>,
    Path(device_id): Path<Id>,
    Json(body): Json<SubmitReadingsRequest>,
) -> ApiResult<Response> {
    let options = SubmitOptions {
        validate: !body.no_validation,
        echo_response: !body.no_response_body,
    };

    Ok(match store.submit_readings(device_id, &body.readings, options).await? {
        Some(echo) => (StatusCode::CREATED, Json(echo)).into_response(),
        None => StatusCode::NO_CONTENT.into_response(),
    })
}
