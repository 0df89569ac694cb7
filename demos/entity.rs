//! A complete federation entity: the HTTP shell around the core.
//!
//! One process hosts one entity. The entity's name is the first command-line
//! argument; it determines the entity identifier (`https://<name>.example.com`
//! unless `ENTITY_ID` overrides it) and the listening port (a base of 8000
//! plus an ordinal derived from the name, unless `PORT` overrides it).
//!
//! ```sh
//! cargo run --example entity -- swamid
//! ```

use std::collections::HashMap;
use std::process::ExitCode;
use std::sync::Arc;
use std::time::Duration;

use axum::extract::{Path, Query, State};
use axum::http::{StatusCode, header};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use openid_fed::provider::{Clock, HttpFetch, HttpResponse};
use openid_fed::state::EntityContext;
use openid_fed::types::{
    AddReceivedTrustMarkRequest, ConfigurationRequest, DeleteSubordinateRequest, EntityRequest,
    FetchRequest, GetSubordinateRequest, GetTrustMarkRequest, IssueTrustMarkRequest, ListRequest,
    ListReceivedTrustMarksRequest, ListSubordinatesRequest, ListTrustMarksRequest,
    ResolveRequest, RevokeTrustMarkRequest, SetAuthorityHintsRequest, UpdateSubordinateRequest,
    UpsertSubordinateRequest,
};
use openid_fed::{endpoint, jose};
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

const ENTITY_STATEMENT_TYPE: &str = "application/entity-statement+jwt";
const BASE_PORT: u16 = 8000;

/// Provider backed by a shared HTTP client and the system clock.
#[derive(Clone, Debug)]
struct Provider {
    client: reqwest::Client,
}

impl HttpFetch for Provider {
    async fn fetch(&self, url: &str) -> anyhow::Result<HttpResponse> {
        let response = self.client.get(url).send().await?;
        Ok(HttpResponse {
            status: response.status().as_u16(),
            body: response.text().await?,
        })
    }
}

impl Clock for Provider {
    fn now(&self) -> i64 {
        chrono::Utc::now().timestamp()
    }
}

struct App {
    ctx: EntityContext,
    provider: Provider,
}

/// Wrapper mapping core errors onto HTTP responses.
struct ApiError(openid_fed::Error);

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status =
            StatusCode::from_u16(self.0.status()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
        (status, Json(self.0.to_json())).into_response()
    }
}

impl From<openid_fed::Error> for ApiError {
    fn from(err: openid_fed::Error) -> Self {
        Self(err)
    }
}

type ApiResult<T> = Result<T, ApiError>;

#[tokio::main]
async fn main() -> ExitCode {
    tracing_subscriber::fmt().with_env_filter(EnvFilter::from_default_env()).init();

    let name = std::env::args().nth(1).unwrap_or_else(|| "node1".to_string());
    let entity_id =
        std::env::var("ENTITY_ID").unwrap_or_else(|_| format!("https://{name}.example.com"));
    let port = std::env::var("PORT").ok().and_then(|p| p.parse().ok()).unwrap_or_else(|| {
        let ordinal = name.bytes().map(u32::from).sum::<u32>() % 1000;
        BASE_PORT + u16::try_from(ordinal).unwrap_or_default()
    });

    let keys = match jose::KeyManager::new(&name) {
        Ok(keys) => keys,
        Err(e) => {
            error!("failed to initialize signing key: {e}");
            return ExitCode::FAILURE;
        }
    };
    // the fetch timeout is the only cancellation knob resolution has
    let client = match reqwest::Client::builder().timeout(Duration::from_secs(10)).build() {
        Ok(client) => client,
        Err(e) => {
            error!("failed to build HTTP client: {e}");
            return ExitCode::FAILURE;
        }
    };
    let app = Arc::new(App {
        ctx: EntityContext::new(entity_id.clone(), keys),
        provider: Provider { client },
    });

    let router = Router::new()
        .route("/.well-known/openid-federation", get(configuration))
        .route("/fetch", get(fetch))
        .route("/list", get(list))
        .route("/resolve", get(resolve))
        .route("/manage/entity", get(entity))
        .route("/manage/entity/authority-hints", post(set_authority_hints))
        .route("/manage/entity/trust-marks", get(list_received).post(add_received))
        .route("/manage/subordinates", get(list_subordinates).post(upsert_subordinate))
        .route(
            "/manage/subordinates/{*id}",
            get(get_subordinate).put(update_subordinate).delete(delete_subordinate),
        )
        .route("/manage/trust-marks", get(list_trust_marks).post(issue_trust_mark))
        .route("/manage/trust-marks/{*id}", get(get_trust_mark).delete(revoke_trust_mark))
        .with_state(app);

    info!("entity {entity_id} listening on port {port}");
    let listener = match tokio::net::TcpListener::bind(("0.0.0.0", port)).await {
        Ok(listener) => listener,
        Err(e) => {
            error!("failed to bind port {port}: {e}");
            return ExitCode::FAILURE;
        }
    };
    if let Err(e) = axum::serve(listener, router).await {
        error!("server error: {e}");
        return ExitCode::FAILURE;
    }
    ExitCode::SUCCESS
}

async fn configuration(State(app): State<Arc<App>>) -> ApiResult<impl IntoResponse> {
    let response = endpoint::handle(&app.ctx, ConfigurationRequest {}, &app.provider).await?;
    Ok(([(header::CONTENT_TYPE, ENTITY_STATEMENT_TYPE)], response.0))
}

async fn fetch(
    State(app): State<Arc<App>>, Query(params): Query<HashMap<String, String>>,
) -> ApiResult<impl IntoResponse> {
    let sub = params.get("sub").cloned().unwrap_or_default();
    let response = endpoint::handle(&app.ctx, FetchRequest { sub }, &app.provider).await?;
    Ok(([(header::CONTENT_TYPE, ENTITY_STATEMENT_TYPE)], response.0))
}

async fn list(State(app): State<Arc<App>>) -> ApiResult<impl IntoResponse> {
    let response = endpoint::handle(&app.ctx, ListRequest {}, &app.provider).await?;
    Ok(Json(response.0))
}

async fn resolve(
    State(app): State<Arc<App>>, Query(params): Query<HashMap<String, String>>,
) -> ApiResult<impl IntoResponse> {
    let request = ResolveRequest {
        sub: params.get("sub").cloned().unwrap_or_default(),
        trust_anchor: params.get("trust_anchor").cloned().unwrap_or_default(),
    };
    // resolution failures are part of the result body, not HTTP errors
    let chain = endpoint::handle(&app.ctx, request, &app.provider).await?;
    Ok(Json(chain))
}

async fn entity(State(app): State<Arc<App>>) -> ApiResult<impl IntoResponse> {
    let response = endpoint::handle(&app.ctx, EntityRequest {}, &app.provider).await?;
    Ok(Json(response))
}

async fn set_authority_hints(
    State(app): State<Arc<App>>, Json(request): Json<SetAuthorityHintsRequest>,
) -> ApiResult<impl IntoResponse> {
    let response = endpoint::handle(&app.ctx, request, &app.provider).await?;
    Ok(Json(response))
}

async fn list_subordinates(State(app): State<Arc<App>>) -> ApiResult<impl IntoResponse> {
    let response = endpoint::handle(&app.ctx, ListSubordinatesRequest {}, &app.provider).await?;
    Ok(Json(response.0))
}

async fn upsert_subordinate(
    State(app): State<Arc<App>>, Json(request): Json<UpsertSubordinateRequest>,
) -> ApiResult<impl IntoResponse> {
    let response = endpoint::handle(&app.ctx, request, &app.provider).await?;
    Ok(Json(response))
}

async fn get_subordinate(
    State(app): State<Arc<App>>, Path(id): Path<String>,
) -> ApiResult<impl IntoResponse> {
    let request = GetSubordinateRequest { entity_id: id };
    let response = endpoint::handle(&app.ctx, request, &app.provider).await?;
    Ok(Json(response.0))
}

async fn update_subordinate(
    State(app): State<Arc<App>>, Path(id): Path<String>,
    Json(request): Json<UpsertSubordinateRequest>,
) -> ApiResult<impl IntoResponse> {
    let request = UpdateSubordinateRequest {
        entity_id: id,
        jwks: request.jwks,
        metadata: request.metadata,
        authority_hints: request.authority_hints,
    };
    let response = endpoint::handle(&app.ctx, request, &app.provider).await?;
    Ok(Json(response.0))
}

async fn delete_subordinate(
    State(app): State<Arc<App>>, Path(id): Path<String>,
) -> ApiResult<impl IntoResponse> {
    let request = DeleteSubordinateRequest { entity_id: id };
    let response = endpoint::handle(&app.ctx, request, &app.provider).await?;
    Ok(Json(response))
}

async fn issue_trust_mark(
    State(app): State<Arc<App>>, Json(request): Json<IssueTrustMarkRequest>,
) -> ApiResult<impl IntoResponse> {
    let response = endpoint::handle(&app.ctx, request, &app.provider).await?;
    Ok(Json(response.0))
}

async fn list_trust_marks(State(app): State<Arc<App>>) -> ApiResult<impl IntoResponse> {
    let response = endpoint::handle(&app.ctx, ListTrustMarksRequest {}, &app.provider).await?;
    Ok(Json(response.0))
}

async fn get_trust_mark(
    State(app): State<Arc<App>>, Path(id): Path<String>,
) -> ApiResult<impl IntoResponse> {
    let request = GetTrustMarkRequest { trust_mark_id: id };
    let response = endpoint::handle(&app.ctx, request, &app.provider).await?;
    Ok(Json(response.0))
}

async fn revoke_trust_mark(
    State(app): State<Arc<App>>, Path(id): Path<String>,
) -> ApiResult<impl IntoResponse> {
    let request = RevokeTrustMarkRequest { trust_mark_id: id };
    let response = endpoint::handle(&app.ctx, request, &app.provider).await?;
    Ok(Json(response))
}

async fn add_received(
    State(app): State<Arc<App>>, Json(request): Json<AddReceivedTrustMarkRequest>,
) -> ApiResult<impl IntoResponse> {
    let response = endpoint::handle(&app.ctx, request, &app.provider).await?;
    Ok(Json(response.0))
}

async fn list_received(State(app): State<Arc<App>>) -> ApiResult<impl IntoResponse> {
    let response =
        endpoint::handle(&app.ctx, ListReceivedTrustMarksRequest {}, &app.provider).await?;
    Ok(Json(response.0))
}
