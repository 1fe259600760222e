// Upgrade Planner - Web Server
// REST API with Axum

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Json, Response},
    routing::{get, post},
    Router,
};
use rusqlite::Connection;
use serde::{Deserialize, Serialize};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use tower_http::cors::CorsLayer;
use tracing::{error, info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};
use async_trait::async_trait;
use upgrade_planner::{
    delete_hero, enumerate_targets, get_hero, get_saved_heroes, load_hero, save_hero,
    setup_database, Config, CostSource, CostTable, CostTableIndex, CostTableProvider,
    CsvCostTableProvider, Hero, MaterialCatalog, PlanBuilder, PlannerError, Rarity,
    UpgradePath, UpgradePlan, UpgradePreview, UpgradeTarget,
};

/// CSV provider that reads on the blocking pool instead of a runtime worker
struct BlockingCsvProvider(CsvCostTableProvider);

#[async_trait]
impl CostTableProvider for BlockingCsvProvider {
    async fn fetch(&self) -> upgrade_planner::Result<CostTable> {
        let path = self.0.path().to_path_buf();
        tokio::task::spawn_blocking(move || CostTable::load_csv(&path))
            .await
            .map_err(|e| PlannerError::DataUnavailable(format!("cost table load aborted: {}", e)))?
    }

    fn describe(&self) -> String {
        self.0.describe()
    }
}

/// Shared application state
#[derive(Clone)]
struct AppState {
    db: Arc<Mutex<Connection>>,
    costs: Arc<CostTableIndex<BlockingCsvProvider>>,
    materials: Arc<MaterialCatalog>,
}

impl AppState {
    fn db(&self) -> MutexGuard<'_, Connection> {
        self.db.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// API Response wrapper
#[derive(Serialize)]
struct ApiResponse<T> {
    success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    data: Option<T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>,
}

impl<T> ApiResponse<T> {
    fn ok(data: T) -> Self {
        Self {
            success: true,
            data: Some(data),
            error: None,
        }
    }

    fn err(message: String) -> Self {
        Self {
            success: false,
            data: None,
            error: Some(message),
        }
    }
}

/// Planner errors as HTTP responses
struct ApiError(PlannerError);

impl From<PlannerError> for ApiError {
    fn from(e: PlannerError) -> Self {
        ApiError(e)
    }
}

fn status_for(e: &PlannerError) -> StatusCode {
    match e {
        PlannerError::DataUnavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
        PlannerError::HeroNotFound(_) => StatusCode::NOT_FOUND,
        PlannerError::InvalidHero(_) | PlannerError::UnknownPath(_) => StatusCode::BAD_REQUEST,
        PlannerError::CorruptRecord(_)
        | PlannerError::Storage(_)
        | PlannerError::Serialization(_) => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = status_for(&self.0);
        if status.is_server_error() {
            error!(error = %self.0, "request failed");
        }
        (status, Json(ApiResponse::<()>::err(self.0.to_string()))).into_response()
    }
}

type ApiResult<T> = Result<Json<ApiResponse<T>>, ApiError>;

fn ok<T>(data: T) -> ApiResult<T> {
    Ok(Json(ApiResponse::ok(data)))
}

/// Saved hero listing entry
#[derive(Serialize)]
struct HeroSummary {
    id: String,
    name: String,
    rarity: Rarity,
    last_modified: String,
}

#[derive(Deserialize)]
struct NewHeroRequest {
    name: String,
    rarity: Rarity,
}

#[derive(Deserialize)]
struct PlanRequest {
    targets: Vec<UpgradeTarget>,
}

#[derive(Deserialize)]
struct PreviewQuery {
    path: UpgradePath,
    from: u32,
    to: u32,
}

#[derive(Serialize)]
struct ReloadResponse {
    rows: usize,
    fingerprint: String,
}

// ============================================================================
// API Handlers
// ============================================================================

/// GET /api/health - Health check
async fn health_check(State(state): State<AppState>) -> impl IntoResponse {
    Json(ApiResponse::ok(serde_json::json!({
        "status": "OK",
        "version": upgrade_planner::VERSION,
        "cost_table_loaded": state.costs.is_loaded(),
        "cost_table_fingerprint": state.costs.fingerprint(),
    })))
}

/// GET /api/heroes - Saved heroes, most recent first
async fn list_heroes(State(state): State<AppState>) -> ApiResult<Vec<HeroSummary>> {
    let heroes = get_saved_heroes(&state.db())?;
    ok(heroes
        .into_iter()
        .map(|saved| HeroSummary {
            id: saved.id,
            name: saved.name,
            rarity: saved.rarity,
            last_modified: saved.last_modified.to_rfc3339(),
        })
        .collect())
}

/// POST /api/heroes - Create a hero with starting levels
async fn create_hero(
    State(state): State<AppState>,
    Json(request): Json<NewHeroRequest>,
) -> Result<(StatusCode, Json<ApiResponse<Hero>>), ApiError> {
    let hero = Hero::new(&request.name, request.rarity);
    save_hero(&state.db(), &hero)?;
    info!(hero_id = %hero.id, name = %hero.name, "hero created");
    Ok((StatusCode::CREATED, Json(ApiResponse::ok(hero))))
}

/// GET /api/heroes/:id - Read a hero
async fn get_hero_by_id(State(state): State<AppState>, Path(id): Path<String>) -> ApiResult<Hero> {
    ok(fetch_hero(&state, &id)?)
}

/// POST /api/heroes/:id/select - Make a hero the current one
async fn select_hero(State(state): State<AppState>, Path(id): Path<String>) -> ApiResult<Hero> {
    let hero = load_hero(&state.db(), &id)?.ok_or_else(|| PlannerError::HeroNotFound(id.clone()))?;
    info!(hero_id = %hero.id, "current hero changed");
    ok(hero)
}

/// PUT /api/heroes/:id - Replace a hero snapshot
async fn put_hero(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(hero): Json<Hero>,
) -> ApiResult<Hero> {
    if hero.id != id {
        return Err(PlannerError::InvalidHero(format!(
            "body id '{}' does not match path id '{}'",
            hero.id, id
        ))
        .into());
    }
    save_hero(&state.db(), &hero)?;
    ok(hero)
}

/// DELETE /api/heroes/:id
async fn remove_hero(State(state): State<AppState>, Path(id): Path<String>) -> ApiResult<String> {
    if !delete_hero(&state.db(), &id)? {
        return Err(PlannerError::HeroNotFound(id).into());
    }
    ok(id)
}

/// GET /api/heroes/:id/targets - Every track still below max
async fn hero_targets(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<Vec<UpgradeTarget>> {
    let hero = fetch_hero(&state, &id)?;
    ok(enumerate_targets(&hero))
}

/// GET /api/heroes/:id/plan - Material bill for maxing everything
async fn hero_plan(State(state): State<AppState>, Path(id): Path<String>) -> ApiResult<UpgradePlan> {
    let hero = fetch_hero(&state, &id)?;
    let plan = PlanBuilder::new(state.costs.as_ref()).build_max(&hero).await?;
    ok(plan)
}

/// POST /api/plan - Material bill for an explicit target selection
async fn plan_targets(
    State(state): State<AppState>,
    Json(request): Json<PlanRequest>,
) -> ApiResult<UpgradePlan> {
    let plan = PlanBuilder::new(state.costs.as_ref())
        .build(request.targets)
        .await?;
    ok(plan)
}

/// GET /api/preview?path=&from=&to= - Cost of one range on one path
async fn preview(
    State(state): State<AppState>,
    Query(query): Query<PreviewQuery>,
) -> ApiResult<UpgradePreview> {
    let preview = PlanBuilder::new(state.costs.as_ref())
        .preview(query.path, query.from, query.to)
        .await?;
    ok(preview)
}

/// GET /api/materials - Material catalog
async fn list_materials(State(state): State<AppState>) -> ApiResult<Vec<String>> {
    ok(state.materials.all().to_vec())
}

/// POST /api/cost-table/reload - Drop the loaded table and fetch it again
async fn reload_cost_table(State(state): State<AppState>) -> ApiResult<ReloadResponse> {
    state.costs.invalidate();
    let table = state.costs.load().await?;
    ok(ReloadResponse {
        rows: table.len(),
        fingerprint: table.fingerprint().to_string(),
    })
}

/// Read-only lookup; leaves the current hero alone
fn fetch_hero(state: &AppState, id: &str) -> Result<Hero, PlannerError> {
    get_hero(&state.db(), id)?.ok_or_else(|| PlannerError::HeroNotFound(id.to_string()))
}

fn api_routes(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health_check))
        .route("/heroes", get(list_heroes).post(create_hero))
        .route(
            "/heroes/:id",
            get(get_hero_by_id).put(put_hero).delete(remove_hero),
        )
        .route("/heroes/:id/select", post(select_hero))
        .route("/heroes/:id/targets", get(hero_targets))
        .route("/heroes/:id/plan", get(hero_plan))
        .route("/plan", post(plan_targets))
        .route("/preview", get(preview))
        .route("/materials", get(list_materials))
        .route("/cost-table/reload", post(reload_cost_table))
        .with_state(state)
}

// ============================================================================
// Main Server
// ============================================================================

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = Config::from_env();
    info!(?config, "starting planner server");

    let conn = Connection::open(&config.db_path)?;
    setup_database(&conn)?;
    info!(db = %config.db_path.display(), "hero store opened");

    let costs = CostTableIndex::new(BlockingCsvProvider(CsvCostTableProvider::new(
        &config.costs_csv,
    )));
    // Serve anyway; plan endpoints answer 503 until the table loads
    if let Err(e) = costs.load().await {
        warn!(error = %e, "cost table not loaded at startup");
    }

    let materials = MaterialCatalog::load_csv(&config.materials_csv).unwrap_or_else(|e| {
        warn!(error = %e, "material catalog not loaded, serving an empty list");
        MaterialCatalog::default()
    });

    let state = AppState {
        db: Arc::new(Mutex::new(conn)),
        costs: Arc::new(costs),
        materials: Arc::new(materials),
    };

    let app = Router::new()
        .nest("/api", api_routes(state))
        .layer(CorsLayer::permissive());

    let listener = tokio::net::TcpListener::bind(&config.server_addr).await?;
    info!(addr = %config.server_addr, "server listening");

    axum::serve(listener, app).await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use upgrade_planner::get_current_hero;

    fn test_state() -> AppState {
        let conn = Connection::open_in_memory().unwrap();
        setup_database(&conn).unwrap();
        AppState {
            db: Arc::new(Mutex::new(conn)),
            costs: Arc::new(CostTableIndex::new(BlockingCsvProvider(
                CsvCostTableProvider::new("/nonexistent/costs.csv"),
            ))),
            materials: Arc::new(MaterialCatalog::default()),
        }
    }

    #[test]
    fn test_error_status_mapping() {
        assert_eq!(
            status_for(&PlannerError::DataUnavailable("offline".into())),
            StatusCode::SERVICE_UNAVAILABLE
        );
        assert_eq!(
            status_for(&PlannerError::HeroNotFound("hero-1".into())),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            status_for(&PlannerError::InvalidHero("bad".into())),
            StatusCode::BAD_REQUEST
        );
        // A broken stored row is the server's fault, not the client's
        assert_eq!(
            status_for(&PlannerError::CorruptRecord("hero-1".into())),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn test_reading_a_hero_keeps_the_current_one() {
        let state = test_state();
        let a = Hero::new("A", Rarity::Legendary);
        let b = Hero::new("B", Rarity::Legendary);
        save_hero(&state.db(), &a).unwrap();
        save_hero(&state.db(), &b).unwrap();

        assert_eq!(fetch_hero(&state, &a.id).unwrap(), a);
        assert_eq!(get_current_hero(&state.db()).unwrap().unwrap().id, b.id);
        assert!(matches!(
            fetch_hero(&state, "hero-missing"),
            Err(PlannerError::HeroNotFound(_))
        ));
    }

    #[tokio::test]
    async fn test_select_changes_the_current_hero() {
        let state = test_state();
        let a = Hero::new("A", Rarity::Legendary);
        let b = Hero::new("B", Rarity::Legendary);
        save_hero(&state.db(), &a).unwrap();
        save_hero(&state.db(), &b).unwrap();

        let Json(body) = select_hero(State(state.clone()), Path(a.id.clone()))
            .await
            .ok()
            .unwrap();
        assert_eq!(body.data.unwrap().id, a.id);
        assert_eq!(get_current_hero(&state.db()).unwrap().unwrap().id, a.id);
    }

    #[tokio::test]
    async fn test_blocking_provider_reports_missing_file() {
        let state = test_state();
        let err = state.costs.load().await.unwrap_err();
        assert!(err.is_data_unavailable());
        assert!(!state.costs.is_loaded());
    }

    #[test]
    fn test_preview_query_uses_path_keys() {
        let query: PreviewQuery =
            serde_json::from_str(r#"{"path":"signature 1","from":5,"to":7}"#).unwrap();
        assert_eq!(query.path, UpgradePath::Signature1);
        assert_eq!((query.from, query.to), (5, 7));
    }

    #[test]
    fn test_error_body_has_no_data() {
        let body = serde_json::to_value(ApiResponse::<()>::err("nope".into())).unwrap();
        assert_eq!(body["success"], false);
        assert_eq!(body["error"], "nope");
        assert!(body.get("data").is_none());
    }
}
