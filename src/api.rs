use std::sync::Arc;

use axum::{
    extract::{rejection::JsonRejection, State},
    http::header,
    response::IntoResponse,
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use tower_http::trace::TraceLayer;
use utoipa::{OpenApi, ToSchema};
use utoipa_swagger_ui::SwaggerUi;

use crate::analysis::{self, AnalysisFilter, AnalysisReport};
use crate::browser::ChromeLauncher;
use crate::config::Config;
use crate::error::AppError;
use crate::export;
use crate::model::RunStats;
use crate::table::{assemble, JobTable};
use crate::worker;

pub const XLSX_FILENAME: &str = "vagas.xlsx";
pub const CSV_FILENAME: &str = "vagas.csv";

#[derive(Clone)]
pub struct AppState {
    pub config: Config,
    pub launcher: Arc<ChromeLauncher>,
}

impl AppState {
    pub fn new(config: Config) -> Self {
        let launcher = Arc::new(ChromeLauncher::new(config.chrome_path.clone()));
        Self { config, launcher }
    }
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct SearchRequest {
    /// Free-text search term, e.g. "analista de dados".
    pub term: String,
    /// Upper bound on the number of listings returned.
    pub max_count: usize,
    /// Overrides the configured browser visibility for this search.
    pub headless: Option<bool>,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct SearchResponse {
    pub table: JobTable,
    pub stats: RunStats,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct AnalysisRequest {
    pub table: JobTable,
    #[serde(flatten)]
    pub filter: AnalysisFilter,
}

#[derive(OpenApi)]
#[openapi(
    paths(healthz, search, export_xlsx, export_csv, analyze),
    components(schemas(
        SearchRequest,
        SearchResponse,
        AnalysisRequest,
        crate::table::JobTable,
        crate::table::JobRow,
        crate::model::RunStats,
        crate::analysis::AnalysisFilter,
        crate::analysis::AnalysisReport,
        crate::analysis::Share,
        crate::analysis::DateCount,
        crate::analysis::RegionShare,
        crate::analysis::TermCount
    )),
    tags(
        (name = "scraper", description = "Job portal search"),
        (name = "reports", description = "Exports and analysis of a scraped table")
    )
)]
pub struct ApiDoc;

pub fn router(state: AppState) -> Router {
    Router::new()
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
        .route("/healthz", get(healthz))
        .route("/search", post(search))
        .route("/export/xlsx", post(export_xlsx))
        .route("/export/csv", post(export_csv))
        .route("/analysis", post(analyze))
        .layer(TraceLayer::new_for_http())
        .with_state(Arc::new(state))
}

#[utoipa::path(
    get,
    path = "/healthz",
    tag = "scraper",
    responses((status = 200, description = "Service is up", body = String))
)]
pub async fn healthz() -> &'static str {
    "ok"
}

/// Runs a full search and returns the assembled table.
#[utoipa::path(
    post,
    path = "/search",
    tag = "scraper",
    request_body = SearchRequest,
    responses(
        (status = 200, description = "Listings found", body = SearchResponse),
        (status = 400, description = "Blank term, max_count below 1 or malformed body"),
        (status = 502, description = "Browser could not start or the portal did not load")
    )
)]
pub async fn search(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<SearchRequest>, JsonRejection>,
) -> Result<Json<SearchResponse>, AppError> {
    let Json(payload) = payload?;
    let mut options = state.config.scrape.clone();
    if let Some(headless) = payload.headless {
        options.headless = headless;
    }

    let outcome = worker::run(
        Arc::clone(&state.launcher),
        &payload.term,
        payload.max_count,
        &options,
    )
    .await?;

    Ok(Json(SearchResponse {
        table: assemble(outcome.listings),
        stats: outcome.stats,
    }))
}

#[utoipa::path(
    post,
    path = "/export/xlsx",
    tag = "reports",
    request_body = JobTable,
    responses((
        status = 200,
        description = "Single-sheet workbook",
        body = String,
        content_type = "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet"
    ))
)]
pub async fn export_xlsx(
    table: Result<Json<JobTable>, JsonRejection>,
) -> Result<impl IntoResponse, AppError> {
    let Json(table) = table?;
    let bytes = export::to_xlsx(&table)?;
    tracing::info!(rows = table.len(), "Exported XLSX");
    Ok(attachment(export::XLSX_CONTENT_TYPE, XLSX_FILENAME, bytes))
}

#[utoipa::path(
    post,
    path = "/export/csv",
    tag = "reports",
    request_body = JobTable,
    responses((status = 200, description = "Comma-separated table", body = String, content_type = "text/csv"))
)]
pub async fn export_csv(
    table: Result<Json<JobTable>, JsonRejection>,
) -> Result<impl IntoResponse, AppError> {
    let Json(table) = table?;
    let bytes = export::to_csv(&table)?;
    tracing::info!(rows = table.len(), "Exported CSV");
    Ok(attachment(export::CSV_CONTENT_TYPE, CSV_FILENAME, bytes))
}

#[utoipa::path(
    post,
    path = "/analysis",
    tag = "reports",
    request_body = AnalysisRequest,
    responses((status = 200, description = "Summary figures and frequent terms", body = AnalysisReport))
)]
pub async fn analyze(
    payload: Result<Json<AnalysisRequest>, JsonRejection>,
) -> Result<Json<AnalysisReport>, AppError> {
    let Json(payload) = payload?;
    Ok(Json(analysis::analyze(&payload.table, &payload.filter)))
}

fn attachment(content_type: &'static str, filename: &str, bytes: Vec<u8>) -> impl IntoResponse {
    (
        [
            (header::CONTENT_TYPE, content_type.to_string()),
            (
                header::CONTENT_DISPOSITION,
                format!("attachment; filename=\"{filename}\""),
            ),
        ],
        bytes,
    )
}
