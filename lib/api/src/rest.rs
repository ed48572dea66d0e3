use actix_cors::Cors;
use actix_web::{web, App, HttpResponse, HttpServer, Result as ActixResult};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::sync::Arc;
use tracing::error;
use unicat_core::{Record, SourcePredicate, UnifiedRecord};
use unicat_engine::{EtlEngine, QueryFederation, UnifiedQuery};

/// Shared handler state
pub struct AppState {
    pub engine: Arc<EtlEngine>,
    pub federation: Arc<QueryFederation>,
}

impl AppState {
    pub fn new(engine: Arc<EtlEngine>) -> Self {
        let federation = Arc::new(QueryFederation::from_engine(&engine));
        Self { engine, federation }
    }
}

#[derive(Deserialize)]
struct SearchRequest {
    #[serde(default)]
    filters: UnifiedQuery,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct SearchResponse {
    results: Vec<UnifiedRecord>,
    total_count: usize,
}

#[derive(Deserialize)]
struct FederatedRequest {
    predicates: BTreeMap<String, Option<SourcePredicate>>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct FederatedResponse {
    results_by_source: BTreeMap<String, Option<Vec<Record>>>,
    total_count: usize,
}

pub struct RestApi;

impl RestApi {
    pub async fn start(state: Arc<AppState>, port: u16) -> std::io::Result<()> {
        let state = web::Data::from(state);
        HttpServer::new(move || {
            let cors = Cors::default()
                .allow_any_origin()
                .allow_any_method()
                .allow_any_header()
                .max_age(3600);

            App::new()
                .wrap(cors)
                .app_data(state.clone())
                .configure(configure)
        })
        .bind(("0.0.0.0", port))?
        .run()
        .await
    }
}

/// Register every route; state is supplied by the caller.
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.route("/health", web::get().to(health))
        .route("/etl/status", web::get().to(etl_status))
        .route("/etl/refresh", web::post().to(etl_refresh))
        .route("/etl/schema", web::get().to(etl_schema))
        .route("/unified/search", web::post().to(unified_search))
        .route("/query/federated", web::post().to(federated_query));
}

async fn health() -> ActixResult<HttpResponse> {
    Ok(HttpResponse::Ok().json(serde_json::json!({ "status": "ok" })))
}

async fn etl_status(state: web::Data<AppState>) -> ActixResult<HttpResponse> {
    Ok(HttpResponse::Ok().json(state.engine.stats()))
}

async fn etl_refresh(state: web::Data<AppState>) -> ActixResult<HttpResponse> {
    match state.engine.force_refresh().await {
        Ok(report) => Ok(HttpResponse::Ok().json(serde_json::json!({
            "message": "ETL refresh completed",
            "result": report
        }))),
        Err(e) => {
            error!(error = %e, "refresh failed");
            Ok(HttpResponse::InternalServerError().json(serde_json::json!({
                "error": e.to_string()
            })))
        }
    }
}

async fn etl_schema(state: web::Data<AppState>) -> ActixResult<HttpResponse> {
    Ok(HttpResponse::Ok().json(state.engine.unified_schema()))
}

async fn unified_search(
    state: web::Data<AppState>,
    req: web::Json<SearchRequest>,
) -> ActixResult<HttpResponse> {
    let results = state.engine.query(&req.filters);
    Ok(HttpResponse::Ok().json(SearchResponse {
        total_count: results.len(),
        results,
    }))
}

async fn federated_query(
    state: web::Data<AppState>,
    req: web::Json<FederatedRequest>,
) -> ActixResult<HttpResponse> {
    if req.predicates.is_empty() {
        return Ok(HttpResponse::BadRequest().json(serde_json::json!({
            "error": "predicates must name at least one source"
        })));
    }

    let results = state.federation.execute_federated(&req.predicates).await;
    Ok(HttpResponse::Ok().json(FederatedResponse {
        total_count: results.total_count(),
        results_by_source: results.by_source,
    }))
}
