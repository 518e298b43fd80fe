mod tables;

use std::env;
use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use axum::body::Body;
use axum::extract::{Path as AxumPath, Query, State};
use axum::http::{HeaderMap, HeaderValue, Method, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use axum::Router;
use formats::{content_digest, parse_region_collection};
use layers::{classify_all, ChoroplethStyle, LevelCounts};
use scene::{parse_salary, LocationIndex, RegionCollection};
use serde::{Deserialize, Serialize};
use serde_json::json;
use streaming::{validate_key, DirectorySource, FetchError, FetchErrorKind};
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

use crate::tables::TableCache;

#[derive(Clone)]
struct AppState {
    data_root: PathBuf,
    counties: Arc<Counties>,
    tables: Arc<TableCache>,
    style: ChoroplethStyle,
    default_salary: f64,
}

/// The base region collection as served and as indexed.
struct Counties {
    geojson: String,
    digest: String,
    collection: Arc<RegionCollection>,
    index: LocationIndex,
}

#[derive(Debug, Deserialize)]
struct ClassifyQuery {
    salary: Option<String>,
    #[serde(default)]
    lottery: bool,
}

#[derive(Debug, Serialize)]
struct RegionLevel<'a> {
    id: &'a str,
    has_data: bool,
    level: Option<u8>,
}

#[derive(Debug, Serialize)]
struct ClassifyResponse<'a> {
    occupation: &'a str,
    salary: f64,
    counts: LevelCounts,
    regions: Vec<RegionLevel<'a>>,
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    if let Err(err) = run().await {
        error!("{err}");
        std::process::exit(1);
    }
}

async fn run() -> Result<(), String> {
    let data_root = PathBuf::from(env::var("WAGEMAP_DATA_ROOT").unwrap_or_else(|_| "data".to_string()));
    let counties_path = env::var("WAGEMAP_COUNTIES")
        .map(PathBuf::from)
        .unwrap_or_else(|_| data_root.join("counties.geojson"));
    let addr: SocketAddr = env::var("WAGEMAP_ADDR")
        .unwrap_or_else(|_| "127.0.0.1:9200".to_string())
        .parse()
        .map_err(|e| format!("invalid WAGEMAP_ADDR: {e}"))?;

    let counties = load_counties(&counties_path).await?;
    info!(
        regions = counties.collection.len(),
        states = counties.index.state_abbrevs().len(),
        digest = %counties.digest,
        "loaded {}",
        counties_path.display()
    );

    let state = AppState {
        tables: Arc::new(TableCache::new(Arc::new(DirectorySource::new(&data_root)))),
        data_root,
        counties: Arc::new(counties),
        style: ChoroplethStyle::default(),
        default_salary: env_var_f64("WAGEMAP_DEFAULT_SALARY", 150_000.0),
    };

    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_headers(Any)
        .allow_methods([Method::GET, Method::OPTIONS]);

    let app = Router::new()
        .route("/healthz", get(healthz))
        .route("/counties.geojson", get(get_counties))
        .route("/data/soc_codes.json", get(get_occupations))
        .route("/data/soc/:file", get(get_table_file))
        .route("/api/status", get(get_status))
        .route("/api/style", get(get_style))
        .route("/api/states", get(get_states))
        .route("/api/states/:abbr", get(get_state))
        .route("/api/classify/:key", get(get_classification))
        .route("/api/popup/:key/:id", get(get_popup))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state);

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .map_err(|e| format!("bind {addr}: {e}"))?;
    info!("wagemap server listening on http://{addr}");
    axum::serve(listener, app)
        .await
        .map_err(|e| format!("server error: {e}"))
}

async fn load_counties(path: &Path) -> Result<Counties, String> {
    let geojson = tokio::fs::read_to_string(path)
        .await
        .map_err(|e| format!("read {}: {e}", path.display()))?;
    Counties::from_geojson(geojson).map_err(|e| format!("{}: {e}", path.display()))
}

impl Counties {
    fn from_geojson(geojson: String) -> Result<Self, String> {
        let collection = parse_region_collection(&geojson).map_err(|e| e.to_string())?;
        let collection = Arc::new(collection);
        let index = LocationIndex::build(Arc::clone(&collection));
        Ok(Counties {
            digest: content_digest(geojson.as_bytes()),
            geojson,
            collection,
            index,
        })
    }
}

async fn healthz() -> Response {
    (StatusCode::OK, "ok").into_response()
}

async fn get_counties(State(state): State<AppState>) -> Response {
    with_content_type(
        "application/geo+json",
        Body::from(state.counties.geojson.clone()),
    )
}

async fn get_occupations(State(state): State<AppState>) -> Response {
    serve_file(&state.data_root.join("soc_codes.json"), "application/json").await
}

async fn get_table_file(
    State(state): State<AppState>,
    AxumPath(file): AxumPath<String>,
) -> Response {
    let Some(key) = table_key_from_file(&file) else {
        return (StatusCode::BAD_REQUEST, "invalid occupation key").into_response();
    };
    let path = state.data_root.join("soc").join(format!("{key}.json"));
    serve_file(&path, "application/json").await
}

async fn get_status(State(state): State<AppState>) -> Response {
    let counties = &state.counties;
    json_response(&json!({
        "status": "ready",
        "regions": counties.collection.len(),
        "states": counties.index.state_abbrevs().len(),
        "counties_digest": counties.digest,
        "cached_tables": state.tables.len(),
    }))
}

async fn get_style(State(state): State<AppState>) -> Response {
    let legend: Vec<_> = state
        .style
        .legend()
        .into_iter()
        .map(|(label, color)| json!({ "label": label, "color": color }))
        .collect();
    json_response(&json!({ "style": state.style, "legend": legend }))
}

async fn get_states(State(state): State<AppState>) -> Response {
    json_response(&state.counties.index.state_abbrevs())
}

async fn get_state(State(state): State<AppState>, AxumPath(abbr): AxumPath<String>) -> Response {
    let abbr = abbr.to_ascii_uppercase();
    let index = &state.counties.index;
    let counties = index.counties(&abbr);
    if counties.is_empty() {
        return (StatusCode::NOT_FOUND, "unknown state").into_response();
    }
    let options: Vec<_> = counties
        .iter()
        .map(|c| json!({ "name": c.name, "id": c.id.as_str() }))
        .collect();
    json_response(&json!({
        "state": abbr,
        "counties": options,
        "bounds": index.state_bounds(&abbr).map(|b| b.to_corners()),
    }))
}

async fn get_classification(
    State(state): State<AppState>,
    AxumPath(key): AxumPath<String>,
    Query(query): Query<ClassifyQuery>,
) -> Response {
    let salary = match resolve_salary(query.salary.as_deref(), state.default_salary) {
        Ok(s) => s,
        Err(resp) => return resp,
    };
    let table = match state.tables.get(&key).await {
        Ok(t) => t,
        Err(err) => return fetch_error_response(&key, &err),
    };
    let Some(view) = classify_all(&table, &state.counties.collection, salary) else {
        return (StatusCode::BAD_REQUEST, "invalid salary").into_response();
    };

    let regions = view
        .iter()
        .map(|(feature, c)| RegionLevel {
            id: feature.id.as_str(),
            has_data: c.has_data,
            level: c.level.map(|l| l.number()),
        })
        .collect();
    json_response(&ClassifyResponse {
        occupation: &key,
        salary,
        counts: view.counts(),
        regions,
    })
}

async fn get_popup(
    State(state): State<AppState>,
    AxumPath((key, id)): AxumPath<(String, String)>,
    Query(query): Query<ClassifyQuery>,
) -> Response {
    if !state.counties.index.contains(&id) {
        return (StatusCode::NOT_FOUND, "unknown region").into_response();
    }
    let salary = match resolve_salary(query.salary.as_deref(), state.default_salary) {
        Ok(s) => s,
        Err(resp) => return resp,
    };
    let table = match state.tables.get(&key).await {
        Ok(t) => t,
        Err(err) => return fetch_error_response(&key, &err),
    };
    let content = classify_all(&table, &state.counties.collection, salary)
        .and_then(|view| view.popup_content(&id, query.lottery, &state.style));
    match content {
        Some(content) => json_response(&content),
        None => (StatusCode::NOT_FOUND, "unknown region").into_response(),
    }
}

/// `"15-1252.json"` → `"15-1252"`, if the key is well formed.
fn table_key_from_file(file: &str) -> Option<&str> {
    let key = file.strip_suffix(".json")?;
    validate_key(key).ok()
}

/// Missing salary falls back to the default; blank or malformed is rejected.
fn resolve_salary(raw: Option<&str>, default: f64) -> Result<f64, Response> {
    let Some(raw) = raw else {
        return Ok(default);
    };
    match parse_salary(raw) {
        Ok(Some(salary)) => Ok(salary),
        Ok(None) => Err((StatusCode::BAD_REQUEST, "salary is empty").into_response()),
        Err(err) => Err((StatusCode::BAD_REQUEST, err.to_string()).into_response()),
    }
}

fn fetch_status(err: &FetchError) -> StatusCode {
    match err.kind {
        FetchErrorKind::InvalidKey => StatusCode::BAD_REQUEST,
        FetchErrorKind::NotFound => StatusCode::NOT_FOUND,
        FetchErrorKind::Http(_) | FetchErrorKind::Transport => StatusCode::BAD_GATEWAY,
        FetchErrorKind::Io | FetchErrorKind::Parse | FetchErrorKind::Aborted => {
            StatusCode::INTERNAL_SERVER_ERROR
        }
    }
}

fn fetch_error_response(key: &str, err: &FetchError) -> Response {
    let status = fetch_status(err);
    if status.is_server_error() {
        warn!("wage table {key} failed: {err}");
    }
    (status, err.to_string()).into_response()
}

fn json_response<T: Serialize + ?Sized>(value: &T) -> Response {
    match serde_json::to_string(value) {
        Ok(body) => with_content_type("application/json", Body::from(body)),
        Err(err) => {
            error!("response serialization failed: {err}");
            (StatusCode::INTERNAL_SERVER_ERROR, "serialization error").into_response()
        }
    }
}

fn with_content_type(content_type: &'static str, body: Body) -> Response {
    let mut headers = HeaderMap::new();
    headers.insert(
        http::header::CONTENT_TYPE,
        HeaderValue::from_static(content_type),
    );
    (StatusCode::OK, headers, body).into_response()
}

async fn serve_file(path: &Path, content_type: &'static str) -> Response {
    match tokio::fs::read(path).await {
        Ok(data) => with_content_type(content_type, Body::from(data)),
        Err(err) => {
            warn!("file read failed: {path:?} -> {err}");
            (StatusCode::NOT_FOUND, "not found").into_response()
        }
    }
}

fn env_var_f64(key: &str, default: f64) -> f64 {
    env::var(key)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}

#[cfg(test)]
mod tests {
    use std::path::PathBuf;
    use std::sync::Arc;

    use axum::extract::{Path as AxumPath, Query, State};
    use axum::http::StatusCode;
    use axum::response::Response;
    use layers::ChoroplethStyle;
    use scene::{LevelThresholds, WageThresholdTable};
    use serde_json::Value;
    use streaming::{FetchError, FetchErrorKind, MemorySource};

    use super::{
        fetch_status, get_classification, get_popup, resolve_salary, table_key_from_file,
        AppState, ClassifyQuery, Counties,
    };
    use crate::tables::TableCache;

    const COUNTIES: &str = r#"{
      "type": "FeatureCollection",
      "features": [
        {"type": "Feature",
         "properties": {"STATEFP": "06", "NAME": "Los Angeles", "GEOID": "06037"},
         "geometry": {"type": "Polygon", "coordinates": [[[-119, 34], [-117, 34], [-117, 36], [-119, 34]]]}},
        {"type": "Feature",
         "properties": {"STATEFP": "99", "NAME": "Nowhere", "GEOID": "99001"},
         "geometry": null}
      ]
    }"#;

    async fn app_state() -> AppState {
        let source = MemorySource::new();
        let table: WageThresholdTable = [(
            "CA|los angeles",
            LevelThresholds::new(Some(40.0), Some(55.0), Some(70.0), Some(90.0)),
        )]
        .into_iter()
        .collect();
        source.set_table("15-1252", table).await;
        AppState {
            data_root: PathBuf::from("unused"),
            counties: Arc::new(Counties::from_geojson(COUNTIES.to_string()).expect("counties")),
            tables: Arc::new(TableCache::new(Arc::new(source))),
            style: ChoroplethStyle::default(),
            default_salary: 150_000.0,
        }
    }

    fn query(salary: Option<&str>, lottery: bool) -> Query<ClassifyQuery> {
        Query(ClassifyQuery {
            salary: salary.map(str::to_string),
            lottery,
        })
    }

    async fn json_body(resp: Response) -> Value {
        let bytes = axum::body::to_bytes(resp.into_body(), usize::MAX)
            .await
            .expect("body");
        serde_json::from_slice(&bytes).expect("json")
    }

    #[tokio::test]
    async fn classification_uses_default_salary_when_absent() {
        let state = app_state().await;
        let resp = get_classification(
            State(state),
            AxumPath("15-1252".to_string()),
            query(None, false),
        )
        .await;
        assert_eq!(resp.status(), StatusCode::OK);

        let body = json_body(resp).await;
        assert_eq!(body["salary"].as_f64(), Some(150_000.0));
        assert_eq!(body["counts"]["level_iii"], 1);
        assert_eq!(body["counts"]["no_data"], 1);
        assert_eq!(body["regions"][0]["id"], "06037");
        assert_eq!(body["regions"][0]["level"], 3);
        assert_eq!(body["regions"][1]["has_data"], false);
    }

    #[tokio::test]
    async fn classification_rejects_blank_salary_and_unknown_table() {
        let state = app_state().await;
        let blank = get_classification(
            State(state.clone()),
            AxumPath("15-1252".to_string()),
            query(Some(""), false),
        )
        .await;
        assert_eq!(blank.status(), StatusCode::BAD_REQUEST);

        let missing = get_classification(
            State(state),
            AxumPath("99-9999".to_string()),
            query(None, false),
        )
        .await;
        assert_eq!(missing.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn popup_serves_indexed_regions_only() {
        let state = app_state().await;
        let ok = get_popup(
            State(state.clone()),
            AxumPath(("15-1252".to_string(), "06037".to_string())),
            query(Some("95,000"), true),
        )
        .await;
        assert_eq!(ok.status(), StatusCode::OK);
        let body = json_body(ok).await;
        assert_eq!(body["label"], "Level I");
        assert_eq!(body["title"], "Los Angeles, CA");

        let unindexed = get_popup(
            State(state.clone()),
            AxumPath(("15-1252".to_string(), "99001".to_string())),
            query(None, false),
        )
        .await;
        assert_eq!(unindexed.status(), StatusCode::NOT_FOUND);

        let blank = get_popup(
            State(state),
            AxumPath(("15-1252".to_string(), "06037".to_string())),
            query(Some("  "), false),
        )
        .await;
        assert_eq!(blank.status(), StatusCode::BAD_REQUEST);
    }

    #[test]
    fn table_files_map_to_keys() {
        assert_eq!(table_key_from_file("15-1252.json"), Some("15-1252"));
        assert_eq!(table_key_from_file("15-1252"), None);
        assert_eq!(table_key_from_file("..%2F.json"), None);
        assert_eq!(table_key_from_file(".json"), None);
    }

    #[test]
    fn salary_query_defaults_and_validates() {
        assert_eq!(resolve_salary(None, 150_000.0).ok(), Some(150_000.0));
        assert_eq!(resolve_salary(Some("95,000"), 150_000.0).ok(), Some(95_000.0));
        let blank = resolve_salary(Some(""), 1.0).expect_err("blank");
        assert_eq!(blank.status(), StatusCode::BAD_REQUEST);
        let junk = resolve_salary(Some("lots"), 1.0).expect_err("junk");
        assert_eq!(junk.status(), StatusCode::BAD_REQUEST);
    }

    #[test]
    fn fetch_failures_map_to_statuses() {
        let status = |kind| fetch_status(&FetchError::new(kind, "x"));
        assert_eq!(status(FetchErrorKind::NotFound), StatusCode::NOT_FOUND);
        assert_eq!(status(FetchErrorKind::InvalidKey), StatusCode::BAD_REQUEST);
        assert_eq!(status(FetchErrorKind::Http(503)), StatusCode::BAD_GATEWAY);
        assert_eq!(status(FetchErrorKind::Parse), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(status(FetchErrorKind::Aborted), StatusCode::INTERNAL_SERVER_ERROR);
    }
}
