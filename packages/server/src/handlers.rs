//! HTTP handler functions for the crisis map API.

use actix_web::{HttpResponse, web};
use crisis_map_cluster::{
    ClickOutcome, ClusterId, ClusterIndex, FeatureClick, to_feature_collection,
};
use crisis_map_crisis_models::{Category, Charity, Crisis, CrisisId, Severity};
use crisis_map_filter::{FilterState, filter_crises, sort_by_priority};
use crisis_map_server_models::{
    ApiError, ApiHealth, ApiTaxonomy, CharityListResponse, CharityQueryParams, ClusterQueryParams,
    CrisisListResponse, CrisisQueryParams, CrisisSort, ExpansionResponse,
};

use crate::AppState;

/// `GET /api/health`
pub async fn health() -> HttpResponse {
    HttpResponse::Ok().json(ApiHealth {
        healthy: true,
        version: env!("CARGO_PKG_VERSION").to_string(),
    })
}

/// `GET /api/categories`
///
/// Returns the categories with their marker colors and the severity
/// levels, least severe first.
pub async fn categories() -> HttpResponse {
    HttpResponse::Ok().json(ApiTaxonomy {
        categories: Category::all().iter().map(|&c| c.into()).collect(),
        severities: Severity::all().iter().map(|&s| s.into()).collect(),
    })
}

/// `GET /api/crises`
///
/// Filters crises by search text, category, and severity. `total` counts
/// every match; `limit` only truncates the returned list.
pub async fn crises(
    state: web::Data<AppState>,
    params: web::Query<CrisisQueryParams>,
) -> HttpResponse {
    let filters = match parse_filters(
        params.q.as_deref(),
        params.category.as_deref(),
        params.severity.as_deref(),
    ) {
        Ok(filters) => filters,
        Err(message) => return bad_request(message),
    };

    let mut matched = filter_crises(&state.snapshot.crises, &filters);
    if params.sort.unwrap_or_default() == CrisisSort::Priority {
        sort_by_priority(&mut matched);
    }

    let total = matched.len();
    let crises: Vec<Crisis> = matched
        .into_iter()
        .take(params.limit.unwrap_or(usize::MAX))
        .cloned()
        .collect();

    HttpResponse::Ok().json(CrisisListResponse { crises, total })
}

/// `GET /api/crises/{id}`
pub async fn crisis(state: web::Data<AppState>, path: web::Path<CrisisId>) -> HttpResponse {
    let id = path.into_inner();
    state.snapshot.crisis(id).map_or_else(
        || not_found(format!("Crisis {id} not found")),
        |crisis| HttpResponse::Ok().json(crisis),
    )
}

/// `GET /api/charities`
///
/// Lists every charity, or only those supporting `crisisId`.
pub async fn charities(
    state: web::Data<AppState>,
    params: web::Query<CharityQueryParams>,
) -> HttpResponse {
    let charities: Vec<Charity> = match params.crisis_id {
        Some(id) => state
            .charity_index
            .lookup(&state.snapshot.charities, id)
            .into_iter()
            .cloned()
            .collect(),
        None => state.snapshot.charities.clone(),
    };

    HttpResponse::Ok().json(CharityListResponse { charities })
}

/// `GET /api/charities/by-crisis/{id}`
pub async fn charities_by_crisis(
    state: web::Data<AppState>,
    path: web::Path<CrisisId>,
) -> HttpResponse {
    let id = path.into_inner();
    if state.snapshot.crisis(id).is_none() {
        return not_found(format!("Crisis {id} not found"));
    }

    let charities = state
        .charity_index
        .lookup(&state.snapshot.charities, id)
        .into_iter()
        .cloned()
        .collect();

    HttpResponse::Ok().json(CharityListResponse { charities })
}

/// `GET /api/clusters`
///
/// Clusters the filtered crises at `zoom` and returns a `GeoJSON`
/// `FeatureCollection`.
pub async fn clusters(
    state: web::Data<AppState>,
    params: web::Query<ClusterQueryParams>,
) -> HttpResponse {
    let index = match cluster_index(&state, &params) {
        Ok(index) => index,
        Err(message) => return bad_request(message),
    };

    let features = index.features(params.zoom.unwrap_or(0.0));
    HttpResponse::Ok().json(to_feature_collection(&features))
}

/// `GET /api/clusters/{zoom}/{seed}/expansion`
///
/// Returns where to fly to so that the cluster splits. The query must carry
/// the same filters the cluster was produced with.
pub async fn cluster_expansion(
    state: web::Data<AppState>,
    path: web::Path<(u8, usize)>,
    params: web::Query<ClusterQueryParams>,
) -> HttpResponse {
    let (zoom, seed) = path.into_inner();
    let id = ClusterId { zoom, seed };

    let index = match cluster_index(&state, &params) {
        Ok(index) => index,
        Err(message) => return bad_request(message),
    };

    match index.resolve_click(FeatureClick::Cluster { id }) {
        Some(ClickOutcome::Expand { center, zoom }) => {
            HttpResponse::Ok().json(ExpansionResponse { zoom, center })
        }
        _ => not_found(format!("Cluster {id} not found")),
    }
}

fn cluster_index(state: &AppState, params: &ClusterQueryParams) -> Result<ClusterIndex, String> {
    let filters = parse_filters(
        params.q.as_deref(),
        params.category.as_deref(),
        params.severity.as_deref(),
    )?;

    let mut options = state.cluster_options;
    if let Some(radius) = params.radius {
        if !radius.is_finite() || radius < 0.0 {
            return Err(format!("Invalid radius: {radius}"));
        }
        options.radius = radius;
    }

    Ok(ClusterIndex::from_crises(
        filter_crises(&state.snapshot.crises, &filters),
        options,
    ))
}

/// Builds a [`FilterState`] from query values. An empty category or
/// severity means "All".
fn parse_filters(
    q: Option<&str>,
    category: Option<&str>,
    severity: Option<&str>,
) -> Result<FilterState, String> {
    let category = category
        .filter(|s| !s.is_empty())
        .map(|s| {
            s.parse::<Category>()
                .map_err(|_| format!("Unknown category: {s}"))
        })
        .transpose()?;

    let severity = severity
        .filter(|s| !s.is_empty())
        .map(|s| {
            s.parse::<Severity>()
                .map_err(|_| format!("Unknown severity: {s}"))
        })
        .transpose()?;

    Ok(FilterState::default()
        .with_search(q.unwrap_or_default())
        .with_category(category)
        .with_severity(severity))
}

fn bad_request(message: String) -> HttpResponse {
    log::debug!("Rejecting request: {message}");
    HttpResponse::BadRequest().json(ApiError::new(message))
}

fn not_found(message: String) -> HttpResponse {
    HttpResponse::NotFound().json(ApiError::new(message))
}

#[cfg(test)]
mod tests {
    use actix_web::{App, http::StatusCode, test, web};
    use crisis_map_cluster::ClusterOptions;
    use crisis_map_source::{FixtureSource, load_snapshot};
    use serde_json::Value;

    use crate::{AppState, configure};

    async fn fixture_state() -> web::Data<AppState> {
        let outcome = load_snapshot(&FixtureSource::new()).await;
        web::Data::new(AppState::new(outcome.snapshot, ClusterOptions::default()))
    }

    async fn get(uri: &str) -> (StatusCode, Value) {
        let app = test::init_service(
            App::new()
                .app_data(fixture_state().await)
                .configure(configure),
        )
        .await;
        let req = test::TestRequest::get().uri(uri).to_request();
        let resp = test::call_service(&app, req).await;
        let status = resp.status();
        let body: Value = test::read_body_json(resp).await;
        (status, body)
    }

    fn ids(body: &Value, field: &str) -> Vec<i64> {
        body[field]
            .as_array()
            .unwrap()
            .iter()
            .map(|c| c["id"].as_i64().unwrap())
            .collect()
    }

    #[actix_web::test]
    async fn health_reports_version() {
        let (status, body) = get("/api/health").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["healthy"], true);
        assert_eq!(body["version"], env!("CARGO_PKG_VERSION"));
    }

    #[actix_web::test]
    async fn categories_list_taxonomy() {
        let (status, body) = get("/api/categories").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["categories"].as_array().unwrap().len(), 5);
        assert_eq!(body["categories"][0]["name"], "Conflict");
        assert_eq!(body["severities"][0]["name"], "Low");
        assert_eq!(body["severities"][3]["rank"], 4);
    }

    #[actix_web::test]
    async fn crises_without_filters_returns_everything() {
        let (status, body) = get("/api/crises").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["total"], 15);
        assert_eq!(ids(&body, "crises"), (1..=15).collect::<Vec<_>>());
    }

    #[actix_web::test]
    async fn crises_search_is_case_insensitive() {
        let (_, body) = get("/api/crises?q=SYRIA").await;
        assert_eq!(ids(&body, "crises"), vec![1, 2]);
    }

    #[actix_web::test]
    async fn crises_filters_compose() {
        let (_, body) = get("/api/crises?category=conflict").await;
        assert_eq!(ids(&body, "crises"), vec![1, 6, 14]);

        let (_, body) = get("/api/crises?category=Humanitarian&severity=Medium").await;
        assert_eq!(ids(&body, "crises"), vec![15]);
    }

    #[actix_web::test]
    async fn crises_priority_sort_and_limit() {
        let (status, body) = get("/api/crises?sort=priority&limit=3").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["total"], 15);
        assert_eq!(ids(&body, "crises"), vec![14, 2, 6]);
    }

    #[actix_web::test]
    async fn crises_rejects_unknown_category() {
        let (status, body) = get("/api/crises?category=Bogus").await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(body["error"].as_str().unwrap().contains("Bogus"));
    }

    #[actix_web::test]
    async fn malformed_query_values_return_json_errors() {
        let (status, body) = get("/api/crises?sort=newest").await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(body["error"].as_str().unwrap().contains("newest"));

        for uri in [
            "/api/crises?limit=x",
            "/api/clusters?zoom=abc",
            "/api/charities?crisisId=one",
        ] {
            let (status, body) = get(uri).await;
            assert_eq!(status, StatusCode::BAD_REQUEST, "{uri}");
            assert!(body["error"].is_string(), "{uri}");
        }
    }

    #[actix_web::test]
    async fn crisis_by_id() {
        let (status, body) = get("/api/crises/3").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["title"], "Yemen Humanitarian Crisis");

        let (status, _) = get("/api/crises/999").await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[actix_web::test]
    async fn charities_filter_by_crisis() {
        let (_, body) = get("/api/charities").await;
        assert_eq!(body["charities"].as_array().unwrap().len(), 22);

        let (_, body) = get("/api/charities?crisisId=1").await;
        let charities = body["charities"].as_array().unwrap();
        assert_eq!(charities.len(), 2);
        assert!(charities.iter().all(|c| c["crisis_id"] == 1));

        let (_, body) = get("/api/charities?crisisId=999").await;
        assert!(body["charities"].as_array().unwrap().is_empty());
    }

    #[actix_web::test]
    async fn charities_by_crisis_requires_known_crisis() {
        let (status, body) = get("/api/charities/by-crisis/7").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["charities"].as_array().unwrap().len(), 1);

        let (status, _) = get("/api/charities/by-crisis/999").await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[actix_web::test]
    async fn clusters_conserve_points() {
        let (status, body) = get("/api/clusters?zoom=0").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["type"], "FeatureCollection");

        let features = body["features"].as_array().unwrap();
        assert!(features.iter().any(|f| f["properties"]["cluster"] == true));

        let total: u64 = features
            .iter()
            .map(|f| f["properties"]["point_count"].as_u64().unwrap_or(1))
            .sum();
        assert_eq!(total, 15);
    }

    #[actix_web::test]
    async fn clusters_dissolve_at_max_zoom() {
        let (_, body) = get("/api/clusters?zoom=14").await;
        let features = body["features"].as_array().unwrap();
        assert_eq!(features.len(), 15);
        assert!(features.iter().all(|f| f["properties"]["cluster"] == false));
    }

    #[actix_web::test]
    async fn clusters_respect_filters() {
        let (_, body) = get("/api/clusters?zoom=14&severity=Medium").await;
        assert_eq!(body["features"].as_array().unwrap().len(), 2);

        let (status, _) = get("/api/clusters?severity=Extreme").await;
        assert_eq!(status, StatusCode::BAD_REQUEST);

        let (status, _) = get("/api/clusters?radius=-1").await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[actix_web::test]
    async fn cluster_expansion_zooms_in() {
        let (_, body) = get("/api/clusters?zoom=0").await;
        let cluster = body["features"]
            .as_array()
            .unwrap()
            .iter()
            .find(|f| f["properties"]["cluster"] == true)
            .unwrap()
            .clone();
        let seed = cluster["properties"]["cluster_seed"].as_u64().unwrap();

        let (status, body) = get(&format!("/api/clusters/0/{seed}/expansion")).await;
        assert_eq!(status, StatusCode::OK);
        let zoom = body["zoom"].as_u64().unwrap();
        assert!(zoom > 0 && zoom <= 14, "unexpected expansion zoom {zoom}");
        assert_eq!(
            body["center"]["lng"],
            cluster["geometry"]["coordinates"][0]
        );
    }

    #[actix_web::test]
    async fn cluster_expansion_unknown_cluster() {
        let (status, _) = get("/api/clusters/0/999/expansion").await;
        assert_eq!(status, StatusCode::NOT_FOUND);

        let (status, _) = get("/api/clusters/14/0/expansion").await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }
}
