//! HTTP handler functions for the correlation API.

use std::sync::Arc;

use actix_web::{HttpResponse, web};
use crime_corr_analytics::snapshot::{Published, Snapshot};
use crime_corr_analytics::{AnalyticsError, association, links as link_map, summary};
use crime_corr_analytics_models::QueryOutcome;
use crime_corr_crime_models::{Event, EventFilter};
use crime_corr_server_models::{
    ApiAssociation, ApiContingency, ApiEmpty, ApiError, ApiHealth, ApiReload, DEFAULT_ALPHA,
    EventQueryParams, LinksQuery, SummaryQuery,
};
use serde::Serialize;

use crate::AppState;

/// Returns the published snapshot, or a `503` response when there is none.
fn current(state: &AppState) -> Result<Arc<Snapshot>, HttpResponse> {
    state.store.current().ok_or_else(|| {
        HttpResponse::ServiceUnavailable().json(ApiError::new("No dataset loaded"))
    })
}

fn error_response(e: &AnalyticsError) -> HttpResponse {
    match e {
        AnalyticsError::UnknownCity { .. } => HttpResponse::NotFound().json(ApiError::new(e.to_string())),
        AnalyticsError::EmptyDataset { .. } => {
            HttpResponse::UnprocessableEntity().json(ApiError::new(e.to_string()))
        }
        AnalyticsError::Source(_) | AnalyticsError::StagePanicked { .. } | AnalyticsError::Conversion { .. } => {
            log::error!("Request failed: {e}");
            HttpResponse::InternalServerError().json(ApiError::new(e.to_string()))
        }
    }
}

fn outcome_response<T: Serialize>(outcome: QueryOutcome<T>, empty_message: &str) -> HttpResponse {
    match outcome {
        QueryOutcome::Rows(rows) => HttpResponse::Ok().json(rows),
        QueryOutcome::Empty => HttpResponse::Ok().json(ApiEmpty::new(empty_message)),
    }
}

/// Runs a blocking event query on the actix blocking pool.
async fn query_events(
    state: &web::Data<AppState>,
    filter: EventFilter,
) -> Result<Vec<Event>, HttpResponse> {
    let source = Arc::clone(&state.source);
    match web::block(move || source.events(&filter)).await {
        Ok(Ok(events)) => Ok(events),
        Ok(Err(e)) => Err(error_response(&AnalyticsError::from(e))),
        Err(e) => {
            log::error!("Event query task failed: {e}");
            Err(HttpResponse::InternalServerError().json(ApiError::new("Event query failed")))
        }
    }
}

/// `GET /api/health`
pub async fn health(state: web::Data<AppState>) -> HttpResponse {
    HttpResponse::Ok().json(ApiHealth {
        healthy: true,
        version: env!("CARGO_PKG_VERSION").to_string(),
        snapshot_loaded: state.store.current().is_some(),
        generation: state.store.generation(),
    })
}

/// `GET /api/dataset`
pub async fn dataset(state: web::Data<AppState>) -> HttpResponse {
    match current(&state) {
        Ok(snapshot) => HttpResponse::Ok().json(snapshot.info()),
        Err(response) => response,
    }
}

/// `GET /api/contingency`
pub async fn contingency(state: web::Data<AppState>) -> HttpResponse {
    match current(&state) {
        Ok(snapshot) => HttpResponse::Ok().json(ApiContingency::from(snapshot.contingency())),
        Err(response) => response,
    }
}

/// `GET /api/association`
///
/// Chi-square result with a verdict at the 5% level.
pub async fn association(state: web::Data<AppState>) -> HttpResponse {
    match current(&state) {
        Ok(snapshot) => {
            let result = snapshot.association().clone();
            HttpResponse::Ok().json(ApiAssociation {
                alpha: DEFAULT_ALPHA,
                significant: result.is_significant(DEFAULT_ALPHA),
                interpretation: association::interpret(&result, DEFAULT_ALPHA),
                result,
            })
        }
        Err(response) => response,
    }
}

/// `GET /api/correlation`
pub async fn correlation(state: web::Data<AppState>) -> HttpResponse {
    match current(&state) {
        Ok(snapshot) => HttpResponse::Ok().json(snapshot.correlation()),
        Err(response) => response,
    }
}

/// `GET /api/fingerprints`
pub async fn fingerprints(state: web::Data<AppState>) -> HttpResponse {
    match current(&state) {
        Ok(snapshot) => HttpResponse::Ok().json(snapshot.fingerprints()),
        Err(response) => response,
    }
}

/// `GET /api/centroids`
pub async fn centroids(state: web::Data<AppState>) -> HttpResponse {
    match current(&state) {
        Ok(snapshot) => HttpResponse::Ok().json(snapshot.centroids()),
        Err(response) => response,
    }
}

/// `GET /api/centroids/{city}`
pub async fn centroid(state: web::Data<AppState>, path: web::Path<String>) -> HttpResponse {
    let snapshot = match current(&state) {
        Ok(snapshot) => snapshot,
        Err(response) => return response,
    };
    let city = path.into_inner();

    snapshot.centroid(&city).map_or_else(
        || error_response(&AnalyticsError::UnknownCity { city: city.clone() }),
        |c| HttpResponse::Ok().json(c),
    )
}

/// `GET /api/links`
///
/// Correlation links between city centroids, optionally limited to the
/// links touching `?city=`.
pub async fn links(state: web::Data<AppState>, query: web::Query<LinksQuery>) -> HttpResponse {
    let snapshot = match current(&state) {
        Ok(snapshot) => snapshot,
        Err(response) => return response,
    };

    match link_map::correlation_links(&snapshot, query.city.as_deref()) {
        Ok(map) => HttpResponse::Ok().json(map),
        Err(e) => error_response(&e),
    }
}

/// `GET /api/cities/{city}/summary`
pub async fn city_summary(
    state: web::Data<AppState>,
    path: web::Path<String>,
    query: web::Query<SummaryQuery>,
) -> HttpResponse {
    if let Err(response) = current(&state) {
        return response;
    }
    let city = path.into_inner();
    let filter = EventFilter::for_city(city.clone()).between(query.from, query.to);

    match query_events(&state, filter).await {
        Ok(events) => outcome_response(
            summary::city_summary(&events, &city),
            &format!("No offenses recorded for {city}"),
        ),
        Err(response) => response,
    }
}

/// `GET /api/offenses/{offense}/summary`
pub async fn offense_summary(
    state: web::Data<AppState>,
    path: web::Path<String>,
    query: web::Query<SummaryQuery>,
) -> HttpResponse {
    if let Err(response) = current(&state) {
        return response;
    }
    let offense = path.into_inner();
    let filter = EventFilter::for_offense_type(offense.clone()).between(query.from, query.to);

    match query_events(&state, filter).await {
        Ok(events) => outcome_response(
            summary::offense_summary(&events, &offense),
            &format!("No {offense} offenses recorded"),
        ),
        Err(response) => response,
    }
}

/// `GET /api/events`
///
/// Events matching `cities`, `offenses`, `from`, `to`, and `limit`.
pub async fn events(
    state: web::Data<AppState>,
    params: web::Query<EventQueryParams>,
) -> HttpResponse {
    if let Err(response) = current(&state) {
        return response;
    }

    match query_events(&state, params.to_filter()).await {
        Ok(events) => outcome_response(
            summary::listing(events),
            "No offenses recorded for the selected filters",
        ),
        Err(response) => response,
    }
}

/// `GET /api/diagnostics`
pub async fn diagnostics(state: web::Data<AppState>) -> HttpResponse {
    match current(&state) {
        Ok(snapshot) => HttpResponse::Ok().json(snapshot.diagnostics()),
        Err(response) => response,
    }
}

/// `POST /api/reload`
///
/// Rebuilds the snapshot and swaps it in. On failure the previous snapshot
/// keeps being served.
pub async fn reload(state: web::Data<AppState>) -> HttpResponse {
    match web::block(move || state.reload()).await {
        Ok(Ok(Published {
            generation,
            snapshot,
        })) => HttpResponse::Ok().json(ApiReload {
            generation,
            built_at: snapshot.built_at(),
            total_events: snapshot.info().total_events,
            diagnostics: snapshot.diagnostics().len(),
        }),
        Ok(Err(e)) => error_response(&e),
        Err(e) => {
            log::error!("Reload task failed: {e}");
            HttpResponse::InternalServerError().json(ApiError::new("Reload failed"))
        }
    }
}
