//! JSON HTTP surface over the scheduling service.
//!
//! Every organization-scoped route reads the acting organization from the
//! `x-organization-id` header; the id must name a stored organization.

use std::sync::Arc;

use axum::extract::{Path, Query, State};
use axum::http::{HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, patch, post};
use axum::{Json, Router};
use chrono::{NaiveDate, NaiveTime};
use flock_core::error::FlockError;
use flock_core::models::availability::{UpdateAvailability, VolunteerAvailability};
use flock_core::models::opportunity::{CreateOpportunity, ServingOpportunity};
use flock_core::models::organization::{CreateOrganization, Organization};
use flock_core::models::shift::VolunteerShift;
use flock_core::models::volunteer::{BackgroundCheckStatus, CreateVolunteer, Volunteer};
use flock_core::repository::{OpportunityRepository, OrganizationRepository, VolunteerRepository};
use flock_db::repository::{
    SurrealAvailabilityRepository, SurrealOpportunityRepository, SurrealOrganizationRepository,
    SurrealShiftRepository, SurrealVolunteerRepository,
};
use flock_scheduling::{
    NewAvailability, OrgContext, ScheduleError, SchedulingConfig, SchedulingService,
    ShiftChanges, ShiftRequest,
};
use serde::Deserialize;
use serde_json::{Value, json};
use surrealdb::{Connection, Surreal};
use tower_http::trace::TraceLayer;
use tracing::error;
use uuid::Uuid;

pub const ORGANIZATION_HEADER: &str = "x-organization-id";

pub type Scheduler<C> = SchedulingService<
    SurrealVolunteerRepository<C>,
    SurrealOpportunityRepository<C>,
    SurrealShiftRepository<C>,
    SurrealAvailabilityRepository<C>,
>;

/// Shared state for the axum application.
#[derive(Clone)]
pub struct AppState<C: Connection> {
    organizations: SurrealOrganizationRepository<C>,
    volunteers: SurrealVolunteerRepository<C>,
    opportunities: SurrealOpportunityRepository<C>,
    scheduler: Arc<Scheduler<C>>,
}

impl<C: Connection> AppState<C> {
    pub fn new(db: Surreal<C>, config: SchedulingConfig) -> Self {
        let scheduler = SchedulingService::new(
            SurrealVolunteerRepository::new(db.clone()),
            SurrealOpportunityRepository::new(db.clone()),
            SurrealShiftRepository::new(db.clone()),
            SurrealAvailabilityRepository::new(db.clone()),
            config,
        );
        Self {
            organizations: SurrealOrganizationRepository::new(db.clone()),
            volunteers: SurrealVolunteerRepository::new(db.clone()),
            opportunities: SurrealOpportunityRepository::new(db),
            scheduler: Arc::new(scheduler),
        }
    }
}

pub fn router<C: Connection + Clone>(state: AppState<C>) -> Router {
    Router::new()
        .route("/api/v1/health", get(health))
        .route("/api/v1/organizations", post(create_organization::<C>))
        .route("/api/v1/organizations/:id", get(get_organization::<C>))
        .route("/api/v1/volunteers", post(create_volunteer::<C>))
        .route("/api/v1/volunteers/:id", get(get_volunteer::<C>))
        .route("/api/v1/volunteers/:id/shifts", get(volunteer_schedule::<C>))
        .route(
            "/api/v1/volunteers/:id/availability",
            get(list_availability::<C>).post(add_availability::<C>),
        )
        .route("/api/v1/opportunities", post(create_opportunity::<C>))
        .route("/api/v1/opportunities/:id", get(get_opportunity::<C>))
        .route(
            "/api/v1/opportunities/:id/roster",
            get(opportunity_roster::<C>),
        )
        .route("/api/v1/shifts", post(schedule_shift::<C>))
        .route("/api/v1/shifts/:id", patch(update_shift::<C>))
        .route("/api/v1/shifts/:id/confirm", post(confirm_shift::<C>))
        .route("/api/v1/shifts/:id/cancel", post(cancel_shift::<C>))
        .route("/api/v1/shifts/:id/check-in", post(check_in::<C>))
        .route("/api/v1/shifts/:id/no-show", post(mark_no_show::<C>))
        .route("/api/v1/shifts/:id/complete", post(complete_shift::<C>))
        .route(
            "/api/v1/availability/:id",
            patch(update_availability::<C>).delete(remove_availability::<C>),
        )
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

/// Error returned by every handler.
#[derive(Debug)]
pub struct ApiError(ScheduleError);

impl From<ScheduleError> for ApiError {
    fn from(err: ScheduleError) -> Self {
        Self(err)
    }
}

impl From<FlockError> for ApiError {
    fn from(err: FlockError) -> Self {
        Self(ScheduleError::from(err))
    }
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match &self.0 {
            ScheduleError::InvalidTimeRange
            | ScheduleError::BackgroundCheckRequired
            | ScheduleError::BackgroundCheckExpired
            | ScheduleError::MissingRequiredSkills { .. }
            | ScheduleError::InvalidStatusTransition { .. }
            | ScheduleError::InvalidAvailability(_) => StatusCode::UNPROCESSABLE_ENTITY,
            ScheduleError::TimeConflict { .. }
            | ScheduleError::VolunteerUnavailable
            | ScheduleError::OpportunityFull { .. } => StatusCode::CONFLICT,
            ScheduleError::VolunteerNotFound { .. } | ScheduleError::OpportunityNotFound { .. } => {
                StatusCode::NOT_FOUND
            }
            ScheduleError::Timeout => StatusCode::SERVICE_UNAVAILABLE,
            ScheduleError::Store(err) => match err {
                FlockError::NotFound { .. } => StatusCode::NOT_FOUND,
                FlockError::AlreadyExists { .. }
                | FlockError::VersionConflict { .. }
                | FlockError::SlotTaken(_) => StatusCode::CONFLICT,
                FlockError::Validation { .. } => StatusCode::UNPROCESSABLE_ENTITY,
                FlockError::TenantContext => StatusCode::BAD_REQUEST,
                FlockError::WriteConflict { .. }
                | FlockError::Database(_)
                | FlockError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
            },
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            error!(code = self.0.code(), error = %self.0, "Request failed");
        }

        let body = Json(json!({
            "status": "error",
            "code": self.0.code(),
            "message": self.0.user_message(),
        }));

        (status, body).into_response()
    }
}

type ApiResult<T> = Result<T, ApiError>;

/// Resolves the tenant header to a stored organization. A missing,
/// malformed or unknown id is a tenant-context failure.
async fn org_context<C: Connection>(
    state: &AppState<C>,
    headers: &HeaderMap,
) -> Result<OrgContext, ApiError> {
    let id = headers
        .get(ORGANIZATION_HEADER)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| Uuid::parse_str(value.trim()).ok())
        .ok_or(FlockError::TenantContext)?;

    match state.organizations.get_by_id(id).await {
        Ok(organization) => Ok(OrgContext::new(organization.id)),
        Err(FlockError::NotFound { .. }) => Err(FlockError::TenantContext.into()),
        Err(err) => Err(err.into()),
    }
}

// ---------------------------------------------------------------------------
// Request bodies
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
pub struct NewOrganization {
    pub name: String,
    pub slug: String,
    #[serde(default)]
    pub metadata: Option<Value>,
}

#[derive(Debug, Deserialize)]
pub struct NewVolunteer {
    pub name: String,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub skills: Vec<String>,
    #[serde(default)]
    pub background_check_status: BackgroundCheckStatus,
    #[serde(default)]
    pub background_check_expires_on: Option<NaiveDate>,
}

#[derive(Debug, Deserialize)]
pub struct NewOpportunity {
    pub name: String,
    #[serde(default)]
    pub category: Option<String>,
    #[serde(default)]
    pub required_skills: Vec<String>,
    pub volunteers_needed: u32,
}

#[derive(Debug, Deserialize)]
pub struct ShiftPatch {
    pub version: u32,
    #[serde(default)]
    pub start_time: Option<NaiveTime>,
    #[serde(default)]
    pub end_time: Option<NaiveTime>,
    #[serde(default)]
    pub location_id: Option<Option<Uuid>>,
    #[serde(default)]
    pub notes: Option<Option<String>>,
}

#[derive(Debug, Deserialize)]
pub struct VersionBody {
    pub version: u32,
}

#[derive(Debug, Deserialize)]
pub struct DateQuery {
    pub date: NaiveDate,
}

// ---------------------------------------------------------------------------
// Handlers
// ---------------------------------------------------------------------------

async fn health() -> Json<Value> {
    Json(json!({ "status": "ok" }))
}

async fn create_organization<C: Connection>(
    State(state): State<AppState<C>>,
    Json(body): Json<NewOrganization>,
) -> ApiResult<(StatusCode, Json<Organization>)> {
    if body.name.trim().is_empty() || body.slug.trim().is_empty() {
        return Err(FlockError::validation("organization name and slug are required").into());
    }
    let organization = state
        .organizations
        .create(CreateOrganization {
            name: body.name,
            slug: body.slug,
            metadata: body.metadata,
        })
        .await?;
    Ok((StatusCode::CREATED, Json(organization)))
}

async fn get_organization<C: Connection>(
    State(state): State<AppState<C>>,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<Organization>> {
    Ok(Json(state.organizations.get_by_id(id).await?))
}

async fn create_volunteer<C: Connection>(
    State(state): State<AppState<C>>,
    headers: HeaderMap,
    Json(body): Json<NewVolunteer>,
) -> ApiResult<(StatusCode, Json<Volunteer>)> {
    let ctx = org_context(&state, &headers).await?;
    let volunteer = state
        .volunteers
        .create(CreateVolunteer {
            organization_id: ctx.organization_id(),
            name: body.name,
            email: body.email,
            skills: body.skills,
            background_check_status: body.background_check_status,
            background_check_expires_on: body.background_check_expires_on,
        })
        .await?;
    Ok((StatusCode::CREATED, Json(volunteer)))
}

async fn get_volunteer<C: Connection>(
    State(state): State<AppState<C>>,
    headers: HeaderMap,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<Volunteer>> {
    let ctx = org_context(&state, &headers).await?;
    Ok(Json(
        state.volunteers.get_by_id(ctx.organization_id(), id).await?,
    ))
}

async fn create_opportunity<C: Connection>(
    State(state): State<AppState<C>>,
    headers: HeaderMap,
    Json(body): Json<NewOpportunity>,
) -> ApiResult<(StatusCode, Json<ServingOpportunity>)> {
    let ctx = org_context(&state, &headers).await?;
    let opportunity = state
        .opportunities
        .create(CreateOpportunity {
            organization_id: ctx.organization_id(),
            name: body.name,
            category: body.category,
            required_skills: body.required_skills,
            volunteers_needed: body.volunteers_needed,
        })
        .await?;
    Ok((StatusCode::CREATED, Json(opportunity)))
}

async fn get_opportunity<C: Connection>(
    State(state): State<AppState<C>>,
    headers: HeaderMap,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<ServingOpportunity>> {
    let ctx = org_context(&state, &headers).await?;
    Ok(Json(
        state
            .opportunities
            .get_by_id(ctx.organization_id(), id)
            .await?,
    ))
}

async fn schedule_shift<C: Connection>(
    State(state): State<AppState<C>>,
    headers: HeaderMap,
    Json(body): Json<ShiftRequest>,
) -> ApiResult<(StatusCode, Json<VolunteerShift>)> {
    let ctx = org_context(&state, &headers).await?;
    let shift = state.scheduler.schedule_shift(&ctx, body).await?;
    Ok((StatusCode::CREATED, Json(shift)))
}

async fn update_shift<C: Connection>(
    State(state): State<AppState<C>>,
    headers: HeaderMap,
    Path(id): Path<Uuid>,
    Json(body): Json<ShiftPatch>,
) -> ApiResult<Json<VolunteerShift>> {
    let ctx = org_context(&state, &headers).await?;
    let changes = ShiftChanges {
        start_time: body.start_time,
        end_time: body.end_time,
        location_id: body.location_id,
        notes: body.notes,
    };
    Ok(Json(
        state
            .scheduler
            .update_shift(&ctx, id, body.version, changes)
            .await?,
    ))
}

async fn confirm_shift<C: Connection>(
    State(state): State<AppState<C>>,
    headers: HeaderMap,
    Path(id): Path<Uuid>,
    Json(body): Json<VersionBody>,
) -> ApiResult<Json<VolunteerShift>> {
    let ctx = org_context(&state, &headers).await?;
    Ok(Json(
        state
            .scheduler
            .confirm_shift(&ctx, id, body.version)
            .await?,
    ))
}

async fn cancel_shift<C: Connection>(
    State(state): State<AppState<C>>,
    headers: HeaderMap,
    Path(id): Path<Uuid>,
    Json(body): Json<VersionBody>,
) -> ApiResult<Json<VolunteerShift>> {
    let ctx = org_context(&state, &headers).await?;
    Ok(Json(
        state.scheduler.cancel_shift(&ctx, id, body.version).await?,
    ))
}

async fn check_in<C: Connection>(
    State(state): State<AppState<C>>,
    headers: HeaderMap,
    Path(id): Path<Uuid>,
    Json(body): Json<VersionBody>,
) -> ApiResult<Json<VolunteerShift>> {
    let ctx = org_context(&state, &headers).await?;
    Ok(Json(state.scheduler.check_in(&ctx, id, body.version).await?))
}

async fn mark_no_show<C: Connection>(
    State(state): State<AppState<C>>,
    headers: HeaderMap,
    Path(id): Path<Uuid>,
    Json(body): Json<VersionBody>,
) -> ApiResult<Json<VolunteerShift>> {
    let ctx = org_context(&state, &headers).await?;
    Ok(Json(
        state.scheduler.mark_no_show(&ctx, id, body.version).await?,
    ))
}

async fn complete_shift<C: Connection>(
    State(state): State<AppState<C>>,
    headers: HeaderMap,
    Path(id): Path<Uuid>,
    Json(body): Json<VersionBody>,
) -> ApiResult<Json<VolunteerShift>> {
    let ctx = org_context(&state, &headers).await?;
    Ok(Json(
        state
            .scheduler
            .complete_shift(&ctx, id, body.version)
            .await?,
    ))
}

async fn volunteer_schedule<C: Connection>(
    State(state): State<AppState<C>>,
    headers: HeaderMap,
    Path(id): Path<Uuid>,
    Query(query): Query<DateQuery>,
) -> ApiResult<Json<Vec<VolunteerShift>>> {
    let ctx = org_context(&state, &headers).await?;
    Ok(Json(
        state
            .scheduler
            .volunteer_schedule(&ctx, id, query.date)
            .await?,
    ))
}

async fn opportunity_roster<C: Connection>(
    State(state): State<AppState<C>>,
    headers: HeaderMap,
    Path(id): Path<Uuid>,
    Query(query): Query<DateQuery>,
) -> ApiResult<Json<Vec<VolunteerShift>>> {
    let ctx = org_context(&state, &headers).await?;
    Ok(Json(
        state
            .scheduler
            .opportunity_roster(&ctx, id, query.date)
            .await?,
    ))
}

async fn list_availability<C: Connection>(
    State(state): State<AppState<C>>,
    headers: HeaderMap,
    Path(volunteer_id): Path<Uuid>,
) -> ApiResult<Json<Vec<VolunteerAvailability>>> {
    let ctx = org_context(&state, &headers).await?;
    Ok(Json(
        state
            .scheduler
            .list_availability(&ctx, volunteer_id)
            .await?,
    ))
}

async fn add_availability<C: Connection>(
    State(state): State<AppState<C>>,
    headers: HeaderMap,
    Path(volunteer_id): Path<Uuid>,
    Json(body): Json<NewAvailability>,
) -> ApiResult<(StatusCode, Json<VolunteerAvailability>)> {
    let ctx = org_context(&state, &headers).await?;
    let record = state
        .scheduler
        .add_availability(&ctx, volunteer_id, body)
        .await?;
    Ok((StatusCode::CREATED, Json(record)))
}

async fn update_availability<C: Connection>(
    State(state): State<AppState<C>>,
    headers: HeaderMap,
    Path(id): Path<Uuid>,
    Json(body): Json<UpdateAvailability>,
) -> ApiResult<Json<VolunteerAvailability>> {
    let ctx = org_context(&state, &headers).await?;
    Ok(Json(
        state
            .scheduler
            .update_availability(&ctx, id, body)
            .await?,
    ))
}

async fn remove_availability<C: Connection>(
    State(state): State<AppState<C>>,
    headers: HeaderMap,
    Path(id): Path<Uuid>,
) -> ApiResult<StatusCode> {
    let ctx = org_context(&state, &headers).await?;
    state.scheduler.remove_availability(&ctx, id).await?;
    Ok(StatusCode::NO_CONTENT)
}

#[cfg(test)]
mod tests {
    use axum::body::{Body, to_bytes};
    use axum::http::Request;
    use flock_core::models::shift::SlotConflict;
    use surrealdb::engine::local::{Db, Mem};
    use tower::ServiceExt;

    use super::*;

    async fn app() -> Router {
        let db = Surreal::new::<Mem>(()).await.unwrap();
        db.use_ns("test").use_db("test").await.unwrap();
        flock_db::run_migrations(&db).await.unwrap();
        router::<Db>(AppState::new(db, SchedulingConfig::default()))
    }

    async fn send(app: &Router, req: Request<Body>) -> (StatusCode, Value) {
        let response = app.clone().oneshot(req).await.unwrap();
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let body = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap()
        };
        (status, body)
    }

    async fn register(app: &Router, slug: &str) -> Uuid {
        let (status, body) = send(
            app,
            Request::post("/api/v1/organizations")
                .header("content-type", "application/json")
                .body(Body::from(
                    json!({ "name": format!("Church {slug}"), "slug": slug }).to_string(),
                ))
                .unwrap(),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED, "{body}");
        Uuid::parse_str(body["id"].as_str().unwrap()).unwrap()
    }

    fn post_json(uri: &str, org: Uuid, body: Value) -> Request<Body> {
        Request::post(uri)
            .header(ORGANIZATION_HEADER, org.to_string())
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    #[test]
    fn rejection_statuses() {
        let conflict = ApiError::from(ScheduleError::TimeConflict {
            conflicting_shift_id: Uuid::new_v4(),
        });
        assert_eq!(conflict.status(), StatusCode::CONFLICT);

        let skills = ApiError::from(ScheduleError::MissingRequiredSkills {
            missing: vec!["CPR".into()],
        });
        assert_eq!(skills.status(), StatusCode::UNPROCESSABLE_ENTITY);

        let stale = ApiError::from(FlockError::VersionConflict {
            entity: "volunteer_shift".into(),
            id: "x".into(),
            expected: 1,
        });
        assert_eq!(stale.status(), StatusCode::CONFLICT);

        let tenant = ApiError::from(FlockError::TenantContext);
        assert_eq!(tenant.status(), StatusCode::BAD_REQUEST);

        let full = ApiError::from(FlockError::SlotTaken(SlotConflict::OpportunityFull {
            volunteers_needed: 2,
        }));
        assert_eq!(full.status(), StatusCode::CONFLICT);
        assert_eq!(full.0.code(), "OPPORTUNITY_FULL");

        let db = ApiError::from(FlockError::Database("boom".into()));
        assert_eq!(db.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(
            ApiError::from(ScheduleError::Timeout).status(),
            StatusCode::SERVICE_UNAVAILABLE
        );
    }

    #[tokio::test]
    async fn health_is_ok() {
        let app = app().await;
        let (status, body) = send(
            &app,
            Request::get("/api/v1/health").body(Body::empty()).unwrap(),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], "ok");
    }

    #[tokio::test]
    async fn missing_organization_header_is_bad_request() {
        let app = app().await;
        let (status, body) = send(
            &app,
            Request::get(format!("/api/v1/volunteers/{}", Uuid::new_v4()))
                .body(Body::empty())
                .unwrap(),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["code"], "TENANT_CONTEXT");
    }

    #[tokio::test]
    async fn unregistered_organization_is_bad_request() {
        let app = app().await;
        let (status, body) = send(
            &app,
            post_json("/api/v1/volunteers", Uuid::new_v4(), json!({ "name": "Ruth" })),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["code"], "TENANT_CONTEXT");
    }

    #[tokio::test]
    async fn organizations_are_created_and_fetched() {
        let app = app().await;
        let org = register(&app, "grace").await;

        let (status, body) = send(
            &app,
            Request::get(format!("/api/v1/organizations/{org}"))
                .body(Body::empty())
                .unwrap(),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["slug"], "grace");

        let (status, body) = send(
            &app,
            Request::post("/api/v1/organizations")
                .header("content-type", "application/json")
                .body(Body::from(json!({ "name": "Again", "slug": "grace" }).to_string()))
                .unwrap(),
        )
        .await;
        assert_eq!(status, StatusCode::CONFLICT);
        assert_eq!(body["code"], "ALREADY_EXISTS");
    }

    #[tokio::test]
    async fn conflicting_shift_returns_code_and_safe_message() {
        let app = app().await;
        let org = register(&app, "grace").await;

        let (status, volunteer) = send(
            &app,
            post_json("/api/v1/volunteers", org, json!({ "name": "Ruth" })),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);

        let (status, opportunity) = send(
            &app,
            post_json(
                "/api/v1/opportunities",
                org,
                json!({ "name": "Greeter", "volunteers_needed": 3 }),
            ),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);

        let shift = |start: &str, end: &str| {
            json!({
                "volunteer_id": volunteer["id"],
                "opportunity_id": opportunity["id"],
                "shift_date": "2025-06-01",
                "start_time": start,
                "end_time": end,
            })
        };

        let (status, created) = send(
            &app,
            post_json("/api/v1/shifts", org, shift("09:00:00", "10:00:00")),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(created["version"], 1);

        let (status, body) = send(
            &app,
            post_json("/api/v1/shifts", org, shift("09:30:00", "10:30:00")),
        )
        .await;
        assert_eq!(status, StatusCode::CONFLICT);
        assert_eq!(body["status"], "error");
        assert_eq!(body["code"], "TIME_CONFLICT");
        assert!(
            !body["message"]
                .as_str()
                .unwrap()
                .contains(created["id"].as_str().unwrap())
        );

        let cancel_uri = format!("/api/v1/shifts/{}/cancel", created["id"].as_str().unwrap());
        let (status, cancelled) = send(
            &app,
            post_json(&cancel_uri, org, json!({ "version": 1 })),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(cancelled["status"], "Cancelled");

        let (status, body) = send(&app, post_json(&cancel_uri, org, json!({ "version": 1 }))).await;
        assert_eq!(status, StatusCode::CONFLICT);
        assert_eq!(body["code"], "VERSION_CONFLICT");
    }

    #[tokio::test]
    async fn other_organization_sees_not_found() {
        let app = app().await;
        let owner = register(&app, "grace").await;
        let stranger = register(&app, "hope").await;
        let (_, volunteer) = send(
            &app,
            post_json("/api/v1/volunteers", owner, json!({ "name": "Ruth" })),
        )
        .await;

        let (status, body) = send(
            &app,
            Request::get(format!(
                "/api/v1/volunteers/{}",
                volunteer["id"].as_str().unwrap()
            ))
            .header(ORGANIZATION_HEADER, stranger.to_string())
            .body(Body::empty())
            .unwrap(),
        )
        .await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["code"], "NOT_FOUND");
    }
}
