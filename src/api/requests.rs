use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;
use bson::oid::ObjectId;
use serde::{Deserialize, Serialize};

use crate::api::extract::{non_blank, path_id, ApiJson, ApiQuery, PageQuery, Validator};
use crate::api::views::{ExpandedRequestView, RequestView};
use crate::app::AppState;
use crate::db::models::{Page, RequestFields};
use crate::db::Repositories;
use crate::error::{AppError, Resource};
use crate::relations::{QueryExpander, ReferenceMaintainer};

/// Request body for filing or replacing a maintenance request.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RequestPayload {
    pub student_id: Option<String>,
    pub description: Option<String>,
    pub status: Option<String>,
    pub location_id: Option<String>,
    pub building_id: Option<String>,
    pub estimated_completion: Option<String>,
}

impl RequestPayload {
    pub fn validate(self) -> Result<RequestFields, AppError> {
        let mut v = Validator::default();
        let student_id = v.object_id("studentId", self.student_id, "Student");
        let description = v.required_string("description", self.description, "Description");
        let status = v.required_string("status", self.status, "Status");
        let location = v.object_id("locationId", self.location_id, "Location");
        let building = v.object_id("buildingId", self.building_id, "Building");
        match (student_id, description, status, location, building) {
            (Some(student_id), Some(description), Some(status), Some(location), Some(building))
                if v.is_clean() =>
            {
                Ok(RequestFields {
                    student_id,
                    description,
                    status,
                    location,
                    building,
                    estimated_completion: non_blank(self.estimated_completion),
                })
            }
            _ => Err(v.into_error()),
        }
    }
}

/// File a request and append its id to the user's and location's lists.
///
/// The response carries bare `location`/`building` ids. A completion
/// estimate is only accepted on update.
pub async fn process_create_request(
    repos: &Repositories,
    fields: RequestFields,
) -> Result<RequestView, AppError> {
    let fields = RequestFields {
        estimated_completion: None,
        ..fields
    };
    let request = ReferenceMaintainer::new(repos).create_request(fields).await?;
    tracing::info!(
        request_id = %request.id,
        student_id = %request.student_id,
        location_id = %request.location,
        "request created"
    );
    Ok(request.into())
}

pub async fn process_get_request(
    repos: &Repositories,
    id: ObjectId,
) -> Result<ExpandedRequestView, AppError> {
    QueryExpander::new(repos)
        .get_request(id)
        .await?
        .map(ExpandedRequestView::from)
        .ok_or(AppError::NotFound(Resource::Request))
}

pub async fn process_list_requests(
    repos: &Repositories,
    page: Page,
) -> Result<Vec<ExpandedRequestView>, AppError> {
    let requests = QueryExpander::new(repos).get_requests(page).await?;
    Ok(requests.into_iter().map(ExpandedRequestView::from).collect())
}

pub async fn process_list_requests_by_user(
    repos: &Repositories,
    user_id: ObjectId,
) -> Result<Vec<ExpandedRequestView>, AppError> {
    let requests = QueryExpander::new(repos).get_requests_by_user(user_id).await?;
    Ok(requests.into_iter().map(ExpandedRequestView::from).collect())
}

/// Replace a request's fields and return it expanded.
///
/// The user and location request lists are not recomputed when the
/// request is moved to another user or location.
pub async fn process_update_request(
    repos: &Repositories,
    id: ObjectId,
    fields: RequestFields,
) -> Result<ExpandedRequestView, AppError> {
    let request = repos
        .requests
        .update(id, fields)
        .await?
        .ok_or(AppError::NotFound(Resource::Request))?;
    let expanded = QueryExpander::new(repos).expand(request).await?;
    Ok(expanded.into())
}

/// Delete a request. Its id stays in the user's and location's lists.
pub async fn process_delete_request(repos: &Repositories, id: ObjectId) -> Result<(), AppError> {
    repos
        .requests
        .delete(id)
        .await?
        .ok_or(AppError::NotFound(Resource::Request))?;
    tracing::info!(request_id = %id, "request deleted");
    Ok(())
}

/// Axum handler for `POST /api/request`.
pub async fn create_request_handler(
    State(state): State<AppState>,
    ApiJson(payload): ApiJson<RequestPayload>,
) -> Result<(StatusCode, Json<RequestView>), AppError> {
    let fields = payload.validate()?;
    let request = process_create_request(&state.repos, fields).await?;
    Ok((StatusCode::CREATED, Json(request)))
}

/// Axum handler for `GET /api/request/{id}`.
pub async fn get_request_handler(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<ExpandedRequestView>, AppError> {
    let id = path_id(&id, Resource::Request)?;
    Ok(Json(process_get_request(&state.repos, id).await?))
}

/// Axum handler for `GET /api/requests?page=&count=`.
pub async fn list_requests_handler(
    State(state): State<AppState>,
    ApiQuery(query): ApiQuery<PageQuery>,
) -> Result<Json<Vec<ExpandedRequestView>>, AppError> {
    let page = query.validate()?;
    Ok(Json(process_list_requests(&state.repos, page).await?))
}

/// Axum handler for `GET /api/requests/{user_id}`.
pub async fn list_user_requests_handler(
    State(state): State<AppState>,
    Path(user_id): Path<String>,
) -> Result<Json<Vec<ExpandedRequestView>>, AppError> {
    let user_id = path_id(&user_id, Resource::User)?;
    Ok(Json(process_list_requests_by_user(&state.repos, user_id).await?))
}

/// Axum handler for `PUT /api/request/{id}`.
pub async fn update_request_handler(
    State(state): State<AppState>,
    Path(id): Path<String>,
    ApiJson(payload): ApiJson<RequestPayload>,
) -> Result<Json<ExpandedRequestView>, AppError> {
    let id = path_id(&id, Resource::Request)?;
    let fields = payload.validate()?;
    Ok(Json(process_update_request(&state.repos, id, fields).await?))
}

/// Axum handler for `DELETE /api/request/{id}`.
pub async fn delete_request_handler(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<StatusCode, AppError> {
    let id = path_id(&id, Resource::Request)?;
    process_delete_request(&state.repos, id).await?;
    Ok(StatusCode::NO_CONTENT)
}
