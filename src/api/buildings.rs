use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;
use serde::{Deserialize, Serialize};

use crate::api::extract::{path_id, ApiJson, ApiQuery, PageQuery, Validator};
use crate::api::views::BuildingView;
use crate::app::AppState;
use crate::db::models::{Building, BuildingFields, Page};
use crate::db::Repositories;
use crate::error::{AppError, Resource};
use bson::oid::ObjectId;

/// Request body for creating or replacing a building.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct BuildingPayload {
    pub name: Option<String>,
    pub floors: Option<Vec<String>>,
}

impl BuildingPayload {
    pub fn validate(self) -> Result<BuildingFields, AppError> {
        let mut v = Validator::default();
        let name = v.required_string("name", self.name, "Name");
        let floors = v.required("floors", self.floors, "Floors");
        match (name, floors) {
            (Some(name), Some(floors)) if v.is_clean() => Ok(BuildingFields { name, floors }),
            _ => Err(v.into_error()),
        }
    }
}

pub async fn process_create_building(
    repos: &Repositories,
    fields: BuildingFields,
) -> Result<BuildingView, AppError> {
    let building = Building::new(fields);
    repos.buildings.insert(&building).await?;
    tracing::info!(building_id = %building.id, name = %building.name, "building created");
    Ok(building.into())
}

pub async fn process_get_building(
    repos: &Repositories,
    id: ObjectId,
) -> Result<BuildingView, AppError> {
    repos
        .buildings
        .find_by_id(id)
        .await?
        .map(BuildingView::from)
        .ok_or(AppError::NotFound(Resource::Building))
}

pub async fn process_list_buildings(
    repos: &Repositories,
    page: Page,
) -> Result<Vec<BuildingView>, AppError> {
    let buildings = repos.buildings.list(page).await?;
    Ok(buildings.into_iter().map(BuildingView::from).collect())
}

pub async fn process_update_building(
    repos: &Repositories,
    id: ObjectId,
    fields: BuildingFields,
) -> Result<BuildingView, AppError> {
    repos
        .buildings
        .update(id, fields)
        .await?
        .map(BuildingView::from)
        .ok_or(AppError::NotFound(Resource::Building))
}

/// Delete a building. Its locations are left in place.
pub async fn process_delete_building(
    repos: &Repositories,
    id: ObjectId,
) -> Result<BuildingView, AppError> {
    let building = repos
        .buildings
        .delete(id)
        .await?
        .ok_or(AppError::NotFound(Resource::Building))?;
    tracing::info!(building_id = %building.id, "building deleted");
    Ok(building.into())
}

/// Axum handler for `POST /api/building`.
pub async fn create_building_handler(
    State(state): State<AppState>,
    ApiJson(payload): ApiJson<BuildingPayload>,
) -> Result<(StatusCode, Json<BuildingView>), AppError> {
    let fields = payload.validate()?;
    let building = process_create_building(&state.repos, fields).await?;
    Ok((StatusCode::CREATED, Json(building)))
}

/// Axum handler for `GET /api/building/{id}`.
pub async fn get_building_handler(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<BuildingView>, AppError> {
    let id = path_id(&id, Resource::Building)?;
    Ok(Json(process_get_building(&state.repos, id).await?))
}

/// Axum handler for `GET /api/buildings?page=&count=`.
pub async fn list_buildings_handler(
    State(state): State<AppState>,
    ApiQuery(query): ApiQuery<PageQuery>,
) -> Result<Json<Vec<BuildingView>>, AppError> {
    let page = query.validate()?;
    Ok(Json(process_list_buildings(&state.repos, page).await?))
}

/// Axum handler for `PUT /api/building/{id}`.
pub async fn update_building_handler(
    State(state): State<AppState>,
    Path(id): Path<String>,
    ApiJson(payload): ApiJson<BuildingPayload>,
) -> Result<Json<BuildingView>, AppError> {
    let id = path_id(&id, Resource::Building)?;
    let fields = payload.validate()?;
    Ok(Json(process_update_building(&state.repos, id, fields).await?))
}

/// Axum handler for `DELETE /api/building/{id}`. Responds with the removed building.
pub async fn delete_building_handler(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<BuildingView>, AppError> {
    let id = path_id(&id, Resource::Building)?;
    Ok(Json(process_delete_building(&state.repos, id).await?))
}
