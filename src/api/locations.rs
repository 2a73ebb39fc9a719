use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;
use bson::oid::ObjectId;
use serde::{Deserialize, Serialize};

use crate::api::extract::{non_blank, path_id, ApiJson, ApiQuery, PageQuery, Validator};
use crate::api::views::LocationView;
use crate::app::AppState;
use crate::db::models::{LocationFields, NewLocation, Page};
use crate::db::Repositories;
use crate::error::{AppError, Resource};
use crate::relations::ReferenceMaintainer;

/// Request body for creating or replacing a location.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LocationPayload {
    pub name: Option<String>,
    pub description: Option<String>,
    pub floor: Option<String>,
    pub building_id: Option<String>,
}

impl LocationPayload {
    pub fn validate(self) -> Result<NewLocation, AppError> {
        let mut v = Validator::default();
        let name = v.required_string("name", self.name, "Name");
        let floor = v.required_string("floor", self.floor, "Floor");
        let building_id = v.object_id("buildingId", self.building_id, "Building");
        match (name, floor, building_id) {
            (Some(name), Some(floor), Some(building_id)) if v.is_clean() => Ok(NewLocation {
                fields: LocationFields {
                    name,
                    description: non_blank(self.description),
                    floor,
                },
                building_id,
            }),
            _ => Err(v.into_error()),
        }
    }
}

/// Create a location and append it to its building's location list.
pub async fn process_create_location(
    repos: &Repositories,
    new: NewLocation,
) -> Result<LocationView, AppError> {
    let building_id = new.building_id;
    let location = ReferenceMaintainer::new(repos).create_location(new).await?;
    tracing::info!(location_id = %location.id, %building_id, "location created");
    Ok(location.into())
}

pub async fn process_get_location(
    repos: &Repositories,
    id: ObjectId,
) -> Result<LocationView, AppError> {
    repos
        .locations
        .find_by_id(id)
        .await?
        .map(LocationView::from)
        .ok_or(AppError::NotFound(Resource::Location))
}

pub async fn process_list_locations(
    repos: &Repositories,
    page: Page,
) -> Result<Vec<LocationView>, AppError> {
    let locations = repos.locations.list(page).await?;
    Ok(locations.into_iter().map(LocationView::from).collect())
}

/// Replace name, description and floor. A location never changes building.
pub async fn process_update_location(
    repos: &Repositories,
    id: ObjectId,
    fields: LocationFields,
) -> Result<LocationView, AppError> {
    repos
        .locations
        .update(id, fields)
        .await?
        .map(LocationView::from)
        .ok_or(AppError::NotFound(Resource::Location))
}

/// Delete a location. The id stays in its building's location list.
pub async fn process_delete_location(repos: &Repositories, id: ObjectId) -> Result<(), AppError> {
    repos
        .locations
        .delete(id)
        .await?
        .ok_or(AppError::NotFound(Resource::Location))?;
    tracing::info!(location_id = %id, "location deleted");
    Ok(())
}

/// Axum handler for `POST /api/location`.
pub async fn create_location_handler(
    State(state): State<AppState>,
    ApiJson(payload): ApiJson<LocationPayload>,
) -> Result<(StatusCode, Json<LocationView>), AppError> {
    let new = payload.validate()?;
    let location = process_create_location(&state.repos, new).await?;
    Ok((StatusCode::CREATED, Json(location)))
}

/// Axum handler for `GET /api/location/{id}`.
pub async fn get_location_handler(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<LocationView>, AppError> {
    let id = path_id(&id, Resource::Location)?;
    Ok(Json(process_get_location(&state.repos, id).await?))
}

/// Axum handler for `GET /api/locations?page=&count=`.
pub async fn list_locations_handler(
    State(state): State<AppState>,
    ApiQuery(query): ApiQuery<PageQuery>,
) -> Result<Json<Vec<LocationView>>, AppError> {
    let page = query.validate()?;
    Ok(Json(process_list_locations(&state.repos, page).await?))
}

/// Axum handler for `PUT /api/location/{id}`.
pub async fn update_location_handler(
    State(state): State<AppState>,
    Path(id): Path<String>,
    ApiJson(payload): ApiJson<LocationPayload>,
) -> Result<Json<LocationView>, AppError> {
    let id = path_id(&id, Resource::Location)?;
    let new = payload.validate()?;
    Ok(Json(process_update_location(&state.repos, id, new.fields).await?))
}

/// Axum handler for `DELETE /api/location/{id}`.
pub async fn delete_location_handler(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<StatusCode, AppError> {
    let id = path_id(&id, Resource::Location)?;
    process_delete_location(&state.repos, id).await?;
    Ok(StatusCode::NO_CONTENT)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::models::{Building, BuildingFields};
    use crate::testing::MemoryStore;

    async fn seed_building(repos: &Repositories) -> Building {
        let building = Building::new(BuildingFields {
            name: "Hall".to_string(),
            floors: vec!["1".to_string(), "2".to_string()],
        });
        repos.buildings.insert(&building).await.unwrap();
        building
    }

    fn payload(name: &str, building_id: ObjectId) -> LocationPayload {
        LocationPayload {
            name: Some(name.to_string()),
            description: Some("Lab".to_string()),
            floor: Some("1".to_string()),
            building_id: Some(building_id.to_hex()),
        }
    }

    #[test]
    fn test_validate_rejects_bad_building_id() {
        let mut p = payload("Room1", ObjectId::new());
        p.building_id = Some("not-an-id".to_string());
        match p.validate() {
            Err(AppError::Validation(issues)) => {
                assert_eq!(issues.len(), 1);
                assert_eq!(issues[0].path, "buildingId");
                assert_eq!(issues[0].message, "Invalid building id");
            }
            other => panic!("Expected Validation error, got: {:?}", other),
        }
    }

    #[test]
    fn test_validate_blank_description_dropped() {
        let mut p = payload("Room1", ObjectId::new());
        p.description = Some("  ".to_string());
        let new = p.validate().unwrap();
        assert_eq!(new.fields.description, None);
    }

    #[tokio::test]
    async fn test_create_appends_to_building() {
        let repos = MemoryStore::new().repositories();
        let building = seed_building(&repos).await;

        let new = payload("Room1", building.id).validate().unwrap();
        let created = process_create_location(&repos, new).await.unwrap();
        assert_eq!(created.floor, "1");
        assert_eq!(created.last_cleaned, created.created_at);
        assert!(created.requests.is_empty());

        let building = repos.buildings.find_by_id(building.id).await.unwrap().unwrap();
        let ids: Vec<String> = building.locations.iter().map(|id| id.to_hex()).collect();
        assert_eq!(ids, vec![created.id]);
    }

    #[tokio::test]
    async fn test_create_with_unknown_building() {
        let repos = MemoryStore::new().repositories();
        let result =
            process_create_location(&repos, payload("Room1", ObjectId::new()).validate().unwrap())
                .await;
        assert!(matches!(result, Err(AppError::NotFound(Resource::Building))));
    }

    #[tokio::test]
    async fn test_update_keeps_requests_and_building() {
        let repos = MemoryStore::new().repositories();
        let building = seed_building(&repos).await;
        let new = payload("Room1", building.id).validate().unwrap();
        let created = process_create_location(&repos, new).await.unwrap();
        let id = ObjectId::parse_str(&created.id).unwrap();
        repos.locations.push_request(id, ObjectId::new()).await.unwrap();

        let updated = process_update_location(
            &repos,
            id,
            LocationFields {
                name: "Room 1A".to_string(),
                description: None,
                floor: "2".to_string(),
            },
        )
        .await
        .unwrap();
        assert_eq!(updated.name, "Room 1A");
        assert_eq!(updated.description, None);
        assert_eq!(updated.requests.len(), 1);

        let building = repos.buildings.find_by_id(building.id).await.unwrap().unwrap();
        assert_eq!(building.locations, vec![id]);
    }

    #[tokio::test]
    async fn test_delete_leaves_building_reference() {
        let repos = MemoryStore::new().repositories();
        let building = seed_building(&repos).await;
        let new = payload("Room1", building.id).validate().unwrap();
        let created = process_create_location(&repos, new).await.unwrap();
        let id = ObjectId::parse_str(&created.id).unwrap();

        process_delete_location(&repos, id).await.unwrap();
        assert!(matches!(
            process_get_location(&repos, id).await,
            Err(AppError::NotFound(Resource::Location))
        ));

        let building = repos.buildings.find_by_id(building.id).await.unwrap().unwrap();
        assert_eq!(building.locations, vec![id]);
    }
}
