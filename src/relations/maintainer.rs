use bson::oid::ObjectId;

use crate::db::models::{Location, MaintenanceRequest, NewLocation, RequestFields};
use crate::db::Repositories;
use crate::error::{AppError, Resource};

/// Keeps the denormalized id lists (`Building.locations`, `Location.requests`,
/// `User.requests`) in step with the records they point at.
///
/// Only the create path is covered: deleting a location or request leaves
/// its id behind in the owning lists.
pub struct ReferenceMaintainer<'a> {
    repos: &'a Repositories,
}

impl<'a> ReferenceMaintainer<'a> {
    pub fn new(repos: &'a Repositories) -> Self {
        Self { repos }
    }

    /// Append `location_id` to the building's location list.
    pub async fn attach_location_to_building(
        &self,
        building_id: ObjectId,
        location_id: ObjectId,
    ) -> Result<(), AppError> {
        if !self
            .repos
            .buildings
            .push_location(building_id, location_id)
            .await?
        {
            return Err(AppError::NotFound(Resource::Building));
        }
        tracing::debug!(%building_id, %location_id, "attached location to building");
        Ok(())
    }

    /// Append `request_id` to the user's request list.
    pub async fn attach_request_to_user(
        &self,
        user_id: ObjectId,
        request_id: ObjectId,
    ) -> Result<(), AppError> {
        if !self.repos.users.push_request(user_id, request_id).await? {
            return Err(AppError::NotFound(Resource::User));
        }
        tracing::debug!(%user_id, %request_id, "attached request to user");
        Ok(())
    }

    /// Append `request_id` to the location's request list.
    pub async fn attach_request_to_location(
        &self,
        location_id: ObjectId,
        request_id: ObjectId,
    ) -> Result<(), AppError> {
        if !self
            .repos
            .locations
            .push_request(location_id, request_id)
            .await?
        {
            return Err(AppError::NotFound(Resource::Location));
        }
        tracing::debug!(%location_id, %request_id, "attached request to location");
        Ok(())
    }

    /// Create a location and register it with its building.
    ///
    /// The building must exist. The location is saved before the attach, so
    /// a failed attach leaves an unlisted location rather than a listed id
    /// with no record behind it.
    pub async fn create_location(&self, new: NewLocation) -> Result<Location, AppError> {
        if self
            .repos
            .buildings
            .find_by_id(new.building_id)
            .await?
            .is_none()
        {
            return Err(AppError::NotFound(Resource::Building));
        }

        let location = Location::new(new.fields);
        self.repos.locations.insert(&location).await?;

        if let Err(e) = self
            .attach_location_to_building(new.building_id, location.id)
            .await
        {
            tracing::error!(
                building_id = %new.building_id,
                location_id = %location.id,
                "location saved but not attached to its building: {e}"
            );
            return Err(e);
        }

        Ok(location)
    }

    /// Create a maintenance request and register it with its user and location.
    ///
    /// The user, location and building must all exist. The request is saved
    /// first. Both attaches are always attempted; each failure is logged and
    /// the first one is returned.
    pub async fn create_request(
        &self,
        fields: RequestFields,
    ) -> Result<MaintenanceRequest, AppError> {
        if self.repos.users.find_by_id(fields.student_id).await?.is_none() {
            return Err(AppError::NotFound(Resource::User));
        }
        if self.repos.locations.find_by_id(fields.location).await?.is_none() {
            return Err(AppError::NotFound(Resource::Location));
        }
        if self.repos.buildings.find_by_id(fields.building).await?.is_none() {
            return Err(AppError::NotFound(Resource::Building));
        }

        let request = MaintenanceRequest::new(fields);
        self.repos.requests.insert(&request).await?;

        let (to_user, to_location) = futures::join!(
            self.attach_request_to_user(request.student_id, request.id),
            self.attach_request_to_location(request.location, request.id),
        );
        if let Err(e) = &to_user {
            tracing::error!(
                user_id = %request.student_id,
                request_id = %request.id,
                "request saved but not attached to its user: {e}"
            );
        }
        if let Err(e) = &to_location {
            tracing::error!(
                location_id = %request.location,
                request_id = %request.id,
                "request saved but not attached to its location: {e}"
            );
        }
        to_user?;
        to_location?;

        Ok(request)
    }
}
