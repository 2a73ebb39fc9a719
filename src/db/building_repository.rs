use async_trait::async_trait;
use bson::oid::ObjectId;

use crate::db::models::{Building, BuildingFields, Page};
use crate::error::AppError;

/// Repository trait for building operations.
///
/// This trait allows mocking the database layer in tests.
#[async_trait]
pub trait BuildingRepository: Send + Sync {
    /// Insert a new building.
    async fn insert(&self, building: &Building) -> Result<(), AppError>;

    /// Find a building by its id.
    async fn find_by_id(&self, id: ObjectId) -> Result<Option<Building>, AppError>;

    /// Find every building whose id is in `ids`, in no particular order.
    async fn find_by_ids(&self, ids: &[ObjectId]) -> Result<Vec<Building>, AppError>;

    /// List one page of buildings in insertion order.
    async fn list(&self, page: Page) -> Result<Vec<Building>, AppError>;

    /// Replace the editable fields and return the updated building.
    async fn update(
        &self,
        id: ObjectId,
        fields: BuildingFields,
    ) -> Result<Option<Building>, AppError>;

    /// Delete a building and return what was removed.
    async fn delete(&self, id: ObjectId) -> Result<Option<Building>, AppError>;

    /// Append `location_id` to the building's location list.
    ///
    /// Returns `false` when no building matched.
    async fn push_location(
        &self,
        building_id: ObjectId,
        location_id: ObjectId,
    ) -> Result<bool, AppError>;
}

/// MongoDB implementation of the BuildingRepository.
pub struct MongoBuildingRepository {
    collection: mongodb::Collection<Building>,
}

impl MongoBuildingRepository {
    pub fn new(db: &mongodb::Database) -> Self {
        Self {
            collection: db.collection("buildings"),
        }
    }

    /// Create the unique index on `name`.
    pub async fn ensure_indexes(&self) -> Result<(), AppError> {
        use mongodb::bson::doc;
        use mongodb::options::IndexOptions;
        use mongodb::IndexModel;

        let index = IndexModel::builder()
            .keys(doc! { "name": 1 })
            .options(IndexOptions::builder().unique(true).build())
            .build();

        self.collection
            .create_index(index)
            .await
            .map_err(super::map_read_error)?;

        Ok(())
    }
}

#[async_trait]
impl BuildingRepository for MongoBuildingRepository {
    async fn insert(&self, building: &Building) -> Result<(), AppError> {
        self.collection
            .insert_one(building)
            .await
            .map_err(|e| super::map_write_error(e, "Building"))?;

        Ok(())
    }

    async fn find_by_id(&self, id: ObjectId) -> Result<Option<Building>, AppError> {
        use mongodb::bson::doc;

        self.collection
            .find_one(doc! { "_id": id })
            .await
            .map_err(super::map_read_error)
    }

    async fn find_by_ids(&self, ids: &[ObjectId]) -> Result<Vec<Building>, AppError> {
        use mongodb::bson::doc;

        if ids.is_empty() {
            return Ok(Vec::new());
        }

        let cursor = self
            .collection
            .find(doc! { "_id": { "$in": ids.to_vec() } })
            .await
            .map_err(super::map_read_error)?;

        super::collect(cursor).await
    }

    async fn list(&self, page: Page) -> Result<Vec<Building>, AppError> {
        use mongodb::bson::doc;

        // ObjectIds are generated in insertion order
        let cursor = self
            .collection
            .find(doc! {})
            .sort(doc! { "_id": 1 })
            .skip(page.skip())
            .limit(i64::from(page.count()))
            .await
            .map_err(super::map_read_error)?;

        super::collect(cursor).await
    }

    async fn update(
        &self,
        id: ObjectId,
        fields: BuildingFields,
    ) -> Result<Option<Building>, AppError> {
        use mongodb::bson::{doc, DateTime};
        use mongodb::options::ReturnDocument;

        let update = doc! {
            "$set": {
                "name": fields.name,
                "floors": fields.floors,
                "updatedAt": DateTime::from_chrono(super::models::now()),
            },
            "$inc": { "__v": 1 },
        };

        self.collection
            .find_one_and_update(doc! { "_id": id }, update)
            .return_document(ReturnDocument::After)
            .await
            .map_err(|e| super::map_write_error(e, "Building"))
    }

    async fn delete(&self, id: ObjectId) -> Result<Option<Building>, AppError> {
        use mongodb::bson::doc;

        self.collection
            .find_one_and_delete(doc! { "_id": id })
            .await
            .map_err(super::map_read_error)
    }

    async fn push_location(
        &self,
        building_id: ObjectId,
        location_id: ObjectId,
    ) -> Result<bool, AppError> {
        use mongodb::bson::{doc, DateTime};

        let result = self
            .collection
            .update_one(
                doc! { "_id": building_id },
                doc! {
                    "$push": { "locations": location_id },
                    "$set": { "updatedAt": DateTime::from_chrono(super::models::now()) },
                    "$inc": { "__v": 1 },
                },
            )
            .await
            .map_err(super::map_read_error)?;

        Ok(result.matched_count > 0)
    }
}
