use async_trait::async_trait;
use bson::oid::ObjectId;

use crate::db::models::{Location, LocationFields, Page};
use crate::error::AppError;

/// Repository trait for location (room) operations.
#[async_trait]
pub trait LocationRepository: Send + Sync {
    /// Insert a new location.
    async fn insert(&self, location: &Location) -> Result<(), AppError>;

    /// Find a location by its id.
    async fn find_by_id(&self, id: ObjectId) -> Result<Option<Location>, AppError>;

    /// Find every location whose id is in `ids`, in no particular order.
    async fn find_by_ids(&self, ids: &[ObjectId]) -> Result<Vec<Location>, AppError>;

    /// List one page of locations in insertion order.
    async fn list(&self, page: Page) -> Result<Vec<Location>, AppError>;

    /// Replace name, description and floor. The request list is untouched.
    async fn update(
        &self,
        id: ObjectId,
        fields: LocationFields,
    ) -> Result<Option<Location>, AppError>;

    /// Delete a location and return what was removed.
    async fn delete(&self, id: ObjectId) -> Result<Option<Location>, AppError>;

    /// Append `request_id` to the location's request list.
    ///
    /// Returns `false` when no location matched.
    async fn push_request(
        &self,
        location_id: ObjectId,
        request_id: ObjectId,
    ) -> Result<bool, AppError>;
}

/// MongoDB implementation of the LocationRepository.
pub struct MongoLocationRepository {
    collection: mongodb::Collection<Location>,
}

impl MongoLocationRepository {
    pub fn new(db: &mongodb::Database) -> Self {
        Self {
            collection: db.collection("locations"),
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
impl LocationRepository for MongoLocationRepository {
    async fn insert(&self, location: &Location) -> Result<(), AppError> {
        self.collection
            .insert_one(location)
            .await
            .map_err(|e| super::map_write_error(e, "Location"))?;

        Ok(())
    }

    async fn find_by_id(&self, id: ObjectId) -> Result<Option<Location>, AppError> {
        use mongodb::bson::doc;

        self.collection
            .find_one(doc! { "_id": id })
            .await
            .map_err(super::map_read_error)
    }

    async fn find_by_ids(&self, ids: &[ObjectId]) -> Result<Vec<Location>, AppError> {
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

    async fn list(&self, page: Page) -> Result<Vec<Location>, AppError> {
        use mongodb::bson::doc;

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
        fields: LocationFields,
    ) -> Result<Option<Location>, AppError> {
        use mongodb::bson::{doc, DateTime};
        use mongodb::options::ReturnDocument;

        let mut set = doc! {
            "name": fields.name,
            "floor": fields.floor,
            "updatedAt": DateTime::from_chrono(super::models::now()),
        };
        let mut update = doc! { "$inc": { "__v": 1 } };
        match fields.description {
            Some(description) => {
                set.insert("description", description);
            }
            None => {
                update.insert("$unset", doc! { "description": "" });
            }
        }
        update.insert("$set", set);

        self.collection
            .find_one_and_update(doc! { "_id": id }, update)
            .return_document(ReturnDocument::After)
            .await
            .map_err(|e| super::map_write_error(e, "Location"))
    }

    async fn delete(&self, id: ObjectId) -> Result<Option<Location>, AppError> {
        use mongodb::bson::doc;

        self.collection
            .find_one_and_delete(doc! { "_id": id })
            .await
            .map_err(super::map_read_error)
    }

    async fn push_request(
        &self,
        location_id: ObjectId,
        request_id: ObjectId,
    ) -> Result<bool, AppError> {
        use mongodb::bson::{doc, DateTime};

        let result = self
            .collection
            .update_one(
                doc! { "_id": location_id },
                doc! {
                    "$push": { "requests": request_id },
                    "$set": { "updatedAt": DateTime::from_chrono(super::models::now()) },
                    "$inc": { "__v": 1 },
                },
            )
            .await
            .map_err(super::map_read_error)?;

        Ok(result.matched_count > 0)
    }
}
