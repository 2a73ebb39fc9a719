use async_trait::async_trait;
use bson::oid::ObjectId;

use crate::db::models::{MaintenanceRequest, Page, RequestFields};
use crate::error::AppError;

/// Repository trait for maintenance request operations.
#[async_trait]
pub trait RequestRepository: Send + Sync {
    /// Insert a new request.
    async fn insert(&self, request: &MaintenanceRequest) -> Result<(), AppError>;

    /// Find a request by its id.
    async fn find_by_id(&self, id: ObjectId) -> Result<Option<MaintenanceRequest>, AppError>;

    /// List one page of requests in insertion order.
    async fn list(&self, page: Page) -> Result<Vec<MaintenanceRequest>, AppError>;

    /// List every request filed by `student_id`, in insertion order.
    async fn list_by_student(
        &self,
        student_id: ObjectId,
    ) -> Result<Vec<MaintenanceRequest>, AppError>;

    /// Replace every editable field and return the updated request.
    async fn update(
        &self,
        id: ObjectId,
        fields: RequestFields,
    ) -> Result<Option<MaintenanceRequest>, AppError>;

    /// Delete a request and return what was removed.
    async fn delete(&self, id: ObjectId) -> Result<Option<MaintenanceRequest>, AppError>;
}

/// MongoDB implementation of the RequestRepository.
pub struct MongoRequestRepository {
    collection: mongodb::Collection<MaintenanceRequest>,
}

impl MongoRequestRepository {
    pub fn new(db: &mongodb::Database) -> Self {
        Self {
            collection: db.collection("requests"),
        }
    }

    /// Index `studentId` for the per-user listing.
    pub async fn ensure_indexes(&self) -> Result<(), AppError> {
        use mongodb::bson::doc;
        use mongodb::IndexModel;

        let index = IndexModel::builder().keys(doc! { "studentId": 1 }).build();

        self.collection
            .create_index(index)
            .await
            .map_err(super::map_read_error)?;

        Ok(())
    }
}

#[async_trait]
impl RequestRepository for MongoRequestRepository {
    async fn insert(&self, request: &MaintenanceRequest) -> Result<(), AppError> {
        self.collection
            .insert_one(request)
            .await
            .map_err(|e| super::map_write_error(e, "Request"))?;

        Ok(())
    }

    async fn find_by_id(&self, id: ObjectId) -> Result<Option<MaintenanceRequest>, AppError> {
        use mongodb::bson::doc;

        self.collection
            .find_one(doc! { "_id": id })
            .await
            .map_err(super::map_read_error)
    }

    async fn list(&self, page: Page) -> Result<Vec<MaintenanceRequest>, AppError> {
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

    async fn list_by_student(
        &self,
        student_id: ObjectId,
    ) -> Result<Vec<MaintenanceRequest>, AppError> {
        use mongodb::bson::doc;

        let cursor = self
            .collection
            .find(doc! { "studentId": student_id })
            .sort(doc! { "_id": 1 })
            .await
            .map_err(super::map_read_error)?;

        super::collect(cursor).await
    }

    async fn update(
        &self,
        id: ObjectId,
        fields: RequestFields,
    ) -> Result<Option<MaintenanceRequest>, AppError> {
        use mongodb::bson::{doc, DateTime};
        use mongodb::options::ReturnDocument;

        let mut set = doc! {
            "studentId": fields.student_id,
            "description": fields.description,
            "status": fields.status,
            "location": fields.location,
            "building": fields.building,
            "updatedAt": DateTime::from_chrono(super::models::now()),
        };
        let mut update = doc! { "$inc": { "__v": 1 } };
        match fields.estimated_completion {
            Some(estimate) => {
                set.insert("estimatedCompletion", estimate);
            }
            None => {
                update.insert("$unset", doc! { "estimatedCompletion": "" });
            }
        }
        update.insert("$set", set);

        self.collection
            .find_one_and_update(doc! { "_id": id }, update)
            .return_document(ReturnDocument::After)
            .await
            .map_err(|e| super::map_write_error(e, "Request"))
    }

    async fn delete(&self, id: ObjectId) -> Result<Option<MaintenanceRequest>, AppError> {
        use mongodb::bson::doc;

        self.collection
            .find_one_and_delete(doc! { "_id": id })
            .await
            .map_err(super::map_read_error)
    }
}
