use async_trait::async_trait;
use bson::oid::ObjectId;

use crate::db::models::{User, UserFields};
use crate::error::AppError;

/// Repository trait for user operations.
#[async_trait]
pub trait UserRepository: Send + Sync {
    /// Insert a new user.
    async fn insert(&self, user: &User) -> Result<(), AppError>;

    /// Find a user by id.
    async fn find_by_id(&self, id: ObjectId) -> Result<Option<User>, AppError>;

    /// Find a user by email address.
    async fn find_by_email(&self, email: &str) -> Result<Option<User>, AppError>;

    /// Replace the editable fields and return the updated user.
    async fn update(&self, id: ObjectId, fields: UserFields) -> Result<Option<User>, AppError>;

    /// Delete a user. Returns `false` when nothing was deleted.
    async fn delete(&self, id: ObjectId) -> Result<bool, AppError>;

    /// Append `request_id` to the user's request list.
    ///
    /// Returns `false` when no user matched.
    async fn push_request(&self, user_id: ObjectId, request_id: ObjectId)
        -> Result<bool, AppError>;
}

/// MongoDB implementation of the UserRepository.
pub struct MongoUserRepository {
    collection: mongodb::Collection<User>,
}

impl MongoUserRepository {
    pub fn new(db: &mongodb::Database) -> Self {
        Self {
            collection: db.collection("users"),
        }
    }

    /// Create the unique index on `email`.
    pub async fn ensure_indexes(&self) -> Result<(), AppError> {
        use mongodb::bson::doc;
        use mongodb::options::IndexOptions;
        use mongodb::IndexModel;

        let index = IndexModel::builder()
            .keys(doc! { "email": 1 })
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
impl UserRepository for MongoUserRepository {
    async fn insert(&self, user: &User) -> Result<(), AppError> {
        self.collection
            .insert_one(user)
            .await
            .map_err(|e| super::map_write_error(e, "User"))?;

        Ok(())
    }

    async fn find_by_id(&self, id: ObjectId) -> Result<Option<User>, AppError> {
        use mongodb::bson::doc;

        self.collection
            .find_one(doc! { "_id": id })
            .await
            .map_err(super::map_read_error)
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<User>, AppError> {
        use mongodb::bson::doc;

        self.collection
            .find_one(doc! { "email": email })
            .await
            .map_err(super::map_read_error)
    }

    async fn update(&self, id: ObjectId, fields: UserFields) -> Result<Option<User>, AppError> {
        use mongodb::bson::{doc, DateTime};
        use mongodb::options::ReturnDocument;

        let mut set = doc! {
            "email": fields.email,
            "role": fields.role.as_str(),
            "updatedAt": DateTime::from_chrono(super::models::now()),
        };
        let mut unset = doc! {};
        match fields.building {
            Some(building) => {
                set.insert("building", building);
            }
            None => {
                unset.insert("building", "");
            }
        }
        match fields.floor {
            Some(floor) => {
                set.insert("floor", floor);
            }
            None => {
                unset.insert("floor", "");
            }
        }

        let mut update = doc! { "$set": set, "$inc": { "__v": 1 } };
        if !unset.is_empty() {
            update.insert("$unset", unset);
        }

        self.collection
            .find_one_and_update(doc! { "_id": id }, update)
            .return_document(ReturnDocument::After)
            .await
            .map_err(|e| super::map_write_error(e, "User"))
    }

    async fn delete(&self, id: ObjectId) -> Result<bool, AppError> {
        use mongodb::bson::doc;

        let result = self
            .collection
            .delete_one(doc! { "_id": id })
            .await
            .map_err(super::map_read_error)?;

        Ok(result.deleted_count > 0)
    }

    async fn push_request(
        &self,
        user_id: ObjectId,
        request_id: ObjectId,
    ) -> Result<bool, AppError> {
        use mongodb::bson::{doc, DateTime};

        let result = self
            .collection
            .update_one(
                doc! { "_id": user_id },
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
