pub mod building_repository;
pub mod location_repository;
pub mod models;
pub mod request_repository;
pub mod user_repository;

use std::sync::Arc;

use futures::TryStreamExt;
use mongodb::error::{ErrorKind, WriteFailure};

use crate::error::AppError;
use building_repository::{BuildingRepository, MongoBuildingRepository};
use location_repository::{LocationRepository, MongoLocationRepository};
use request_repository::{MongoRequestRepository, RequestRepository};
use user_repository::{MongoUserRepository, UserRepository};

/// MongoDB error code for a unique index violation.
const DUPLICATE_KEY: i32 = 11000;

/// The four record stores, shared by every handler.
#[derive(Clone)]
pub struct Repositories {
    pub buildings: Arc<dyn BuildingRepository>,
    pub locations: Arc<dyn LocationRepository>,
    pub requests: Arc<dyn RequestRepository>,
    pub users: Arc<dyn UserRepository>,
}

impl Repositories {
    /// Build MongoDB-backed repositories and make sure their indexes exist.
    pub async fn connect(db: &mongodb::Database) -> Result<Self, AppError> {
        let buildings = MongoBuildingRepository::new(db);
        let locations = MongoLocationRepository::new(db);
        let requests = MongoRequestRepository::new(db);
        let users = MongoUserRepository::new(db);

        buildings.ensure_indexes().await?;
        locations.ensure_indexes().await?;
        requests.ensure_indexes().await?;
        users.ensure_indexes().await?;

        Ok(Self {
            buildings: Arc::new(buildings),
            locations: Arc::new(locations),
            requests: Arc::new(requests),
            users: Arc::new(users),
        })
    }
}

/// Convert a driver error, turning unique-index violations into `Conflict`.
pub(crate) fn map_write_error(err: mongodb::error::Error, what: &str) -> AppError {
    let duplicate = match err.kind.as_ref() {
        ErrorKind::Write(WriteFailure::WriteError(e)) => e.code == DUPLICATE_KEY,
        ErrorKind::Command(e) => e.code == DUPLICATE_KEY,
        _ => false,
    };

    if duplicate {
        AppError::Conflict(format!("{what} already exists"))
    } else {
        AppError::Database(err.to_string())
    }
}

pub(crate) fn map_read_error(err: mongodb::error::Error) -> AppError {
    AppError::Database(err.to_string())
}

/// Drain a cursor into a vector.
pub(crate) async fn collect<T>(cursor: mongodb::Cursor<T>) -> Result<Vec<T>, AppError>
where
    T: serde::de::DeserializeOwned + Send + Sync + Unpin,
{
    cursor.try_collect().await.map_err(map_read_error)
}
