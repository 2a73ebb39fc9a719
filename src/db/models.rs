use bson::oid::ObjectId;
use chrono::{DateTime, SubsecRound, Utc};
use serde::{Deserialize, Serialize};

use crate::auth::models::Role;
use crate::error::AppError;

/// Current time truncated to the millisecond precision MongoDB stores.
pub fn now() -> DateTime<Utc> {
    Utc::now().trunc_subsecs(3)
}

/// A campus building, stored in the `buildings` collection.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Building {
    #[serde(rename = "_id")]
    pub id: ObjectId,
    /// Unique building name.
    pub name: String,
    /// Floor labels, in display order.
    pub floors: Vec<String>,
    /// Locations created inside this building.
    #[serde(default)]
    pub locations: Vec<ObjectId>,
    #[serde(with = "bson::serde_helpers::chrono_datetime_as_bson_datetime")]
    pub created_at: DateTime<Utc>,
    #[serde(with = "bson::serde_helpers::chrono_datetime_as_bson_datetime")]
    pub updated_at: DateTime<Utc>,
    /// Bumped by every update and every list push.
    #[serde(rename = "__v", default)]
    pub version: i64,
}

impl Building {
    pub fn new(fields: BuildingFields) -> Self {
        let now = now();
        Self {
            id: ObjectId::new(),
            name: fields.name,
            floors: fields.floors,
            locations: Vec::new(),
            created_at: now,
            updated_at: now,
            version: 0,
        }
    }
}

/// A room inside a building, stored in the `locations` collection.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Location {
    #[serde(rename = "_id")]
    pub id: ObjectId,
    /// Unique room name.
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub floor: String,
    #[serde(with = "bson::serde_helpers::chrono_datetime_as_bson_datetime")]
    pub last_cleaned: DateTime<Utc>,
    /// Maintenance requests filed against this room.
    #[serde(default)]
    pub requests: Vec<ObjectId>,
    #[serde(with = "bson::serde_helpers::chrono_datetime_as_bson_datetime")]
    pub created_at: DateTime<Utc>,
    #[serde(with = "bson::serde_helpers::chrono_datetime_as_bson_datetime")]
    pub updated_at: DateTime<Utc>,
    #[serde(rename = "__v", default)]
    pub version: i64,
}

impl Location {
    pub fn new(fields: LocationFields) -> Self {
        let now = now();
        Self {
            id: ObjectId::new(),
            name: fields.name,
            description: fields.description,
            floor: fields.floor,
            last_cleaned: now,
            requests: Vec::new(),
            created_at: now,
            updated_at: now,
            version: 0,
        }
    }
}

/// A campus user, stored in the `users` collection.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    #[serde(rename = "_id")]
    pub id: ObjectId,
    /// Unique email address.
    pub email: String,
    pub role: Role,
    /// Building the user is assigned to, if any.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub building: Option<ObjectId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub floor: Option<String>,
    /// Maintenance requests filed by this user.
    #[serde(default)]
    pub requests: Vec<ObjectId>,
    #[serde(with = "bson::serde_helpers::chrono_datetime_as_bson_datetime")]
    pub created_at: DateTime<Utc>,
    #[serde(with = "bson::serde_helpers::chrono_datetime_as_bson_datetime")]
    pub updated_at: DateTime<Utc>,
    #[serde(rename = "__v", default)]
    pub version: i64,
}

impl User {
    pub fn new(fields: UserFields) -> Self {
        let now = now();
        Self {
            id: ObjectId::new(),
            email: fields.email,
            role: fields.role,
            building: fields.building,
            floor: fields.floor,
            requests: Vec::new(),
            created_at: now,
            updated_at: now,
            version: 0,
        }
    }
}

/// A maintenance request, stored in the `requests` collection.
///
/// `location` and `building` are weak references: they are looked up on
/// read and never enforced by the store.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MaintenanceRequest {
    #[serde(rename = "_id")]
    pub id: ObjectId,
    /// The user who filed the request.
    pub student_id: ObjectId,
    pub description: String,
    /// Free-form status (`pending`, `completed`, ...).
    pub status: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub estimated_completion: Option<String>,
    pub location: ObjectId,
    pub building: ObjectId,
    #[serde(with = "bson::serde_helpers::chrono_datetime_as_bson_datetime")]
    pub created_at: DateTime<Utc>,
    #[serde(with = "bson::serde_helpers::chrono_datetime_as_bson_datetime")]
    pub updated_at: DateTime<Utc>,
    #[serde(rename = "__v", default)]
    pub version: i64,
}

impl MaintenanceRequest {
    pub fn new(fields: RequestFields) -> Self {
        let now = now();
        Self {
            id: ObjectId::new(),
            student_id: fields.student_id,
            description: fields.description,
            status: fields.status,
            estimated_completion: fields.estimated_completion,
            location: fields.location,
            building: fields.building,
            created_at: now,
            updated_at: now,
            version: 0,
        }
    }
}

/// Validated building input, used for both create and update.
#[derive(Debug, Clone, PartialEq)]
pub struct BuildingFields {
    pub name: String,
    pub floors: Vec<String>,
}

/// Validated location input. The owning building is carried separately
/// in [`NewLocation`] because updates never move a location.
#[derive(Debug, Clone, PartialEq)]
pub struct LocationFields {
    pub name: String,
    pub description: Option<String>,
    pub floor: String,
}

/// A location to create inside `building_id`.
#[derive(Debug, Clone, PartialEq)]
pub struct NewLocation {
    pub fields: LocationFields,
    pub building_id: ObjectId,
}

/// Validated user input, used for both create and update.
#[derive(Debug, Clone, PartialEq)]
pub struct UserFields {
    pub email: String,
    pub role: Role,
    pub building: Option<ObjectId>,
    pub floor: Option<String>,
}

/// Validated maintenance request input, used for both create and update.
#[derive(Debug, Clone, PartialEq)]
pub struct RequestFields {
    pub student_id: ObjectId,
    pub description: String,
    pub status: String,
    pub location: ObjectId,
    pub building: ObjectId,
    pub estimated_completion: Option<String>,
}

/// A 1-indexed page window over a listing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Page {
    page: u32,
    count: u32,
}

impl Page {
    /// Build a page window. Both values must be positive.
    pub fn new(page: u32, count: u32) -> Result<Self, AppError> {
        if page == 0 {
            return Err(AppError::invalid("page", "Page must be greater than 0"));
        }
        if count == 0 {
            return Err(AppError::invalid("count", "Count must be greater than 0"));
        }
        Ok(Self { page, count })
    }

    pub fn page(&self) -> u32 {
        self.page
    }

    pub fn count(&self) -> u32 {
        self.count
    }

    /// Number of records preceding this page.
    pub fn skip(&self) -> u64 {
        u64::from(self.page - 1) * u64::from(self.count)
    }
}
