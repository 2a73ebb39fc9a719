//! JSON shapes returned by the API. Ids render as hex strings and
//! timestamps as ISO-8601.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::auth::models::Role;
use crate::db::models::{Building, Location, MaintenanceRequest, User};
use crate::relations::ExpandedRequest;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BuildingView {
    #[serde(rename = "_id")]
    pub id: String,
    pub name: String,
    pub floors: Vec<String>,
    pub locations: Vec<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    #[serde(rename = "__v")]
    pub version: i64,
}

impl From<Building> for BuildingView {
    fn from(b: Building) -> Self {
        Self {
            id: b.id.to_hex(),
            name: b.name,
            floors: b.floors,
            locations: b.locations.iter().map(|id| id.to_hex()).collect(),
            created_at: b.created_at,
            updated_at: b.updated_at,
            version: b.version,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LocationView {
    #[serde(rename = "_id")]
    pub id: String,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub floor: String,
    pub last_cleaned: DateTime<Utc>,
    pub requests: Vec<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    #[serde(rename = "__v")]
    pub version: i64,
}

impl From<Location> for LocationView {
    fn from(l: Location) -> Self {
        Self {
            id: l.id.to_hex(),
            name: l.name,
            description: l.description,
            floor: l.floor,
            last_cleaned: l.last_cleaned,
            requests: l.requests.iter().map(|id| id.to_hex()).collect(),
            created_at: l.created_at,
            updated_at: l.updated_at,
            version: l.version,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserView {
    #[serde(rename = "_id")]
    pub id: String,
    pub email: String,
    pub role: Role,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub building: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub floor: Option<String>,
    pub requests: Vec<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    #[serde(rename = "__v")]
    pub version: i64,
}

impl From<User> for UserView {
    fn from(u: User) -> Self {
        Self {
            id: u.id.to_hex(),
            email: u.email,
            role: u.role,
            building: u.building.map(|id| id.to_hex()),
            floor: u.floor,
            requests: u.requests.iter().map(|id| id.to_hex()).collect(),
            created_at: u.created_at,
            updated_at: u.updated_at,
            version: u.version,
        }
    }
}

/// A request as stored: `location` and `building` are bare ids.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RequestView {
    #[serde(rename = "_id")]
    pub id: String,
    pub student_id: String,
    pub description: String,
    pub status: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub estimated_completion: Option<String>,
    pub location: String,
    pub building: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    #[serde(rename = "__v")]
    pub version: i64,
}

impl From<MaintenanceRequest> for RequestView {
    fn from(r: MaintenanceRequest) -> Self {
        Self {
            id: r.id.to_hex(),
            student_id: r.student_id.to_hex(),
            description: r.description,
            status: r.status,
            estimated_completion: r.estimated_completion,
            location: r.location.to_hex(),
            building: r.building.to_hex(),
            created_at: r.created_at,
            updated_at: r.updated_at,
            version: r.version,
        }
    }
}

/// A request with `location` and `building` replaced by full records
/// (`null` when the referenced record is gone). `studentId` stays an id.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExpandedRequestView {
    #[serde(rename = "_id")]
    pub id: String,
    pub student_id: String,
    pub description: String,
    pub status: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub estimated_completion: Option<String>,
    pub location: Option<LocationView>,
    pub building: Option<BuildingView>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    #[serde(rename = "__v")]
    pub version: i64,
}

impl From<ExpandedRequest> for ExpandedRequestView {
    fn from(e: ExpandedRequest) -> Self {
        let r = e.request;
        Self {
            id: r.id.to_hex(),
            student_id: r.student_id.to_hex(),
            description: r.description,
            status: r.status,
            estimated_completion: r.estimated_completion,
            location: e.location.map(LocationView::from),
            building: e.building.map(BuildingView::from),
            created_at: r.created_at,
            updated_at: r.updated_at,
            version: r.version,
        }
    }
}
