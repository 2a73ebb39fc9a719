//! In-memory repositories for unit tests.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use bson::oid::ObjectId;

use crate::db::building_repository::BuildingRepository;
use crate::db::location_repository::LocationRepository;
use crate::db::models::{
    now, Building, BuildingFields, Location, LocationFields, MaintenanceRequest, Page,
    RequestFields, User, UserFields,
};
use crate::db::request_repository::RequestRepository;
use crate::db::user_repository::UserRepository;
use crate::db::Repositories;
use crate::error::AppError;

/// One store backing all four repository traits. Vectors keep insertion order.
#[derive(Default)]
pub struct MemoryStore {
    pub buildings: Mutex<Vec<Building>>,
    pub locations: Mutex<Vec<Location>>,
    pub requests: Mutex<Vec<MaintenanceRequest>>,
    pub users: Mutex<Vec<User>>,
    /// When set, every list push fails with a database error.
    pub fail_pushes: AtomicBool,
    /// When set, every request insert fails with a database error.
    pub fail_request_inserts: AtomicBool,
    /// When set, only pushes onto a user's request list fail.
    pub fail_user_pushes: AtomicBool,
}

impl MemoryStore {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn repositories(self: &Arc<Self>) -> Repositories {
        Repositories {
            buildings: self.clone(),
            locations: self.clone(),
            requests: self.clone(),
            users: self.clone(),
        }
    }

    fn check_push(&self) -> Result<(), AppError> {
        if self.fail_pushes.load(Ordering::SeqCst) {
            return Err(AppError::Database("injected push failure".into()));
        }
        Ok(())
    }
}

fn page_of<T: Clone>(items: &[T], page: Page) -> Vec<T> {
    items
        .iter()
        .skip(page.skip() as usize)
        .take(page.count() as usize)
        .cloned()
        .collect()
}

#[async_trait]
impl BuildingRepository for MemoryStore {
    async fn insert(&self, building: &Building) -> Result<(), AppError> {
        let mut buildings = self.buildings.lock().unwrap();
        if buildings.iter().any(|b| b.name == building.name) {
            return Err(AppError::Conflict("Building already exists".into()));
        }
        buildings.push(building.clone());
        Ok(())
    }

    async fn find_by_id(&self, id: ObjectId) -> Result<Option<Building>, AppError> {
        Ok(self.buildings.lock().unwrap().iter().find(|b| b.id == id).cloned())
    }

    async fn find_by_ids(&self, ids: &[ObjectId]) -> Result<Vec<Building>, AppError> {
        Ok(self
            .buildings
            .lock()
            .unwrap()
            .iter()
            .filter(|b| ids.contains(&b.id))
            .cloned()
            .collect())
    }

    async fn list(&self, page: Page) -> Result<Vec<Building>, AppError> {
        Ok(page_of(&self.buildings.lock().unwrap(), page))
    }

    async fn update(
        &self,
        id: ObjectId,
        fields: BuildingFields,
    ) -> Result<Option<Building>, AppError> {
        let mut buildings = self.buildings.lock().unwrap();
        Ok(buildings.iter_mut().find(|b| b.id == id).map(|b| {
            b.name = fields.name;
            b.floors = fields.floors;
            b.updated_at = now();
            b.version += 1;
            b.clone()
        }))
    }

    async fn delete(&self, id: ObjectId) -> Result<Option<Building>, AppError> {
        let mut buildings = self.buildings.lock().unwrap();
        let position = buildings.iter().position(|b| b.id == id);
        Ok(position.map(|i| buildings.remove(i)))
    }

    async fn push_location(
        &self,
        building_id: ObjectId,
        location_id: ObjectId,
    ) -> Result<bool, AppError> {
        self.check_push()?;
        let mut buildings = self.buildings.lock().unwrap();
        match buildings.iter_mut().find(|b| b.id == building_id) {
            Some(b) => {
                b.locations.push(location_id);
                b.version += 1;
                Ok(true)
            }
            None => Ok(false),
        }
    }
}

#[async_trait]
impl LocationRepository for MemoryStore {
    async fn insert(&self, location: &Location) -> Result<(), AppError> {
        let mut locations = self.locations.lock().unwrap();
        if locations.iter().any(|l| l.name == location.name) {
            return Err(AppError::Conflict("Location already exists".into()));
        }
        locations.push(location.clone());
        Ok(())
    }

    async fn find_by_id(&self, id: ObjectId) -> Result<Option<Location>, AppError> {
        Ok(self.locations.lock().unwrap().iter().find(|l| l.id == id).cloned())
    }

    async fn find_by_ids(&self, ids: &[ObjectId]) -> Result<Vec<Location>, AppError> {
        Ok(self
            .locations
            .lock()
            .unwrap()
            .iter()
            .filter(|l| ids.contains(&l.id))
            .cloned()
            .collect())
    }

    async fn list(&self, page: Page) -> Result<Vec<Location>, AppError> {
        Ok(page_of(&self.locations.lock().unwrap(), page))
    }

    async fn update(
        &self,
        id: ObjectId,
        fields: LocationFields,
    ) -> Result<Option<Location>, AppError> {
        let mut locations = self.locations.lock().unwrap();
        Ok(locations.iter_mut().find(|l| l.id == id).map(|l| {
            l.name = fields.name;
            l.description = fields.description;
            l.floor = fields.floor;
            l.updated_at = now();
            l.version += 1;
            l.clone()
        }))
    }

    async fn delete(&self, id: ObjectId) -> Result<Option<Location>, AppError> {
        let mut locations = self.locations.lock().unwrap();
        let position = locations.iter().position(|l| l.id == id);
        Ok(position.map(|i| locations.remove(i)))
    }

    async fn push_request(
        &self,
        location_id: ObjectId,
        request_id: ObjectId,
    ) -> Result<bool, AppError> {
        self.check_push()?;
        let mut locations = self.locations.lock().unwrap();
        match locations.iter_mut().find(|l| l.id == location_id) {
            Some(l) => {
                l.requests.push(request_id);
                l.version += 1;
                Ok(true)
            }
            None => Ok(false),
        }
    }
}

#[async_trait]
impl RequestRepository for MemoryStore {
    async fn insert(&self, request: &MaintenanceRequest) -> Result<(), AppError> {
        if self.fail_request_inserts.load(Ordering::SeqCst) {
            return Err(AppError::Database("injected insert failure".into()));
        }
        self.requests.lock().unwrap().push(request.clone());
        Ok(())
    }

    async fn find_by_id(&self, id: ObjectId) -> Result<Option<MaintenanceRequest>, AppError> {
        Ok(self.requests.lock().unwrap().iter().find(|r| r.id == id).cloned())
    }

    async fn list(&self, page: Page) -> Result<Vec<MaintenanceRequest>, AppError> {
        Ok(page_of(&self.requests.lock().unwrap(), page))
    }

    async fn list_by_student(
        &self,
        student_id: ObjectId,
    ) -> Result<Vec<MaintenanceRequest>, AppError> {
        Ok(self
            .requests
            .lock()
            .unwrap()
            .iter()
            .filter(|r| r.student_id == student_id)
            .cloned()
            .collect())
    }

    async fn update(
        &self,
        id: ObjectId,
        fields: RequestFields,
    ) -> Result<Option<MaintenanceRequest>, AppError> {
        let mut requests = self.requests.lock().unwrap();
        Ok(requests.iter_mut().find(|r| r.id == id).map(|r| {
            r.student_id = fields.student_id;
            r.description = fields.description;
            r.status = fields.status;
            r.location = fields.location;
            r.building = fields.building;
            r.estimated_completion = fields.estimated_completion;
            r.updated_at = now();
            r.version += 1;
            r.clone()
        }))
    }

    async fn delete(&self, id: ObjectId) -> Result<Option<MaintenanceRequest>, AppError> {
        let mut requests = self.requests.lock().unwrap();
        let position = requests.iter().position(|r| r.id == id);
        Ok(position.map(|i| requests.remove(i)))
    }
}

#[async_trait]
impl UserRepository for MemoryStore {
    async fn insert(&self, user: &User) -> Result<(), AppError> {
        let mut users = self.users.lock().unwrap();
        if users.iter().any(|u| u.email == user.email) {
            return Err(AppError::Conflict("User already exists".into()));
        }
        users.push(user.clone());
        Ok(())
    }

    async fn find_by_id(&self, id: ObjectId) -> Result<Option<User>, AppError> {
        Ok(self.users.lock().unwrap().iter().find(|u| u.id == id).cloned())
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<User>, AppError> {
        Ok(self
            .users
            .lock()
            .unwrap()
            .iter()
            .find(|u| u.email == email)
            .cloned())
    }

    async fn update(&self, id: ObjectId, fields: UserFields) -> Result<Option<User>, AppError> {
        let mut users = self.users.lock().unwrap();
        Ok(users.iter_mut().find(|u| u.id == id).map(|u| {
            u.email = fields.email;
            u.role = fields.role;
            u.building = fields.building;
            u.floor = fields.floor;
            u.updated_at = now();
            u.version += 1;
            u.clone()
        }))
    }

    async fn delete(&self, id: ObjectId) -> Result<bool, AppError> {
        let mut users = self.users.lock().unwrap();
        let before = users.len();
        users.retain(|u| u.id != id);
        Ok(users.len() != before)
    }

    async fn push_request(
        &self,
        user_id: ObjectId,
        request_id: ObjectId,
    ) -> Result<bool, AppError> {
        self.check_push()?;
        if self.fail_user_pushes.load(Ordering::SeqCst) {
            return Err(AppError::Database("injected user push failure".into()));
        }
        let mut users = self.users.lock().unwrap();
        match users.iter_mut().find(|u| u.id == user_id) {
            Some(u) => {
                u.requests.push(request_id);
                u.version += 1;
                Ok(true)
            }
            None => Ok(false),
        }
    }
}
