use std::collections::{HashMap, HashSet};

use bson::oid::ObjectId;

use crate::db::models::{Building, Location, MaintenanceRequest, Page};
use crate::db::Repositories;
use crate::error::AppError;

/// A maintenance request with its location and building resolved.
///
/// A reference whose record no longer exists resolves to `None`.
#[derive(Debug, Clone, PartialEq)]
pub struct ExpandedRequest {
    pub request: MaintenanceRequest,
    pub location: Option<Location>,
    pub building: Option<Building>,
}

/// Resolves the weak location/building references stored on requests.
pub struct QueryExpander<'a> {
    repos: &'a Repositories,
}

impl<'a> QueryExpander<'a> {
    pub fn new(repos: &'a Repositories) -> Self {
        Self { repos }
    }

    /// Fetch one request with its references expanded.
    pub async fn get_request(&self, id: ObjectId) -> Result<Option<ExpandedRequest>, AppError> {
        match self.repos.requests.find_by_id(id).await? {
            Some(request) => self.expand(request).await.map(Some),
            None => Ok(None),
        }
    }

    /// Fetch one page of requests, in insertion order, expanded.
    pub async fn get_requests(&self, page: Page) -> Result<Vec<ExpandedRequest>, AppError> {
        let requests = self.repos.requests.list(page).await?;
        self.expand_all(requests).await
    }

    /// Fetch every request filed by `user_id`, expanded.
    pub async fn get_requests_by_user(
        &self,
        user_id: ObjectId,
    ) -> Result<Vec<ExpandedRequest>, AppError> {
        let requests = self.repos.requests.list_by_student(user_id).await?;
        self.expand_all(requests).await
    }

    /// Resolve the references of a single request.
    pub async fn expand(&self, request: MaintenanceRequest) -> Result<ExpandedRequest, AppError> {
        let location = self.repos.locations.find_by_id(request.location).await?;
        let building = self.repos.buildings.find_by_id(request.building).await?;
        Ok(ExpandedRequest {
            request,
            location,
            building,
        })
    }

    /// Resolve a batch with one lookup per referenced collection.
    async fn expand_all(
        &self,
        requests: Vec<MaintenanceRequest>,
    ) -> Result<Vec<ExpandedRequest>, AppError> {
        if requests.is_empty() {
            return Ok(Vec::new());
        }

        let location_ids = distinct(requests.iter().map(|r| r.location));
        let building_ids = distinct(requests.iter().map(|r| r.building));

        let locations: HashMap<ObjectId, Location> = self
            .repos
            .locations
            .find_by_ids(&location_ids)
            .await?
            .into_iter()
            .map(|l| (l.id, l))
            .collect();
        let buildings: HashMap<ObjectId, Building> = self
            .repos
            .buildings
            .find_by_ids(&building_ids)
            .await?
            .into_iter()
            .map(|b| (b.id, b))
            .collect();

        Ok(requests
            .into_iter()
            .map(|request| ExpandedRequest {
                location: locations.get(&request.location).cloned(),
                building: buildings.get(&request.building).cloned(),
                request,
            })
            .collect())
    }
}

fn distinct(ids: impl Iterator<Item = ObjectId>) -> Vec<ObjectId> {
    let mut seen = HashSet::new();
    ids.filter(|id| seen.insert(*id)).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::models::Role;
    use crate::db::models::{
        BuildingFields, LocationFields, NewLocation, RequestFields, User, UserFields,
    };
    use crate::relations::ReferenceMaintainer;
    use crate::testing::MemoryStore;

    struct Fixture {
        repos: Repositories,
        building: Building,
        location: Location,
        user: User,
    }

    async fn fixture() -> Fixture {
        let store = MemoryStore::new();
        let repos = store.repositories();

        let building = Building::new(BuildingFields {
            name: "Hall".to_string(),
            floors: vec!["1".to_string()],
        });
        repos.buildings.insert(&building).await.unwrap();

        let user = User::new(UserFields {
            email: "a@b.com".to_string(),
            role: Role::Student,
            building: None,
            floor: None,
        });
        repos.users.insert(&user).await.unwrap();

        let location = ReferenceMaintainer::new(&repos)
            .create_location(NewLocation {
                fields: LocationFields {
                    name: "Room1".to_string(),
                    description: Some("Corner room".to_string()),
                    floor: "1".to_string(),
                },
                building_id: building.id,
            })
            .await
            .unwrap();

        Fixture {
            repos,
            building,
            location,
            user,
        }
    }

    async fn file_request(f: &Fixture, description: &str) -> MaintenanceRequest {
        ReferenceMaintainer::new(&f.repos)
            .create_request(RequestFields {
                student_id: f.user.id,
                description: description.to_string(),
                status: "pending".to_string(),
                location: f.location.id,
                building: f.building.id,
                estimated_completion: None,
            })
            .await
            .unwrap()
    }

    #[tokio::test]
    async fn test_get_request_expands_references() {
        let f = fixture().await;
        let request = file_request(&f, "fix sink").await;

        let expanded = QueryExpander::new(&f.repos)
            .get_request(request.id)
            .await
            .unwrap()
            .unwrap();

        assert_eq!(expanded.request.student_id, f.user.id);
        let location = expanded.location.unwrap();
        assert_eq!(location.id, f.location.id);
        assert_eq!(location.requests, vec![request.id]);
        let building = expanded.building.unwrap();
        assert_eq!(building.id, f.building.id);
        assert_eq!(building.locations, vec![f.location.id]);
    }

    #[tokio::test]
    async fn test_get_request_missing() {
        let f = fixture().await;
        let result = QueryExpander::new(&f.repos)
            .get_request(ObjectId::new())
            .await
            .unwrap();
        assert!(result.is_none());
    }

    #[tokio::test]
    async fn test_dangling_reference_resolves_to_none() {
        let f = fixture().await;
        let request = file_request(&f, "fix sink").await;
        f.repos.locations.delete(f.location.id).await.unwrap();

        let expander = QueryExpander::new(&f.repos);
        let single = expander.get_request(request.id).await.unwrap().unwrap();
        assert!(single.location.is_none());
        assert!(single.building.is_some());

        let listed = expander.get_requests(Page::new(1, 10).unwrap()).await.unwrap();
        assert_eq!(listed.len(), 1);
        assert!(listed[0].location.is_none());
        assert!(listed[0].building.is_some());
    }

    #[tokio::test]
    async fn test_get_requests_pages_in_insertion_order() {
        let f = fixture().await;
        let mut ids = Vec::new();
        for i in 0..7 {
            ids.push(file_request(&f, &format!("job {i}")).await.id);
        }

        let expander = QueryExpander::new(&f.repos);
        let page = |p, k| Page::new(p, k).unwrap();

        let second: Vec<ObjectId> = expander
            .get_requests(page(2, 3))
            .await
            .unwrap()
            .into_iter()
            .map(|e| e.request.id)
            .collect();
        assert_eq!(second, ids[3..6].to_vec());

        let last = expander.get_requests(page(3, 3)).await.unwrap();
        assert_eq!(last.len(), 1);
        assert_eq!(last[0].request.id, ids[6]);

        assert!(expander.get_requests(page(4, 3)).await.unwrap().is_empty());

        let all = expander.get_requests(page(1, 10)).await.unwrap();
        assert!(all.iter().all(|e| e.location.is_some() && e.building.is_some()));
    }

    #[tokio::test]
    async fn test_get_requests_by_user() {
        let f = fixture().await;
        let first = file_request(&f, "fix sink").await;
        let second = file_request(&f, "replace bulb").await;

        let other = User::new(UserFields {
            email: "other@b.com".to_string(),
            role: Role::Custodian,
            building: None,
            floor: None,
        });
        f.repos.users.insert(&other).await.unwrap();

        let expander = QueryExpander::new(&f.repos);
        let mine = expander.get_requests_by_user(f.user.id).await.unwrap();
        let ids: Vec<ObjectId> = mine.iter().map(|e| e.request.id).collect();
        assert_eq!(ids, vec![first.id, second.id]);
        assert!(mine.iter().all(|e| e.location.is_some()));

        assert!(expander
            .get_requests_by_user(other.id)
            .await
            .unwrap()
            .is_empty());
    }

    #[test]
    fn test_distinct_keeps_first_occurrence_order() {
        let a = ObjectId::new();
        let b = ObjectId::new();
        assert_eq!(distinct([a, b, a, b].into_iter()), vec![a, b]);
    }

    #[test]
    fn test_distinct_large_batch() {
        let ids: Vec<ObjectId> = (0..5_000).map(|_| ObjectId::new()).collect();
        let repeated = ids.iter().chain(ids.iter()).copied();
        assert_eq!(distinct(repeated), ids);
    }
}
