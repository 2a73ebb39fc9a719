use axum::Router;
use testcontainers::runners::AsyncRunner;
use testcontainers::ContainerAsync;
use testcontainers_modules::mongo::Mongo;

use facilities::app::{router, AppState};
use facilities::auth::middleware::TokenVerifier;
use facilities::auth::models::Role;
use facilities::db::Repositories;

pub const JWT_SECRET: &str = "integration-secret";

/// Holds a running MongoDB container and the router wired to it.
///
/// The container is stopped when this struct is dropped.
pub struct TestEnv {
    _mongo: ContainerAsync<Mongo>,
    pub repos: Repositories,
    pub router: Router,
}

impl TestEnv {
    /// Start MongoDB and build the router with bearer auth enabled.
    pub async fn start() -> Self {
        let mongo = Mongo::default()
            .start()
            .await
            .expect("Failed to start MongoDB container");
        let port = mongo
            .get_host_port_ipv4(27017)
            .await
            .expect("Failed to get MongoDB port");
        let client = mongodb::Client::with_uri_str(format!("mongodb://127.0.0.1:{port}"))
            .await
            .expect("Failed to connect to MongoDB");
        let db = client.database("facilities_test");
        let repos = Repositories::connect(&db)
            .await
            .expect("Failed to prepare repositories");

        let router = router(AppState::new(
            repos.clone(),
            Some(TokenVerifier::new(JWT_SECRET)),
        ));

        Self {
            _mongo: mongo,
            repos,
            router,
        }
    }

    /// A `TestServer` that fails any request not answered with 2xx.
    pub fn server(&self) -> axum_test::TestServer {
        axum_test::TestServer::builder()
            .expect_success_by_default()
            .build(self.router.clone())
    }

    /// A `TestServer` for error-path tests.
    pub fn server_permissive(&self) -> axum_test::TestServer {
        axum_test::TestServer::builder()
            .build(self.router.clone())
    }
}

/// A valid admin bearer token for the test secret.
pub fn admin_token() -> String {
    TokenVerifier::new(JWT_SECRET)
        .issue(
            "integration-admin",
            "admin@campus.edu",
            Role::Admin,
            chrono::Duration::hours(1),
        )
        .expect("Failed to sign token")
}

/// A name that will not collide with other tests' records.
pub fn unique(prefix: &str) -> String {
    format!("{prefix}-{}", uuid::Uuid::new_v4().simple())
}
