//! Test harness wiring an in-memory database to a stub JD server.

#![allow(dead_code)]

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use mockito::{Matcher, Mock, ServerGuard};
use serde_json::Value;

use jdl_ldop::db::{config_repo, token_repo};
use jdl_ldop::settings::{EndpointSettings, HttpSettings};
use jdl_ldop::{
    ApiGateway, Database, DatabaseError, JdlConfig, PickupOrder, PickupOrderStore,
    PickupOrderWorkflow, Settings, TraceReconciler,
};

use super::builders;

pub const ROUTER_PATH: &str = "/routerjson";
pub const OAUTH_PATH: &str = "/oauth2/to_login";

/// Order store that counts saves before delegating to the database.
pub struct CountingOrderStore {
    db: Database,
    saves: AtomicUsize,
}

impl CountingOrderStore {
    pub fn new(db: Database) -> Self {
        Self {
            db,
            saves: AtomicUsize::new(0),
        }
    }

    pub fn saves(&self) -> usize {
        self.saves.load(Ordering::SeqCst)
    }
}

impl PickupOrderStore for CountingOrderStore {
    fn save(&self, order: &mut PickupOrder) -> Result<(), DatabaseError> {
        self.saves.fetch_add(1, Ordering::SeqCst);
        self.db.save(order)
    }
}

pub struct TestHarness {
    pub server: ServerGuard,
    pub db: Database,
    pub settings: Settings,
    pub orders: Arc<CountingOrderStore>,
}

impl TestHarness {
    pub async fn new() -> Self {
        let server = mockito::Server::new_async().await;
        let db = Database::open_in_memory().expect("Failed to create test database");
        let settings = Settings {
            endpoints: EndpointSettings {
                router_url: format!("{}{}", server.url(), ROUTER_PATH),
                oauth_url: format!("{}{}", server.url(), OAUTH_PATH),
            },
            http: HttpSettings {
                connect_timeout_secs: 5,
                request_timeout_secs: 5,
            },
            ..Settings::default()
        };
        let orders = Arc::new(CountingOrderStore::new(db.clone()));

        Self {
            server,
            db,
            settings,
            orders,
        }
    }

    /// Harness with config C1/K1/S1 and token T1 stored.
    pub async fn seeded() -> Self {
        let harness = Self::new().await;
        harness.seed_config(builders::config("C1", "K1", "S1"));
        harness.seed_token(1, "T1");
        harness
    }

    pub fn seed_config(&self, mut config: JdlConfig) -> JdlConfig {
        config_repo::save(&self.db, &mut config).expect("Failed to save config");
        config
    }

    pub fn seed_token(&self, id: i64, access_token: &str) {
        let mut token = builders::token(id, access_token);
        token_repo::save(&self.db, &mut token).expect("Failed to save token");
    }

    pub fn gateway(&self) -> Arc<ApiGateway> {
        Arc::new(ApiGateway::from_database(&self.db, &self.settings).expect("Failed to build gateway"))
    }

    pub fn workflow(&self) -> PickupOrderWorkflow {
        PickupOrderWorkflow::new(self.gateway(), self.orders.clone())
    }

    pub fn reconciler(&self) -> TraceReconciler {
        TraceReconciler::new(self.gateway(), Arc::new(self.db.clone()))
    }

    /// Stubs one router method with a JSON body.
    pub async fn mock_method(&mut self, method: &str, body: &Value) -> Mock {
        self.server
            .mock("POST", ROUTER_PATH)
            .match_body(Matcher::UrlEncoded("method".into(), method.into()))
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(body.to_string())
            .create_async()
            .await
    }

    /// A router stub that must never be hit.
    pub async fn mock_router_unused(&mut self) -> Mock {
        self.server
            .mock("POST", ROUTER_PATH)
            .expect(0)
            .create_async()
            .await
    }
}
