//! Storage seams used by the gateway and the workflows.
//!
//! `Database` implements every trait; tests substitute their own doubles.

use crate::db::{
    config_repo, logistics_detail_repo, pickup_order_repo, token_repo, Database, DatabaseError,
};
use crate::entity::{AccessToken, JdlConfig, LogisticsDetail, PickupOrder, TraceKey};

pub trait ConfigStore: Send + Sync {
    /// The lowest-id active config.
    fn default_config(&self) -> Result<Option<JdlConfig>, DatabaseError>;
    fn find_all_active(&self) -> Result<Vec<JdlConfig>, DatabaseError>;
    fn find(&self, id: i64) -> Result<Option<JdlConfig>, DatabaseError>;
}

pub trait TokenStore: Send + Sync {
    fn find(&self, id: i64) -> Result<Option<AccessToken>, DatabaseError>;
}

pub trait PickupOrderStore: Send + Sync {
    /// Persists the order immediately.
    fn save(&self, order: &mut PickupOrder) -> Result<(), DatabaseError>;
}

pub trait LogisticsDetailStore: Send + Sync {
    fn find_one_by(&self, key: &TraceKey) -> Result<Option<LogisticsDetail>, DatabaseError>;
    fn insert(&self, detail: &mut LogisticsDetail) -> Result<(), DatabaseError>;
}

impl ConfigStore for Database {
    fn default_config(&self) -> Result<Option<JdlConfig>, DatabaseError> {
        config_repo::default_config(self)
    }

    fn find_all_active(&self) -> Result<Vec<JdlConfig>, DatabaseError> {
        config_repo::find_all_active(self)
    }

    fn find(&self, id: i64) -> Result<Option<JdlConfig>, DatabaseError> {
        config_repo::find(self, id)
    }
}

impl TokenStore for Database {
    fn find(&self, id: i64) -> Result<Option<AccessToken>, DatabaseError> {
        token_repo::find(self, id)
    }
}

impl PickupOrderStore for Database {
    fn save(&self, order: &mut PickupOrder) -> Result<(), DatabaseError> {
        pickup_order_repo::save(self, order)
    }
}

impl LogisticsDetailStore for Database {
    fn find_one_by(&self, key: &TraceKey) -> Result<Option<LogisticsDetail>, DatabaseError> {
        logistics_detail_repo::find_one_by(self, key)
    }

    fn insert(&self, detail: &mut LogisticsDetail) -> Result<(), DatabaseError> {
        logistics_detail_repo::insert(self, detail)
    }
}
