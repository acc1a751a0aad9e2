pub mod db;
pub mod entity;
pub mod error;
pub mod gateway;
pub mod logging;
pub mod request;
pub mod service;
pub mod settings;
pub mod sign;
pub mod store;
pub mod time;

pub use db::{Database, DatabaseError};
pub use entity::{
    AccessToken, JdlConfig, LogisticsDetail, Party, PickupOrder, PickupOrderStatus,
    ResponseFormat, TraceKey, WaybillStatus, DEFAULT_TOKEN_ID,
};
pub use error::{JdlError, Result, SettingsError, ValidationError};
pub use gateway::{ApiGateway, ErrorEnvelope};
pub use logging::init_logging;
pub use request::{RequestBuilder, SignedRequest};
pub use service::{
    map_trace_event, MappedTrace, PickupOrderWorkflow, TraceReconciler, TraceSync,
    DEFAULT_CANCEL_REASON,
};
pub use settings::{load_settings, load_settings_from_str, Settings};
pub use sign::{sign, sign_with, SignMethod};
pub use store::{ConfigStore, LogisticsDetailStore, PickupOrderStore, TokenStore};
