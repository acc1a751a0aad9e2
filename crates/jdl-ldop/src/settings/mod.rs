//! Process-level settings: storage location, JD endpoints, HTTP timeouts
//! and logging.

pub mod loader;
pub mod schema;

pub use loader::{load_settings, load_settings_from_str};
pub use schema::{
    EndpointSettings, HttpSettings, LogFormat, LoggingSettings, Settings, DEFAULT_OAUTH_URL,
    DEFAULT_ROUTER_URL,
};
