//! Configuration module for the FIX gateway.
//!
//! Two sources: the FIX session settings file (identity and session-scoped
//! order fields) and environment variables (file location, paper venue,
//! demo order).

mod gateway_config;
mod session_settings;

pub use gateway_config::{GatewayEnvConfig, PaperVenueConfig};
pub use session_settings::{
    ACCOUNT, BEGIN_STRING, DESTINATION, SENDER_COMP_ID, SessionFields, SessionSettings,
    TARGET_COMP_ID, TARGET_SUB_ID,
};
