pub mod adapters;
pub mod aggregate;
pub mod api;
pub mod db;
pub mod environment;
pub mod logging;
pub mod model;
pub mod normalize;
pub mod sample;
pub mod score;

pub const TARGET_WEB_REQUEST: &str = "web_request";
pub const TARGET_AGGREGATOR: &str = "aggregator";
pub const TARGET_DB: &str = "db_query";
