pub mod espn_client;
pub mod espn_types;
