pub mod cluster;
pub mod connection_settings;
pub mod error;
pub mod policy;
pub mod queries;
