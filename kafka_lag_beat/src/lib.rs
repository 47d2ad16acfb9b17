pub mod app_config;
pub mod cycle;
pub mod events;
pub mod publisher;
pub mod startup;
