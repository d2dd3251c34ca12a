pub mod aggregation_service;
pub mod auth_service;
