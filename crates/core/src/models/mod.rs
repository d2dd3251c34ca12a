pub mod chart;
pub mod granularity;
pub mod settings;
pub mod user;
