pub mod classifier;
pub mod executor;
pub mod factory;
pub mod repository;
pub mod templates;
