pub mod db;
pub mod grading;
pub mod models;
pub mod pagination;
pub mod repos;
pub mod workflow;
