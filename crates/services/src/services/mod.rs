pub mod auth;
pub mod authorization;
pub mod dashboard;
pub mod dependencies;
pub mod tasks;
pub mod users;
