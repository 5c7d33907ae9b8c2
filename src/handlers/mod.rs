pub mod admin;
pub mod dashboard;
pub mod documents;
pub mod health;
pub mod session;
pub mod shared;
