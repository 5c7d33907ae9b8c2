pub mod document;
pub mod user;
pub mod work_session;

// Re-export all models for easy importing
pub use document::*;
pub use user::*;
pub use work_session::*;
