pub mod document;
pub mod user;
pub mod work_session;

// Re-export all repositories for easy importing
pub use document::DocumentRepository;
pub use user::UserRepository;
pub use work_session::WorkSessionRepository;
