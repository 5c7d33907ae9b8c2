pub mod auth;
pub mod clock;
pub mod export;
pub mod report;
pub mod roster;

pub use auth::AuthService;
pub use clock::ClockService;
