pub mod config;
pub mod database;
pub mod error;
pub mod handlers;
pub mod middleware;
pub mod routes;
pub mod services;

use sqlx::SqlitePool;

pub use config::Config;
pub use database::repositories::{DocumentRepository, UserRepository, WorkSessionRepository};
pub use services::{AuthService, ClockService};

pub struct AppState {
    pub config: Config,
    pub auth_service: AuthService,
    pub clock_service: ClockService,
    pub user_repository: UserRepository,
    pub work_session_repository: WorkSessionRepository,
    pub document_repository: DocumentRepository,
}

impl AppState {
    pub fn new(config: Config, pool: SqlitePool) -> Self {
        let user_repository = UserRepository::new(pool.clone());
        let work_session_repository = WorkSessionRepository::new(pool.clone());
        let document_repository = DocumentRepository::new(pool);

        Self {
            auth_service: AuthService::new(user_repository.clone(), config.clone()),
            clock_service: ClockService::new(work_session_repository.clone(), config.clone()),
            config,
            user_repository,
            work_session_repository,
            document_repository,
        }
    }
}
