use std::sync::Arc;

use r2d2::Pool;
use r2d2_sqlite::SqliteConnectionManager;
use tokio::sync::Mutex;

use crate::auth::sessions::SessionStore;
use crate::config::Config;
use crate::directory::{DirectoryRepository, SqliteDirectoryRepository};

pub type DbPool = Pool<SqliteConnectionManager>;

#[derive(Clone)]
pub struct AppState {
    pub config: Config,
    pub directory: Arc<dyn DirectoryRepository>,
    pub sessions: Arc<Mutex<SessionStore>>,
}

impl AppState {
    pub fn new(db: DbPool, config: Config) -> Self {
        let sessions = SessionStore::new(config.auth.token_ttl());
        Self {
            config,
            directory: Arc::new(SqliteDirectoryRepository::new(db)),
            sessions: Arc::new(Mutex::new(sessions)),
        }
    }
}
