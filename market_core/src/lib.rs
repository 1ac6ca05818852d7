pub mod config;
pub mod entity;
pub mod error;
pub mod ids;
pub mod models;
pub mod service;
pub mod time;

use sea_orm::{DatabaseConnection, DbErr};
use tracing::info;

use crate::service::{
    accounts::AccountsService, board::BoardService, items::ItemsService,
    messages::MessagesService, notifications::NotificationsService, requests::RequestsService,
    social::SocialService, stocks::StocksService,
};

/// Every service, sharing one connection pool.
#[derive(Clone)]
pub struct Services {
    pub accounts: AccountsService,
    pub items: ItemsService,
    pub requests: RequestsService,
    pub stocks: StocksService,
    pub board: BoardService,
    pub social: SocialService,
    pub messages: MessagesService,
    pub notifications: NotificationsService,
}

impl Services {
    pub fn new(db: DatabaseConnection) -> Self {
        Self {
            accounts: AccountsService::new(db.clone()),
            items: ItemsService::new(db.clone()),
            requests: RequestsService::new(db.clone()),
            stocks: StocksService::new(db.clone()),
            board: BoardService::new(db.clone()),
            social: SocialService::new(db.clone()),
            messages: MessagesService::new(db.clone()),
            notifications: NotificationsService::new(db),
        }
    }
}

/// Main runtime handle for the marketplace.
#[derive(Clone)]
pub struct MarketCore {
    pub config: config::MarketConfig,
    pub db: DatabaseConnection,
    pub services: Services,
}

impl MarketCore {
    /// Open the database, apply migrations and wire up the services.
    pub async fn start(config: config::MarketConfig) -> Result<Self, DbErr> {
        let db = models::open_or_create_db(&config).await?;
        models::migrate_up(&db).await?;

        info!("market core started");
        Ok(Self {
            config,
            services: Services::new(db.clone()),
            db,
        })
    }

    /// Services over an already-migrated in-memory database.
    #[cfg(any(test, feature = "test-utils"))]
    pub async fn in_memory(config: config::MarketConfig) -> Self {
        let db = models::memory_db().await;
        Self {
            config,
            services: Services::new(db.clone()),
            db,
        }
    }
}

pub mod prelude {
    pub use super::config;
    pub use super::entity;
    pub use super::error;
    pub use super::ids;
    pub use super::models;
    pub use super::service;
    pub use super::{MarketCore, Services};
}
