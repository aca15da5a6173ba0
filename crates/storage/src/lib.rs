pub mod dto;
pub mod engine;
pub mod error;
pub mod history;
pub mod models;
pub mod rank_table;
pub mod rating;
pub mod repository;

use sqlx::PgPool;
use sqlx::postgres::PgPoolOptions;

use crate::error::Result;

pub use engine::LadderEngine;
pub use error::{LadderError, StorageError};
pub use repository::memory::MemoryStore;
pub use repository::postgres::PgLadderStore;

#[derive(Clone)]
pub struct Database {
    pool: PgPool,
}

impl Database {
    pub async fn new(database_url: &str) -> Result<Self> {
        let pool = PgPoolOptions::new()
            .max_connections(10)
            .connect(database_url)
            .await?;

        Ok(Self { pool })
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    pub async fn run_migrations(&self) -> Result<()> {
        sqlx::migrate!("./migrations").run(&self.pool).await?;
        Ok(())
    }
}
