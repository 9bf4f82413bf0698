mod access;
pub use access::check_access;

mod database;
pub use database::DbConnection;

pub mod entity;

mod error;
pub use error::{DatabaseError, DatabaseResult};

mod repo;
pub use repo::{CrudRepository, Page, PaginatableRepository, ResourceType, ResourceTyped};

use sqlx::pool::PoolConnection;
use sqlx::{PgPool, Postgres, Transaction};

#[derive(Debug, Clone)]
pub struct ModelManager {
    database: DbConnection,
}

impl ModelManager {
    pub fn new(conn: DbConnection) -> Self {
        Self { database: conn }
    }

    pub fn executor(&self) -> &PgPool {
        self.database.pool()
    }

    /// Multi-step mutations (curriculum sync, approval transitions) must run
    /// on an explicit transaction, never on the ambient pool.
    pub async fn begin(&self) -> DatabaseResult<Transaction<'static, Postgres>> {
        Ok(self.database.pool().begin().await?)
    }

    pub async fn acquire(&self) -> DatabaseResult<PoolConnection<Postgres>> {
        Ok(self.database.pool().acquire().await?)
    }
}
