use crate::impl_paginatable_for;
use crate::model::access::HasOwner;
use crate::model::repo::ResourceTyped;
use crate::web::AuthenticatedUser;
use crate::web::UserRole;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use sqlx::prelude::FromRow;
use sqlx::prelude::Row;
use uuid::Uuid;

use crate::model::{ModelManager, error::DatabaseResult, repo::CrudRepository};

#[derive(Debug, Serialize, Deserialize, FromRow, utoipa::ToSchema)]
pub struct Account {
    id: uuid::Uuid,
    username: String,
    #[serde(skip)]
    password_hash: String,
    role: String,
}

#[derive(Debug, Deserialize, Serialize, utoipa::ToSchema)]
pub struct AccountCreateUpdate {
    pub username: String,
    pub password_hash: String,
    pub role: String,
}

impl ResourceTyped for Account {
    fn get_resource_type() -> crate::model::repo::ResourceType {
        crate::model::repo::ResourceType::Account
    }
}

impl Account {
    pub fn id(&self) -> uuid::Uuid {
        self.id
    }

    pub fn username(&self) -> &str {
        &self.username
    }

    pub fn hash(&self) -> &str {
        &self.password_hash
    }

    pub fn role(&self) -> UserRole {
        UserRole::from(self.role.as_str())
    }
}

#[async_trait::async_trait]
impl CrudRepository<Account, AccountCreateUpdate, uuid::Uuid> for Account {
    async fn create(
        mm: &ModelManager,
        _actor: &AuthenticatedUser,
        data: AccountCreateUpdate,
    ) -> DatabaseResult<Self> {
        let result = sqlx::query(
            "INSERT INTO accounts (id, username, password_hash, role) VALUES ($1,$2,$3,$4) RETURNING id",
        )
        .bind(Uuid::new_v4())
        .bind(&data.username)
        .bind(&data.password_hash)
        .bind(&data.role)
        .fetch_one(mm.executor())
        .await?;

        let id = result.try_get("id")?;
        Ok(Account {
            id,
            username: data.username,
            password_hash: data.password_hash,
            role: data.role,
        })
    }

    async fn update(
        mut self,
        mm: &ModelManager,
        _actor: &AuthenticatedUser,
        data: AccountCreateUpdate,
    ) -> DatabaseResult<Self> {
        sqlx::query("UPDATE accounts SET username = $1 WHERE id = $2")
            .bind(&data.username)
            .bind(&self.id)
            .execute(mm.executor())
            .await?;

        self.username = data.username;
        Ok(self)
    }

    async fn delete(self, mm: &ModelManager, _actor: &AuthenticatedUser) -> DatabaseResult<()> {
        sqlx::query("DELETE FROM accounts WHERE id = $1")
            .bind(self.id)
            .execute(mm.executor())
            .await?;
        Ok(())
    }

    async fn find_by_id(
        mm: &ModelManager,
        _actor: &AuthenticatedUser,
        id: uuid::Uuid,
    ) -> DatabaseResult<Option<Self>> {
        let result = sqlx::query_as("SELECT * FROM accounts WHERE id = $1")
            .bind(id)
            .fetch_one(mm.executor())
            .await;
        if let Err(sqlx::Error::RowNotFound) = result {
            return Ok(None);
        }

        Ok(Some(result?))
    }

    async fn list(
        mm: &ModelManager,
        _actor: &AuthenticatedUser,
        limit: i64,
        offset: i64,
    ) -> DatabaseResult<Vec<Self>> {
        let result = sqlx::query_as("SELECT * FROM accounts LIMIT $1 OFFSET $2")
            .bind(limit)
            .bind(offset)
            .fetch_all(mm.executor())
            .await?;
        Ok(result)
    }

    async fn count(mm: &ModelManager, _actor: &AuthenticatedUser) -> DatabaseResult<i64> {
        let result: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM accounts")
            .fetch_one(mm.executor())
            .await?;

        Ok(result)
    }
}

impl_paginatable_for!(Account, AccountCreateUpdate, Uuid);

#[async_trait]
impl HasOwner for Account {
    type OwnerId = uuid::Uuid;

    async fn get_owner_id(
        &self,
        _mm: &ModelManager,
        _actor: &AuthenticatedUser,
    ) -> DatabaseResult<Self::OwnerId> {
        Ok(self.id) // owners of accounts are themselves
    }
}

impl Account {
    pub async fn find_by_username(
        mm: &ModelManager,
        _actor: &AuthenticatedUser,
        username: &str,
    ) -> DatabaseResult<Option<Self>> {
        let result = sqlx::query_as("SELECT * FROM accounts WHERE username = $1")
            .bind(username)
            .fetch_one(mm.executor())
            .await;
        if let Err(sqlx::Error::RowNotFound) = result {
            return Ok(None);
        }
        Ok(Some(result?))
    }

    pub async fn all_admin_ids(mm: &ModelManager) -> DatabaseResult<Vec<Uuid>> {
        let ids = sqlx::query_scalar("SELECT id FROM accounts WHERE role = 'admin'")
            .fetch_all(mm.executor())
            .await?;
        Ok(ids)
    }

    /// Seeds the bootstrap admin account on first start.
    pub async fn ensure_admin(mm: &ModelManager, password_hash: String) -> DatabaseResult<()> {
        sqlx::query(
            "INSERT INTO accounts (id, username, password_hash, role) VALUES ($1, 'admin', $2, 'admin') ON CONFLICT (username) DO NOTHING",
        )
        .bind(Uuid::new_v4())
        .bind(password_hash)
        .execute(mm.executor())
        .await?;
        Ok(())
    }
}
