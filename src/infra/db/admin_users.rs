use async_trait::async_trait;
use sqlx::FromRow;
use time::OffsetDateTime;

use crate::application::repos::{AdminUsersRepo, RepoError};
use crate::domain::posts::AdminUser;

use super::{PostgresRepositories, map_sqlx_error};

#[derive(Debug, FromRow)]
struct AdminUserRow {
    id: i64,
    username: String,
    email: Option<String>,
    password_hash: String,
    is_active: bool,
    last_login: Option<OffsetDateTime>,
}

impl From<AdminUserRow> for AdminUser {
    fn from(row: AdminUserRow) -> Self {
        AdminUser {
            id: row.id,
            username: row.username,
            email: row.email,
            password_hash: row.password_hash,
            is_active: row.is_active,
            last_login: row.last_login,
        }
    }
}

#[async_trait]
impl AdminUsersRepo for PostgresRepositories {
    async fn find_active_by_username(
        &self,
        username: &str,
    ) -> Result<Option<AdminUser>, RepoError> {
        let row: Option<AdminUserRow> = sqlx::query_as(
            "SELECT id, username, email, password_hash, is_active, last_login \
             FROM admin_users WHERE username = $1 AND is_active",
        )
        .bind(username)
        .fetch_optional(self.pool())
        .await
        .map_err(map_sqlx_error)?;

        Ok(row.map(AdminUser::from))
    }

    async fn record_login(&self, id: i64) -> Result<(), RepoError> {
        sqlx::query("UPDATE admin_users SET last_login = now() WHERE id = $1")
            .bind(id)
            .execute(self.pool())
            .await
            .map_err(map_sqlx_error)?;
        Ok(())
    }
}
