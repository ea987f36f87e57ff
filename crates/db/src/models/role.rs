use chrono::Utc;
use serde::{Deserialize, Serialize};
use sqlx::SqlitePool;
use strum::IntoEnumIterator;
use strum_macros::{Display, EnumIter, EnumString};
use ts_rs::TS;

#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Deserialize,
    sqlx::Type,
    TS,
    Display,
    EnumString,
    EnumIter,
)]
#[sqlx(type_name = "role", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum Role {
    User,
    Manager,
    Admin,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS, Display)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum Permission {
    ViewTasks,
    UpdateOwnTasks,
    AssignTasks,
    ViewReports,
    ManageUsers,
}

impl Role {
    pub fn permissions(self) -> &'static [Permission] {
        match self {
            Role::User => &[Permission::ViewTasks, Permission::UpdateOwnTasks],
            Role::Manager => &[
                Permission::ViewTasks,
                Permission::AssignTasks,
                Permission::ViewReports,
            ],
            Role::Admin => &[
                Permission::ViewTasks,
                Permission::ManageUsers,
                Permission::AssignTasks,
                Permission::ViewReports,
            ],
        }
    }

    pub fn has_permission(self, permission: Permission) -> bool {
        self.permissions().contains(&permission)
    }

    /// Inserts every role that is not yet present in the `roles` table.
    pub async fn seed(pool: &SqlitePool) -> Result<(), sqlx::Error> {
        for role in Role::iter() {
            let permissions = serde_json::to_string(role.permissions())
                .map_err(|err| sqlx::Error::Encode(Box::new(err)))?;

            let result = sqlx::query(
                r#"INSERT INTO roles (name, permissions, created_at)
                   VALUES ($1, $2, $3)
                   ON CONFLICT(name) DO NOTHING"#,
            )
            .bind(role)
            .bind(permissions)
            .bind(Utc::now())
            .execute(pool)
            .await?;

            if result.rows_affected() > 0 {
                tracing::info!(%role, "role created");
            } else {
                tracing::debug!(%role, "role already exists");
            }
        }
        Ok(())
    }

    pub async fn find_all_names(pool: &SqlitePool) -> Result<Vec<String>, sqlx::Error> {
        sqlx::query_scalar(r#"SELECT name FROM roles ORDER BY name"#)
            .fetch_all(pool)
            .await
    }
}
