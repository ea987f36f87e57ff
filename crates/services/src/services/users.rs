use std::str::FromStr;

use db::{
    DBService,
    models::{
        role::Role,
        user::{CreateUser, User},
    },
};
use serde::Deserialize;
use sqlx::SqlitePool;
use thiserror::Error;
use ts_rs::TS;
use uuid::Uuid;

use super::{
    auth::{AuthError, Principal, hash_password},
    authorization::{AccessDenied, authorize_user_admin},
};

const MIN_PASSWORD_LEN: usize = 6;

#[derive(Debug, Error)]
pub enum UserError {
    #[error("User not found")]
    NotFound,
    #[error("Email already exists")]
    Conflict,
    #[error("{0}")]
    Validation(String),
    #[error("{0}")]
    Forbidden(String),
    #[error(transparent)]
    Auth(#[from] AuthError),
    #[error(transparent)]
    Database(sqlx::Error),
}

impl From<AccessDenied> for UserError {
    fn from(denied: AccessDenied) -> Self {
        UserError::Forbidden(denied.0.to_string())
    }
}

impl From<sqlx::Error> for UserError {
    fn from(err: sqlx::Error) -> Self {
        match &err {
            sqlx::Error::Database(db_err) if db_err.is_unique_violation() => UserError::Conflict,
            _ => UserError::Database(err),
        }
    }
}

#[derive(Debug, Clone, Deserialize, TS)]
pub struct Registration {
    pub name: String,
    pub email: String,
    pub password: String,
}

/// Admin-side account creation. `role` is parsed leniently so that an unknown
/// name surfaces as a validation error rather than a rejected body.
#[derive(Debug, Clone, Deserialize, TS)]
pub struct NewUser {
    pub name: String,
    pub email: String,
    pub password: String,
    pub role: String,
}

fn parse_role(role: &str) -> Result<Role, UserError> {
    Role::from_str(role.trim()).map_err(|_| UserError::Validation("Invalid role".to_string()))
}

fn validate_registration(registration: &Registration) -> Result<(String, String), UserError> {
    let name = registration.name.trim();
    if name.is_empty() {
        return Err(UserError::Validation("Name is required".to_string()));
    }
    let email = registration.email.trim().to_lowercase();
    if !email.contains('@') {
        return Err(UserError::Validation(
            "A valid email address is required".to_string(),
        ));
    }
    if registration.password.chars().count() < MIN_PASSWORD_LEN {
        return Err(UserError::Validation(format!(
            "Password must be at least {MIN_PASSWORD_LEN} characters"
        )));
    }
    Ok((name.to_string(), email))
}

#[derive(Clone)]
pub struct UserService {
    db: DBService,
}

impl UserService {
    pub fn new(db: DBService) -> Self {
        Self { db }
    }

    fn pool(&self) -> &SqlitePool {
        &self.db.pool
    }

    async fn insert(&self, registration: &Registration, role: Role) -> Result<User, UserError> {
        let (name, email) = validate_registration(registration)?;
        let data = CreateUser {
            name,
            email,
            password_hash: hash_password(&registration.password)?,
            role,
        };
        let user = User::create(self.pool(), &data, Uuid::new_v4()).await?;
        tracing::info!(user_id = %user.id, %role, "user created");
        Ok(user)
    }

    /// Self-service sign-up; always yields a `user`.
    pub async fn register(&self, registration: Registration) -> Result<User, UserError> {
        self.insert(&registration, Role::User).await
    }

    pub async fn create_with_role(
        &self,
        principal: &Principal,
        new_user: NewUser,
    ) -> Result<User, UserError> {
        authorize_user_admin(principal.role)?;
        let role = parse_role(&new_user.role)?;
        let registration = Registration {
            name: new_user.name,
            email: new_user.email,
            password: new_user.password,
        };
        self.insert(&registration, role).await
    }

    pub async fn list(&self, principal: &Principal) -> Result<Vec<User>, UserError> {
        authorize_user_admin(principal.role)?;
        Ok(User::find_all(self.pool()).await?)
    }

    pub async fn promote(
        &self,
        principal: &Principal,
        user_id: Uuid,
        role: &str,
    ) -> Result<User, UserError> {
        authorize_user_admin(principal.role)?;
        let role = parse_role(role)?;
        let user = User::update_role(self.pool(), user_id, role)
            .await?
            .ok_or(UserError::NotFound)?;
        tracing::info!(%user_id, %role, by = %principal.id, "user role changed");
        Ok(user)
    }

    /// Removes the account. Owned tasks lose their owner, worker rows go away
    /// and comments keep their text with no author.
    pub async fn delete(&self, principal: &Principal, user_id: Uuid) -> Result<(), UserError> {
        authorize_user_admin(principal.role)?;
        if User::delete(self.pool(), user_id).await? == 0 {
            return Err(UserError::NotFound);
        }
        tracing::info!(%user_id, by = %principal.id, "user deleted");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn registration(name: &str, email: &str, password: &str) -> Registration {
        Registration {
            name: name.to_string(),
            email: email.to_string(),
            password: password.to_string(),
        }
    }

    #[test]
    fn registration_normalizes_email() {
        let (name, email) =
            validate_registration(&registration("  Ada ", " Ada@Example.COM ", "secret1")).unwrap();
        assert_eq!(name, "Ada");
        assert_eq!(email, "ada@example.com");
    }

    #[test]
    fn registration_rejects_bad_input() {
        for input in [
            registration(" ", "a@b.c", "secret1"),
            registration("Ada", "not-an-email", "secret1"),
            registration("Ada", "a@b.c", "short"),
        ] {
            assert!(matches!(
                validate_registration(&input),
                Err(UserError::Validation(_))
            ));
        }
    }

    #[test]
    fn role_names_are_trimmed_before_parsing() {
        assert_eq!(parse_role(" manager ").unwrap(), Role::Manager);
        assert!(matches!(parse_role("superuser"), Err(UserError::Validation(_))));
    }
}
