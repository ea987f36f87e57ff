use std::{str::FromStr, time::Duration};

use sqlx::{
    Error, Pool, Sqlite, SqlitePool,
    sqlite::{SqliteConnectOptions, SqliteJournalMode},
};

pub mod models;

use models::role::Role;

#[derive(Clone)]
pub struct DBService {
    pub pool: Pool<Sqlite>,
}

impl DBService {
    /// Opens (creating if needed) the database at `database_url`, applies the
    /// embedded migrations and seeds the role catalog.
    pub async fn new(database_url: &str) -> Result<DBService, Error> {
        let pool = Self::create_pool(database_url).await?;
        Role::seed(&pool).await?;
        Ok(DBService { pool })
    }

    async fn create_pool(database_url: &str) -> Result<Pool<Sqlite>, Error> {
        let options = SqliteConnectOptions::from_str(database_url)?
            .create_if_missing(true)
            .foreign_keys(true)
            .journal_mode(SqliteJournalMode::Wal)
            .busy_timeout(Duration::from_secs(5));
        let pool = SqlitePool::connect_with(options).await?;
        sqlx::migrate!("./migrations").run(&pool).await?;
        Ok(pool)
    }
}
