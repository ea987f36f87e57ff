use std::sync::Arc;

use db::DBService;
use services::services::{
    auth::AuthService, dashboard::DashboardService, tasks::TaskService, users::UserService,
};

use crate::config::ServerConfig;

#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    config: ServerConfig,
    auth: AuthService,
    tasks: TaskService,
    users: UserService,
    dashboard: DashboardService,
}

impl AppState {
    pub fn new(db: DBService, config: ServerConfig) -> Self {
        let auth = AuthService::new(db.clone(), &config.jwt_secret, config.session_ttl);
        Self {
            inner: Arc::new(AppStateInner {
                tasks: TaskService::new(db.clone()),
                users: UserService::new(db.clone()),
                dashboard: DashboardService::new(db),
                auth,
                config,
            }),
        }
    }

    pub fn config(&self) -> &ServerConfig {
        &self.inner.config
    }

    pub fn auth(&self) -> &AuthService {
        &self.inner.auth
    }

    pub fn tasks(&self) -> &TaskService {
        &self.inner.tasks
    }

    pub fn users(&self) -> &UserService {
        &self.inner.users
    }

    pub fn dashboard(&self) -> &DashboardService {
        &self.inner.dashboard
    }
}
