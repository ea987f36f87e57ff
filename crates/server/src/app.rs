use std::net::SocketAddr;

use anyhow::Context;
use db::DBService;

use crate::{AppState, config::ServerConfig, routes};

pub struct Server;

impl Server {
    pub async fn run(config: ServerConfig) -> anyhow::Result<()> {
        let db = DBService::new(&config.database_url)
            .await
            .context("failed to open sqlite database")?;

        let addr: SocketAddr = config
            .listen_addr
            .parse()
            .context("listen address is invalid")?;

        let state = AppState::new(db, config);
        let router = routes::router(state);

        let tcp_listener = tokio::net::TcpListener::bind(addr)
            .await
            .context("failed to bind tcp listener")?;

        tracing::info!(%addr, "taskboard server listening");

        axum::serve(tcp_listener, router.into_make_service())
            .await
            .context("taskboard server failure")?;

        Ok(())
    }
}
