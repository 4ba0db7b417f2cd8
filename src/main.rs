// SPDX-License-Identifier: BSD-3-Clause
// Copyright (c) 2026 Aleksandr Ptakhin

use anyhow::Context;
use gemsearch_agent::app::{self, AppState};
use gemsearch_agent::gemini;
use gemsearch_agent::services::store::{PageStore, StoreConfig};
use std::env;
use tokio::net::TcpListener;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let store_config = StoreConfig::from_env()?;
    let store = PageStore::connect(&store_config)
        .await
        .context("connecting to the page store")?;
    info!("connected to the page store");

    let listen_addr =
        env::var("GEMSEARCH_LISTEN").unwrap_or_else(|_| "0.0.0.0:1965".to_string());
    let listener = TcpListener::bind(&listen_addr)
        .await
        .with_context(|| format!("binding {listen_addr}"))?;
    info!(addr = %listen_addr, version = app::VERSION, "gemsearch agent listening");

    let state = AppState::new(store);
    gemini::serve(listener, state).await?;
    Ok(())
}
