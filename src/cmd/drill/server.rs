// Copyright 2025 Fernando Borretti
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

use std::time::Duration;

use axum::Router;
use axum::http::HeaderName;
use axum::http::StatusCode;
use axum::http::header::CACHE_CONTROL;
use axum::http::header::CONTENT_TYPE;
use axum::response::Html;
use axum::routing::get;
use axum::routing::post;
use tokio::net::TcpListener;
use tokio::net::TcpStream;
use tokio::signal::ctrl_c;
use tokio::time::sleep;

use crate::cmd::drill::get::get_handler;
use crate::cmd::drill::post::post_handler;
use crate::cmd::drill::state::Clock;
use crate::cmd::drill::state::ServerState;
use crate::collection::Collection;
use crate::error::Fallible;
use crate::state::StateStore;

pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub open_browser: bool,
    pub clock: Clock,
}

pub async fn start_server(
    collection: Collection,
    store: StateStore,
    config: ServerConfig,
) -> Fallible<()> {
    log::debug!(
        "Serving {} cards from {} decks, state in {}.",
        collection.cards.len(),
        collection.decks.len(),
        store.path().display()
    );
    if store.is_empty() {
        log::info!("No review state yet, every card is new.");
    } else {
        log::debug!("{} cards have been reviewed before.", store.len());
    }
    let state = ServerState::new(collection, store, config.clock);
    let app = Router::new();
    let app = app.route("/", get(get_handler));
    let app = app.route("/", post(post_handler));
    let app = app.route("/script.js", get(script));
    let app = app.route("/style.css", get(stylesheet));
    let app = app.fallback(not_found_handler);
    let app = app.with_state(state);
    let bind = format!("{}:{}", config.host, config.port);

    // Start a separate task to open the browser once the server is up.
    if config.open_browser {
        let url = format!("http://{bind}/");
        let bind = bind.clone();
        tokio::spawn(async move {
            loop {
                if let Ok(stream) = TcpStream::connect(&bind).await {
                    drop(stream);
                    break;
                }
                sleep(Duration::from_millis(1)).await;
            }
            if let Err(e) = open::that(&url) {
                log::warn!("Could not open the browser: {e}");
            }
        });
    }

    log::info!("Starting server on http://{bind}/");
    let listener = TcpListener::bind(&bind).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;
    Ok(())
}

async fn shutdown_signal() {
    match ctrl_c().await {
        Ok(()) => log::info!("Shutting down."),
        Err(e) => {
            log::error!("Could not listen for Ctrl-C: {e}");
            std::future::pending::<()>().await;
        }
    }
}

async fn script() -> (StatusCode, [(HeaderName, &'static str); 1], &'static str) {
    let content = include_str!("script.js");
    (StatusCode::OK, [(CONTENT_TYPE, "text/javascript")], content)
}

async fn stylesheet() -> (StatusCode, [(HeaderName, &'static str); 2], &'static [u8]) {
    let bytes = include_bytes!("style.css");
    (
        StatusCode::OK,
        [
            (CONTENT_TYPE, "text/css"),
            (CACHE_CONTROL, "public, max-age=604800, immutable"),
        ],
        bytes,
    )
}

async fn not_found_handler() -> (StatusCode, Html<String>) {
    (StatusCode::NOT_FOUND, Html("Not Found".to_string()))
}
