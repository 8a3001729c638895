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

mod format;
mod get;
mod post;
pub mod server;
mod state;
mod template;

#[cfg(test)]
mod tests {
    use std::path::Path;
    use std::time::Duration;

    use reqwest::StatusCode;
    use serde_json::Value;
    use tokio::net::TcpStream;
    use tokio::spawn;
    use tokio::time::sleep;

    use crate::cmd::drill::server::ServerConfig;
    use crate::cmd::drill::server::start_server;
    use crate::collection::Collection;
    use crate::error::Fallible;
    use crate::helper::create_tmp_directory;
    use crate::helper::write_file;
    use crate::state::StateStore;
    use crate::types::card::CardKey;
    use crate::types::timestamp::Timestamp;

    const NOW: i64 = 1_700_000_000;

    fn clock() -> Timestamp {
        Timestamp::from_unix(NOW)
    }

    const DECK: &str = r#"{
        "name": "Geography",
        "cards": [
            {"front": "Capital of France", "back": "Paris", "tags": ["europe"]},
            {"front": "Capital of Spain", "back": "Madrid"}
        ]
    }"#;

    /// Start a server on a free port. Returns the port and the card keys in
    /// deck order.
    async fn start(dir: &Path) -> Fallible<(u16, Vec<CardKey>)> {
        let deck = write_file(dir, "geography.json", DECK)?;
        let state_path = dir.join("state.json");
        let collection = Collection::load(&[deck], Some(&state_path))?;
        let keys: Vec<CardKey> = collection.cards.iter().map(|c| c.key().clone()).collect();
        let store = StateStore::load(&state_path)?;
        let port = portpicker::pick_unused_port().unwrap();
        let config = ServerConfig {
            host: "127.0.0.1".to_string(),
            port,
            open_browser: false,
            clock,
        };
        spawn(async move { start_server(collection, store, config).await });
        loop {
            if let Ok(stream) = TcpStream::connect(("127.0.0.1", port)).await {
                drop(stream);
                break;
            }
            sleep(Duration::from_millis(1)).await;
        }
        Ok((port, keys))
    }

    async fn get_page(port: u16) -> Fallible<String> {
        let response = reqwest::get(format!("http://127.0.0.1:{port}/")).await?;
        assert!(response.status().is_success());
        assert_eq!(
            response.headers().get("content-type").unwrap(),
            "text/html; charset=utf-8"
        );
        Ok(response.text().await?)
    }

    /// Submit the form and return the page it redirects to.
    async fn post(port: u16, action: &str, card_key: Option<&CardKey>) -> Fallible<String> {
        let mut form: Vec<(&str, String)> = vec![("action", action.to_string())];
        if let Some(key) = card_key {
            form.push(("card_key", key.as_str().to_string()));
        }
        let response = reqwest::Client::new()
            .post(format!("http://127.0.0.1:{port}/"))
            .form(&form)
            .send()
            .await?;
        assert!(response.status().is_success());
        Ok(response.text().await?)
    }

    fn read_state(dir: &Path) -> Fallible<Value> {
        let text = std::fs::read_to_string(dir.join("state.json"))?;
        Ok(serde_json::from_str(&text)?)
    }

    #[tokio::test]
    async fn test_static_assets() -> Fallible<()> {
        let dir = create_tmp_directory()?;
        let (port, _) = start(dir.path()).await?;

        let response = reqwest::get(format!("http://127.0.0.1:{port}/style.css")).await?;
        assert!(response.status().is_success());
        assert_eq!(response.headers().get("content-type").unwrap(), "text/css");

        let response = reqwest::get(format!("http://127.0.0.1:{port}/script.js")).await?;
        assert!(response.status().is_success());
        assert_eq!(
            response.headers().get("content-type").unwrap(),
            "text/javascript"
        );

        let response = reqwest::get(format!("http://127.0.0.1:{port}/herp-derp")).await?;
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        Ok(())
    }

    #[tokio::test]
    async fn test_e2e() -> Fallible<()> {
        let dir = create_tmp_directory()?;
        let (port, keys) = start(dir.path()).await?;

        // The first new card is shown, answer hidden.
        let html = get_page(port).await?;
        assert!(html.contains("Capital of France"));
        assert!(!html.contains("Paris"));
        assert!(html.contains("Geography"));
        assert!(html.contains("europe"));
        assert!(html.contains(r#"id="new-count">2<"#));
        assert!(html.contains(r#"id="due-count">0<"#));
        assert!(html.contains(r#"id="total-count">2<"#));
        assert!(html.contains(r#"id="done-count">0<"#));
        assert!(html.contains(r#"value="Reveal""#));

        // Reveal.
        let html = post(port, "Reveal", Some(&keys[0])).await?;
        assert!(html.contains("Paris"));
        assert!(html.contains(r#"<span class="preview">1m</span>"#));
        assert!(html.contains(r#"<span class="preview">1d</span>"#));
        assert!(html.contains(r#"<span class="preview">2d</span>"#));
        // Still revealed on reload.
        assert!(get_page(port).await?.contains("Paris"));

        // Rate it.
        let html = post(port, "Good", Some(&keys[0])).await?;
        assert!(html.contains("Capital of Spain"));
        assert!(!html.contains("Madrid"));
        assert!(html.contains(r#"id="new-count">1<"#));
        assert!(html.contains(r#"id="done-count">1<"#));
        let state = read_state(dir.path())?;
        let saved = &state["cards"][keys[0].as_str()];
        assert_eq!(saved["due"], NOW + 86_400);
        assert_eq!(saved["repetitions"], 1);

        // Look back at the review, then return.
        let html = post(port, "Back", None).await?;
        assert!(html.contains("Review 1 of 1"));
        assert!(html.contains("Capital of France"));
        assert!(html.contains("Paris"));
        assert!(html.contains("good"));
        let html = post(port, "Next", None).await?;
        assert!(html.contains("Capital of Spain"));

        // Undo makes the first card new again.
        let html = post(port, "Undo", None).await?;
        assert!(html.contains("Capital of France"));
        assert!(html.contains(r#"id="done-count">0<"#));
        assert!(html.contains("Undid the last review"));
        // The notice is only shown once.
        assert!(!get_page(port).await?.contains("Undid the last review"));
        let state = read_state(dir.path())?;
        assert_eq!(state["cards"], serde_json::json!({}));

        // Finish both cards.
        post(port, "Good", Some(&keys[0])).await?;
        let html = post(port, "Easy", Some(&keys[1])).await?;
        assert!(html.contains("No cards available"));
        let next_due = Timestamp::from_unix(NOW + 86_400).local_display();
        assert!(html.contains(&next_due));
        Ok(())
    }

    #[tokio::test]
    async fn test_rating_unknown_card_is_ignored() -> Fallible<()> {
        let dir = create_tmp_directory()?;
        let (port, _) = start(dir.path()).await?;

        let html = post(port, "Good", Some(&CardKey::from("nope:nope"))).await?;
        assert!(html.contains(r#"id="done-count">0<"#));
        let html = post(port, "Good", None).await?;
        assert!(html.contains(r#"id="done-count">0<"#));
        assert!(!dir.path().join("state.json").exists());

        // Nothing to undo.
        let html = post(port, "Undo", None).await?;
        assert!(html.contains("Capital of France"));
        assert!(!html.contains("Undid the last review"));
        Ok(())
    }

    #[tokio::test]
    async fn test_unknown_action_is_rejected() -> Fallible<()> {
        let dir = create_tmp_directory()?;
        let (port, keys) = start(dir.path()).await?;

        let response = reqwest::Client::new()
            .post(format!("http://127.0.0.1:{port}/"))
            .form(&[("action", "Forgot"), ("card_key", keys[0].as_str())])
            .send()
            .await?;
        assert!(response.status().is_client_error());
        assert!(!dir.path().join("state.json").exists());
        Ok(())
    }
}
