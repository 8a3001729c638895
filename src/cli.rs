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

use std::path::PathBuf;

use clap::Parser;

use crate::cmd::check::check_decks;
use crate::cmd::drill::server::ServerConfig;
use crate::cmd::drill::server::start_server;
use crate::cmd::stats::print_stats;
use crate::collection::Collection;
use crate::error::Fallible;
use crate::state::StateStore;
use crate::types::timestamp::Timestamp;

const DEFAULT_STATE_FILE: &str = "arnold_state.json";

#[derive(Parser, Debug, PartialEq)]
#[command(version, about, long_about = None)]
enum Command {
    /// Drill cards in the browser.
    Drill {
        /// Deck files, or directories to search for deck files.
        #[arg(required = true)]
        paths: Vec<PathBuf>,
        /// Where review state is stored.
        #[arg(long, default_value = DEFAULT_STATE_FILE)]
        state_file: PathBuf,
        /// The host address to bind to.
        #[arg(long, default_value = "127.0.0.1")]
        host: String,
        /// The port to use for the web server.
        #[arg(long, default_value_t = 8000)]
        port: u16,
        /// Don't open the browser automatically.
        #[arg(long, alias = "no-open", default_value_t = false)]
        no_browser: bool,
    },
    /// Check the integrity of the given decks.
    Check {
        #[arg(required = true)]
        paths: Vec<PathBuf>,
    },
    /// Print deck and schedule statistics as JSON.
    Stats {
        #[arg(required = true)]
        paths: Vec<PathBuf>,
        #[arg(long, default_value = DEFAULT_STATE_FILE)]
        state_file: PathBuf,
    },
}

pub async fn entrypoint() -> Fallible<()> {
    let cli: Command = Command::parse();
    match cli {
        Command::Drill {
            paths,
            state_file,
            host,
            port,
            no_browser,
        } => {
            let collection = Collection::load(&paths, Some(&state_file))?;
            let store = StateStore::load(&state_file)?;
            let config = ServerConfig {
                host,
                port,
                open_browser: !no_browser,
                clock: Timestamp::now,
            };
            start_server(collection, store, config).await
        }
        Command::Check { paths } => check_decks(&paths),
        Command::Stats { paths, state_file } => print_stats(&paths, &state_file, Timestamp::now()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_drill_defaults() {
        let cmd = Command::try_parse_from(["arnold", "drill", "decks/"]).unwrap();
        assert_eq!(
            cmd,
            Command::Drill {
                paths: vec![PathBuf::from("decks/")],
                state_file: PathBuf::from("arnold_state.json"),
                host: "127.0.0.1".to_string(),
                port: 8000,
                no_browser: false,
            }
        );
    }

    #[test]
    fn test_drill_flags() {
        let cmd = Command::try_parse_from([
            "arnold",
            "drill",
            "a.json",
            "b.json",
            "--state-file",
            "/tmp/state.json",
            "--host",
            "0.0.0.0",
            "--port",
            "9000",
            "--no-open",
        ])
        .unwrap();
        assert_eq!(
            cmd,
            Command::Drill {
                paths: vec![PathBuf::from("a.json"), PathBuf::from("b.json")],
                state_file: PathBuf::from("/tmp/state.json"),
                host: "0.0.0.0".to_string(),
                port: 9000,
                no_browser: true,
            }
        );
    }

    #[test]
    fn test_paths_required() {
        assert!(Command::try_parse_from(["arnold", "drill"]).is_err());
        assert!(Command::try_parse_from(["arnold", "check"]).is_err());
        assert!(Command::try_parse_from(["arnold", "stats"]).is_err());
    }

    #[test]
    fn test_stats() {
        let cmd = Command::try_parse_from(["arnold", "stats", "deck.json"]).unwrap();
        assert_eq!(
            cmd,
            Command::Stats {
                paths: vec![PathBuf::from("deck.json")],
                state_file: PathBuf::from("arnold_state.json"),
            }
        );
    }
}
