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

use std::collections::BTreeMap;
use std::fs::File;
use std::fs::create_dir_all;
use std::fs::read_to_string;
use std::fs::remove_file;
use std::fs::rename;
use std::io::Write;
use std::path::Path;
use std::path::PathBuf;

use serde::Serialize;
use serde_json::Value;

use crate::error::ErrorReport;
use crate::error::Fallible;
use crate::scheduler::StateLookup;
use crate::types::card::CardKey;
use crate::types::schedule::ScheduleState;
use crate::types::timestamp::Timestamp;

const FORMAT_VERSION: u32 = 1;

/// The schedule state of every reviewed card, backed by a JSON file.
pub struct StateStore {
    path: PathBuf,
    cards: BTreeMap<CardKey, ScheduleState>,
}

#[derive(Serialize)]
struct StateFile<'a> {
    version: u32,
    updated_at: Timestamp,
    cards: &'a BTreeMap<CardKey, ScheduleState>,
}

impl StateStore {
    /// Load the store from `path`. A missing or blank file is an empty store.
    pub fn load(path: &Path) -> Fallible<Self> {
        let cards = if path.exists() {
            let text = read_to_string(path)
                .map_err(|e| state_error(path, format!("Could not read state file: {e}")))?;
            parse_cards(path, &text)?
        } else {
            BTreeMap::new()
        };
        log::debug!("Loaded {} card states from {}.", cards.len(), path.display());
        Ok(Self {
            path: path.to_path_buf(),
            cards,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn get(&self, key: &CardKey) -> Option<ScheduleState> {
        self.cards.get(key).copied()
    }

    pub fn set(&mut self, key: CardKey, state: ScheduleState) {
        self.cards.insert(key, state);
    }

    pub fn remove(&mut self, key: &CardKey) -> Option<ScheduleState> {
        self.cards.remove(key)
    }

    pub fn len(&self) -> usize {
        self.cards.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cards.is_empty()
    }

    /// Write the store to disk. The file is replaced atomically: the new
    /// contents go to a sibling temporary file which is then renamed over the
    /// target.
    pub fn save(&self, now: Timestamp) -> Fallible<()> {
        let payload = StateFile {
            version: FORMAT_VERSION,
            updated_at: now,
            cards: &self.cards,
        };
        let mut json = serde_json::to_string_pretty(&payload)?;
        json.push('\n');

        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                create_dir_all(parent)?;
            }
        }
        let tmp_path = self.tmp_path();
        let result = write_and_sync(&tmp_path, &json)
            .and_then(|()| rename(&tmp_path, &self.path).map_err(ErrorReport::from));
        if result.is_err() && tmp_path.exists() {
            let _ = remove_file(&tmp_path);
        }
        result?;
        log::debug!("Saved {} card states to {}.", self.cards.len(), self.path.display());
        Ok(())
    }

    fn tmp_path(&self) -> PathBuf {
        let mut name = self
            .path
            .file_name()
            .map(|n| n.to_os_string())
            .unwrap_or_default();
        name.push(".tmp");
        self.path.with_file_name(name)
    }
}

impl StateLookup for StateStore {
    fn lookup(&self, key: &CardKey) -> Option<&ScheduleState> {
        self.cards.get(key)
    }
}

fn write_and_sync(path: &Path, contents: &str) -> Fallible<()> {
    let mut file = File::create(path)?;
    file.write_all(contents.as_bytes())?;
    file.flush()?;
    file.sync_all()?;
    Ok(())
}

fn state_error(path: &Path, message: impl Into<String>) -> ErrorReport {
    ErrorReport::new(format!("{}: {}", path.display(), message.into()))
}

/// Accepts both the current format (`{"version": 1, "cards": {...}}`) and
/// the legacy flat mapping of keys to states.
fn parse_cards(path: &Path, text: &str) -> Fallible<BTreeMap<CardKey, ScheduleState>> {
    if text.trim().is_empty() {
        return Ok(BTreeMap::new());
    }
    let raw: Value = serde_json::from_str(text)
        .map_err(|e| state_error(path, format!("Invalid JSON: {e}")))?;
    let Value::Object(mut obj) = raw else {
        return Err(state_error(path, "State file must be a JSON object."));
    };
    let entries = match obj.remove("cards") {
        Some(Value::Object(cards)) => cards,
        Some(other) => {
            // A legacy file whose only oddity is a card keyed "cards".
            obj.insert("cards".to_string(), other);
            obj
        }
        None => obj,
    };

    let mut cards = BTreeMap::new();
    for (key, value) in entries {
        let state: ScheduleState = serde_json::from_value(value)
            .map_err(|e| state_error(path, format!("Invalid state for '{key}': {e}")))?;
        state
            .validate()
            .map_err(|e| state_error(path, format!("Invalid state for '{key}': {}", e.message())))?;
        cards.insert(CardKey::from(key), state);
    }
    Ok(cards)
}
