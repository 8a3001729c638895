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

use std::collections::HashSet;
use std::error::Error;
use std::fmt::Display;
use std::fmt::Formatter;
use std::fs::read_to_string;
use std::path::Path;
use std::path::PathBuf;

use serde::Serialize;
use serde_json::Map;
use serde_json::Value;
use walkdir::WalkDir;

use crate::error::ErrorReport;
use crate::error::Fallible;
use crate::error::fail;
use crate::hash::card_id_for_content;
use crate::hash::deck_id_for_path;
use crate::types::card::Card;
use crate::types::card::CardData;

pub struct Deck {
    pub deck_id: String,
    pub name: String,
    pub cards: Vec<Card>,
}

/// Every problem found in a single deck file.
#[derive(Debug)]
pub struct DeckValidationError {
    pub path: PathBuf,
    pub errors: Vec<String>,
}

impl DeckValidationError {
    fn single(path: &Path, error: String) -> Self {
        Self {
            path: path.to_path_buf(),
            errors: vec![error],
        }
    }
}

impl Display for DeckValidationError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}:", self.path.display())?;
        for error in &self.errors {
            write!(f, "\n- {error}")?;
        }
        Ok(())
    }
}

impl Error for DeckValidationError {}

impl From<DeckValidationError> for ErrorReport {
    fn from(value: DeckValidationError) -> Self {
        ErrorReport::new(value.to_string())
    }
}

/// The content a card's id is derived from. Fields are in sorted order so
/// the serialized form is canonical.
#[derive(Serialize)]
struct CanonicalCard<'a> {
    back: &'a str,
    front: &'a str,
    tags: &'a [String],
}

/// Load and validate a single deck file. `deck_index` is the position of the
/// deck among all loaded decks, and becomes the first half of each card's
/// order.
pub fn load_deck(path: &Path, deck_index: usize) -> Result<Deck, DeckValidationError> {
    let text = read_to_string(path)
        .map_err(|e| DeckValidationError::single(path, format!("Could not read file: {e}")))?;
    let data: Value = serde_json::from_str(&text)
        .map_err(|e| DeckValidationError::single(path, format!("Invalid JSON: {e}")))?;
    let canonical_path = path
        .canonicalize()
        .map_err(|e| DeckValidationError::single(path, format!("Could not resolve path: {e}")))?;

    let mut name: Option<String> = None;
    let cards_raw: &Vec<Value> = match &data {
        Value::Array(items) => items,
        Value::Object(obj) => {
            name = obj.get("name").and_then(Value::as_str).map(str::to_string);
            match obj.get("cards") {
                Some(Value::Array(items)) => items,
                Some(_) => {
                    return Err(DeckValidationError::single(
                        path,
                        "Top-level field 'cards' must be an array.".to_string(),
                    ));
                }
                None => {
                    return Err(DeckValidationError::single(
                        path,
                        "Missing required top-level field 'cards' (array).".to_string(),
                    ));
                }
            }
        }
        _ => {
            return Err(DeckValidationError::single(
                path,
                "Deck JSON must be an array of cards or an object with a 'cards' array."
                    .to_string(),
            ));
        }
    };

    let deck_id = deck_id_for_path(&canonical_path.display().to_string());
    let deck_name = match name {
        Some(name) => name,
        None => path
            .file_stem()
            .map(|stem| stem.to_string_lossy().to_string())
            .unwrap_or_else(|| deck_id.clone()),
    };

    let mut errors: Vec<String> = Vec::new();
    let mut cards: Vec<Card> = Vec::new();
    let mut seen: HashSet<String> = HashSet::new();
    for (card_index, raw) in cards_raw.iter().enumerate() {
        let Some(obj) = raw.as_object() else {
            errors.push(format!("Card {card_index}: must be an object."));
            continue;
        };
        let front = string_field(obj, "front", card_index, &mut errors);
        let back = string_field(obj, "back", card_index, &mut errors);
        if obj.contains_key("id") {
            errors.push(format!(
                "Card {card_index}: field 'id' is deprecated; card ids are derived from content."
            ));
        }
        let tags = tags_field(obj, card_index, &mut errors);

        let (Some(front), Some(back), Some(tags)) = (front, back, tags) else {
            continue;
        };
        let canonical = CanonicalCard {
            back: &back,
            front: &front,
            tags: &tags,
        };
        let card_id = match serde_json::to_string(&canonical) {
            Ok(json) => card_id_for_content(&json),
            Err(e) => {
                errors.push(format!("Card {card_index}: could not hash content: {e}"));
                continue;
            }
        };
        if !seen.insert(card_id.clone()) {
            log::debug!(
                "{}: card {card_index} duplicates an earlier card, skipping.",
                path.display()
            );
            continue;
        }
        cards.push(Card::new(CardData {
            deck_id: deck_id.clone(),
            card_id,
            front,
            back,
            tags,
            deck_name: deck_name.clone(),
            deck_path: canonical_path.clone(),
            order: (deck_index, card_index),
        }));
    }

    if !errors.is_empty() {
        return Err(DeckValidationError {
            path: path.to_path_buf(),
            errors,
        });
    }

    log::debug!("Loaded deck '{deck_name}' with {} cards.", cards.len());
    Ok(Deck {
        deck_id,
        name: deck_name,
        cards,
    })
}

fn string_field(
    obj: &Map<String, Value>,
    field: &str,
    card_index: usize,
    errors: &mut Vec<String>,
) -> Option<String> {
    match obj.get(field) {
        Some(Value::String(s)) => Some(s.clone()),
        Some(_) => {
            errors.push(format!(
                "Card {card_index}: field '{field}' must be a string."
            ));
            None
        }
        None => {
            errors.push(format!(
                "Card {card_index}: missing required field '{field}'."
            ));
            None
        }
    }
}

/// Tags are optional. When present they are sorted and de-duplicated.
fn tags_field(
    obj: &Map<String, Value>,
    card_index: usize,
    errors: &mut Vec<String>,
) -> Option<Vec<String>> {
    let Some(raw) = obj.get("tags") else {
        return Some(Vec::new());
    };
    let tags: Option<Vec<String>> = raw.as_array().and_then(|items| {
        items
            .iter()
            .map(|item| item.as_str().map(str::to_string))
            .collect()
    });
    match tags {
        Some(mut tags) => {
            tags.sort();
            tags.dedup();
            Some(tags)
        }
        None => {
            errors.push(format!(
                "Card {card_index}: field 'tags' must be a list of strings when provided."
            ));
            None
        }
    }
}

/// Load every deck, collecting failures rather than stopping at the first.
pub fn load_decks(paths: &[PathBuf]) -> (Vec<Deck>, Vec<DeckValidationError>) {
    let mut decks = Vec::new();
    let mut failures = Vec::new();
    for (index, path) in paths.iter().enumerate() {
        match load_deck(path, index) {
            Ok(deck) => decks.push(deck),
            Err(e) => failures.push(e),
        }
    }
    (decks, failures)
}

/// Expand the command-line inputs into a list of deck files. Directories are
/// walked for `.json` files in name order. `exclude` (the state file) is
/// skipped, as is any file already listed.
pub fn collect_deck_paths(inputs: &[PathBuf], exclude: Option<&Path>) -> Fallible<Vec<PathBuf>> {
    let exclude: Option<PathBuf> = exclude.and_then(|p| p.canonicalize().ok());
    let mut seen: HashSet<PathBuf> = HashSet::new();
    let mut paths: Vec<PathBuf> = Vec::new();
    for input in inputs {
        if !input.exists() {
            return fail(format!("{}: no such file or directory.", input.display()));
        }
        let candidates: Vec<PathBuf> = if input.is_dir() {
            let mut found = Vec::new();
            for entry in WalkDir::new(input).sort_by_file_name() {
                let entry = entry?;
                let path = entry.path();
                if path.is_file() && path.extension().is_some_and(|ext| ext == "json") {
                    found.push(path.to_path_buf());
                }
            }
            found
        } else {
            vec![input.clone()]
        };
        for path in candidates {
            let canonical = path.canonicalize()?;
            if exclude.as_ref() == Some(&canonical) {
                continue;
            }
            if seen.insert(canonical) {
                paths.push(path);
            }
        }
    }
    Ok(paths)
}

/// All cards across all decks, in deck order.
pub fn flatten(decks: &[Deck]) -> Vec<Card> {
    decks
        .iter()
        .flat_map(|deck| deck.cards.iter().cloned())
        .collect()
}
