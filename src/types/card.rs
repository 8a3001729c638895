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

use std::fmt::Display;
use std::fmt::Formatter;
use std::path::Path;
use std::path::PathBuf;

use maud::Markup;
use maud::PreEscaped;
use maud::html;
use serde::Deserialize;
use serde::Serialize;

use crate::markdown::markdown_to_html;

/// Position of a card: (index of its deck, index within the deck file).
/// Only used to break ties deterministically.
pub type CardOrder = (usize, usize);

/// The key a card's schedule is stored under: `{deck_id}:{card_id}`.
#[derive(Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Debug, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CardKey(String);

impl CardKey {
    pub fn new(deck_id: &str, card_id: &str) -> Self {
        Self(format!("{deck_id}:{card_id}"))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<String> for CardKey {
    fn from(value: String) -> Self {
        Self(value)
    }
}

impl From<&str> for CardKey {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

impl Display for CardKey {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[derive(Clone, PartialEq, Debug)]
pub struct Card {
    /// The prompt, as Markdown.
    front: String,
    /// The answer, as Markdown.
    back: String,
    /// Sorted and de-duplicated.
    tags: Vec<String>,
    deck_name: String,
    /// The absolute path to the file this card was loaded from.
    deck_path: PathBuf,
    order: CardOrder,
    /// Cached `{deck_id}:{card_id}`.
    key: CardKey,
}

/// Everything needed to build a [`Card`].
pub struct CardData {
    pub deck_id: String,
    pub card_id: String,
    pub front: String,
    pub back: String,
    pub tags: Vec<String>,
    pub deck_name: String,
    pub deck_path: PathBuf,
    pub order: CardOrder,
}

impl Card {
    pub fn new(data: CardData) -> Self {
        let key = CardKey::new(&data.deck_id, &data.card_id);
        Self {
            front: data.front,
            back: data.back,
            tags: data.tags,
            deck_name: data.deck_name,
            deck_path: data.deck_path,
            order: data.order,
            key,
        }
    }

    pub fn key(&self) -> &CardKey {
        &self.key
    }

    pub fn front(&self) -> &str {
        &self.front
    }

    pub fn back(&self) -> &str {
        &self.back
    }

    pub fn tags(&self) -> &[String] {
        &self.tags
    }

    pub fn deck_name(&self) -> &str {
        &self.deck_name
    }

    pub fn deck_path(&self) -> &Path {
        &self.deck_path
    }

    pub fn order(&self) -> CardOrder {
        self.order
    }

    pub fn html_front(&self) -> Markup {
        html! {
            (PreEscaped(markdown_to_html(self.front())))
        }
    }

    pub fn html_back(&self) -> Markup {
        html! {
            (PreEscaped(markdown_to_html(self.back())))
        }
    }
}

#[cfg(test)]
pub fn test_card(deck_id: &str, card_id: &str, order: CardOrder) -> Card {
    Card::new(CardData {
        deck_id: deck_id.to_string(),
        card_id: card_id.to_string(),
        front: format!("front {card_id}"),
        back: format!("back {card_id}"),
        tags: Vec::new(),
        deck_name: "Deck".to_string(),
        deck_path: PathBuf::from("/decks/deck.json"),
        order,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_key() {
        let card = test_card("d", "1", (0, 0));
        assert_eq!(card.key().as_str(), "d:1");
        assert_eq!(card.key(), &CardKey::from("d:1"));
        assert_eq!(card.key(), &CardKey::new("d", "1"));
    }

    #[test]
    fn test_html() {
        let card = test_card("d", "1", (0, 0));
        assert_eq!(card.html_front().into_string(), "<p>front 1</p>\n");
        assert_eq!(card.html_back().into_string(), "<p>back 1</p>\n");
    }

    #[test]
    fn test_key_as_json_map_key() {
        let mut map = std::collections::BTreeMap::new();
        map.insert(CardKey::from("d:1"), 1);
        assert_eq!(serde_json::to_string(&map).unwrap(), r#"{"d:1":1}"#);
    }
}
