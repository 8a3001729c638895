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

use std::path::Path;
use std::path::PathBuf;
use std::time::Instant;

use crate::deck::Deck;
use crate::deck::collect_deck_paths;
use crate::deck::flatten;
use crate::deck::load_decks;
use crate::error::Fallible;
use crate::error::fail;
use crate::types::card::Card;

/// Every deck named on the command line, validated.
pub struct Collection {
    pub decks: Vec<Deck>,
    /// All cards across all decks, in deck order.
    pub cards: Vec<Card>,
}

impl Collection {
    /// Load the decks at `inputs`. `state_file` is never treated as a deck,
    /// even when it sits in a deck directory.
    ///
    /// Validation failures are printed to stderr, one block per deck, before
    /// failing.
    pub fn load(inputs: &[PathBuf], state_file: Option<&Path>) -> Fallible<Self> {
        if inputs.is_empty() {
            return fail("no deck files given.");
        }
        let paths = collect_deck_paths(inputs, state_file)?;
        if paths.is_empty() {
            return fail("no deck files found.");
        }

        log::debug!("Loading {} decks...", paths.len());
        let start = Instant::now();
        let (decks, failures) = load_decks(&paths);
        let duration = start.elapsed().as_millis();
        log::debug!("Decks loaded in {duration}ms.");

        if !failures.is_empty() {
            for failure in &failures {
                eprintln!("{failure}\n");
            }
            return fail(format!("{} deck(s) failed validation.", failures.len()));
        }

        for deck in &decks {
            log::debug!("Deck {} '{}': {} cards.", deck.deck_id, deck.name, deck.cards.len());
        }
        let cards = flatten(&decks);
        Ok(Self { decks, cards })
    }
}
