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

use serde::Serialize;

use crate::collection::Collection;
use crate::error::Fallible;
use crate::scheduler::select_next;
use crate::state::StateStore;
use crate::types::timestamp::Timestamp;

pub fn print_stats(paths: &[PathBuf], state_file: &Path, now: Timestamp) -> Fallible<()> {
    let collection = Collection::load(paths, Some(state_file))?;
    let store = StateStore::load(state_file)?;
    let stats = compute_stats(&collection, &store, now);
    let stats_json = serde_json::to_string_pretty(&stats)?;
    println!("{stats_json}");
    Ok(())
}

fn compute_stats(collection: &Collection, store: &StateStore, now: Timestamp) -> Stats {
    let selection = select_next(&collection.cards, store, now);
    Stats {
        deck_count: collection.decks.len(),
        total_count: selection.total_count,
        due_count: selection.due_count,
        new_count: selection.new_count,
        next_due: selection.next_due,
    }
}

#[derive(Serialize, PartialEq, Debug)]
#[serde(rename_all = "camelCase")]
pub struct Stats {
    deck_count: usize,
    total_count: usize,
    due_count: usize,
    new_count: usize,
    /// Only known when nothing is due or new.
    next_due: Option<Timestamp>,
}
