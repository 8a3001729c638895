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

use crate::collection::Collection;
use crate::error::Fallible;

pub fn check_decks(paths: &[PathBuf]) -> Fallible<()> {
    let count = validated_deck_count(paths)?;
    println!("Validated {count} deck(s).");
    Ok(())
}

fn validated_deck_count(paths: &[PathBuf]) -> Fallible<usize> {
    let collection = Collection::load(paths, None)?;
    Ok(collection.decks.len())
}
