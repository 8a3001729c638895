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

/// Length of a deck id, in hex characters.
const DECK_ID_LEN: usize = 12;

/// Thin wrapper over blake3 that produces hex identifiers.
#[derive(Default)]
pub struct Hasher {
    inner: blake3::Hasher,
}

impl Hasher {
    pub fn new() -> Self {
        Self {
            inner: blake3::Hasher::new(),
        }
    }

    pub fn update(&mut self, data: &[u8]) {
        self.inner.update(data);
    }

    pub fn finalize_hex(self) -> String {
        self.inner.finalize().to_hex().to_string()
    }
}

/// The deck id is derived from the canonical path of the deck file, so
/// moving a deck file resets its progress.
pub fn deck_id_for_path(canonical_path: &str) -> String {
    let mut hasher = Hasher::new();
    hasher.update(canonical_path.as_bytes());
    let mut hex = hasher.finalize_hex();
    hex.truncate(DECK_ID_LEN);
    hex
}

/// The card id is derived from the card's canonical content.
pub fn card_id_for_content(canonical_json: &str) -> String {
    let mut hasher = Hasher::new();
    hasher.update(canonical_json.as_bytes());
    hasher.finalize_hex()
}
