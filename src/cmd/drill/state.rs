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

use std::collections::HashMap;
use std::sync::Arc;
use std::sync::Mutex;
use std::sync::MutexGuard;

use crate::collection::Collection;
use crate::error::ErrorReport;
use crate::error::Fallible;
use crate::scheduler::apply_rating;
use crate::state::StateStore;
use crate::types::card::Card;
use crate::types::card::CardKey;
use crate::types::rating::Rating;
use crate::types::schedule::ScheduleState;
use crate::types::timestamp::Timestamp;

pub const UNDO_NOTICE: &str = "Oops! Undid the last review.";

/// Where the server gets the current time from.
pub type Clock = fn() -> Timestamp;

#[derive(Clone)]
pub struct ServerState {
    pub deck_count: usize,
    pub cards: Arc<Vec<Card>>,
    /// Card key to position in `cards`.
    index: Arc<HashMap<CardKey, usize>>,
    pub clock: Clock,
    pub mutable: Arc<Mutex<MutableState>>,
}

impl ServerState {
    pub fn new(collection: Collection, store: StateStore, clock: Clock) -> Self {
        let index: HashMap<CardKey, usize> = collection
            .cards
            .iter()
            .enumerate()
            .map(|(i, card)| (card.key().clone(), i))
            .collect();
        Self {
            deck_count: collection.decks.len(),
            cards: Arc::new(collection.cards),
            index: Arc::new(index),
            clock,
            mutable: Arc::new(Mutex::new(MutableState::new(store))),
        }
    }

    pub fn card(&self, key: &CardKey) -> Option<&Card> {
        self.index.get(key).and_then(|i| self.cards.get(*i))
    }

    pub fn now(&self) -> Timestamp {
        (self.clock)()
    }

    pub fn lock(&self) -> Fallible<MutexGuard<'_, MutableState>> {
        self.mutable
            .lock()
            .map_err(|_| ErrorReport::new("server state lock is poisoned."))
    }
}

pub struct MutableState {
    pub store: StateStore,
    /// The card whose answer is showing.
    pub revealed: Option<CardKey>,
    /// This session's reviews, oldest first.
    pub reviews: Vec<Review>,
    /// When set, the page shows `reviews[cursor]` instead of the next card.
    pub cursor: Option<usize>,
    /// Shown on the next page load, then cleared.
    pub notice: Option<&'static str>,
}

#[derive(Clone, PartialEq, Debug)]
pub struct Review {
    pub card_key: CardKey,
    pub rating: Rating,
    pub reviewed_at: Timestamp,
    /// The state before the review. `None` if the card was new.
    pub previous: Option<ScheduleState>,
    pub next: ScheduleState,
}

impl MutableState {
    pub fn new(store: StateStore) -> Self {
        Self {
            store,
            revealed: None,
            reviews: Vec::new(),
            cursor: None,
            notice: None,
        }
    }

    pub fn done_count(&self) -> usize {
        self.reviews.len()
    }

    pub fn reveal(&mut self, key: CardKey) {
        self.revealed = Some(key);
        self.cursor = None;
    }

    /// Rate a card and persist the result. If the store can't be saved, the
    /// in-memory state is left as it was.
    pub fn rate(&mut self, key: &CardKey, rating: Rating, now: Timestamp) -> Fallible<ScheduleState> {
        let previous = self.store.get(key);
        let next = apply_rating(previous, rating, now);
        self.store.set(key.clone(), next);
        if let Err(e) = self.store.save(now) {
            self.restore(key, previous);
            return Err(e);
        }
        log::debug!(
            "{key} {rating} interval={:.2}d due={}",
            next.interval_days,
            next.due
        );
        self.reviews.push(Review {
            card_key: key.clone(),
            rating,
            reviewed_at: now,
            previous,
            next,
        });
        self.revealed = None;
        self.cursor = None;
        self.notice = None;
        Ok(next)
    }

    /// Revert the most recent review. Returns `false` if there was nothing to
    /// undo.
    pub fn undo(&mut self, now: Timestamp) -> Fallible<bool> {
        let Some(review) = self.reviews.pop() else {
            return Ok(false);
        };
        self.restore(&review.card_key, review.previous);
        if let Err(e) = self.store.save(now) {
            self.store.set(review.card_key.clone(), review.next);
            self.reviews.push(review);
            return Err(e);
        }
        log::debug!("Undid {} {}.", review.card_key, review.rating);
        self.revealed = None;
        self.cursor = None;
        self.notice = Some(UNDO_NOTICE);
        Ok(true)
    }

    /// Step back through this session's reviews. From the study view, this
    /// goes to the latest review.
    pub fn history_back(&mut self) {
        if self.reviews.is_empty() {
            return;
        }
        self.cursor = Some(match self.cursor {
            None => self.reviews.len() - 1,
            Some(i) => i.saturating_sub(1),
        });
    }

    /// Step forward. Moving past the latest review returns to the study view.
    pub fn history_next(&mut self) {
        self.cursor = match self.cursor {
            Some(i) if i + 1 < self.reviews.len() => Some(i + 1),
            _ => None,
        };
    }

    fn restore(&mut self, key: &CardKey, state: Option<ScheduleState>) {
        match state {
            Some(state) => self.store.set(key.clone(), state),
            None => {
                self.store.remove(key);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use std::fs::write;

    use super::*;
    use crate::helper::create_tmp_directory;

    fn key(s: &str) -> CardKey {
        CardKey::from(s)
    }

    #[test]
    fn test_rate_and_undo() -> Fallible<()> {
        let dir = create_tmp_directory()?;
        let path = dir.path().join("state.json");
        let mut mutable = MutableState::new(StateStore::load(&path)?);
        let now = Timestamp::from_unix(1_000);

        mutable.reveal(key("d:a"));
        let next = mutable.rate(&key("d:a"), Rating::Good, now)?;
        assert_eq!(next.repetitions, 1);
        assert_eq!(mutable.revealed, None);
        assert_eq!(mutable.done_count(), 1);
        assert_eq!(mutable.reviews[0].previous, None);
        assert_eq!(StateStore::load(&path)?.get(&key("d:a")), Some(next));

        let later = now.plus_seconds(10);
        let again = mutable.rate(&key("d:a"), Rating::Again, later)?;
        assert_eq!(mutable.reviews[1].previous, Some(next));

        assert!(mutable.undo(later)?);
        assert_eq!(mutable.notice, Some(UNDO_NOTICE));
        assert_eq!(mutable.store.get(&key("d:a")), Some(next));
        assert_ne!(mutable.store.get(&key("d:a")), Some(again));
        assert!(mutable.undo(later)?);
        // The card is new again.
        assert_eq!(mutable.store.get(&key("d:a")), None);
        assert!(StateStore::load(&path)?.is_empty());
        assert_eq!(mutable.done_count(), 0);

        mutable.notice = None;
        assert!(!mutable.undo(later)?);
        assert_eq!(mutable.notice, None);
        Ok(())
    }

    #[test]
    fn test_failed_save_leaves_state_unchanged() -> Fallible<()> {
        let dir = create_tmp_directory()?;
        let blocker = dir.path().join("blocker");
        write(&blocker, "not a directory")?;
        let mut mutable = MutableState::new(StateStore::load(&blocker.join("state.json"))?);

        let result = mutable.rate(&key("d:a"), Rating::Good, Timestamp::from_unix(0));
        assert!(result.is_err());
        assert_eq!(mutable.store.get(&key("d:a")), None);
        assert!(mutable.reviews.is_empty());
        Ok(())
    }

    #[test]
    fn test_history_navigation() -> Fallible<()> {
        let dir = create_tmp_directory()?;
        let mut mutable = MutableState::new(StateStore::load(&dir.path().join("state.json"))?);
        let now = Timestamp::from_unix(0);

        // Nothing to go back to.
        mutable.history_back();
        assert_eq!(mutable.cursor, None);

        mutable.rate(&key("d:a"), Rating::Good, now)?;
        mutable.rate(&key("d:b"), Rating::Hard, now)?;

        mutable.history_back();
        assert_eq!(mutable.cursor, Some(1));
        mutable.history_back();
        assert_eq!(mutable.cursor, Some(0));
        mutable.history_back();
        assert_eq!(mutable.cursor, Some(0));
        mutable.history_next();
        assert_eq!(mutable.cursor, Some(1));
        mutable.history_next();
        assert_eq!(mutable.cursor, None);
        mutable.history_next();
        assert_eq!(mutable.cursor, None);

        // Revealing a card leaves the history view.
        mutable.history_back();
        mutable.reveal(key("d:c"));
        assert_eq!(mutable.cursor, None);
        Ok(())
    }
}
