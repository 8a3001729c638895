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

//! The scheduling core: rating a card, and choosing the next card to show.
//!
//! Both operations are pure. Time is always passed in by the caller.

use std::collections::BTreeMap;
use std::collections::HashMap;
use std::hash::BuildHasher;

use crate::types::card::Card;
use crate::types::card::CardKey;
use crate::types::card::CardOrder;
use crate::types::rating::Rating;
use crate::types::schedule::MIN_EASE;
use crate::types::schedule::ScheduleState;
use crate::types::timestamp::Timestamp;

const SECONDS_PER_DAY: f64 = 86_400.0;

/// How soon a card rated `again` comes back, in seconds.
const AGAIN_DELAY: i64 = 60;

/// Read access to the card key to schedule state mapping.
pub trait StateLookup {
    fn lookup(&self, key: &CardKey) -> Option<&ScheduleState>;
}

impl<S: BuildHasher> StateLookup for HashMap<CardKey, ScheduleState, S> {
    fn lookup(&self, key: &CardKey) -> Option<&ScheduleState> {
        self.get(key)
    }
}

impl StateLookup for BTreeMap<CardKey, ScheduleState> {
    fn lookup(&self, key: &CardKey) -> Option<&ScheduleState> {
        self.get(key)
    }
}

/// Compute a card's next schedule state. A card with no state is treated as
/// having [`ScheduleState::initial`].
pub fn apply_rating(existing: Option<ScheduleState>, rating: Rating, now: Timestamp) -> ScheduleState {
    let state = existing.unwrap_or_else(|| ScheduleState::initial(now));
    let ease = state.ease_factor;
    let interval = state.interval_days;
    // Every rating except `again` counts towards the learning ramp.
    let repetitions = state.repetitions.saturating_add(1);

    match rating {
        Rating::Again => ScheduleState {
            due: now.plus_seconds(AGAIN_DELAY),
            interval_days: 0.0,
            ease_factor: (ease - 0.2).max(MIN_EASE),
            repetitions: 0,
        },
        Rating::Hard => {
            let interval = match repetitions {
                1 => 1.0,
                2 => 3.0,
                _ => (interval * 1.2).max(1.0),
            };
            reviewed(now, interval, (ease - 0.15).max(MIN_EASE), repetitions)
        }
        Rating::Good => {
            let interval = match repetitions {
                1 => 1.0,
                2 => 6.0,
                _ => (interval * ease).max(1.0),
            };
            reviewed(now, interval, ease, repetitions)
        }
        Rating::Easy => {
            let ease = ease + 0.15;
            let interval = match repetitions {
                1 => 2.0,
                2 => 7.0,
                _ => (interval * ease * 1.3).max(1.0),
            };
            reviewed(now, interval, ease, repetitions)
        }
    }
}

fn reviewed(now: Timestamp, interval_days: f64, ease_factor: f64, repetitions: u32) -> ScheduleState {
    // `f64::round` rounds half away from zero. The cast saturates, and so
    // does `plus_seconds`, so huge intervals pin `due` at the far future.
    let offset = (interval_days * SECONDS_PER_DAY).round() as i64;
    ScheduleState {
        due: now.plus_seconds(offset),
        interval_days,
        ease_factor,
        repetitions,
    }
}

/// The outcome of choosing the next card.
#[derive(Clone, PartialEq, Debug)]
pub struct Selection<'a> {
    /// The card to show, if any.
    pub card: Option<&'a Card>,
    /// Cards with state whose due time has passed.
    pub due_count: usize,
    /// Cards with no state.
    pub new_count: usize,
    pub total_count: usize,
    /// Earliest due time among the remaining cards. Only set when `card` is
    /// `None`.
    pub next_due: Option<Timestamp>,
}

/// Choose the next card to show.
///
/// Due cards come first, earliest due time first. New cards come only when
/// nothing is due. Ties are broken by card order, so the result does not
/// depend on the order of `cards`.
pub fn select_next<'a, S>(cards: &'a [Card], state: &S, now: Timestamp) -> Selection<'a>
where
    S: StateLookup + ?Sized,
{
    let mut due_count = 0;
    let mut new_count = 0;
    let mut best_due: Option<((Timestamp, CardOrder), &'a Card)> = None;
    let mut best_new: Option<&'a Card> = None;
    let mut earliest_future: Option<Timestamp> = None;

    for card in cards {
        match state.lookup(card.key()) {
            None => {
                new_count += 1;
                if best_new.is_none_or(|best| card.order() < best.order()) {
                    best_new = Some(card);
                }
            }
            Some(st) if st.due <= now => {
                due_count += 1;
                let rank = (st.due, card.order());
                if best_due.is_none_or(|(best, _)| rank < best) {
                    best_due = Some((rank, card));
                }
            }
            Some(st) => {
                earliest_future = Some(match earliest_future {
                    Some(earliest) => earliest.min(st.due),
                    None => st.due,
                });
            }
        }
    }

    let card = best_due.map(|(_, card)| card).or(best_new);
    let next_due = if card.is_none() { earliest_future } else { None };
    Selection {
        card,
        due_count,
        new_count,
        total_count: cards.len(),
        next_due,
    }
}
