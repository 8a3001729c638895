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

use serde::Deserialize;
use serde::Serialize;

use crate::error::Fallible;
use crate::error::fail;
use crate::types::timestamp::Timestamp;

/// The ease factor of a card that has never been reviewed.
pub const DEFAULT_EASE: f64 = 2.5;

/// The ease factor never drops below this.
pub const MIN_EASE: f64 = 1.3;

/// Scheduling information for a single card.
///
/// Values are never mutated in place: every review produces a new state.
#[derive(Clone, Copy, PartialEq, Debug, Serialize, Deserialize)]
pub struct ScheduleState {
    /// When the card should be shown next.
    pub due: Timestamp,
    /// The current spacing between reviews, in days.
    pub interval_days: f64,
    /// Multiplier for interval growth.
    pub ease_factor: f64,
    /// Reviews since the last reset.
    pub repetitions: u32,
}

impl ScheduleState {
    /// The state a card is treated as having before its first review.
    pub fn initial(now: Timestamp) -> Self {
        Self {
            due: now,
            interval_days: 0.0,
            ease_factor: DEFAULT_EASE,
            repetitions: 0,
        }
    }

    /// Checks the invariants on a state that came from outside the scheduler.
    pub fn validate(&self) -> Fallible<()> {
        if !self.ease_factor.is_finite() || self.ease_factor < MIN_EASE {
            return fail(format!(
                "ease_factor must be a number >= {MIN_EASE}, got {}",
                self.ease_factor
            ));
        }
        if !self.interval_days.is_finite() || self.interval_days < 0.0 {
            return fail(format!(
                "interval_days must be a non-negative number, got {}",
                self.interval_days
            ));
        }
        Ok(())
    }
}
