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

use axum::Form;
use axum::extract::State;
use axum::response::Redirect;
use serde::Deserialize;

use crate::cmd::drill::state::ServerState;
use crate::error::Fallible;
use crate::error::fail;
use crate::types::card::CardKey;
use crate::types::rating::Rating;

#[derive(Clone, Copy, PartialEq, Debug, Deserialize)]
enum Action {
    Reveal,
    Undo,
    Back,
    Next,
    Again,
    Hard,
    Good,
    Easy,
}

impl Action {
    fn rating(self) -> Option<Rating> {
        match self {
            Action::Again => Some(Rating::Again),
            Action::Hard => Some(Rating::Hard),
            Action::Good => Some(Rating::Good),
            Action::Easy => Some(Rating::Easy),
            Action::Reveal | Action::Undo | Action::Back | Action::Next => None,
        }
    }
}

#[derive(Deserialize)]
pub struct FormData {
    action: Action,
    #[serde(default)]
    card_key: Option<String>,
}

pub async fn post_handler(State(state): State<ServerState>, Form(form): Form<FormData>) -> Redirect {
    if let Err(e) = action_handler(&state, form) {
        log::error!("{e}");
    }
    Redirect::to("/")
}

fn action_handler(state: &ServerState, form: FormData) -> Fallible<()> {
    let card_key: Option<CardKey> = form
        .card_key
        .filter(|key| !key.is_empty())
        .map(CardKey::from);
    let mut mutable = state.lock()?;
    match form.action {
        Action::Reveal => match card_key {
            Some(key) if state.card(&key).is_some() => mutable.reveal(key),
            _ => log::warn!("Reveal for an unknown card, ignoring."),
        },
        Action::Undo => {
            if !mutable.undo(state.now())? {
                log::debug!("Nothing to undo.");
            }
        }
        Action::Back => mutable.history_back(),
        Action::Next => mutable.history_next(),
        Action::Again | Action::Hard | Action::Good | Action::Easy => {
            let Some(rating) = form.action.rating() else {
                return fail("action is not a rating.");
            };
            let Some(key) = card_key.filter(|key| state.card(key).is_some()) else {
                return fail("rating submitted for an unknown card.");
            };
            mutable.rate(&key, rating, state.now())?;
        }
    }
    Ok(())
}
