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

use axum::extract::State;
use axum::http::StatusCode;
use axum::response::Html;
use maud::Markup;
use maud::html;

use crate::cmd::drill::format::format_interval;
use crate::cmd::drill::state::MutableState;
use crate::cmd::drill::state::Review;
use crate::cmd::drill::state::ServerState;
use crate::cmd::drill::template::page_template;
use crate::error::Fallible;
use crate::scheduler::Selection;
use crate::scheduler::apply_rating;
use crate::scheduler::select_next;
use crate::types::card::Card;
use crate::types::rating::Rating;
use crate::types::timestamp::Timestamp;

pub async fn get_handler(State(state): State<ServerState>) -> (StatusCode, Html<String>) {
    match render_page(&state) {
        Ok(body) => (StatusCode::OK, Html(page_template(body).into_string())),
        Err(e) => {
            log::error!("{e}");
            let body = html! {
                div.error { (e.to_string()) }
            };
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Html(page_template(body).into_string()),
            )
        }
    }
}

fn render_page(state: &ServerState) -> Fallible<Markup> {
    let mut mutable = state.lock()?;
    let notice = mutable.notice.take();
    if let Some(index) = mutable.cursor
        && let Some(review) = mutable.reviews.get(index)
    {
        return Ok(history_view(state, &mutable, index, review));
    }
    let now = state.now();
    let selection = select_next(state.cards.as_slice(), &mutable.store, now);
    // A revealed card stays on screen until it is rated, even if the
    // selection has moved on.
    let revealed: Option<&Card> = mutable.revealed.as_ref().and_then(|key| state.card(key));
    let body = match revealed.or(selection.card) {
        Some(card) => study_view(state, &mutable, &selection, card, revealed.is_some(), now),
        None => empty_view(state, &mutable, &selection),
    };
    Ok(html! {
        @if let Some(notice) = notice {
            div.notice { (notice) }
        }
        (body)
    })
}

fn counters(state: &ServerState, mutable: &MutableState, selection: &Selection) -> Markup {
    html! {
        div.counters {
            div.counter { span.label { "Decks" } span id="deck-count" { (state.deck_count) } }
            div.counter { span.label { "Due" } span id="due-count" { (selection.due_count) } }
            div.counter { span.label { "New" } span id="new-count" { (selection.new_count) } }
            div.counter { span.label { "Total" } span id="total-count" { (selection.total_count) } }
            div.counter { span.label { "Done" } span id="done-count" { (mutable.done_count()) } }
        }
    }
}

fn card_header(card: &Card) -> Markup {
    html! {
        div.header {
            h1 title=(card.deck_path().display().to_string()) {
                (card.deck_name())
            }
            @if !card.tags().is_empty() {
                div.tags {
                    @for tag in card.tags() {
                        span.tag { (tag) }
                    }
                }
            }
        }
    }
}

fn history_buttons(mutable: &MutableState) -> Markup {
    let at_start = mutable.cursor == Some(0) || mutable.reviews.is_empty();
    html! {
        @if at_start {
            button id="back" type="submit" name="action" value="Back" data-hotkey="arrowleft" disabled { "Back" }
        } @else {
            button id="back" type="submit" name="action" value="Back" data-hotkey="arrowleft" { "Back" }
        }
        @if mutable.cursor.is_some() {
            button id="next" type="submit" name="action" value="Next" data-hotkey="arrowright" { "Next" }
        }
    }
}

fn undo_button(mutable: &MutableState) -> Markup {
    html! {
        @if mutable.reviews.is_empty() {
            button id="undo" type="submit" name="action" value="Undo" data-hotkey="u" disabled { "Undo" }
        } @else {
            button id="undo" type="submit" name="action" value="Undo" data-hotkey="u" { "Undo" }
        }
    }
}

fn study_view(
    state: &ServerState,
    mutable: &MutableState,
    selection: &Selection,
    card: &Card,
    revealed: bool,
    now: Timestamp,
) -> Markup {
    let controls = if revealed {
        let existing = mutable.store.get(card.key());
        html! {
            @for (n, rating) in Rating::ALL.iter().enumerate() {
                @let next = apply_rating(existing, *rating, now);
                @let label = action_label(*rating);
                button id=(rating.as_str()) type="submit" name="action" value=(label) data-hotkey=(n + 1) {
                    (label)
                    span.preview { (format_interval(next.due.seconds_since(now))) }
                }
            }
        }
    } else {
        html! {
            button id="reveal" type="submit" name="action" value="Reveal" data-hotkey="space" { "Reveal" }
        }
    };
    html! {
        div.root {
            (counters(state, mutable, selection))
            div.card {
                (card_header(card))
                div.content {
                    div.question .rich-text {
                        (card.html_front())
                    }
                    @if revealed {
                        div.answer .rich-text {
                            (card.html_back())
                        }
                    }
                }
                div.controls {
                    form action="/" method="post" {
                        input type="hidden" name="card_key" value=(card.key().as_str());
                        (history_buttons(mutable))
                        (undo_button(mutable))
                        div.spacer {}
                        (controls)
                    }
                }
            }
        }
    }
}

fn empty_view(state: &ServerState, mutable: &MutableState, selection: &Selection) -> Markup {
    html! {
        div.root {
            (counters(state, mutable, selection))
            div.finished {
                h1 { "No cards available" }
                @if let Some(next_due) = selection.next_due {
                    p.next-due { "Next card due at " (next_due.local_display()) "." }
                }
            }
            div.controls {
                form action="/" method="post" {
                    (history_buttons(mutable))
                    (undo_button(mutable))
                }
            }
        }
    }
}

fn history_view(state: &ServerState, mutable: &MutableState, index: usize, review: &Review) -> Markup {
    let card = state.card(&review.card_key);
    html! {
        div.root {
            div.history-header {
                "Review " (index + 1) " of " (mutable.reviews.len())
            }
            div.card {
                @if let Some(card) = card {
                    (card_header(card))
                    div.content {
                        div.question .rich-text {
                            (card.html_front())
                        }
                        div.answer .rich-text {
                            (card.html_back())
                        }
                    }
                } @else {
                    div.content { (review.card_key.as_str()) }
                }
                div.review {
                    p { "Rated " span.rating { (review.rating.as_str()) } " at " (review.reviewed_at.local_display()) "." }
                    p { "Next due at " (review.next.due.local_display()) "." }
                }
                div.controls {
                    form action="/" method="post" {
                        (history_buttons(mutable))
                    }
                }
            }
        }
    }
}

/// The button label for a rating. Also the form value of its action.
fn action_label(rating: Rating) -> &'static str {
    match rating {
        Rating::Again => "Again",
        Rating::Hard => "Hard",
        Rating::Good => "Good",
        Rating::Easy => "Easy",
    }
}
