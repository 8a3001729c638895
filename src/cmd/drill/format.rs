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

const MINUTE: i64 = 60;
const HOUR: i64 = 60 * MINUTE;
const DAY: i64 = 24 * HOUR;

/// A short human-readable duration, e.g. `10m`, `3h`, `1.5d`, `6d`. Halves
/// round to even.
pub fn format_interval(seconds: i64) -> String {
    let seconds = seconds.max(0);
    if seconds < 90 {
        return "1m".to_string();
    }
    if seconds < HOUR {
        let minutes = (seconds as f64 / MINUTE as f64).round_ties_even().max(1.0);
        return format!("{minutes}m");
    }
    if seconds < DAY {
        let hours = (seconds as f64 / HOUR as f64).round_ties_even().max(1.0);
        return format!("{hours}h");
    }
    let days = seconds as f64 / DAY as f64;
    let rounded = days.round_ties_even();
    if (days - rounded).abs() >= 0.05 && days < 10.0 {
        let text = format!("{days:.1}");
        let text = text.trim_end_matches('0').trim_end_matches('.');
        format!("{text}d")
    } else {
        format!("{}d", rounded.max(1.0))
    }
}
