//! Persisted progress record and its load-time migration.
//!
//! The record is written wholesale after every mutation. Older blobs (the
//! unversioned flat shape with a mixed `notes` bag) are folded into the typed
//! v4 layout once, on load; anything unreadable becomes the default record.

use std::collections::{BTreeMap, BTreeSet};

use log::{info, warn};
use serde::{Deserialize, Serialize};
use serde_json::Value;

pub const CURRENT_SCHEMA_VERSION: u32 = 4;

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProgressRecord {
    pub schema_version: u32,
    #[serde(default)]
    pub completed: BTreeSet<String>,
    #[serde(default)]
    pub notes: Notes,
    #[serde(default)]
    pub word_hunt: WordHuntProgress,
    #[serde(default)]
    pub convergence: ConvergenceProgress,
}

impl Default for ProgressRecord {
    fn default() -> Self {
        Self {
            schema_version: CURRENT_SCHEMA_VERSION,
            completed: BTreeSet::new(),
            notes: Notes::default(),
            word_hunt: WordHuntProgress::default(),
            convergence: ConvergenceProgress::default(),
        }
    }
}

/// Per-level scratch data, grouped by value kind.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Notes {
    /// Prompt answers, guesses, riddle attempts, chosen posture.
    pub text: BTreeMap<String, String>,
    pub decks: BTreeMap<String, DeckState>,
    pub coupons: BTreeMap<String, Vec<Coupon>>,
    pub checklists: BTreeMap<String, Vec<ChecklistStep>>,
    pub stillness: BTreeMap<String, StillnessTimer>,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeckState {
    pub order: Vec<String>,
    pub idx: usize,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Coupon {
    pub name: String,
    #[serde(default)]
    pub used: bool,
    #[serde(default)]
    pub note: String,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ChecklistStep {
    pub step: String,
    #[serde(default)]
    pub done: bool,
}

/// Wall-clock window of a stillness countdown (ms since epoch).
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StillnessTimer {
    pub start_at: f64,
    pub end_at: f64,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct WordHuntProgress {
    pub word: Option<String>,
    /// Found letters in the order they were added (undo pops the last).
    pub letters_found: Vec<char>,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ConvergenceProgress {
    pub chosen: Vec<String>,
    pub stillness_done: bool,
    pub stillness_broken: bool,
}

// Note key prefixes; a level id follows (a deck key is "{level}/{deck}").
pub const NOTE_PROMPT: &str = "note_";
pub const NOTE_GUESS: &str = "guess_";
pub const NOTE_RIDDLE: &str = "riddle_";
pub const NOTE_POSTURE: &str = "pos_";

pub fn note_key(prefix: &str, level_id: &str) -> String {
    format!("{}{}", prefix, level_id)
}

pub fn deck_key(level_id: &str, deck: &str) -> String {
    format!("{}/{}", level_id, deck)
}

impl ProgressRecord {
    /// Parse a stored blob, migrating older shapes. Never fails.
    pub fn from_blob(raw: &str) -> Self {
        match serde_json::from_str::<Value>(raw) {
            Ok(v) => migrate(v),
            Err(e) => {
                warn!("progress: unreadable blob, starting fresh: {}", e);
                Self::default()
            }
        }
    }

    pub fn to_blob(&self) -> String {
        // Plain maps/strings/numbers only; serialization cannot fail.
        serde_json::to_string(self).unwrap_or_default()
    }

    /// Restore invariants that a hand-edited or migrated blob may break.
    pub fn normalize(&mut self) {
        let mut seen = BTreeSet::new();
        let word = self.word_hunt.word.as_deref().map(str::to_uppercase);
        self.word_hunt.letters_found = self
            .word_hunt
            .letters_found
            .iter()
            .flat_map(|c| c.to_uppercase())
            .filter(|c| word.as_deref().is_none_or(|w| w.contains(*c)))
            .filter(|c| seen.insert(*c))
            .collect();
        self.word_hunt.word = word;

        let mut chosen = BTreeSet::new();
        self.convergence.chosen.retain(|c| chosen.insert(c.clone()));
    }

    /// Drop picks that are not in `pool` and keep at most `cap` of the rest.
    pub fn settle_choices(&mut self, pool: &[String], cap: usize) {
        let chosen = &mut self.convergence.chosen;
        let before = chosen.len();
        chosen.retain(|c| pool.contains(c));
        chosen.truncate(cap);
        if chosen.len() != before {
            warn!("progress: dropped {} stored pick(s)", before - chosen.len());
        }
    }
}

/// Bring any stored JSON value up to the current schema.
pub fn migrate(value: Value) -> ProgressRecord {
    let version = value.get("schemaVersion").and_then(Value::as_u64);
    let mut record = match version {
        Some(v) if v == CURRENT_SCHEMA_VERSION as u64 => {
            match serde_json::from_value::<ProgressRecord>(value) {
                Ok(r) => r,
                Err(e) => {
                    warn!("progress: v{} blob failed to parse: {}", v, e);
                    ProgressRecord::default()
                }
            }
        }
        Some(v) => {
            warn!("progress: unknown schema v{}, starting fresh", v);
            ProgressRecord::default()
        }
        None if value.is_object() => {
            info!("progress: migrating unversioned blob to v{}", CURRENT_SCHEMA_VERSION);
            migrate_legacy(&value)
        }
        None => ProgressRecord::default(),
    };
    record.normalize();
    record
}

fn migrate_legacy(value: &Value) -> ProgressRecord {
    let mut record = ProgressRecord::default();

    match value.get("completed") {
        Some(Value::Object(map)) => {
            record.completed = map
                .iter()
                .filter(|(_, v)| v.as_bool().unwrap_or(false))
                .map(|(k, _)| k.clone())
                .collect();
        }
        Some(Value::Array(items)) => {
            record.completed = items
                .iter()
                .filter_map(|v| v.as_str().map(str::to_string))
                .collect();
        }
        _ => {}
    }

    if let Some(Value::Object(notes)) = value.get("notes") {
        for (key, v) in notes {
            migrate_legacy_note(&mut record.notes, key, v);
        }
    }

    if let Some(wh) = value.get("wordHunt") {
        record.word_hunt.word = wh.get("word").and_then(Value::as_str).map(str::to_string);
        if let Some(Value::Array(letters)) = wh.get("lettersFound") {
            record.word_hunt.letters_found = letters
                .iter()
                .filter_map(Value::as_str)
                .filter_map(|s| s.chars().next())
                .collect();
        }
    }

    if let Some(conv) = value.get("convergence") {
        if let Ok(c) = serde_json::from_value::<ConvergenceProgress>(conv.clone()) {
            record.convergence = c;
        }
    }

    record
}

fn migrate_legacy_note(notes: &mut Notes, key: &str, v: &Value) {
    // Legacy decks were shared across levels; keep them under an empty level id.
    if let Some(deck) = key.strip_prefix("deck_") {
        if let Ok(d) = serde_json::from_value::<DeckState>(v.clone()) {
            notes.decks.insert(deck_key("", deck), d);
        }
    } else if let Some(level) = key.strip_prefix("coupons_") {
        if let Ok(c) = serde_json::from_value::<Vec<Coupon>>(v.clone()) {
            notes.coupons.insert(level.to_string(), c);
        }
    } else if let Some(level) = key.strip_prefix("check_") {
        if let Ok(c) = serde_json::from_value::<Vec<ChecklistStep>>(v.clone()) {
            notes.checklists.insert(level.to_string(), c);
        }
    } else if let Some(level) = key.strip_prefix("still_") {
        if let Ok(t) = serde_json::from_value::<StillnessTimer>(v.clone()) {
            notes.stillness.insert(level.to_string(), t);
        }
    } else if let Some(s) = v.as_str() {
        notes.text.insert(key.to_string(), s.to_string());
    } else {
        warn!("progress: dropping legacy note '{}'", key);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn garbage_falls_back_to_default() {
        assert_eq!(ProgressRecord::from_blob("{not json"), ProgressRecord::default());
        assert_eq!(ProgressRecord::from_blob("42"), ProgressRecord::default());
        assert_eq!(ProgressRecord::from_blob("null"), ProgressRecord::default());
    }

    #[test]
    fn future_schema_falls_back_to_default() {
        let blob = r#"{"schemaVersion": 99, "completed": ["a"]}"#;
        assert_eq!(ProgressRecord::from_blob(blob), ProgressRecord::default());
    }

    #[test]
    fn current_schema_round_trips() {
        let mut p = ProgressRecord::default();
        p.completed.insert("c1-l1".into());
        p.notes.text.insert(note_key(NOTE_PROMPT, "c1-l2"), "hello".into());
        p.word_hunt.word = Some("PINEAPPLE".into());
        p.word_hunt.letters_found = vec!['P', 'E'];
        assert_eq!(ProgressRecord::from_blob(&p.to_blob()), p);
    }

    #[test]
    fn legacy_blob_is_migrated() {
        let blob = r#"{
            "completed": {"c1-l1": true, "c1-l2": false},
            "notes": {
                "note_c1-l3": "I promise",
                "deck_nights": {"order": ["Mon", "Tue"], "idx": 1},
                "coupons_c2-l1": [{"name": "Coupon 1", "used": true, "note": ""}],
                "check_c2-l2": [{"step": "Light the candle", "done": false}],
                "still_c3-l1": {"startAt": 1000, "endAt": 121000},
                "weird": 17
            },
            "wordHunt": {"word": "PINEAPPLE", "lettersFound": ["p", "X", "E", "P"]},
            "convergence": {"chosen": ["Dice", "Dice"], "stillnessDone": true, "stillnessBroken": false}
        }"#;
        let p = ProgressRecord::from_blob(blob);
        assert_eq!(p.schema_version, CURRENT_SCHEMA_VERSION);
        assert_eq!(p.completed.iter().collect::<Vec<_>>(), vec!["c1-l1"]);
        assert_eq!(p.notes.text.get("note_c1-l3").map(String::as_str), Some("I promise"));
        assert_eq!(p.notes.decks.get("/nights").map(|d| d.idx), Some(1));
        assert!(p.notes.coupons["c2-l1"][0].used);
        assert_eq!(p.notes.checklists["c2-l2"][0].step, "Light the candle");
        assert_eq!(p.notes.stillness["c3-l1"].end_at, 121000.0);
        assert!(!p.notes.text.contains_key("weird"));
        // X is not in the word; duplicate P collapses.
        assert_eq!(p.word_hunt.letters_found, vec!['P', 'E']);
        assert_eq!(p.convergence.chosen, vec!["Dice".to_string()]);
        assert!(p.convergence.stillness_done);
    }

    #[test]
    fn legacy_partial_blob_fills_defaults() {
        let p = ProgressRecord::from_blob(r#"{"completed": {}}"#);
        assert_eq!(p, ProgressRecord::default());
    }

    #[test]
    fn picks_are_settled_against_pool_and_cap() {
        let blob = r#"{"convergence": {"chosen": ["A", "B", "Zz", "C", "D", "E"], "stillnessDone": true}}"#;
        let mut p = ProgressRecord::from_blob(blob);
        assert_eq!(p.convergence.chosen.len(), 6);
        let pool: Vec<String> = ["A", "B", "C", "D", "E"].iter().map(|s| s.to_string()).collect();
        p.settle_choices(&pool, 3);
        assert_eq!(p.convergence.chosen, vec!["A", "B", "C"]);
        assert!(p.convergence.stillness_done);
    }

    #[test]
    fn wordless_legacy_hunt_keeps_letters_for_the_session() {
        // Without a stored word the letters cannot be checked yet; the word
        // hunt filters them once it fixes its word.
        let p = ProgressRecord::from_blob(r#"{"wordHunt": {"lettersFound": ["z", "Q", "z"]}}"#);
        assert_eq!(p.word_hunt.word, None);
        assert_eq!(p.word_hunt.letters_found, vec!['Z', 'Q']);
    }
}
