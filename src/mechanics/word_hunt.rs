//! Word hunt: letters of a hidden word are found one by one in the physical
//! world and tracked here. Shared across levels (one hunt per quest).

use serde::Serialize;

use crate::config::DEFAULT_WORD;
use crate::error::{QuestError, QuestResult};
use crate::progress::WordHuntProgress;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum CollarStatus {
    Bound,
    Released,
}

impl CollarStatus {
    pub fn label(self) -> &'static str {
        match self {
            CollarStatus::Bound => "Collar: Bound",
            CollarStatus::Released => "Collar: Released",
        }
    }
}

pub struct WordHunt<'a> {
    progress: &'a mut WordHuntProgress,
}

impl<'a> WordHunt<'a> {
    /// Attach to the shared hunt, fixing its word on first use. Stored
    /// letters that are not in the word are dropped.
    pub fn open(progress: &'a mut WordHuntProgress, word: Option<&str>) -> Self {
        if progress.word.is_none() {
            let w = word.filter(|w| !w.trim().is_empty()).unwrap_or(DEFAULT_WORD);
            progress.word = Some(w.trim().to_uppercase());
        }
        let word = progress.word.clone().unwrap_or_default();
        let mut seen = Vec::new();
        progress.letters_found.retain(|c| {
            if !word.contains(*c) || seen.contains(c) {
                return false;
            }
            seen.push(*c);
            true
        });
        Self { progress }
    }

    pub fn word(&self) -> &str {
        self.progress.word.as_deref().unwrap_or(DEFAULT_WORD)
    }

    pub fn found(&self) -> &[char] {
        &self.progress.letters_found
    }

    /// Distinct letters the word is made of.
    pub fn distinct_letters(&self) -> usize {
        let mut letters: Vec<char> = self.word().chars().collect();
        letters.sort_unstable();
        letters.dedup();
        letters.len()
    }

    /// Add one letter. Returns whether it was newly found.
    pub fn add_letter(&mut self, input: &str) -> QuestResult<bool> {
        let mut chars = input.trim().chars().flat_map(char::to_uppercase);
        let (Some(c), None) = (chars.next(), chars.next()) else {
            return Err(QuestError::NotALetter);
        };
        if !self.word().contains(c) {
            return Err(QuestError::LetterNotInWord(c));
        }
        if self.progress.letters_found.contains(&c) {
            return Ok(false);
        }
        self.progress.letters_found.push(c);
        Ok(true)
    }

    /// Remove the most recently added letter.
    pub fn undo(&mut self) -> Option<char> {
        self.progress.letters_found.pop()
    }

    /// A correct full-word guess fills in every missing letter. Blank input
    /// is ignored and returns `Ok(false)`.
    pub fn guess(&mut self, guess: &str) -> QuestResult<bool> {
        if guess.trim().is_empty() {
            return Ok(false);
        }
        if guess.trim().to_uppercase() != self.word() {
            return Err(QuestError::WrongGuess);
        }
        let word: Vec<char> = self.word().chars().collect();
        for c in word {
            if !self.progress.letters_found.contains(&c) {
                self.progress.letters_found.push(c);
            }
        }
        Ok(true)
    }

    pub fn collar_status(&self) -> CollarStatus {
        let found = &self.progress.letters_found;
        if self.word().chars().all(|c| found.contains(&c)) {
            CollarStatus::Released
        } else {
            CollarStatus::Bound
        }
    }

    /// " P  _  N ..." view of the word.
    pub fn pattern(&self) -> String {
        self.word()
            .chars()
            .map(|c| {
                if self.progress.letters_found.contains(&c) {
                    format!(" {} ", c)
                } else {
                    " _ ".to_string()
                }
            })
            .collect()
    }
}
