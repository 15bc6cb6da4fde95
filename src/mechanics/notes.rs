//! Free-text mechanics: prompt answers, mystery-box guesses and riddles.

use crate::error::{QuestError, QuestResult};
use crate::progress::{NOTE_GUESS, NOTE_PROMPT, NOTE_RIDDLE, Notes, note_key};

pub const PROMPT_FALLBACK: &str = "Write your response here.";
pub const RIDDLE_FALLBACK: &str = "A riddle waits. Read it carefully.";

fn text<'n>(notes: &'n Notes, prefix: &str, level_id: &str) -> &'n str {
    notes
        .text
        .get(&note_key(prefix, level_id))
        .map(String::as_str)
        .unwrap_or("")
}

pub fn prompt_answer<'n>(notes: &'n Notes, level_id: &str) -> &'n str {
    text(notes, NOTE_PROMPT, level_id)
}

/// Prompt answers are kept verbatim.
pub fn save_prompt(notes: &mut Notes, level_id: &str, answer: &str) {
    notes.text.insert(note_key(NOTE_PROMPT, level_id), answer.to_string());
}

pub fn locked_guess<'n>(notes: &'n Notes, level_id: &str) -> &'n str {
    text(notes, NOTE_GUESS, level_id)
}

pub fn lock_guess(notes: &mut Notes, level_id: &str, guess: &str) {
    notes.text.insert(note_key(NOTE_GUESS, level_id), guess.trim().to_string());
}

pub fn riddle_attempt<'n>(notes: &'n Notes, level_id: &str) -> &'n str {
    text(notes, NOTE_RIDDLE, level_id)
}

/// Record the attempt, then compare case-insensitively. A blank attempt is
/// ignored and returns `Ok(false)`.
pub fn check_riddle(notes: &mut Notes, level_id: &str, attempt: &str, solution: &str) -> QuestResult<bool> {
    let attempt = attempt.trim();
    if attempt.is_empty() {
        return Ok(false);
    }
    notes.text.insert(note_key(NOTE_RIDDLE, level_id), attempt.to_string());
    if riddle_matches(attempt, solution) {
        Ok(true)
    } else {
        Err(QuestError::WrongAnswer)
    }
}

pub fn riddle_matches(attempt: &str, solution: &str) -> bool {
    !attempt.trim().is_empty() && attempt.trim().to_lowercase() == solution.trim().to_lowercase()
}
