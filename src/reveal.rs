//! Dice-gated text reveal.
//!
//! Directions are veiled word by word. How many words stay readable depends on
//! the last d20 roll; which words stay readable depends only on
//! `(level id, roll)`, so re-rendering the same level after the same roll always
//! shows the same words.

use crate::rng::XorShift32;

/// Returned for empty or blank input.
pub const EMPTY_PLACEHOLDER: &str = "—";
/// Prefix shown above the veiled text before the level has been rolled for.
pub const ROLL_PROMPT: &str = "Roll the d20 to sharpen the words.\n\n";
/// Glyph replacing each masked character.
pub const VEIL_GLYPH: char = '•';
/// Longest veil drawn for a single word.
const MAX_VEIL_LEN: usize = 8;
/// Words always left readable when the text has at least this many.
const MIN_KEPT_WORDS: usize = 3;

/// Keep ratios per clarity band.
pub const KEEP_UNROLLED: f64 = 0.15;
pub const KEEP_LOW: f64 = 0.22;
pub const KEEP_MEDIUM: f64 = 0.55;

/// Rolls above this show the full text.
pub const FULL_CLARITY_ABOVE: u8 = 16;
/// Rolls at or above this (and not above `FULL_CLARITY_ABOVE`) get medium masking.
pub const MEDIUM_CLARITY_FROM: u8 = 7;

/// Lexical class of a token.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TokenKind {
    Word,
    Space,
    Punct,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Token<'a> {
    pub kind: TokenKind,
    pub text: &'a str,
}

/// Latin letters (incl. Latin-1 / Latin Extended-A), digits and apostrophes.
pub fn is_word_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || ('\u{C0}'..='\u{17E}').contains(&c) || c == '\'' || c == '’'
}

fn classify(c: char) -> TokenKind {
    if is_word_char(c) {
        TokenKind::Word
    } else if c.is_whitespace() {
        TokenKind::Space
    } else {
        TokenKind::Punct
    }
}

/// Split into maximal runs of words, whitespace and punctuation.
/// Concatenating the token texts yields the input exactly.
pub fn tokenize(text: &str) -> Vec<Token<'_>> {
    let mut tokens = Vec::new();
    let mut start = 0;
    let mut current: Option<TokenKind> = None;
    for (i, c) in text.char_indices() {
        let kind = classify(c);
        match current {
            Some(k) if k == kind => {}
            Some(k) => {
                tokens.push(Token { kind: k, text: &text[start..i] });
                start = i;
                current = Some(kind);
            }
            None => current = Some(kind),
        }
    }
    if let Some(k) = current {
        tokens.push(Token { kind: k, text: &text[start..] });
    }
    tokens
}

/// Number of words left readable for `word_count` words at `ratio`.
pub fn keep_count(word_count: usize, ratio: f64) -> usize {
    let by_ratio = (word_count as f64 * ratio).floor() as usize;
    by_ratio.max(MIN_KEPT_WORDS.min(word_count))
}

fn veil(word: &str) -> String {
    let len = word.chars().count();
    let n = if len <= 2 { len } else { len.min(MAX_VEIL_LEN) };
    std::iter::repeat_n(VEIL_GLYPH, n).collect()
}

/// Mask all but a deterministic subset of words.
/// `roll` only feeds the seed (`"{level_id}|{roll}"`).
pub fn mask_words(text: &str, keep_ratio: f64, level_id: &str, roll: u8) -> String {
    let seed_src = format!("{}|{}", if level_id.is_empty() { "lvl" } else { level_id }, roll);
    let mut rng = XorShift32::from_str_seed(&seed_src);

    let tokens = tokenize(text);
    let word_positions: Vec<usize> = tokens
        .iter()
        .enumerate()
        .filter(|(_, t)| t.kind == TokenKind::Word)
        .map(|(i, _)| i)
        .collect();
    let n = word_positions.len();
    let keep_n = keep_count(n, keep_ratio).min(n);

    let mut kept = vec![false; tokens.len()];
    let mut picked = 0;
    while picked < keep_n {
        let j = (rng.next_f64() * n as f64).floor() as usize;
        let pos = word_positions[j.min(n - 1)];
        if !kept[pos] {
            kept[pos] = true;
            picked += 1;
        }
    }

    let mut out = String::with_capacity(text.len() * 2);
    for (i, t) in tokens.iter().enumerate() {
        match t.kind {
            TokenKind::Word if !kept[i] => out.push_str(&veil(t.text)),
            _ => out.push_str(t.text),
        }
    }
    out
}

/// Clarity band for a roll (`None`/0 means not rolled yet).
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Clarity {
    Unrolled,
    Low,
    Medium,
    Full,
}

impl Clarity {
    pub fn from_roll(roll: Option<u8>) -> Self {
        match roll {
            None | Some(0) => Clarity::Unrolled,
            Some(r) if r > FULL_CLARITY_ABOVE => Clarity::Full,
            Some(r) if r >= MEDIUM_CLARITY_FROM => Clarity::Medium,
            Some(_) => Clarity::Low,
        }
    }
}

/// Render `text` as seen after `roll` on `level_id`.
pub fn reveal(text: &str, roll: Option<u8>, level_id: &str) -> String {
    if text.trim().is_empty() {
        return EMPTY_PLACEHOLDER.to_string();
    }
    match (Clarity::from_roll(roll), roll.unwrap_or(0)) {
        (Clarity::Unrolled, _) => {
            let mut s = String::from(ROLL_PROMPT);
            s.push_str(&mask_words(text, KEEP_UNROLLED, level_id, 0));
            s
        }
        (Clarity::Full, _) => text.to_string(),
        (Clarity::Medium, r) => mask_words(text, KEEP_MEDIUM, level_id, r),
        (Clarity::Low, r) => mask_words(text, KEEP_LOW, level_id, r),
    }
}

/// Whether the current level's directions may use the real roll.
/// Reset on every level change; unlocked only by a roll made on that level.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct RevealState {
    level_id: Option<String>,
    unlocked: bool,
}

impl RevealState {
    /// Switch to `level_id`, locking it if it differs from the tracked level.
    pub fn ensure(&mut self, level_id: &str) {
        if self.level_id.as_deref() != Some(level_id) {
            self.level_id = Some(level_id.to_string());
            self.unlocked = false;
        }
    }

    pub fn unlock(&mut self, level_id: &str) {
        self.level_id = Some(level_id.to_string());
        self.unlocked = true;
    }

    pub fn is_revealed(&self, level_id: &str) -> bool {
        self.unlocked && self.level_id.as_deref() == Some(level_id)
    }

    /// Roll to feed the reveal engine for `level_id`.
    pub fn effective_roll(&self, level_id: &str, last_roll: Option<u8>) -> Option<u8> {
        if self.is_revealed(level_id) { last_roll } else { None }
    }
}
