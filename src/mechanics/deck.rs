//! Fate draw: a shuffled order is fixed once per (level, deck) and persisted;
//! draws walk a cursor through it until an explicit reshuffle.

use crate::error::{QuestError, QuestResult};
use crate::progress::{DeckState, Notes, deck_key};
use crate::rng::{RandomSource, shuffle};

pub struct Deck<'a> {
    state: &'a mut DeckState,
}

impl<'a> Deck<'a> {
    /// Attach to the persisted deck, shuffling `cards` the first time.
    pub fn open(
        notes: &'a mut Notes,
        level_id: &str,
        deck: &str,
        cards: &[String],
        rng: &mut dyn RandomSource,
    ) -> Self {
        let state = notes
            .decks
            .entry(deck_key(level_id, deck))
            .or_insert_with(|| fresh_order(cards, rng));
        Self { state }
    }

    /// Consume the next card. An exhausted deck leaves the cursor alone.
    pub fn draw(&mut self) -> QuestResult<String> {
        let card = self
            .state
            .order
            .get(self.state.idx)
            .cloned()
            .ok_or(QuestError::DeckEmpty)?;
        self.state.idx += 1;
        Ok(card)
    }

    /// Throw the old order away and start over.
    pub fn reshuffle(&mut self, cards: &[String], rng: &mut dyn RandomSource) {
        *self.state = fresh_order(cards, rng);
    }

    pub fn cursor(&self) -> usize {
        self.state.idx
    }

    pub fn remaining(&self) -> usize {
        self.state.order.len().saturating_sub(self.state.idx)
    }

    /// The most recent draw, if any since the last shuffle.
    pub fn last_drawn(&self) -> Option<&str> {
        self.state
            .idx
            .checked_sub(1)
            .and_then(|i| self.state.order.get(i))
            .map(String::as_str)
    }
}

fn fresh_order(cards: &[String], rng: &mut dyn RandomSource) -> DeckState {
    let mut order = cards.to_vec();
    shuffle(&mut order, rng);
    DeckState { order, idx: 0 }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rng::XorShift32;

    fn cards() -> Vec<String> {
        ["I", "II", "III", "IV", "V"].iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn order_persists_between_opens() {
        let mut notes = Notes::default();
        let mut rng = XorShift32::new(5);
        let first = Deck::open(&mut notes, "l", "d", &cards(), &mut rng).state.order.clone();
        let mut other_rng = XorShift32::new(6);
        let again = Deck::open(&mut notes, "l", "d", &cards(), &mut other_rng).state.order.clone();
        assert_eq!(first, again);
    }

    #[test]
    fn decks_are_scoped_per_level() {
        let mut notes = Notes::default();
        let mut rng = XorShift32::new(5);
        Deck::open(&mut notes, "a", "d", &cards(), &mut rng).draw().unwrap();
        let other = Deck::open(&mut notes, "b", "d", &cards(), &mut rng);
        assert_eq!(other.cursor(), 0);
    }

    #[test]
    fn reshuffle_resets_cursor() {
        let mut notes = Notes::default();
        let mut rng = XorShift32::new(11);
        let mut deck = Deck::open(&mut notes, "l", "d", &cards(), &mut rng);
        deck.draw().unwrap();
        deck.draw().unwrap();
        assert_eq!(deck.remaining(), 3);
        deck.reshuffle(&cards(), &mut rng);
        assert_eq!(deck.cursor(), 0);
        assert_eq!(deck.last_drawn(), None);
        assert_eq!(deck.remaining(), 5);
    }

    #[test]
    fn empty_deck_source_is_empty_immediately() {
        let mut notes = Notes::default();
        let mut rng = XorShift32::new(1);
        let mut deck = Deck::open(&mut notes, "l", "missing", &[], &mut rng);
        assert_eq!(deck.draw(), Err(QuestError::DeckEmpty));
    }
}
