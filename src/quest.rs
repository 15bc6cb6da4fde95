//! Chapter/level quest session.
//!
//! Owns the loaded game, the progress record and the persistence port. Every
//! mutating call writes the whole record back before returning, so the next
//! render always sees saved state.

use log::{debug, info};

use crate::content::{Chapter, GameDefinition, Level, Mechanic};
use crate::error::{QuestError, QuestResult};
use crate::mechanics::{
    self, Convergence, Deck, MechanicView, Posture, WordHunt, checklist, notes,
};
use crate::progress::ProgressRecord;
use crate::reveal::{RevealState, reveal};
use crate::rng::RandomSource;
use crate::store::{ProgressStore, Repo};

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum RollMode {
    #[default]
    Normal,
    /// Roll twice, keep the higher.
    Advantage,
    /// Roll twice, keep the lower.
    Disadvantage,
}

impl RollMode {
    pub fn label(self) -> &'static str {
        match self {
            RollMode::Normal => "Normal",
            RollMode::Advantage => "Advantage",
            RollMode::Disadvantage => "Disadvantage",
        }
    }

    pub fn roll(self, rng: &mut dyn RandomSource) -> u8 {
        match self {
            RollMode::Normal => rng.roll_d20(),
            RollMode::Advantage => rng.roll_d20().max(rng.roll_d20()),
            RollMode::Disadvantage => rng.roll_d20().min(rng.roll_d20()),
        }
    }
}

/// Consequence accepted in exchange for a hint.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum HintPrice {
    Freeze,
    Confess,
    Task,
}

impl HintPrice {
    pub fn label(self) -> &'static str {
        match self {
            HintPrice::Freeze => "Freeze: 30s stillness",
            HintPrice::Confess => "Confess: one honest truth",
            HintPrice::Task => "Task: do a small service",
        }
    }

    pub fn confirmation(self) -> &'static str {
        match self {
            HintPrice::Freeze => "Price chosen: 30 seconds of stillness. Now take your hint.",
            HintPrice::Confess => "Price chosen: one honest truth, no jokes. Now take your hint.",
            HintPrice::Task => "Price chosen: a small act of service. Now take your hint.",
        }
    }
}

/// Practical hint for a level, keyed on its mechanic.
pub fn hint_for(level: &Level) -> &'static str {
    match &level.mechanics {
        Some(Mechanic::WordHunt { .. }) => {
            "Hide letter pieces in obvious-yet-mean places: under a mug, inside a book, behind a remote. Make the last letter feel like a reveal."
        }
        Some(Mechanic::DiceDraw { .. }) => {
            "Keep the deck nearby. After the roll lands, draw once, no rerolls. Commit to the first available night."
        }
        Some(Mechanic::Convergence { .. }) => {
            "Gather everything, pick a posture, start the stillness and let the silence do the work. After, choose with intention."
        }
        Some(Mechanic::Guess) => {
            "Texture and weight are clues. Ask for a single confident answer before opening."
        }
        Some(Mechanic::Prompt { .. }) => {
            "Write it down immediately. Sincerity beats poetry; clarity beats perfection."
        }
        Some(Mechanic::Riddle { .. }) => "Say the riddle out loud. The answer is usually overhead.",
        Some(Mechanic::Redeemables { .. }) | Some(Mechanic::Checklist { .. }) | None => {
            "Slow down. Read the direction again. The clue is often closer than it feels."
        }
    }
}

pub struct QuestSession<S: ProgressStore> {
    game: GameDefinition,
    repo: Repo<S>,
    progress: ProgressRecord,
    chapter_index: usize,
    level_index: usize,
    last_roll: Option<u8>,
    roll_mode: RollMode,
    reveal: RevealState,
}

impl<S: ProgressStore> QuestSession<S> {
    /// Load progress for `game` from `store` (defaults on absence/corruption).
    pub fn new(game: GameDefinition, store: S) -> QuestResult<Self> {
        game.validate()?;
        let repo = Repo::new(store, game.config.storage_key.clone());
        let progress = repo.load_progress();
        let mut session = Self {
            game,
            repo,
            progress,
            chapter_index: 0,
            level_index: 0,
            last_roll: None,
            roll_mode: RollMode::Normal,
            reveal: RevealState::default(),
        };
        session.settle_loaded();
        session.on_level_changed();
        Ok(session)
    }

    /// Bring loaded progress in line with this game: the hunt's letters must
    /// belong to its word and stored picks must fit the pool and choose count.
    fn settle_loaded(&mut self) {
        let before = self.progress.clone();
        let mut hunt_word = None;
        let mut choose = None;
        let config = &self.game.config;
        let used = self
            .game
            .chapters
            .iter()
            .flat_map(|c| c.levels.iter())
            .filter_map(|l| l.mechanics.as_ref());
        for m in used {
            match m {
                Mechanic::WordHunt { word } if hunt_word.is_none() => hunt_word = Some(word.clone()),
                Mechanic::Convergence { choose_count, .. } if choose.is_none() => {
                    choose = Some(mechanics::choose_count(*choose_count, config));
                }
                _ => {}
            }
        }
        // An empty hunt stays untouched so fresh progress keeps its default shape.
        if let Some(word) = hunt_word.filter(|_| !self.progress.word_hunt.letters_found.is_empty()) {
            WordHunt::open(&mut self.progress.word_hunt, word.as_deref());
        }
        let cap = choose.unwrap_or(config.choose_count);
        self.progress.settle_choices(&self.game.item_pool(), cap);
        if self.progress != before {
            self.persist();
        }
    }

    pub fn game(&self) -> &GameDefinition {
        &self.game
    }

    pub fn progress(&self) -> &ProgressRecord {
        &self.progress
    }

    pub fn store(&self) -> &S {
        self.repo.store()
    }

    pub fn position(&self) -> (usize, usize) {
        (self.chapter_index, self.level_index)
    }

    pub fn current_chapter(&self) -> &Chapter {
        &self.game.chapters[self.chapter_index]
    }

    pub fn current_level(&self) -> &Level {
        &self.current_chapter().levels[self.level_index]
    }

    pub fn last_roll(&self) -> Option<u8> {
        self.last_roll
    }

    pub fn roll_mode(&self) -> RollMode {
        self.roll_mode
    }

    pub fn set_roll_mode(&mut self, mode: RollMode) {
        self.roll_mode = mode;
    }

    /// "chapter/chapters • level/levels", 1-based.
    pub fn crumb(&self) -> String {
        format!(
            "{}/{} • {}/{}",
            self.chapter_index + 1,
            self.game.chapters.len(),
            self.level_index + 1,
            self.current_chapter().levels.len()
        )
    }

    fn on_level_changed(&mut self) {
        let id = self.current_level().id.clone();
        self.reveal.ensure(&id);
        debug!("active level {}", id);
    }

    fn persist(&mut self) {
        self.repo.save_progress(&self.progress);
    }

    pub fn select_chapter(&mut self, ci: usize) -> QuestResult<()> {
        if ci >= self.game.chapters.len() {
            return Err(QuestError::NotFound(format!("chapter {}", ci + 1)));
        }
        self.chapter_index = ci;
        self.level_index = 0;
        self.on_level_changed();
        Ok(())
    }

    pub fn is_first(&self) -> bool {
        self.chapter_index == 0 && self.level_index == 0
    }

    pub fn is_last(&self) -> bool {
        self.chapter_index + 1 == self.game.chapters.len()
            && self.level_index + 1 == self.current_chapter().levels.len()
    }

    /// Advance, crossing into the next chapter. Needs the current level revealed.
    /// Returns false when already at the final level.
    pub fn next_level(&mut self) -> QuestResult<bool> {
        if !self.is_revealed() {
            return Err(QuestError::NotRevealed);
        }
        if self.level_index + 1 < self.current_chapter().levels.len() {
            self.level_index += 1;
        } else if self.chapter_index + 1 < self.game.chapters.len() {
            self.chapter_index += 1;
            self.level_index = 0;
        } else {
            return Ok(false);
        }
        self.on_level_changed();
        Ok(true)
    }

    /// Step back, crossing into the previous chapter's last level.
    pub fn prev_level(&mut self) -> bool {
        if self.level_index > 0 {
            self.level_index -= 1;
        } else if self.chapter_index > 0 {
            self.chapter_index -= 1;
            self.level_index = self.current_chapter().levels.len() - 1;
        } else {
            return false;
        }
        self.on_level_changed();
        true
    }

    /// Roll the d20 for the current level and unlock its directions.
    pub fn roll(&mut self, rng: &mut dyn RandomSource) -> u8 {
        let value = self.roll_mode.roll(rng);
        self.apply_roll(value);
        value
    }

    /// Record an externally produced roll (e.g. finished dice animation).
    pub fn apply_roll(&mut self, value: u8) {
        let value = value.clamp(1, 20);
        self.last_roll = Some(value);
        let id = self.current_level().id.clone();
        self.reveal.unlock(&id);
        info!("rolled {} ({}) on {}", value, self.roll_mode.label(), id);
    }

    pub fn is_revealed(&self) -> bool {
        self.reveal.is_revealed(&self.current_level().id)
    }

    fn effective_roll(&self) -> Option<u8> {
        self.reveal.effective_roll(&self.current_level().id, self.last_roll)
    }

    pub fn chapter_direction(&self) -> String {
        let lvl = self.current_level();
        reveal(&self.current_chapter().direction, self.effective_roll(), &lvl.id)
    }

    pub fn level_direction(&self) -> String {
        let lvl = self.current_level();
        reveal(&lvl.direction, self.effective_roll(), &lvl.id)
    }

    pub fn action(&self) -> &str {
        let a = self.current_level().action.as_str();
        if a.trim().is_empty() { crate::reveal::EMPTY_PLACEHOLDER } else { a }
    }

    pub fn can_advance(&self) -> bool {
        self.is_revealed() && !self.is_last()
    }

    pub fn can_complete(&self) -> bool {
        self.is_revealed() && !self.is_complete(&self.current_level().id)
    }

    pub fn is_complete(&self, level_id: &str) -> bool {
        self.progress.completed.contains(level_id)
    }

    /// Mark the current level complete. Returns false if it already was.
    pub fn mark_complete(&mut self) -> QuestResult<bool> {
        if !self.is_revealed() {
            return Err(QuestError::NotRevealed);
        }
        let id = self.current_level().id.clone();
        let added = self.progress.completed.insert(id.clone());
        if added {
            info!("level {} completed", id);
            self.persist();
        }
        Ok(added)
    }

    /// (done, total) levels of chapter `ci`.
    pub fn chapter_completion(&self, ci: usize) -> (usize, usize) {
        self.game.chapter(ci).map_or((0, 0), |ch| {
            let done = ch.levels.iter().filter(|l| self.is_complete(&l.id)).count();
            (done, ch.levels.len())
        })
    }

    /// Wipe stored progress and start over from the first level.
    pub fn reset(&mut self) {
        self.repo.clear();
        self.progress = self.repo.load_progress();
        self.chapter_index = 0;
        self.level_index = 0;
        self.last_roll = None;
        self.reveal = RevealState::default();
        self.on_level_changed();
        info!("progress reset");
    }

    pub fn hint(&self) -> &'static str {
        hint_for(self.current_level())
    }

    // --- Mechanics ---------------------------------------------------------

    fn mechanic(&self) -> Option<(String, Mechanic)> {
        let lvl = self.current_level();
        lvl.mechanics.clone().map(|m| (lvl.id.clone(), m))
    }

    pub fn mechanic_title(&self) -> Option<&'static str> {
        self.current_level().mechanics.as_ref().map(mechanics::card_title)
    }

    /// View of the current level's mechanic; initializes and persists its state.
    pub fn mechanic_view(&mut self, rng: &mut dyn RandomSource, now_ms: f64) -> Option<MechanicView> {
        let (id, m) = self.mechanic()?;
        let v = mechanics::view(&m, &id, &self.game, &mut self.progress, rng, now_ms);
        self.persist();
        Some(v)
    }

    fn word_hunt_word(&self) -> QuestResult<Option<String>> {
        match self.mechanic() {
            Some((_, Mechanic::WordHunt { word })) => Ok(word),
            _ => Err(QuestError::NoMechanic("word hunt")),
        }
    }

    pub fn add_letter(&mut self, input: &str) -> QuestResult<bool> {
        let word = self.word_hunt_word()?;
        let added = WordHunt::open(&mut self.progress.word_hunt, word.as_deref()).add_letter(input)?;
        self.persist();
        Ok(added)
    }

    pub fn undo_letter(&mut self) -> QuestResult<Option<char>> {
        let word = self.word_hunt_word()?;
        let popped = WordHunt::open(&mut self.progress.word_hunt, word.as_deref()).undo();
        self.persist();
        Ok(popped)
    }

    /// Guess the whole word. `Ok(false)` means blank input was ignored.
    pub fn guess_word(&mut self, guess: &str) -> QuestResult<bool> {
        let word = self.word_hunt_word()?;
        let filled = WordHunt::open(&mut self.progress.word_hunt, word.as_deref()).guess(guess)?;
        self.persist();
        Ok(filled)
    }

    fn deck_name(&self) -> QuestResult<(String, String)> {
        match self.mechanic() {
            Some((id, Mechanic::DiceDraw { deck })) => Ok((id, deck)),
            _ => Err(QuestError::NoMechanic("deck")),
        }
    }

    pub fn draw_card(&mut self, rng: &mut dyn RandomSource) -> QuestResult<String> {
        let (id, deck) = self.deck_name()?;
        let cards = self.game.deck(&deck).to_vec();
        let card = Deck::open(&mut self.progress.notes, &id, &deck, &cards, rng).draw();
        // Opening may have created the order even when the draw is refused.
        self.persist();
        card
    }

    pub fn reshuffle(&mut self, rng: &mut dyn RandomSource) -> QuestResult<()> {
        let (id, deck) = self.deck_name()?;
        let cards = self.game.deck(&deck).to_vec();
        Deck::open(&mut self.progress.notes, &id, &deck, &cards, rng).reshuffle(&cards, rng);
        self.persist();
        Ok(())
    }

    pub fn save_prompt(&mut self, answer: &str) -> QuestResult<()> {
        let Some((id, Mechanic::Prompt { .. })) = self.mechanic() else {
            return Err(QuestError::NoMechanic("prompt"));
        };
        notes::save_prompt(&mut self.progress.notes, &id, answer);
        self.persist();
        Ok(())
    }

    pub fn lock_guess(&mut self, guess: &str) -> QuestResult<()> {
        let Some((id, Mechanic::Guess)) = self.mechanic() else {
            return Err(QuestError::NoMechanic("mystery box"));
        };
        notes::lock_guess(&mut self.progress.notes, &id, guess);
        self.persist();
        Ok(())
    }

    /// `Ok(false)` means a blank attempt was ignored.
    pub fn check_riddle(&mut self, attempt: &str) -> QuestResult<bool> {
        let Some((id, Mechanic::Riddle { solution, .. })) = self.mechanic() else {
            return Err(QuestError::NoMechanic("riddle"));
        };
        let result = notes::check_riddle(&mut self.progress.notes, &id, attempt, &solution);
        self.persist();
        result
    }

    pub fn toggle_coupon(&mut self, idx: usize) -> QuestResult<bool> {
        let Some((id, Mechanic::Redeemables { count })) = self.mechanic() else {
            return Err(QuestError::NoMechanic("coupons"));
        };
        let n = mechanics::coupon_count(count, &self.game.config);
        let used = checklist::toggle_coupon(&mut self.progress.notes, &id, n, idx)?;
        self.persist();
        Ok(used)
    }

    pub fn set_coupon_note(&mut self, idx: usize, note: &str) -> QuestResult<()> {
        let Some((id, Mechanic::Redeemables { count })) = self.mechanic() else {
            return Err(QuestError::NoMechanic("coupons"));
        };
        let n = mechanics::coupon_count(count, &self.game.config);
        checklist::set_coupon_note(&mut self.progress.notes, &id, n, idx, note)?;
        self.persist();
        Ok(())
    }

    pub fn toggle_step(&mut self, idx: usize) -> QuestResult<bool> {
        let Some((id, Mechanic::Checklist { steps })) = self.mechanic() else {
            return Err(QuestError::NoMechanic("checklist"));
        };
        let done = checklist::toggle_step(&mut self.progress.notes, &id, &steps, idx)?;
        self.persist();
        Ok(done)
    }

    /// Run `f` against the current level's convergence ritual, then persist.
    fn with_convergence<T>(&mut self, f: impl FnOnce(&mut Convergence<'_>) -> T) -> QuestResult<T> {
        let Some((id, Mechanic::Convergence { stillness_seconds, choose_count })) = self.mechanic()
        else {
            return Err(QuestError::NoMechanic("convergence"));
        };
        let secs = mechanics::stillness_seconds(stillness_seconds, &self.game.config);
        let choose = mechanics::choose_count(choose_count, &self.game.config);
        let out = f(&mut Convergence::open(&mut self.progress, &id, secs, choose));
        self.persist();
        Ok(out)
    }

    pub fn set_posture(&mut self, posture: Option<Posture>) -> QuestResult<()> {
        self.with_convergence(|c| c.set_posture(posture))
    }

    pub fn start_stillness(&mut self, now_ms: f64) -> QuestResult<f64> {
        self.with_convergence(|c| c.start(now_ms))?.map(|t| t.end_at)
    }

    pub fn mark_stillness_broken(&mut self) -> QuestResult<()> {
        self.with_convergence(|c| c.mark_broken())?
    }

    /// Resolve an expired countdown. True exactly once per ritual.
    pub fn poll_stillness(&mut self, now_ms: f64) -> bool {
        self.with_convergence(|c| c.poll(now_ms)).unwrap_or(false)
    }

    pub fn stillness_wake_at(&mut self) -> Option<f64> {
        self.with_convergence(|c| c.wake_at()).ok().flatten()
    }

    pub fn toggle_item(&mut self, item: &str) -> QuestResult<bool> {
        let pool = self.game.item_pool();
        self.with_convergence(|c| c.toggle_item(item, &pool))?
    }

    pub fn lock_choices(&mut self) -> QuestResult<()> {
        self.with_convergence(|c| c.lock_choices())?
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rng::XorShift32;
    use crate::store::MemoryStore;

    /// Always yields the same raw value, so `roll_d20` is `value % 20 + 1`.
    struct Fixed(u32);

    impl RandomSource for Fixed {
        fn next_u32(&mut self) -> u32 {
            self.0
        }
    }

    fn session() -> QuestSession<MemoryStore> {
        QuestSession::new(GameDefinition::builtin(), MemoryStore::new()).unwrap()
    }

    #[test]
    fn directions_stay_veiled_until_rolled() {
        let mut s = session();
        assert!(!s.is_revealed());
        assert!(s.level_direction().starts_with(crate::reveal::ROLL_PROMPT));
        s.apply_roll(18);
        assert_eq!(s.level_direction(), s.current_level().direction);
        assert_eq!(s.chapter_direction(), s.current_chapter().direction);
    }

    #[test]
    fn navigation_requires_reveal_and_relocks() {
        let mut s = session();
        assert_eq!(s.next_level(), Err(QuestError::NotRevealed));
        s.apply_roll(20);
        assert_eq!(s.next_level(), Ok(true));
        assert_eq!(s.position(), (0, 1));
        assert!(!s.is_revealed(), "a new level needs a new roll");
        assert!(s.level_direction().starts_with(crate::reveal::ROLL_PROMPT));
        s.apply_roll(3);
        s.next_level().unwrap();
        assert_eq!(s.position(), (1, 0));
        assert!(s.prev_level());
        assert_eq!(s.position(), (0, 1));
        assert!(s.prev_level());
        assert!(!s.prev_level());
    }

    #[test]
    fn last_level_does_not_advance() {
        let mut s = session();
        let last = s.game().chapters.len() - 1;
        s.select_chapter(last).unwrap();
        s.apply_roll(12);
        assert!(s.is_last());
        assert!(!s.can_advance());
        assert_eq!(s.next_level(), Ok(false));
        assert!(s.select_chapter(99).is_err());
    }

    #[test]
    fn roll_modes_pick_extremes() {
        // Two draws of the same fixed value: all modes agree.
        assert_eq!(RollMode::Advantage.roll(&mut Fixed(4)), 5);
        let mut rng = XorShift32::new(42);
        for _ in 0..50 {
            let r = RollMode::Disadvantage.roll(&mut rng);
            assert!((1..=20).contains(&r));
        }
    }

    #[test]
    fn roll_uses_source_and_unlocks() {
        let mut s = session();
        assert_eq!(s.roll(&mut Fixed(16)), 17);
        assert_eq!(s.last_roll(), Some(17));
        assert!(s.is_revealed());
    }

    #[test]
    fn completion_is_gated_and_persisted() {
        let store = MemoryStore::new();
        let mut s = QuestSession::new(GameDefinition::builtin(), store.clone()).unwrap();
        assert_eq!(s.mark_complete(), Err(QuestError::NotRevealed));
        s.apply_roll(9);
        assert_eq!(s.mark_complete(), Ok(true));
        assert_eq!(s.mark_complete(), Ok(false));
        assert!(!s.can_complete());
        assert_eq!(s.chapter_completion(0), (1, 2));

        let again = QuestSession::new(GameDefinition::builtin(), store).unwrap();
        assert!(again.is_complete("c1-l1"));
    }

    #[test]
    fn crumb_and_hint() {
        let s = session();
        assert_eq!(s.crumb(), "1/4 • 1/2");
        assert!(s.hint().contains("letter"));
        assert_eq!(s.mechanic_title(), Some("Word Hunt"));
    }

    #[test]
    fn mechanics_reject_wrong_level() {
        let mut s = session();
        assert_eq!(s.lock_guess("x"), Err(QuestError::NoMechanic("mystery box")));
        assert_eq!(s.toggle_item("Dice"), Err(QuestError::NoMechanic("convergence")));
        assert!(!s.poll_stillness(0.0));
    }
}
