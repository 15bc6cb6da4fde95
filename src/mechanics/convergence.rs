//! The closing ritual: choose a posture, hold a wall-clock stillness countdown,
//! then pick exactly N items from everything earned.
//!
//! Time is always passed in (ms since epoch). Remaining time is recomputed from
//! the stored end timestamp, so a reload mid-countdown resumes where it was and
//! the caller only needs one wake-up at `wake_at()`.

use log::info;
use serde::Serialize;

use crate::error::{QuestError, QuestResult};
use crate::progress::{NOTE_POSTURE, ProgressRecord, StillnessTimer, note_key};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Posture {
    Kneeling,
    Standing,
    Seated,
}

impl Posture {
    pub const ALL: [Posture; 3] = [Posture::Kneeling, Posture::Standing, Posture::Seated];

    pub fn key(self) -> &'static str {
        match self {
            Posture::Kneeling => "kneeling",
            Posture::Standing => "standing",
            Posture::Seated => "seated",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Posture::Kneeling => "Kneeling",
            Posture::Standing => "Standing",
            Posture::Seated => "Seated upright",
        }
    }

    pub fn from_key(key: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|p| p.key() == key)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum StillnessPhase {
    NotStarted,
    Running,
    Held,
    Broken,
}

impl StillnessPhase {
    pub fn label(self) -> &'static str {
        match self {
            StillnessPhase::NotStarted => "Stillness: Not started",
            StillnessPhase::Running => "Stillness: Running",
            StillnessPhase::Held => "Stillness: Held",
            StillnessPhase::Broken => "Stillness: Broken",
        }
    }

    pub fn is_resolved(self) -> bool {
        matches!(self, StillnessPhase::Held | StillnessPhase::Broken)
    }
}

/// Whole seconds left on `timer` at `now_ms` (rounded up, never negative).
pub fn remaining_secs(timer: &StillnessTimer, now_ms: f64) -> u64 {
    ((timer.end_at - now_ms) / 1000.0).ceil().max(0.0) as u64
}

pub struct Convergence<'a> {
    progress: &'a mut ProgressRecord,
    level_id: String,
    seconds: u32,
    choose: usize,
}

impl<'a> Convergence<'a> {
    /// Attach to the ritual. Picks beyond `choose` are dropped.
    pub fn open(progress: &'a mut ProgressRecord, level_id: &str, seconds: u32, choose: usize) -> Self {
        progress.convergence.chosen.truncate(choose);
        Self { progress, level_id: level_id.to_string(), seconds, choose }
    }

    pub fn stillness_seconds(&self) -> u32 {
        self.seconds
    }

    pub fn choose_count(&self) -> usize {
        self.choose
    }

    pub fn posture(&self) -> Option<Posture> {
        self.progress
            .notes
            .text
            .get(&note_key(NOTE_POSTURE, &self.level_id))
            .and_then(|k| Posture::from_key(k))
    }

    pub fn set_posture(&mut self, posture: Option<Posture>) {
        let key = note_key(NOTE_POSTURE, &self.level_id);
        match posture {
            Some(p) => {
                self.progress.notes.text.insert(key, p.key().to_string());
            }
            None => {
                self.progress.notes.text.remove(&key);
            }
        }
    }

    pub fn timer(&self) -> Option<&StillnessTimer> {
        self.progress.notes.stillness.get(&self.level_id)
    }

    pub fn phase(&self) -> StillnessPhase {
        let conv = &self.progress.convergence;
        if conv.stillness_broken {
            StillnessPhase::Broken
        } else if conv.stillness_done {
            StillnessPhase::Held
        } else if self.timer().is_some() {
            StillnessPhase::Running
        } else {
            StillnessPhase::NotStarted
        }
    }

    /// Start (or restart) the countdown. Needs a posture and an unresolved ritual.
    pub fn start(&mut self, now_ms: f64) -> QuestResult<StillnessTimer> {
        let phase = self.phase();
        if phase.is_resolved() {
            return Err(QuestError::StillnessResolved(if phase == StillnessPhase::Held {
                "held"
            } else {
                "broken"
            }));
        }
        if self.posture().is_none() {
            return Err(QuestError::PostureMissing);
        }
        let timer = StillnessTimer {
            start_at: now_ms,
            end_at: now_ms + self.seconds as f64 * 1000.0,
        };
        self.progress.notes.stillness.insert(self.level_id.clone(), timer);
        info!("stillness started on {} for {}s", self.level_id, self.seconds);
        Ok(timer)
    }

    pub fn remaining(&self, now_ms: f64) -> Option<u64> {
        self.timer().map(|t| remaining_secs(t, now_ms))
    }

    /// When the caller should next call `poll`, if a countdown is live.
    pub fn wake_at(&self) -> Option<f64> {
        match self.phase() {
            StillnessPhase::Running => self.timer().map(|t| t.end_at),
            _ => None,
        }
    }

    /// Resolve an expired countdown as held. True only on the call that
    /// performs the transition.
    pub fn poll(&mut self, now_ms: f64) -> bool {
        if self.phase() != StillnessPhase::Running {
            return false;
        }
        if self.remaining(now_ms) != Some(0) {
            return false;
        }
        self.progress.convergence.stillness_done = true;
        info!("stillness held on {}", self.level_id);
        true
    }

    /// Stillness broke before the countdown ended.
    pub fn mark_broken(&mut self) -> QuestResult<()> {
        match self.phase() {
            StillnessPhase::Running => {
                self.progress.convergence.stillness_broken = true;
                self.progress.convergence.stillness_done = true;
                info!("stillness broken on {}", self.level_id);
                Ok(())
            }
            StillnessPhase::NotStarted => Err(QuestError::StillnessNotRunning),
            StillnessPhase::Held => Err(QuestError::StillnessResolved("held")),
            StillnessPhase::Broken => Err(QuestError::StillnessResolved("broken")),
        }
    }

    pub fn can_pick(&self) -> bool {
        self.phase().is_resolved()
    }

    pub fn chosen(&self) -> &[String] {
        &self.progress.convergence.chosen
    }

    /// Toggle `item` in the selection. Returns whether it is now chosen.
    pub fn toggle_item(&mut self, item: &str, pool: &[String]) -> QuestResult<bool> {
        if !self.can_pick() {
            return Err(QuestError::PicksLocked);
        }
        if !pool.iter().any(|p| p == item) {
            return Err(QuestError::UnknownItem(item.to_string()));
        }
        let chosen = &mut self.progress.convergence.chosen;
        if let Some(pos) = chosen.iter().position(|c| c == item) {
            chosen.remove(pos);
            return Ok(false);
        }
        if chosen.len() >= self.choose {
            return Err(QuestError::ChooseExactly(self.choose));
        }
        chosen.push(item.to_string());
        Ok(true)
    }

    pub fn lock_choices(&self) -> QuestResult<()> {
        if !self.can_pick() {
            return Err(QuestError::PicksLocked);
        }
        if self.chosen().len() != self.choose {
            return Err(QuestError::ChooseExactly(self.choose));
        }
        Ok(())
    }

    pub fn pick_message(&self) -> String {
        if self.can_pick() {
            format!("Chosen: {}/{}.", self.chosen().len(), self.choose)
        } else {
            QuestError::PicksLocked.to_string()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pool() -> Vec<String> {
        ["Collar", "Candle", "Notebook", "Dice"].iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn remaining_rounds_up() {
        let t = StillnessTimer { start_at: 0.0, end_at: 2000.0 };
        assert_eq!(remaining_secs(&t, 0.0), 2);
        assert_eq!(remaining_secs(&t, 1.0), 2);
        assert_eq!(remaining_secs(&t, 1000.0), 1);
        assert_eq!(remaining_secs(&t, 1999.0), 1);
        assert_eq!(remaining_secs(&t, 2000.0), 0);
        assert_eq!(remaining_secs(&t, 9000.0), 0);
    }

    #[test]
    fn start_requires_posture() {
        let mut p = ProgressRecord::default();
        let mut c = Convergence::open(&mut p, "r", 2, 3);
        assert_eq!(c.start(0.0), Err(QuestError::PostureMissing));
        c.set_posture(Some(Posture::Seated));
        assert_eq!(c.posture(), Some(Posture::Seated));
        c.start(0.0).unwrap();
        assert_eq!(c.phase(), StillnessPhase::Running);
        assert_eq!(c.wake_at(), Some(2000.0));
    }

    #[test]
    fn expiry_holds_once() {
        let mut p = ProgressRecord::default();
        let mut c = Convergence::open(&mut p, "r", 2, 3);
        c.set_posture(Some(Posture::Kneeling));
        c.start(10_000.0).unwrap();
        assert!(!c.poll(11_000.0));
        assert!(c.poll(12_100.0));
        assert!(!c.poll(12_200.0));
        assert_eq!(c.phase(), StillnessPhase::Held);
        assert_eq!(c.wake_at(), None);
        assert!(matches!(c.start(13_000.0), Err(QuestError::StillnessResolved("held"))));
    }

    #[test]
    fn broken_resolves_and_survives_expiry() {
        let mut p = ProgressRecord::default();
        let mut c = Convergence::open(&mut p, "r", 2, 3);
        assert_eq!(c.mark_broken(), Err(QuestError::StillnessNotRunning));
        c.set_posture(Some(Posture::Standing));
        c.start(0.0).unwrap();
        c.mark_broken().unwrap();
        assert!(!c.poll(5_000.0));
        assert_eq!(c.phase(), StillnessPhase::Broken);
        assert!(c.can_pick());
    }

    #[test]
    fn picks_are_gated_and_capped() {
        let mut p = ProgressRecord::default();
        let mut c = Convergence::open(&mut p, "r", 1, 2);
        assert_eq!(c.toggle_item("Dice", &pool()), Err(QuestError::PicksLocked));
        c.set_posture(Some(Posture::Seated));
        c.start(0.0).unwrap();
        c.poll(1_000.0);
        assert!(c.toggle_item("Dice", &pool()).unwrap());
        assert!(c.toggle_item("Candle", &pool()).unwrap());
        assert_eq!(c.toggle_item("Collar", &pool()), Err(QuestError::ChooseExactly(2)));
        assert_eq!(c.toggle_item("Sword", &pool()), Err(QuestError::UnknownItem("Sword".into())));
        assert_eq!(c.chosen().len(), 2);
        c.lock_choices().unwrap();
        assert!(!c.toggle_item("Dice", &pool()).unwrap());
        assert_eq!(c.lock_choices(), Err(QuestError::ChooseExactly(2)));
        assert_eq!(c.pick_message(), "Chosen: 1/2.");
    }
}
