//! Level minigames. Each one reads and writes its own slice of the progress
//! record, scoped by level id (the word hunt and the convergence picks are
//! quest-wide). `view` is the single dispatch point over `Mechanic`.

pub mod checklist;
pub mod convergence;
pub mod deck;
pub mod notes;
pub mod word_hunt;

pub use convergence::{Convergence, Posture, StillnessPhase, remaining_secs};
pub use deck::Deck;
pub use word_hunt::{CollarStatus, WordHunt};

use serde::Serialize;

use crate::config::QuestConfig;
use crate::content::{GameDefinition, Mechanic};
use crate::progress::{ChecklistStep, Coupon, ProgressRecord};
use crate::rng::RandomSource;

/// Snapshot of a mechanic's state for rendering.
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum MechanicView {
    WordHunt {
        word_len: usize,
        found: usize,
        pattern: String,
        collar: CollarStatus,
    },
    DiceDraw {
        deck: String,
        remaining: usize,
        last_drawn: Option<String>,
    },
    Prompt {
        label: String,
        answer: String,
    },
    Riddle {
        caption: String,
        image: Option<String>,
        attempt: String,
        solved: bool,
    },
    Guess {
        guess: String,
    },
    Redeemables {
        coupons: Vec<Coupon>,
    },
    Checklist {
        steps: Vec<ChecklistStep>,
    },
    Convergence {
        stillness_seconds: u32,
        choose_count: usize,
        phase: StillnessPhase,
        posture: Option<Posture>,
        remaining: Option<u64>,
        chosen: Vec<String>,
        pool: Vec<String>,
        message: String,
    },
}

pub fn card_title(m: &Mechanic) -> &'static str {
    match m {
        Mechanic::WordHunt { .. } => "Word Hunt",
        Mechanic::DiceDraw { .. } => "Fate Draw",
        Mechanic::Prompt { .. } => "Write It Down",
        Mechanic::Riddle { .. } => "Riddle",
        Mechanic::Guess => "Mystery Box",
        Mechanic::Redeemables { .. } => "Coupons",
        Mechanic::Checklist { .. } => "Checklist",
        Mechanic::Convergence { .. } => "The Convergence",
    }
}

pub fn coupon_count(count: Option<usize>, config: &QuestConfig) -> usize {
    count.unwrap_or(config.coupon_count)
}

pub fn stillness_seconds(seconds: Option<u32>, config: &QuestConfig) -> u32 {
    seconds.filter(|s| *s > 0).unwrap_or(config.stillness_seconds)
}

pub fn choose_count(count: Option<usize>, config: &QuestConfig) -> usize {
    count.filter(|c| *c > 0).unwrap_or(config.choose_count)
}

/// Build the view for `mechanic` on `level_id`. First use of a stateful
/// mechanic initializes its slice of `progress` (deck order, coupon list...),
/// so callers persist afterwards.
pub fn view(
    mechanic: &Mechanic,
    level_id: &str,
    game: &GameDefinition,
    progress: &mut ProgressRecord,
    rng: &mut dyn RandomSource,
    now_ms: f64,
) -> MechanicView {
    let config = &game.config;
    match mechanic {
        Mechanic::WordHunt { word } => {
            let hunt = WordHunt::open(&mut progress.word_hunt, word.as_deref());
            MechanicView::WordHunt {
                word_len: hunt.word().chars().count(),
                found: hunt.found().len(),
                pattern: hunt.pattern(),
                collar: hunt.collar_status(),
            }
        }
        Mechanic::DiceDraw { deck } => {
            let d = Deck::open(&mut progress.notes, level_id, deck, game.deck(deck), rng);
            MechanicView::DiceDraw {
                deck: deck.clone(),
                remaining: d.remaining(),
                last_drawn: d.last_drawn().map(str::to_string),
            }
        }
        Mechanic::Prompt { input } => MechanicView::Prompt {
            label: input.clone().unwrap_or_else(|| notes::PROMPT_FALLBACK.to_string()),
            answer: notes::prompt_answer(&progress.notes, level_id).to_string(),
        },
        Mechanic::Riddle { caption, image, solution } => {
            let attempt = notes::riddle_attempt(&progress.notes, level_id).to_string();
            MechanicView::Riddle {
                caption: caption.clone().unwrap_or_else(|| notes::RIDDLE_FALLBACK.to_string()),
                image: image.clone(),
                solved: notes::riddle_matches(&attempt, solution),
                attempt,
            }
        }
        Mechanic::Guess => MechanicView::Guess {
            guess: notes::locked_guess(&progress.notes, level_id).to_string(),
        },
        Mechanic::Redeemables { count } => MechanicView::Redeemables {
            coupons: checklist::coupons(&mut progress.notes, level_id, coupon_count(*count, config)).clone(),
        },
        Mechanic::Checklist { steps } => MechanicView::Checklist {
            steps: checklist::checklist(&mut progress.notes, level_id, steps).clone(),
        },
        Mechanic::Convergence { stillness_seconds: secs, choose_count: choose } => {
            let pool = game.item_pool();
            let mut conv = Convergence::open(
                progress,
                level_id,
                stillness_seconds(*secs, config),
                choose_count(*choose, config),
            );
            conv.poll(now_ms);
            MechanicView::Convergence {
                stillness_seconds: conv.stillness_seconds(),
                choose_count: conv.choose_count(),
                phase: conv.phase(),
                posture: conv.posture(),
                remaining: conv.remaining(now_ms),
                chosen: conv.chosen().to_vec(),
                message: conv.pick_message(),
                pool,
            }
        }
    }
}
