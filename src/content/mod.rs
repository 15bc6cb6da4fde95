//! Static game content: chapters of levels, each with narrative directions, an
//! action and an optional mechanic. Read-only once loaded.
//!
//! Games normally arrive as JSON embedded in the page; `builtin()` assembles the
//! demo quest from the per-chapter files below.

use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};

use crate::config::QuestConfig;
use crate::error::{QuestError, QuestResult};

mod chapter1;
mod chapter2;
mod chapter3;
mod chapter4;

/// Level `item` values meaning "nothing to collect here".
const NO_ITEM_MARKERS: &[&str] = &["None.", "None. Only what has already been earned."];
/// Always offered at the convergence.
pub const SYMBOLIC_ITEM: &str = "Dice";

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct GameDefinition {
    #[serde(default)]
    pub title: String,
    pub chapters: Vec<Chapter>,
    #[serde(default)]
    pub decks: BTreeMap<String, Vec<String>>,
    #[serde(default)]
    pub config: QuestConfig,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Chapter {
    #[serde(default)]
    pub id: String,
    pub title: String,
    #[serde(default)]
    pub direction: String,
    pub levels: Vec<Level>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Level {
    pub id: String,
    pub title: String,
    #[serde(default)]
    pub direction: String,
    #[serde(default)]
    pub action: String,
    #[serde(default)]
    pub item: Option<String>,
    #[serde(default)]
    pub mechanics: Option<Mechanic>,
}

/// Minigame attached to a level, tagged by `type` in the JSON.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Mechanic {
    WordHunt {
        #[serde(default)]
        word: Option<String>,
    },
    DiceDraw {
        deck: String,
    },
    Prompt {
        #[serde(default)]
        input: Option<String>,
    },
    Riddle {
        #[serde(default)]
        caption: Option<String>,
        #[serde(default, alias = "imageData")]
        image: Option<String>,
        #[serde(default)]
        solution: String,
    },
    Guess,
    Redeemables {
        #[serde(default)]
        count: Option<usize>,
    },
    Checklist {
        #[serde(default)]
        steps: Vec<String>,
    },
    Convergence {
        #[serde(default, rename = "stillnessSeconds")]
        stillness_seconds: Option<u32>,
        #[serde(default, rename = "chooseCount")]
        choose_count: Option<usize>,
    },
}

impl Mechanic {
    pub fn kind(&self) -> &'static str {
        match self {
            Mechanic::WordHunt { .. } => "word hunt",
            Mechanic::DiceDraw { .. } => "deck",
            Mechanic::Prompt { .. } => "prompt",
            Mechanic::Riddle { .. } => "riddle",
            Mechanic::Guess => "mystery box",
            Mechanic::Redeemables { .. } => "coupons",
            Mechanic::Checklist { .. } => "checklist",
            Mechanic::Convergence { .. } => "convergence",
        }
    }
}

impl GameDefinition {
    pub fn from_json(json: &str) -> QuestResult<Self> {
        let game: GameDefinition = serde_json::from_str(json)?;
        game.validate()?;
        Ok(game)
    }

    /// The demo quest shipped with the crate.
    pub fn builtin() -> Self {
        let mut decks = BTreeMap::new();
        decks.insert(
            "nights".to_string(),
            ["Monday", "Tuesday", "Wednesday", "Thursday", "Friday"]
                .iter()
                .map(|s| s.to_string())
                .collect(),
        );
        GameDefinition {
            title: "The Ember Veil".to_string(),
            chapters: vec![
                chapter1::chapter(),
                chapter2::chapter(),
                chapter3::chapter(),
                chapter4::chapter(),
            ],
            decks,
            config: QuestConfig::default(),
        }
    }

    pub fn validate(&self) -> QuestResult<()> {
        if self.chapters.is_empty() {
            return Err(QuestError::Content("no chapters".into()));
        }
        let mut ids = BTreeSet::new();
        for (ci, ch) in self.chapters.iter().enumerate() {
            if ch.levels.is_empty() {
                return Err(QuestError::Content(format!("chapter {} has no levels", ci + 1)));
            }
            for lvl in &ch.levels {
                if lvl.id.is_empty() {
                    return Err(QuestError::Content(format!("level '{}' has no id", lvl.title)));
                }
                if !ids.insert(lvl.id.as_str()) {
                    return Err(QuestError::Content(format!("duplicate level id '{}'", lvl.id)));
                }
            }
        }
        Ok(())
    }

    pub fn chapter(&self, ci: usize) -> Option<&Chapter> {
        self.chapters.get(ci)
    }

    pub fn level(&self, ci: usize, li: usize) -> Option<&Level> {
        self.chapters.get(ci).and_then(|c| c.levels.get(li))
    }

    pub fn deck(&self, name: &str) -> &[String] {
        self.decks.get(name).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Distinct collectable items across all levels, then the symbolic die.
    pub fn item_pool(&self) -> Vec<String> {
        let mut seen = BTreeSet::new();
        let mut pool = Vec::new();
        let items = self
            .chapters
            .iter()
            .flat_map(|c| c.levels.iter())
            .filter_map(|l| l.item.as_deref())
            .filter(|i| !i.is_empty() && !NO_ITEM_MARKERS.contains(i));
        for item in items.chain(std::iter::once(SYMBOLIC_ITEM)) {
            if seen.insert(item) {
                pool.push(item.to_string());
            }
        }
        pool
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builtin_is_valid() {
        let g = GameDefinition::builtin();
        g.validate().unwrap();
        assert!(g.chapters.len() >= 4);
    }

    #[test]
    fn builtin_item_pool_ends_with_dice() {
        let pool = GameDefinition::builtin().item_pool();
        assert_eq!(pool.last().map(String::as_str), Some(SYMBOLIC_ITEM));
        assert!(pool.len() >= 4);
        assert!(!pool.iter().any(|i| NO_ITEM_MARKERS.contains(&i.as_str())));
    }

    #[test]
    fn parses_tagged_mechanics() {
        let json = r#"{
            "chapters": [{
                "title": "One",
                "direction": "Begin.",
                "levels": [
                    {"id": "a", "title": "A", "mechanics": {"type": "word_hunt", "word": "LAMP"}},
                    {"id": "b", "title": "B", "mechanics": {"type": "guess"}},
                    {"id": "c", "title": "C", "mechanics": {"type": "convergence", "stillnessSeconds": 30, "chooseCount": 2}},
                    {"id": "d", "title": "D", "mechanics": {"type": "riddle", "imageData": "data:x", "solution": "Moon"}}
                ]
            }]
        }"#;
        let g = GameDefinition::from_json(json).unwrap();
        let lv = &g.chapters[0].levels;
        assert_eq!(lv[0].mechanics, Some(Mechanic::WordHunt { word: Some("LAMP".into()) }));
        assert_eq!(lv[1].mechanics, Some(Mechanic::Guess));
        assert_eq!(
            lv[2].mechanics,
            Some(Mechanic::Convergence { stillness_seconds: Some(30), choose_count: Some(2) })
        );
        match &lv[3].mechanics {
            Some(Mechanic::Riddle { image, solution, .. }) => {
                assert_eq!(image.as_deref(), Some("data:x"));
                assert_eq!(solution, "Moon");
            }
            other => panic!("unexpected {:?}", other),
        }
        assert_eq!(g.config, QuestConfig::default());
    }

    #[test]
    fn rejects_unknown_mechanic_and_bad_shapes() {
        let unknown = r#"{"chapters":[{"title":"x","levels":[{"id":"a","title":"A","mechanics":{"type":"juggle"}}]}]}"#;
        assert!(matches!(GameDefinition::from_json(unknown), Err(QuestError::Content(_))));
        let empty = r#"{"chapters":[]}"#;
        assert!(GameDefinition::from_json(empty).is_err());
        let dup = r#"{"chapters":[{"title":"x","levels":[{"id":"a","title":"A"},{"id":"a","title":"B"}]}]}"#;
        assert!(GameDefinition::from_json(dup).is_err());
    }
}
