//! Room route variant: a fixed loop of rooms walked step by step.
//!
//! Each step runs `Home -> Direction -> Action -> (Reward) -> Home`. The room
//! for a step is `route[step_index % route.len()]`; every advance bumps
//! `step_index`, so a room only comes round again once the route wraps.
//! The run state is its own JSON blob under `rooms_storage_key`.

use std::collections::{BTreeMap, BTreeSet};

use log::{debug, info};
use serde::{Deserialize, Serialize};

use crate::config::QuestConfig;
use crate::error::{QuestError, QuestResult};
use crate::rng::RandomSource;
use crate::store::{ProgressStore, Repo};

mod builtin;

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct RoomAction {
    pub id: String,
    pub text: String,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct RoomRewards {
    #[serde(default)]
    pub base: String,
    #[serde(default)]
    pub high: String,
    #[serde(default)]
    pub top: String,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct RoomDefinition {
    #[serde(default)]
    pub actions: Vec<RoomAction>,
    #[serde(default)]
    pub rewards: RoomRewards,
    #[serde(default)]
    pub hint: String,
    #[serde(default)]
    pub clue: String,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct RouteDefinition {
    pub route: Vec<String>,
    pub rooms: BTreeMap<String, RoomDefinition>,
    #[serde(default)]
    pub config: QuestConfig,
}

impl RouteDefinition {
    pub fn from_json(json: &str) -> QuestResult<Self> {
        let def: RouteDefinition = serde_json::from_str(json)?;
        def.validate()?;
        Ok(def)
    }

    pub fn builtin() -> Self {
        builtin::route()
    }

    /// Non-empty route, every routed room defined, action ids unique.
    pub fn validate(&self) -> QuestResult<()> {
        if self.route.is_empty() {
            return Err(QuestError::Content("empty route".into()));
        }
        if let Some(missing) = self.route.iter().find(|r| !self.rooms.contains_key(*r)) {
            return Err(QuestError::Content(format!("route names unknown room '{}'", missing)));
        }
        let mut ids = BTreeSet::new();
        for action in self.rooms.values().flat_map(|r| r.actions.iter()) {
            if !ids.insert(action.id.as_str()) {
                return Err(QuestError::Content(format!("duplicate action id '{}'", action.id)));
            }
        }
        Ok(())
    }

    pub fn room_name(&self, step_index: u32) -> &str {
        &self.route[step_index as usize % self.route.len()]
    }
}

/// How much of the direction a roll buys.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ClarityTier {
    Low,
    Mid,
    High,
}

impl ClarityTier {
    pub fn from_roll(roll: u8) -> Self {
        match roll {
            0..=7 => ClarityTier::Low,
            8..=14 => ClarityTier::Mid,
            _ => ClarityTier::High,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RewardTier {
    Base,
    High,
    Top,
}

impl RewardTier {
    pub fn from_roll(roll: u8) -> Self {
        match roll {
            20.. => RewardTier::Top,
            15..=19 => RewardTier::High,
            _ => RewardTier::Base,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            RewardTier::Base => "Base",
            RewardTier::High => "High",
            RewardTier::Top => "Top",
        }
    }

    pub fn obols(self, config: &QuestConfig) -> u32 {
        match self {
            RewardTier::Base => config.obols_base,
            RewardTier::High => config.obols_high,
            RewardTier::Top => config.obols_top,
        }
    }

    pub fn pick(self, rewards: &RoomRewards) -> &str {
        match self {
            RewardTier::Base => &rewards.base,
            RewardTier::High => &rewards.high,
            RewardTier::Top => &rewards.top,
        }
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Screen {
    #[default]
    Home,
    Direction,
    Action,
    Reward,
}

impl Screen {
    pub fn key(self) -> &'static str {
        match self {
            Screen::Home => "home",
            Screen::Direction => "direction",
            Screen::Action => "action",
            Screen::Reward => "reward",
        }
    }
}

fn yes() -> bool {
    true
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RoomState {
    #[serde(default)]
    pub step_index: u32,
    #[serde(default)]
    pub last_roll: Option<u8>,
    #[serde(default = "yes")]
    pub armed: bool,
    #[serde(default)]
    pub completed: Vec<String>,
    #[serde(default)]
    pub obols: u32,
    #[serde(default)]
    pub paid_hint_used_at_step: BTreeMap<u32, bool>,
    #[serde(default)]
    pub screen: Screen,
}

impl RoomState {
    pub fn fresh(config: &QuestConfig) -> Self {
        Self {
            step_index: 0,
            last_roll: None,
            armed: true,
            completed: Vec::new(),
            obols: config.starting_obols,
            paid_hint_used_at_step: BTreeMap::new(),
            screen: Screen::Home,
        }
    }
}

/// Number of leading characters given away at mid clarity.
fn leading_third(name: &str) -> String {
    let n = name.chars().count();
    name.chars().take(n.div_ceil(3).max(1)).collect()
}

pub struct RoomRun<S: ProgressStore> {
    route: RouteDefinition,
    config: QuestConfig,
    repo: Repo<S>,
    state: RoomState,
}

impl<S: ProgressStore> RoomRun<S> {
    pub fn new(route: RouteDefinition, config: QuestConfig, store: S) -> QuestResult<Self> {
        route.validate()?;
        let repo = Repo::new(store, config.rooms_storage_key.clone());
        let state = repo.load_or_else(|| RoomState::fresh(&config));
        debug!("room run loaded at step {}", state.step_index);
        Ok(Self { route, config, repo, state })
    }

    pub fn state(&self) -> &RoomState {
        &self.state
    }

    pub fn route(&self) -> &RouteDefinition {
        &self.route
    }

    pub fn store(&self) -> &S {
        self.repo.store()
    }

    pub fn screen(&self) -> Screen {
        self.state.screen
    }

    pub fn obols(&self) -> u32 {
        self.state.obols
    }

    pub fn room_name(&self) -> &str {
        self.route.room_name(self.state.step_index)
    }

    pub fn room(&self) -> &RoomDefinition {
        &self.route.rooms[self.room_name()]
    }

    fn persist(&mut self) {
        self.repo.save_value(&self.state);
    }

    fn expect_screen(&self, screen: Screen) -> QuestResult<()> {
        if self.state.screen == screen { Ok(()) } else { Err(QuestError::WrongScreen) }
    }

    /// First action of the current room not yet done, in definition order.
    pub fn next_action(&self) -> Option<&RoomAction> {
        self.room()
            .actions
            .iter()
            .find(|a| !self.state.completed.contains(&a.id))
    }

    pub fn room_complete(&self) -> bool {
        self.next_action().is_none()
    }

    pub fn roll(&mut self, rng: &mut dyn RandomSource) -> QuestResult<u8> {
        // Check before drawing so a refused roll costs nothing.
        self.expect_screen(Screen::Home)?;
        if !self.state.armed {
            return Err(QuestError::NotArmed);
        }
        let value = rng.roll_d20();
        self.apply_roll(value)?;
        Ok(value)
    }

    /// Accept a finished roll from Home. Disarms until the step advances.
    pub fn apply_roll(&mut self, value: u8) -> QuestResult<()> {
        self.expect_screen(Screen::Home)?;
        if !self.state.armed {
            return Err(QuestError::NotArmed);
        }
        let value = value.clamp(1, 20);
        self.state.last_roll = Some(value);
        self.state.armed = false;
        self.state.screen = Screen::Direction;
        info!("room roll {} at step {} ({})", value, self.state.step_index, self.room_name());
        self.persist();
        Ok(())
    }

    pub fn clarity(&self) -> Option<ClarityTier> {
        self.state.last_roll.map(ClarityTier::from_roll)
    }

    /// Direction to the current room at the clarity of the last roll.
    pub fn direction_text(&self) -> String {
        let name = self.room_name();
        let clue = &self.room().clue;
        let head = match self.clarity() {
            None => return "Roll to learn where to go next.".to_string(),
            Some(ClarityTier::Low) => "The die mutters. Somewhere in this house the next step waits.".to_string(),
            Some(ClarityTier::Mid) => format!("Seek the room whose name begins “{}…”.", leading_third(name)),
            Some(ClarityTier::High) => format!("Go to the {}.", name),
        };
        if clue.is_empty() { head } else { format!("{} {}", head, clue) }
    }

    pub fn hint_used(&self) -> bool {
        self.state
            .paid_hint_used_at_step
            .get(&self.state.step_index)
            .copied()
            .unwrap_or(false)
    }

    /// Hint text, once bought for this step.
    pub fn visible_hint(&self) -> Option<&str> {
        self.hint_used().then(|| self.room().hint.as_str())
    }

    /// Spend `hint_cost` obols on the room hint. Once per step, no refund.
    pub fn purchase_hint(&mut self) -> QuestResult<String> {
        self.expect_screen(Screen::Direction)?;
        if self.hint_used() {
            return Err(QuestError::HintAlreadyUsed);
        }
        let cost = self.config.hint_cost;
        if self.state.obols < cost {
            return Err(QuestError::InsufficientObols { need: cost, have: self.state.obols });
        }
        self.state.obols -= cost;
        self.state.paid_hint_used_at_step.insert(self.state.step_index, true);
        info!("hint bought at step {} for {} obol(s)", self.state.step_index, cost);
        self.persist();
        Ok(self.room().hint.clone())
    }

    /// Leave the direction screen. A room with nothing left to do goes
    /// straight to its reward.
    pub fn proceed_to_action(&mut self) -> QuestResult<Screen> {
        self.expect_screen(Screen::Direction)?;
        self.state.screen = if self.room_complete() { Screen::Reward } else { Screen::Action };
        self.persist();
        Ok(self.state.screen)
    }

    /// Finish the pending action. Returns the screen moved to.
    pub fn mark_action_done(&mut self) -> QuestResult<Screen> {
        self.expect_screen(Screen::Action)?;
        if let Some(id) = self.next_action().map(|a| a.id.clone()) {
            debug!("action {} done", id);
            self.state.completed.push(id);
        }
        if self.room_complete() {
            self.state.screen = Screen::Reward;
        } else {
            self.advance();
        }
        self.persist();
        Ok(self.state.screen)
    }

    fn advance(&mut self) {
        self.state.step_index += 1;
        self.state.last_roll = None;
        self.state.armed = true;
        self.state.screen = Screen::Home;
    }

    pub fn reward_tier(&self) -> Option<RewardTier> {
        match self.state.screen {
            Screen::Reward => Some(RewardTier::from_roll(self.state.last_roll.unwrap_or(0))),
            _ => None,
        }
    }

    pub fn reward_text(&self) -> Option<&str> {
        self.reward_tier().map(|t| t.pick(&self.room().rewards))
    }

    /// Collect the reward and move to the next step. Returns obols granted.
    pub fn continue_from_reward(&mut self) -> QuestResult<u32> {
        let tier = self.reward_tier().ok_or(QuestError::WrongScreen)?;
        let granted = tier.obols(&self.config);
        self.state.obols = self.state.obols.saturating_add(granted);
        info!("{} reward in {}: +{} obol(s)", tier.label(), self.room_name(), granted);
        self.advance();
        self.persist();
        Ok(granted)
    }

    pub fn reset(&mut self) {
        self.repo.clear();
        self.state = RoomState::fresh(&self.config);
        info!("room run reset");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryStore;

    fn run() -> RoomRun<MemoryStore> {
        RoomRun::new(RouteDefinition::builtin(), QuestConfig::default(), MemoryStore::new()).unwrap()
    }

    #[test]
    fn tiers_follow_roll_boundaries() {
        assert_eq!(ClarityTier::from_roll(1), ClarityTier::Low);
        assert_eq!(ClarityTier::from_roll(7), ClarityTier::Low);
        assert_eq!(ClarityTier::from_roll(8), ClarityTier::Mid);
        assert_eq!(ClarityTier::from_roll(14), ClarityTier::Mid);
        assert_eq!(ClarityTier::from_roll(15), ClarityTier::High);
        assert_eq!(RewardTier::from_roll(20), RewardTier::Top);
        assert_eq!(RewardTier::from_roll(19), RewardTier::High);
        assert_eq!(RewardTier::from_roll(15), RewardTier::High);
        assert_eq!(RewardTier::from_roll(14), RewardTier::Base);
    }

    #[test]
    fn builtin_route_is_valid() {
        RouteDefinition::builtin().validate().unwrap();
    }

    #[test]
    fn route_config_overrides_defaults() {
        let json = r#"{
            "route": ["Attic"],
            "rooms": {"Attic": {"actions": [{"id": "a1", "text": "Open the trunk."}]}},
            "config": {"hintCost": 2, "startingObols": 9}
        }"#;
        let route = RouteDefinition::from_json(json).unwrap();
        assert_eq!(route.config.hint_cost, 2);
        assert_eq!(route.config.starting_obols, 9);
        assert_eq!(route.config.choose_count, QuestConfig::default().choose_count);
        assert_eq!(RouteDefinition::builtin().config, QuestConfig::default());
    }

    #[test]
    fn route_rejects_unknown_room() {
        let json = r#"{"route": ["Attic"], "rooms": {}}"#;
        assert!(matches!(RouteDefinition::from_json(json), Err(QuestError::Content(_))));
    }

    #[test]
    fn roll_needs_home_and_armed() {
        let mut r = run();
        r.apply_roll(9).unwrap();
        assert_eq!(r.screen(), Screen::Direction);
        assert!(!r.state().armed);
        assert_eq!(r.apply_roll(9), Err(QuestError::WrongScreen));
    }

    #[test]
    fn direction_reveals_by_tier() {
        let mut r = run();
        assert_eq!(r.room_name(), "Kitchen");
        r.apply_roll(3).unwrap();
        assert!(!r.direction_text().contains("Ki"));

        let mut r = run();
        r.apply_roll(10).unwrap();
        assert!(r.direction_text().contains("“Kit…”"));
        assert!(!r.direction_text().contains("Kitchen"));

        let mut r = run();
        r.apply_roll(15).unwrap();
        assert!(r.direction_text().starts_with("Go to the Kitchen."));
    }

    #[test]
    fn leading_third_rounds_up() {
        assert_eq!(leading_third("Kitchen"), "Kit");
        assert_eq!(leading_third("Den"), "D");
        assert_eq!(leading_third("A"), "A");
    }

    #[test]
    fn hint_is_bought_once_per_step() {
        let mut r = run();
        assert_eq!(r.purchase_hint(), Err(QuestError::WrongScreen));
        r.apply_roll(5).unwrap();
        let start = r.obols();
        assert!(r.visible_hint().is_none());
        let hint = r.purchase_hint().unwrap();
        assert_eq!(r.visible_hint(), Some(hint.as_str()));
        assert_eq!(r.obols(), start - 1);
        assert_eq!(r.purchase_hint(), Err(QuestError::HintAlreadyUsed));
        assert_eq!(r.obols(), start - 1);
    }

    #[test]
    fn hint_needs_obols() {
        let config = QuestConfig { starting_obols: 0, ..QuestConfig::default() };
        let mut r = RoomRun::new(RouteDefinition::builtin(), config, MemoryStore::new()).unwrap();
        r.apply_roll(5).unwrap();
        assert_eq!(r.purchase_hint(), Err(QuestError::InsufficientObols { need: 1, have: 0 }));
        assert!(!r.hint_used());
    }

    #[test]
    fn unfinished_room_steps_forward() {
        let mut r = run();
        r.apply_roll(12).unwrap();
        assert_eq!(r.proceed_to_action(), Ok(Screen::Action));
        assert_eq!(r.next_action().map(|a| a.id.as_str()), Some("kitchen-kettle"));
        assert_eq!(r.mark_action_done(), Ok(Screen::Home));
        let s = r.state();
        assert_eq!(s.step_index, 1);
        assert!(s.armed);
        assert_eq!(s.last_roll, None);
        assert_eq!(r.room_name(), "Library");
    }

    #[test]
    fn finished_room_pays_by_tier() {
        let mut r = run();
        // Library is step 1 and has a single action.
        r.apply_roll(1).unwrap();
        r.proceed_to_action().unwrap();
        r.mark_action_done().unwrap();
        r.apply_roll(20).unwrap();
        r.proceed_to_action().unwrap();
        assert_eq!(r.mark_action_done(), Ok(Screen::Reward));
        assert_eq!(r.reward_tier(), Some(RewardTier::Top));
        assert_eq!(r.reward_text(), Some(r.room().rewards.top.as_str()));
        let before = r.obols();
        assert_eq!(r.continue_from_reward(), Ok(3));
        assert_eq!(r.obols(), before + 3);
        assert_eq!(r.state().step_index, 2);
        assert_eq!(r.state().last_roll, None);
        assert_eq!(r.screen(), Screen::Home);
        assert_eq!(r.continue_from_reward(), Err(QuestError::WrongScreen));
    }

    #[test]
    fn state_survives_reload_and_corruption() {
        let store = MemoryStore::new();
        let mut r =
            RoomRun::new(RouteDefinition::builtin(), QuestConfig::default(), store.clone()).unwrap();
        r.apply_roll(8).unwrap();
        let again =
            RoomRun::new(RouteDefinition::builtin(), QuestConfig::default(), store.clone()).unwrap();
        assert_eq!(again.screen(), Screen::Direction);

        let broken = MemoryStore::with_entry(&QuestConfig::default().rooms_storage_key, "{not json");
        let fresh = RoomRun::new(RouteDefinition::builtin(), QuestConfig::default(), broken).unwrap();
        assert_eq!(fresh.state(), &RoomState::fresh(&QuestConfig::default()));
    }

    #[test]
    fn reset_restores_fresh_state() {
        let store = MemoryStore::new();
        let mut r =
            RoomRun::new(RouteDefinition::builtin(), QuestConfig::default(), store.clone()).unwrap();
        r.apply_roll(8).unwrap();
        r.reset();
        assert!(store.is_empty());
        assert_eq!(r.state(), &RoomState::fresh(&QuestConfig::default()));
    }
}
