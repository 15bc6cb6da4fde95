//! JS-facing wrappers. Each owns a session over `localStorage` and the
//! platform random source; rejections come back as plain message strings.

use wasm_bindgen::prelude::*;
use web_sys::window;

use crate::content::GameDefinition;
use crate::dice::{MotionAccess, ShakeDetector};
use crate::error::QuestError;
use crate::mechanics::Posture;
use crate::quest::{HintPrice, QuestSession, RollMode};
use crate::rng::OsRandom;
use crate::rooms::{RoomRun, RouteDefinition};
use crate::store::LocalStorageStore;

fn js_err(e: QuestError) -> JsValue {
    JsValue::from_str(&e.to_string())
}

/// Wall clock in ms since the epoch, from `performance` (0 outside a browser).
pub fn now_ms() -> f64 {
    window()
        .and_then(|w| w.performance())
        .map(|p| p.time_origin() + p.now())
        .unwrap_or(0.0)
}

#[wasm_bindgen]
pub struct WebQuest {
    session: QuestSession<LocalStorageStore>,
    rng: OsRandom,
}

#[wasm_bindgen]
impl WebQuest {
    /// Load a game from JSON, or the built-in quest when `json` is absent.
    #[wasm_bindgen(constructor)]
    pub fn new(json: Option<String>) -> Result<WebQuest, JsValue> {
        let game = match json {
            Some(j) => GameDefinition::from_json(&j).map_err(js_err)?,
            None => GameDefinition::builtin(),
        };
        let session = QuestSession::new(game, LocalStorageStore).map_err(js_err)?;
        Ok(WebQuest { session, rng: OsRandom::default() })
    }

    pub fn title(&self) -> String {
        self.session.game().title.clone()
    }

    pub fn crumb(&self) -> String {
        self.session.crumb()
    }

    pub fn chapter_title(&self) -> String {
        self.session.current_chapter().title.clone()
    }

    pub fn level_title(&self) -> String {
        self.session.current_level().title.clone()
    }

    pub fn chapter_direction(&self) -> String {
        self.session.chapter_direction()
    }

    pub fn level_direction(&self) -> String {
        self.session.level_direction()
    }

    pub fn action(&self) -> String {
        self.session.action().to_string()
    }

    pub fn item(&self) -> Option<String> {
        self.session.current_level().item.clone()
    }

    /// "normal", "advantage" or "disadvantage".
    pub fn set_roll_mode(&mut self, mode: &str) {
        let mode = match mode {
            "advantage" => RollMode::Advantage,
            "disadvantage" => RollMode::Disadvantage,
            _ => RollMode::Normal,
        };
        self.session.set_roll_mode(mode);
    }

    pub fn roll(&mut self) -> u8 {
        self.session.roll(&mut self.rng)
    }

    pub fn last_roll(&self) -> Option<u8> {
        self.session.last_roll()
    }

    pub fn is_revealed(&self) -> bool {
        self.session.is_revealed()
    }

    pub fn can_advance(&self) -> bool {
        self.session.can_advance()
    }

    pub fn can_complete(&self) -> bool {
        self.session.can_complete()
    }

    pub fn next_level(&mut self) -> Result<bool, JsValue> {
        self.session.next_level().map_err(js_err)
    }

    pub fn prev_level(&mut self) -> bool {
        self.session.prev_level()
    }

    pub fn select_chapter(&mut self, ci: usize) -> Result<(), JsValue> {
        self.session.select_chapter(ci).map_err(js_err)
    }

    pub fn chapter_count(&self) -> usize {
        self.session.game().chapters.len()
    }

    /// "done/total" for chapter `ci`.
    pub fn chapter_completion(&self, ci: usize) -> String {
        let (done, total) = self.session.chapter_completion(ci);
        format!("{}/{}", done, total)
    }

    pub fn mark_complete(&mut self) -> Result<bool, JsValue> {
        self.session.mark_complete().map_err(js_err)
    }

    pub fn is_complete(&self) -> bool {
        self.session.is_complete(&self.session.current_level().id)
    }

    pub fn reset(&mut self) {
        self.session.reset();
    }

    pub fn hint(&self) -> String {
        self.session.hint().to_string()
    }

    /// Confirmation line for a hint price ("freeze", "confess", "task").
    pub fn hint_price(&self, price: &str) -> Option<String> {
        let price = match price {
            "freeze" => HintPrice::Freeze,
            "confess" => HintPrice::Confess,
            "task" => HintPrice::Task,
            _ => return None,
        };
        Some(price.confirmation().to_string())
    }

    /// Current mechanic state as JSON, tagged by `type`.
    pub fn mechanic_json(&mut self) -> Option<String> {
        let view = self.session.mechanic_view(&mut self.rng, now_ms())?;
        match serde_json::to_string(&view) {
            Ok(s) => Some(s),
            Err(e) => {
                log::warn!("mechanic view not serializable: {}", e);
                None
            }
        }
    }

    pub fn mechanic_title(&self) -> Option<String> {
        self.session.mechanic_title().map(str::to_string)
    }

    pub fn add_letter(&mut self, letter: &str) -> Result<bool, JsValue> {
        self.session.add_letter(letter).map_err(js_err)
    }

    pub fn undo_letter(&mut self) -> Result<Option<String>, JsValue> {
        self.session
            .undo_letter()
            .map(|c| c.map(String::from))
            .map_err(js_err)
    }

    /// `false` when the input was blank and nothing happened.
    pub fn guess_word(&mut self, guess: &str) -> Result<bool, JsValue> {
        self.session.guess_word(guess).map_err(js_err)
    }

    pub fn draw_card(&mut self) -> Result<String, JsValue> {
        self.session.draw_card(&mut self.rng).map_err(js_err)
    }

    pub fn reshuffle(&mut self) -> Result<(), JsValue> {
        self.session.reshuffle(&mut self.rng).map_err(js_err)
    }

    pub fn save_prompt(&mut self, answer: &str) -> Result<(), JsValue> {
        self.session.save_prompt(answer).map_err(js_err)
    }

    pub fn lock_guess(&mut self, guess: &str) -> Result<(), JsValue> {
        self.session.lock_guess(guess).map_err(js_err)
    }

    pub fn check_riddle(&mut self, attempt: &str) -> Result<bool, JsValue> {
        self.session.check_riddle(attempt).map_err(js_err)
    }

    pub fn toggle_coupon(&mut self, idx: usize) -> Result<bool, JsValue> {
        self.session.toggle_coupon(idx).map_err(js_err)
    }

    pub fn set_coupon_note(&mut self, idx: usize, note: &str) -> Result<(), JsValue> {
        self.session.set_coupon_note(idx, note).map_err(js_err)
    }

    pub fn toggle_step(&mut self, idx: usize) -> Result<bool, JsValue> {
        self.session.toggle_step(idx).map_err(js_err)
    }

    /// `posture` is "kneeling", "standing", "seated" or empty to clear.
    pub fn set_posture(&mut self, posture: &str) -> Result<(), JsValue> {
        self.session.set_posture(Posture::from_key(posture)).map_err(js_err)
    }

    /// Start the stillness countdown; returns the wake-up timestamp.
    pub fn start_stillness(&mut self) -> Result<f64, JsValue> {
        self.session.start_stillness(now_ms()).map_err(js_err)
    }

    pub fn stillness_wake_at(&mut self) -> Option<f64> {
        self.session.stillness_wake_at()
    }

    pub fn poll_stillness(&mut self) -> bool {
        self.session.poll_stillness(now_ms())
    }

    pub fn mark_stillness_broken(&mut self) -> Result<(), JsValue> {
        self.session.mark_stillness_broken().map_err(js_err)
    }

    pub fn toggle_item(&mut self, item: &str) -> Result<bool, JsValue> {
        self.session.toggle_item(item).map_err(js_err)
    }

    pub fn lock_choices(&mut self) -> Result<(), JsValue> {
        self.session.lock_choices().map_err(js_err)
    }
}

#[wasm_bindgen]
pub struct WebRooms {
    run: RoomRun<LocalStorageStore>,
    rng: OsRandom,
    shake: ShakeDetector,
    motion: MotionAccess,
}

#[wasm_bindgen]
impl WebRooms {
    #[wasm_bindgen(constructor)]
    pub fn new(json: Option<String>) -> Result<WebRooms, JsValue> {
        let route = match json {
            Some(j) => RouteDefinition::from_json(&j).map_err(js_err)?,
            None => RouteDefinition::builtin(),
        };
        let config = route.config.clone();
        let shake = ShakeDetector::from_config(&config);
        let run = RoomRun::new(route, config, LocalStorageStore).map_err(js_err)?;
        Ok(WebRooms { run, rng: OsRandom::default(), shake, motion: MotionAccess::Unknown })
    }

    /// Record the answer to the motion permission request.
    pub fn set_motion_permission(&mut self, answer: &str) {
        self.motion = MotionAccess::from_permission(answer);
    }

    pub fn roll_prompt(&self) -> String {
        self.motion.roll_input().prompt().to_string()
    }

    /// Feed an accelerometer sample; rolls when it counts as a shake.
    pub fn on_motion(&mut self, x: f64, y: f64, z: f64) -> Option<u8> {
        if self.motion != MotionAccess::Granted || !self.shake.observe(x, y, z, now_ms()) {
            return None;
        }
        self.run.roll(&mut self.rng).ok()
    }

    pub fn roll(&mut self) -> Result<u8, JsValue> {
        self.run.roll(&mut self.rng).map_err(js_err)
    }

    pub fn screen(&self) -> String {
        self.run.screen().key().to_string()
    }

    pub fn room_name(&self) -> String {
        self.run.room_name().to_string()
    }

    pub fn step_index(&self) -> u32 {
        self.run.state().step_index
    }

    pub fn obols(&self) -> u32 {
        self.run.obols()
    }

    pub fn direction_text(&self) -> String {
        self.run.direction_text()
    }

    pub fn hint(&self) -> Option<String> {
        self.run.visible_hint().map(str::to_string)
    }

    pub fn purchase_hint(&mut self) -> Result<String, JsValue> {
        self.run.purchase_hint().map_err(js_err)
    }

    pub fn proceed(&mut self) -> Result<String, JsValue> {
        self.run.proceed_to_action().map(|s| s.key().to_string()).map_err(js_err)
    }

    pub fn action_text(&self) -> Option<String> {
        self.run.next_action().map(|a| a.text.clone())
    }

    pub fn mark_done(&mut self) -> Result<String, JsValue> {
        self.run.mark_action_done().map(|s| s.key().to_string()).map_err(js_err)
    }

    pub fn reward_tier(&self) -> Option<String> {
        self.run.reward_tier().map(|t| t.label().to_string())
    }

    pub fn reward_text(&self) -> Option<String> {
        self.run.reward_text().map(str::to_string)
    }

    pub fn continue_from_reward(&mut self) -> Result<u32, JsValue> {
        self.run.continue_from_reward().map_err(js_err)
    }

    pub fn reset(&mut self) {
        self.run.reset();
    }
}
