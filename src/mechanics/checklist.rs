//! Tick-box mechanics: redeemable coupons and step checklists.
//! Both lists are created from the level descriptor on first use and then
//! live in the progress record.

use crate::error::{QuestError, QuestResult};
use crate::progress::{ChecklistStep, Coupon, Notes};

pub fn coupons<'n>(notes: &'n mut Notes, level_id: &str, count: usize) -> &'n mut Vec<Coupon> {
    notes.coupons.entry(level_id.to_string()).or_insert_with(|| {
        (1..=count)
            .map(|i| Coupon { name: format!("Coupon {}", i), used: false, note: String::new() })
            .collect()
    })
}

/// Flip a coupon between redeemed and unused. Returns the new state.
pub fn toggle_coupon(notes: &mut Notes, level_id: &str, count: usize, idx: usize) -> QuestResult<bool> {
    let coupon = coupons(notes, level_id, count)
        .get_mut(idx)
        .ok_or_else(|| QuestError::NotFound(format!("coupon {}", idx + 1)))?;
    coupon.used = !coupon.used;
    Ok(coupon.used)
}

pub fn set_coupon_note(notes: &mut Notes, level_id: &str, count: usize, idx: usize, note: &str) -> QuestResult<()> {
    let coupon = coupons(notes, level_id, count)
        .get_mut(idx)
        .ok_or_else(|| QuestError::NotFound(format!("coupon {}", idx + 1)))?;
    coupon.note = note.to_string();
    Ok(())
}

pub fn checklist<'n>(notes: &'n mut Notes, level_id: &str, steps: &[String]) -> &'n mut Vec<ChecklistStep> {
    notes.checklists.entry(level_id.to_string()).or_insert_with(|| {
        steps
            .iter()
            .map(|s| ChecklistStep { step: s.clone(), done: false })
            .collect()
    })
}

pub fn toggle_step(notes: &mut Notes, level_id: &str, steps: &[String], idx: usize) -> QuestResult<bool> {
    let step = checklist(notes, level_id, steps)
        .get_mut(idx)
        .ok_or_else(|| QuestError::NotFound(format!("step {}", idx + 1)))?;
    step.done = !step.done;
    Ok(step.done)
}
