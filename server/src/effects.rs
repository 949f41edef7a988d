//! Cosmetic effect fan-out
//!
//! Combat code reports logical events (projectile spawned, target hit) here;
//! the network layer drains the queue once per tick and broadcasts each event
//! to every connection exactly once. Duplicate reports of the same logical
//! event within a tick collapse to one notification.

use shared::EffectType;
use std::collections::HashSet;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EffectEvent {
    pub trigger_id: u32,
    pub effect_type: EffectType,
    pub data_id: i32,
    pub action_id: u8,
}

#[derive(Debug, Default)]
pub struct EffectNotifier {
    queued: Vec<EffectEvent>,
    seen: HashSet<(u32, EffectType, i32, u8)>,
}

impl EffectNotifier {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn notify(&mut self, trigger_id: u32, effect_type: EffectType, data_id: i32, action_id: u8) {
        if self.seen.insert((trigger_id, effect_type, data_id, action_id)) {
            self.queued.push(EffectEvent {
                trigger_id,
                effect_type,
                data_id,
                action_id,
            });
        }
    }

    /// Takes the queued events and resets deduplication for the next tick.
    pub fn drain(&mut self) -> Vec<EffectEvent> {
        self.seen.clear();
        std::mem::take(&mut self.queued)
    }

    pub fn is_empty(&self) -> bool {
        self.queued.is_empty()
    }
}
