//! Authoritative combat entity state
//!
//! Everything the server knows about one combatant: vitals, progression,
//! equipped loadout, active status effects and the timed action state machine
//! that paces attacks and skill casts. Only code in this crate mutates these
//! fields; clients see them exclusively through snapshots.

use crate::rules::GameplayRules;
use crate::stats::{ContributorSet, StatAggregator};
use glam::Vec3;
use shared::{
    CharacterSnapshot, CharacterStats, ItemCatalog, StatusEffectData, IDLE_ACTION, IDLE_HOTKEY,
};
use std::collections::HashMap;

/// What a wind-up will launch once its timer elapses.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum PendingAction {
    Weapon { weapon_id: i32, action_id: u8 },
    Skill { skill_id: i32, aim: Vec3 },
}

/// Timed replacement for animation-driven callbacks. A launch only fires if
/// its guards still hold when the timer elapses; any guard failure drops the
/// action silently back to `Idle`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ActionPhase {
    Idle,
    WindUp { action: PendingAction, launch_at: f64 },
    Recover { ends_at: f64 },
}

/// A status effect currently ticking on an entity. Effects never stack:
/// re-applying the same id replaces this record wholesale.
#[derive(Debug, Clone)]
pub struct AppliedStatusEffect {
    pub data_id: i32,
    pub expires_at: f64,
    pub stats: CharacterStats,
}

#[derive(Debug)]
pub struct CombatEntity {
    pub id: u32,
    pub name: String,
    /// Opaque string carried from the join request; never interpreted.
    pub extra: String,
    pub team_id: u8,
    pub is_bot: bool,

    pub position: Vec3,
    pub direction: Vec3,

    pub hp: i32,
    pub exp: i32,
    pub level: i32,
    pub stat_point: i32,
    pub score: i32,
    pub kill_count: i32,
    pub die_count: i32,

    pub head_id: i32,
    pub body_id: i32,
    pub weapon_id: i32,
    pub custom_equipment_ids: Vec<i32>,
    pub spent_attributes: HashMap<String, i32>,
    pub status_effects: Vec<AppliedStatusEffect>,

    pub attacking_action_id: i16,
    pub using_skill_hotkey_id: i8,
    pub last_skill_use: HashMap<i8, f64>,
    pub phase: ActionPhase,
    /// Latched by attack/stop-attack commands; the tick loop re-arms
    /// wind-ups while this holds.
    pub wants_attack: bool,
    pub queued_skill: Option<(i8, Vec3)>,

    pub is_blocking: bool,
    pub is_hidden: bool,
    pub invincible_until: f64,
    pub death_time: Option<f64>,

    aggregator: StatAggregator,
}

impl CombatEntity {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        id: u32,
        name: String,
        team_id: u8,
        position: Vec3,
        head_id: i32,
        body_id: i32,
        weapon_id: i32,
        custom_equipment_ids: Vec<i32>,
        catalog: &ItemCatalog,
        rules: &GameplayRules,
        now: f64,
    ) -> Self {
        let mut entity = Self {
            id,
            name,
            extra: String::new(),
            team_id,
            is_bot: false,
            position,
            direction: Vec3::Z,
            hp: 0,
            exp: 0,
            level: 1,
            stat_point: 0,
            score: 0,
            kill_count: 0,
            die_count: 0,
            head_id,
            body_id,
            weapon_id,
            custom_equipment_ids,
            spent_attributes: HashMap::new(),
            status_effects: Vec::new(),
            attacking_action_id: IDLE_ACTION,
            using_skill_hotkey_id: IDLE_HOTKEY,
            last_skill_use: HashMap::new(),
            phase: ActionPhase::Idle,
            wants_attack: false,
            queued_skill: None,
            is_blocking: false,
            is_hidden: false,
            invincible_until: now + rules.invincible_duration as f64,
            death_time: None,
            aggregator: StatAggregator::new(),
        };
        entity.hp = entity.max_hp(catalog, rules);
        entity
    }

    pub fn aggregated_stats(&self, catalog: &ItemCatalog, rules: &GameplayRules) -> CharacterStats {
        let effect_stats: Vec<CharacterStats> =
            self.status_effects.iter().map(|e| e.stats).collect();
        self.aggregator.total(&ContributorSet {
            catalog,
            rules,
            head_id: self.head_id,
            body_id: self.body_id,
            weapon_id: self.weapon_id,
            custom_equipment_ids: &self.custom_equipment_ids,
            status_effect_stats: &effect_stats,
            spent_attributes: &self.spent_attributes,
        })
    }

    // Derived totals: level-scaled base plus the contributor aggregate.

    pub fn max_hp(&self, catalog: &ItemCatalog, rules: &GameplayRules) -> i32 {
        rules.base_hp.at_level(self.level, rules.max_level)
            + self.aggregated_stats(catalog, rules).add_hp
    }

    pub fn total_attack(&self, catalog: &ItemCatalog, rules: &GameplayRules) -> i32 {
        rules.base_attack.at_level(self.level, rules.max_level)
            + self.aggregated_stats(catalog, rules).add_attack
    }

    pub fn total_defend(&self, catalog: &ItemCatalog, rules: &GameplayRules) -> i32 {
        rules.base_defend.at_level(self.level, rules.max_level)
            + self.aggregated_stats(catalog, rules).add_defend
    }

    pub fn total_move_speed(&self, catalog: &ItemCatalog, rules: &GameplayRules) -> i32 {
        rules.base_move_speed.at_level(self.level, rules.max_level)
            + self.aggregated_stats(catalog, rules).add_move_speed
    }

    pub fn total_exp_rate(&self, catalog: &ItemCatalog, rules: &GameplayRules) -> f32 {
        1.0 + self.aggregated_stats(catalog, rules).add_exp_rate
    }

    pub fn total_score_rate(&self, catalog: &ItemCatalog, rules: &GameplayRules) -> f32 {
        1.0 + self.aggregated_stats(catalog, rules).add_score_rate
    }

    pub fn total_spread_damages(&self, catalog: &ItemCatalog, rules: &GameplayRules) -> i32 {
        (1 + self.aggregated_stats(catalog, rules).add_spread_damages)
            .clamp(1, rules.max_spread_damages)
    }

    pub fn total_block_reduce_rate(&self, catalog: &ItemCatalog, rules: &GameplayRules) -> f32 {
        self.aggregated_stats(catalog, rules)
            .add_block_reduce_damage_rate
            .min(rules.max_block_reduce_rate)
    }

    /// Floored so stacked debuffs can never invert damage.
    pub fn total_increase_damage_rate(&self, catalog: &ItemCatalog, rules: &GameplayRules) -> f32 {
        self.aggregated_stats(catalog, rules)
            .increase_damage_rate
            .max(-0.9)
    }

    pub fn total_reduce_receive_damage_rate(
        &self,
        catalog: &ItemCatalog,
        rules: &GameplayRules,
    ) -> f32 {
        self.aggregated_stats(catalog, rules)
            .reduce_receive_damage_rate
    }

    pub fn total_leech_rate(&self, catalog: &ItemCatalog, rules: &GameplayRules) -> f32 {
        self.aggregated_stats(catalog, rules).add_damage_rate_leech_hp
    }

    pub fn is_dead(&self) -> bool {
        self.hp <= 0
    }

    pub fn is_invincible(&self, now: f64) -> bool {
        now < self.invincible_until
    }

    // Loadout mutation. Every change invalidates the stat cache.

    pub fn set_weapon(&mut self, weapon_id: i32) {
        self.weapon_id = weapon_id;
        self.aggregator.invalidate();
    }

    pub fn set_head(&mut self, head_id: i32) {
        self.head_id = head_id;
        self.aggregator.invalidate();
    }

    pub fn set_body(&mut self, body_id: i32) {
        self.body_id = body_id;
        self.aggregator.invalidate();
    }

    /// Equips into the item's container slot, replacing whatever was there.
    pub fn set_custom_equipment(&mut self, equipment_id: i32, catalog: &ItemCatalog) {
        let Some(incoming) = catalog.custom_equipment(equipment_id) else {
            return;
        };
        let container = incoming.container_index;
        self.custom_equipment_ids.retain(|id| {
            catalog
                .custom_equipment(*id)
                .map(|e| e.container_index != container)
                .unwrap_or(false)
        });
        self.custom_equipment_ids.push(equipment_id);
        self.aggregator.invalidate();
    }

    /// Spends one stat point on a named attribute. Rejects unknown names and
    /// empty pools.
    pub fn add_attribute(&mut self, name: &str, rules: &GameplayRules) -> bool {
        if self.stat_point <= 0 || rules.attribute(name).is_none() {
            return false;
        }
        self.stat_point -= 1;
        *self.spent_attributes.entry(name.to_string()).or_insert(0) += 1;
        self.aggregator.invalidate();
        true
    }

    /// Adds exp and consumes level thresholds with carry-forward. Returns the
    /// number of levels gained.
    pub fn gain_exp(&mut self, amount: i32, rules: &GameplayRules) -> i32 {
        self.exp += amount;
        let mut gained = 0;
        while self.level < rules.max_level {
            let threshold = rules.exp_threshold(self.level);
            if threshold <= 0 || self.exp < threshold {
                break;
            }
            self.exp -= threshold;
            self.level += 1;
            self.stat_point += rules.adding_stat_point;
            gained += 1;
        }
        gained
    }

    /// Applies or refreshes a status effect. Same id replaces, so effects
    /// never stack.
    pub fn apply_status_effect(&mut self, data: &StatusEffectData, now: f64) {
        let data_id = data.data_id();
        self.status_effects.retain(|e| e.data_id != data_id);
        self.status_effects.push(AppliedStatusEffect {
            data_id,
            expires_at: now + data.duration as f64,
            stats: data.stats,
        });
        self.aggregator.invalidate();
    }

    /// Drops expired effects; returns true if anything changed.
    pub fn update_status_effects(&mut self, now: f64) -> bool {
        let before = self.status_effects.len();
        self.status_effects.retain(|e| e.expires_at > now);
        if self.status_effects.len() != before {
            self.aggregator.invalidate();
            true
        } else {
            false
        }
    }

    pub fn die(&mut self, now: f64) {
        self.hp = 0;
        self.die_count += 1;
        self.death_time = Some(now);
        self.status_effects.clear();
        self.aggregator.invalidate();
        self.abort_action();
        self.wants_attack = false;
        self.queued_skill = None;
        self.is_blocking = false;
    }

    pub fn respawn(&mut self, catalog: &ItemCatalog, rules: &GameplayRules, now: f64) {
        self.death_time = None;
        self.hp = self.max_hp(catalog, rules);
        self.invincible_until = now + rules.invincible_duration as f64;
    }

    /// Drops any running action and clears the wire sentinels.
    pub fn abort_action(&mut self) {
        self.phase = ActionPhase::Idle;
        self.attacking_action_id = IDLE_ACTION;
        self.using_skill_hotkey_id = IDLE_HOTKEY;
    }

    pub fn snapshot(&self) -> CharacterSnapshot {
        CharacterSnapshot {
            id: self.id,
            name: self.name.clone(),
            team_id: self.team_id,
            position: self.position,
            direction: self.direction,
            hp: self.hp,
            level: self.level,
            exp: self.exp,
            stat_point: self.stat_point,
            score: self.score,
            kill_count: self.kill_count,
            die_count: self.die_count,
            is_dead: self.is_dead(),
            is_blocking: self.is_blocking,
            is_invincible: false,
            is_hidden: self.is_hidden,
            head_id: self.head_id,
            body_id: self.body_id,
            weapon_id: self.weapon_id,
            attacking_action_id: self.attacking_action_id,
            using_skill_hotkey_id: self.using_skill_hotkey_id,
        }
    }

    /// Snapshot variant that stamps the invincibility flag for `now`.
    pub fn snapshot_at(&self, now: f64) -> CharacterSnapshot {
        let mut snapshot = self.snapshot();
        snapshot.is_invincible = self.is_invincible(now);
        snapshot
    }
}
