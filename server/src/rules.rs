//! Tunable gameplay rules and policy predicates
//!
//! Everything numeric about the mode lives here: base stat curves, damage
//! variance bounds, leveling thresholds, kill rewards and the policy checks
//! other systems consult before acting. A `GameplayRules` value is built once
//! at startup and passed by reference; nothing in the simulation reaches for
//! globals.

use shared::CharacterStats;

/// Level-scaled integer value. Interpolates between `min` (level 1) and
/// `max` (max level) with an exponent shaping the curve.
#[derive(Debug, Clone, Copy)]
pub struct IntAttribute {
    pub min: i32,
    pub max: i32,
    pub growth: f32,
}

impl IntAttribute {
    pub fn new(min: i32, max: i32, growth: f32) -> Self {
        Self { min, max, growth }
    }

    pub fn at_level(&self, level: i32, max_level: i32) -> i32 {
        if max_level <= 1 || level <= 1 {
            return self.min;
        }
        let level = level.min(max_level);
        let t = (level - 1) as f32 / (max_level - 1) as f32;
        let scaled = self.min as f32 + (self.max - self.min) as f32 * t.powf(self.growth);
        scaled.round() as i32
    }
}

/// A stat bundle players can spend earned points on, by name.
#[derive(Debug, Clone)]
pub struct AttributeDef {
    pub name: String,
    pub stats: CharacterStats,
}

#[derive(Debug, Clone)]
pub struct GameplayRules {
    pub max_level: i32,
    /// Exp required to clear each level, scaled by current level.
    pub exp_to_next_level: IntAttribute,
    /// Stat points granted per level gained.
    pub adding_stat_point: i32,

    pub base_hp: IntAttribute,
    pub base_attack: IntAttribute,
    pub base_defend: IntAttribute,
    pub base_move_speed: IntAttribute,

    /// Uniform damage variance bounds applied at launch.
    pub min_attack_vary_rate: f32,
    pub max_attack_vary_rate: f32,
    /// When set, a fan of N projectiles carries 1/N damage each.
    pub divide_spread_damage: bool,
    pub max_spread_damages: i32,
    pub max_block_reduce_rate: f32,

    /// Rewards granted to the killer, scaled by the victim's level.
    pub reward_exp: IntAttribute,
    pub kill_score: IntAttribute,

    pub respawn_duration: f32,
    pub invincible_duration: f32,
    pub friendly_fire: bool,

    pub attributes: Vec<AttributeDef>,
}

impl GameplayRules {
    pub fn exp_threshold(&self, level: i32) -> i32 {
        self.exp_to_next_level.at_level(level, self.max_level)
    }

    pub fn attribute(&self, name: &str) -> Option<&AttributeDef> {
        self.attributes.iter().find(|attr| attr.name == name)
    }

    /// Team 0 entities are unaffiliated and always valid targets.
    pub fn can_receive_damage(&self, attacker_team: u8, target_team: u8) -> bool {
        self.friendly_fire || attacker_team == 0 || attacker_team != target_team
    }

    /// Status effects follow the same team policy as damage.
    pub fn can_apply_status_effect(&self, attacker_team: u8, target_team: u8) -> bool {
        self.can_receive_damage(attacker_team, target_team)
    }

    /// Entry gate for attacks and skill casts. Blocking is a stance; it
    /// cannot overlap an action.
    pub fn can_attack(&self, is_dead: bool, is_blocking: bool) -> bool {
        !is_dead && !is_blocking
    }

    pub fn can_respawn(&self, dead_for: f32) -> bool {
        dead_for >= self.respawn_duration
    }
}

impl Default for GameplayRules {
    fn default() -> Self {
        Self {
            max_level: 20,
            exp_to_next_level: IntAttribute::new(30, 1100, 1.75),
            adding_stat_point: 3,
            base_hp: IntAttribute::new(100, 400, 1.5),
            base_attack: IntAttribute::new(20, 80, 1.0),
            base_defend: IntAttribute::new(5, 40, 1.0),
            base_move_speed: IntAttribute::new(50, 70, 1.0),
            min_attack_vary_rate: -0.05,
            max_attack_vary_rate: 0.05,
            divide_spread_damage: false,
            max_spread_damages: 16,
            max_block_reduce_rate: 0.75,
            reward_exp: IntAttribute::new(15, 120, 1.0),
            kill_score: IntAttribute::new(100, 500, 1.0),
            respawn_duration: 5.0,
            invincible_duration: 1.5,
            friendly_fire: false,
            attributes: vec![
                AttributeDef {
                    name: "Vitality".to_string(),
                    stats: CharacterStats {
                        add_hp: 8,
                        ..Default::default()
                    },
                },
                AttributeDef {
                    name: "Might".to_string(),
                    stats: CharacterStats {
                        add_attack: 2,
                        ..Default::default()
                    },
                },
                AttributeDef {
                    name: "Fortitude".to_string(),
                    stats: CharacterStats {
                        add_defend: 2,
                        ..Default::default()
                    },
                },
                AttributeDef {
                    name: "Swiftness".to_string(),
                    stats: CharacterStats {
                        add_move_speed: 1,
                        ..Default::default()
                    },
                },
            ],
        }
    }
}
