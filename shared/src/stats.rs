use serde::{Deserialize, Serialize};
use std::ops::{Add, AddAssign, Mul, Sub};

/// Additive stat bundle carried by equipment, status effects and spent
/// attribute points. All derived totals are `base + sum(contributions)`;
/// clamping happens at the point of derivation, never here.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct CharacterStats {
    pub add_hp: i32,
    pub add_attack: i32,
    pub add_defend: i32,
    pub add_move_speed: i32,
    pub add_exp_rate: f32,
    pub add_score_rate: f32,
    pub add_hp_recovery_rate: f32,
    pub add_block_reduce_damage_rate: f32,
    pub add_damage_rate_leech_hp: f32,
    pub add_spread_damages: i32,
    pub increase_damage_rate: f32,
    pub reduce_receive_damage_rate: f32,
}

impl Add for CharacterStats {
    type Output = CharacterStats;

    fn add(self, other: CharacterStats) -> CharacterStats {
        CharacterStats {
            add_hp: self.add_hp + other.add_hp,
            add_attack: self.add_attack + other.add_attack,
            add_defend: self.add_defend + other.add_defend,
            add_move_speed: self.add_move_speed + other.add_move_speed,
            add_exp_rate: self.add_exp_rate + other.add_exp_rate,
            add_score_rate: self.add_score_rate + other.add_score_rate,
            add_hp_recovery_rate: self.add_hp_recovery_rate + other.add_hp_recovery_rate,
            add_block_reduce_damage_rate: self.add_block_reduce_damage_rate
                + other.add_block_reduce_damage_rate,
            add_damage_rate_leech_hp: self.add_damage_rate_leech_hp
                + other.add_damage_rate_leech_hp,
            add_spread_damages: self.add_spread_damages + other.add_spread_damages,
            increase_damage_rate: self.increase_damage_rate + other.increase_damage_rate,
            reduce_receive_damage_rate: self.reduce_receive_damage_rate
                + other.reduce_receive_damage_rate,
        }
    }
}

impl AddAssign for CharacterStats {
    fn add_assign(&mut self, other: CharacterStats) {
        *self = *self + other;
    }
}

impl Sub for CharacterStats {
    type Output = CharacterStats;

    fn sub(self, other: CharacterStats) -> CharacterStats {
        CharacterStats {
            add_hp: self.add_hp - other.add_hp,
            add_attack: self.add_attack - other.add_attack,
            add_defend: self.add_defend - other.add_defend,
            add_move_speed: self.add_move_speed - other.add_move_speed,
            add_exp_rate: self.add_exp_rate - other.add_exp_rate,
            add_score_rate: self.add_score_rate - other.add_score_rate,
            add_hp_recovery_rate: self.add_hp_recovery_rate - other.add_hp_recovery_rate,
            add_block_reduce_damage_rate: self.add_block_reduce_damage_rate
                - other.add_block_reduce_damage_rate,
            add_damage_rate_leech_hp: self.add_damage_rate_leech_hp
                - other.add_damage_rate_leech_hp,
            add_spread_damages: self.add_spread_damages - other.add_spread_damages,
            increase_damage_rate: self.increase_damage_rate - other.increase_damage_rate,
            reduce_receive_damage_rate: self.reduce_receive_damage_rate
                - other.reduce_receive_damage_rate,
        }
    }
}

/// Scalar multiply, used for attribute points spent on the same attribute.
impl Mul<i32> for CharacterStats {
    type Output = CharacterStats;

    fn mul(self, count: i32) -> CharacterStats {
        CharacterStats {
            add_hp: self.add_hp * count,
            add_attack: self.add_attack * count,
            add_defend: self.add_defend * count,
            add_move_speed: self.add_move_speed * count,
            add_exp_rate: self.add_exp_rate * count as f32,
            add_score_rate: self.add_score_rate * count as f32,
            add_hp_recovery_rate: self.add_hp_recovery_rate * count as f32,
            add_block_reduce_damage_rate: self.add_block_reduce_damage_rate * count as f32,
            add_damage_rate_leech_hp: self.add_damage_rate_leech_hp * count as f32,
            add_spread_damages: self.add_spread_damages * count,
            increase_damage_rate: self.increase_damage_rate * count as f32,
            reduce_receive_damage_rate: self.reduce_receive_damage_rate * count as f32,
        }
    }
}
