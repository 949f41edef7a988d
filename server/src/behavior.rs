//! Entity control seam
//!
//! Player entities are driven by commands decoded off the wire; bots by a
//! server-side controller behind the same [`BehaviorController`] trait, so
//! the game loop applies both through one code path.

use crate::entity::CombatEntity;
use glam::Vec3;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use shared::ItemCatalog;
use std::collections::HashMap;

/// One intent an entity's controller produced this tick.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Command {
    Move { dir: Vec3 },
    Aim { dir: Vec3 },
    StartAttack,
    StopAttack,
    UseSkill { hotkey_id: i8, aim: Vec3 },
}

/// Read-only view of the world a controller may consult.
pub struct WorldView<'a> {
    pub entities: &'a HashMap<u32, CombatEntity>,
    pub catalog: &'a ItemCatalog,
    pub now: f64,
}

pub trait BehaviorController: Send {
    fn think(&mut self, me: &CombatEntity, world: &WorldView) -> Vec<Command>;
}

/// Wanders until a living enemy comes inside weapon range, then turns and
/// holds the trigger on the nearest one.
pub struct BotController {
    rng: StdRng,
    wander_dir: Vec3,
    next_decision_at: f64,
}

impl BotController {
    pub fn new(seed: u64) -> Self {
        Self {
            rng: StdRng::seed_from_u64(seed),
            wander_dir: Vec3::Z,
            next_decision_at: 0.0,
        }
    }

    fn nearest_enemy<'a>(
        &self,
        me: &CombatEntity,
        world: &'a WorldView,
    ) -> Option<&'a CombatEntity> {
        world
            .entities
            .values()
            .filter(|e| {
                e.id != me.id
                    && !e.is_dead()
                    && (me.team_id == 0 || e.team_id != me.team_id)
            })
            .min_by(|a, b| {
                let da = a.position.distance_squared(me.position);
                let db = b.position.distance_squared(me.position);
                da.total_cmp(&db)
            })
    }
}

impl BehaviorController for BotController {
    fn think(&mut self, me: &CombatEntity, world: &WorldView) -> Vec<Command> {
        if me.is_dead() {
            return Vec::new();
        }

        let range = world
            .catalog
            .weapon(me.weapon_id)
            .map(|w| w.attack_range())
            .unwrap_or(0.0);

        if let Some(enemy) = self.nearest_enemy(me, world) {
            let offset = enemy.position - me.position;
            let distance = offset.length();
            if range > 0.0 && distance <= range {
                let dir = if distance > f32::EPSILON {
                    offset / distance
                } else {
                    Vec3::Z
                };
                // Close half the range, then hold position and fire.
                let advance = if distance > range * 0.5 { dir } else { Vec3::ZERO };
                return vec![
                    Command::Aim { dir },
                    Command::Move { dir: advance },
                    Command::StartAttack,
                ];
            }
        }

        // Nobody in reach: wander, re-rolling the heading every few seconds.
        if world.now >= self.next_decision_at {
            let angle = self.rng.gen_range(0.0..std::f32::consts::TAU);
            self.wander_dir = Vec3::new(angle.cos(), 0.0, angle.sin());
            self.next_decision_at = world.now + self.rng.gen_range(1.5..4.0);
        }
        vec![
            Command::Aim {
                dir: self.wander_dir,
            },
            Command::Move {
                dir: self.wander_dir,
            },
            Command::StopAttack,
        ]
    }
}
