//! Damage projectile runtime
//!
//! Projectiles travel in a straight line for a fixed lifetime, resolve at
//! most once, and sweep every living character around the contact point when
//! they do. Corpses and the attacker never trigger a contact; a projectile
//! flying over a body keeps flying.

use crate::combat::{DamageSource, SpawnDirective};
use crate::effects::EffectNotifier;
use crate::entity::CombatEntity;
use crate::rules::GameplayRules;
use glam::Vec3;
use rand::Rng;
use shared::{
    EffectType, ItemCatalog, ProjectileSnapshot, ProjectileTemplate, ARENA_EXTENT,
    CHARACTER_RADIUS, MOVE_SPEED_RATE,
};
use std::collections::HashMap;

#[derive(Debug)]
pub struct DamageProjectile {
    pub id: u32,
    pub template: ProjectileTemplate,
    pub attacker_id: u32,
    pub attacker_team: u8,
    pub source: DamageSource,
    pub action_id: u8,
    pub position: Vec3,
    pub direction: Vec3,
    pub damage: i32,
    pub spawned_at: f64,
    /// At-most-once latch; once set the projectile only awaits removal.
    pub resolved: bool,
}

/// What a resolution pass decided about one projectile.
#[derive(Debug, Default)]
pub struct ContactResolution {
    pub destroyed: bool,
    /// (target entity, status effect id) pairs applied during the sweep.
    pub status_applied: Vec<(u32, i32)>,
}

impl DamageProjectile {
    pub fn from_directive(id: u32, directive: SpawnDirective, now: f64) -> Self {
        Self {
            id,
            template: directive.template,
            attacker_id: directive.attacker_id,
            attacker_team: directive.attacker_team,
            source: directive.source,
            action_id: directive.action_id,
            position: directive.origin,
            direction: directive.direction,
            damage: directive.damage,
            spawned_at: now,
            resolved: false,
        }
    }

    pub fn advance(&mut self, dt: f32) {
        self.position += self.direction * self.template.speed * MOVE_SPEED_RATE * dt;
    }

    pub fn expired(&self, now: f64) -> bool {
        now - self.spawned_at >= self.template.life_time as f64
    }

    /// The arena boundary is the one piece of geometry a projectile cannot
    /// ignore.
    pub fn out_of_bounds(&self) -> bool {
        self.position.x.abs() > ARENA_EXTENT || self.position.z.abs() > ARENA_EXTENT
    }

    /// Data id observers use to look the cosmetic effect up.
    pub fn effect_data_id(&self) -> i32 {
        match self.source {
            DamageSource::Weapon { weapon_id } => weapon_id,
            DamageSource::Skill { skill_id } => skill_id,
        }
    }

    pub fn spawn_effect_type(&self) -> EffectType {
        match self.source {
            DamageSource::Weapon { .. } => EffectType::DamageSpawn,
            DamageSource::Skill { .. } => EffectType::SkillSpawn,
        }
    }

    pub fn hit_effect_type(&self) -> EffectType {
        match self.source {
            DamageSource::Weapon { .. } => EffectType::DamageHit,
            DamageSource::Skill { .. } => EffectType::SkillHit,
        }
    }

    pub fn snapshot(&self) -> ProjectileSnapshot {
        ProjectileSnapshot {
            id: self.id,
            template_id: self.template.data_id(),
            position: self.position,
            direction: self.direction,
            attacker_id: self.attacker_id,
            speed: self.template.speed,
        }
    }

    fn touches(&self, entity: &CombatEntity) -> bool {
        entity.position.distance(self.position) <= self.template.radius + CHARACTER_RADIUS
    }
}

/// Runs contact detection and, on contact, the full damage sweep. Returns
/// whether the projectile should be removed this tick.
///
/// Contact requires a living character other than the attacker. On contact
/// every living character in the blast radius takes damage once; the
/// attacker's rate bonuses and leech are read up front so the sweep stays
/// correct even when the attacker is among the casualties of an earlier
/// projectile.
pub fn resolve_contacts<R: Rng>(
    projectile: &mut DamageProjectile,
    entities: &mut HashMap<u32, CombatEntity>,
    catalog: &ItemCatalog,
    rules: &GameplayRules,
    rng: &mut R,
    notifier: &mut EffectNotifier,
    now: f64,
) -> ContactResolution {
    if projectile.resolved {
        return ContactResolution {
            destroyed: true,
            status_applied: Vec::new(),
        };
    }

    let contact = entities
        .values()
        .any(|e| e.id != projectile.attacker_id && !e.is_dead() && projectile.touches(e));
    if !contact {
        if projectile.out_of_bounds() {
            projectile.resolved = true;
            return ContactResolution {
                destroyed: true,
                status_applied: Vec::new(),
            };
        }
        return ContactResolution::default();
    }
    projectile.resolved = true;

    let (increase_rate, leech_rate, exp_rate, score_rate) = entities
        .get(&projectile.attacker_id)
        .map(|a| {
            (
                a.total_increase_damage_rate(catalog, rules),
                a.total_leech_rate(catalog, rules),
                a.total_exp_rate(catalog, rules),
                a.total_score_rate(catalog, rules),
            )
        })
        .unwrap_or((0.0, 0.0, 1.0, 1.0));

    let victim_ids: Vec<u32> = entities
        .values()
        .filter(|e| e.id != projectile.attacker_id && !e.is_dead() && projectile.touches(e))
        .map(|e| e.id)
        .collect();

    let mut status_applied = Vec::new();
    let mut leech_total = 0;
    let mut killed_levels = Vec::new();

    for victim_id in victim_ids {
        let Some(target) = entities.get_mut(&victim_id) else {
            continue;
        };
        if target.is_invincible(now) {
            continue;
        }
        if !rules.can_receive_damage(projectile.attacker_team, target.team_id) {
            continue;
        }

        let rated = (projectile.damage as f32
            * (1.0 + increase_rate - target.total_reduce_receive_damage_rate(catalog, rules)))
        .ceil() as i32;
        let block_cut = if target.is_blocking {
            (rated as f32 * target.total_block_reduce_rate(catalog, rules)).ceil() as i32
        } else {
            0
        };
        let reduce_hp = (rated - target.total_defend(catalog, rules) - block_cut).max(0);

        target.hp -= reduce_hp;
        notifier.notify(
            victim_id,
            projectile.hit_effect_type(),
            projectile.effect_data_id(),
            projectile.action_id,
        );

        if !target.is_dead() {
            if let Some(effect) = projectile
                .template
                .status_effect_id
                .and_then(|id| catalog.status_effect(id))
            {
                if rules.can_apply_status_effect(projectile.attacker_team, target.team_id)
                    && rng.gen::<f32>() < effect.apply_rate
                {
                    target.apply_status_effect(effect, now);
                    status_applied.push((victim_id, effect.data_id()));
                }
            }
        } else {
            killed_levels.push(target.level);
            target.die(now);
        }

        if reduce_hp > 0 {
            leech_total += (leech_rate * reduce_hp as f32).ceil() as i32;
        }
    }

    // Leech and kill rewards land on the attacker afterwards, and only while
    // the attacker is still alive.
    if let Some(attacker) = entities.get_mut(&projectile.attacker_id) {
        if !attacker.is_dead() {
            if leech_total > 0 {
                let max_hp = attacker.max_hp(catalog, rules);
                attacker.hp = (attacker.hp + leech_total).min(max_hp);
            }
            for victim_level in killed_levels {
                let exp = (rules.reward_exp.at_level(victim_level, rules.max_level) as f32
                    * exp_rate)
                    .ceil() as i32;
                let score = (rules.kill_score.at_level(victim_level, rules.max_level) as f32
                    * score_rate)
                    .ceil() as i32;
                attacker.gain_exp(exp, rules);
                attacker.score += score;
                attacker.kill_count += 1;
            }
        }
    }

    ContactResolution {
        destroyed: true,
        status_applied,
    }
}
