//! Attack and skill resolution, from command to projectile spawn
//!
//! Attacks run through two timed phases driven by the tick loop: a wind-up
//! sized by the chosen attack animation, then the launch, then a recovery
//! tail. The launch re-validates its guards because anything can change
//! between frames of a wind-up: the attacker can die, swap weapons or have
//! the action cancelled. Guard failures abort silently.

use crate::entity::{ActionPhase, CombatEntity, PendingAction};
use crate::rules::GameplayRules;
use glam::{Quat, Vec3};
use rand::Rng;
use shared::protocol::spread_rotations;
use shared::{ItemCatalog, ProjectileTemplate, SkillData, IDLE_HOTKEY};

/// Where a projectile's damage came from; echoed in effect notifications.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DamageSource {
    Weapon { weapon_id: i32 },
    Skill { skill_id: i32 },
}

/// One projectile the game loop should spawn.
#[derive(Debug, Clone)]
pub struct SpawnDirective {
    pub template: ProjectileTemplate,
    pub origin: Vec3,
    pub direction: Vec3,
    pub damage: i32,
    pub attacker_id: u32,
    /// Captured at spawn so the team policy survives the attacker leaving.
    pub attacker_team: u8,
    pub source: DamageSource,
    pub action_id: u8,
}

/// Broadcast payload for an attack that just started its wind-up.
#[derive(Debug, Clone, Copy)]
pub struct AttackStart {
    pub weapon_id: i32,
    pub action_id: u8,
    pub direction: Vec3,
}

#[derive(Debug, Clone, Copy)]
pub struct SkillStart {
    pub skill_id: i32,
    pub target_position: Vec3,
}

/// Everything a completed launch asks the game loop to do.
#[derive(Debug, Default)]
pub struct LaunchOutcome {
    pub directives: Vec<SpawnDirective>,
    /// Status effect the caster applied to themselves, already applied;
    /// carried here so observers get notified.
    pub self_effect: Option<i32>,
}

/// Base damage for one projectile of a launch. Variance is rolled once for
/// the whole fan; the optional spread division keeps multi-projectile
/// weapons from multiplying total output.
pub fn roll_damage<R: Rng>(
    total_attack: i32,
    skill: Option<&SkillData>,
    spread: i32,
    rules: &GameplayRules,
    rng: &mut R,
) -> i32 {
    let mut damage = total_attack as f32;
    if let Some(skill) = skill {
        damage += skill.increase_damage as f32 + total_attack as f32 * skill.increase_damage_by_rate;
    }
    damage += damage * rng.gen_range(rules.min_attack_vary_rate..=rules.max_attack_vary_rate);
    if rules.divide_spread_damage && spread > 1 {
        damage /= spread as f32;
    }
    damage.ceil() as i32
}

/// Starts a weapon attack wind-up with a randomly chosen attack animation.
/// Returns the notification payload, or None when the entity cannot attack
/// right now.
pub fn begin_attack<R: Rng>(
    entity: &mut CombatEntity,
    catalog: &ItemCatalog,
    rules: &GameplayRules,
    rng: &mut R,
    now: f64,
) -> Option<AttackStart> {
    if !rules.can_attack(entity.is_dead(), entity.is_blocking) || entity.phase != ActionPhase::Idle
    {
        return None;
    }
    let weapon = catalog.weapon(entity.weapon_id)?;
    if weapon.attack_animations.is_empty() {
        return None;
    }
    let animation = &weapon.attack_animations[rng.gen_range(0..weapon.attack_animations.len())];

    entity.attacking_action_id = animation.action_id as i16;
    entity.phase = ActionPhase::WindUp {
        action: PendingAction::Weapon {
            weapon_id: entity.weapon_id,
            action_id: animation.action_id,
        },
        launch_at: now + animation.launch_delay() as f64,
    };
    Some(AttackStart {
        weapon_id: entity.weapon_id,
        action_id: animation.action_id,
        direction: entity.direction,
    })
}

/// Starts a skill cast if the hotkey maps to a known skill and its cooldown
/// has elapsed. Cooldown is committed here, not at launch.
pub fn begin_skill(
    entity: &mut CombatEntity,
    hotkey_id: i8,
    aim: Vec3,
    catalog: &ItemCatalog,
    rules: &GameplayRules,
    now: f64,
) -> Option<SkillStart> {
    if !rules.can_attack(entity.is_dead(), entity.is_blocking) || entity.phase != ActionPhase::Idle
    {
        return None;
    }
    let hotkeys = catalog.skills_for_loadout(
        entity.head_id,
        entity.body_id,
        entity.weapon_id,
        &entity.custom_equipment_ids,
    );
    let skill = *hotkeys.get(&hotkey_id)?;
    if let Some(last) = entity.last_skill_use.get(&hotkey_id) {
        if now - last < skill.cool_down as f64 {
            return None;
        }
    }

    entity.last_skill_use.insert(hotkey_id, now);
    entity.using_skill_hotkey_id = hotkey_id;
    entity.attacking_action_id = skill.attack_animation.action_id as i16;
    entity.phase = ActionPhase::WindUp {
        action: PendingAction::Skill {
            skill_id: skill.data_id(),
            aim,
        },
        launch_at: now + skill.attack_animation.launch_delay() as f64,
    };
    Some(SkillStart {
        skill_id: skill.data_id(),
        target_position: aim,
    })
}

/// Fires the pending action of an elapsed wind-up. Re-checks every guard;
/// on failure the entity drops to idle and nothing spawns.
pub fn launch<R: Rng>(
    entity: &mut CombatEntity,
    catalog: &ItemCatalog,
    rules: &GameplayRules,
    rng: &mut R,
    now: f64,
) -> LaunchOutcome {
    let ActionPhase::WindUp { action, .. } = entity.phase else {
        return LaunchOutcome::default();
    };
    if entity.is_dead() {
        entity.abort_action();
        return LaunchOutcome::default();
    }

    match action {
        PendingAction::Weapon {
            weapon_id,
            action_id,
        } => launch_weapon(entity, weapon_id, action_id, catalog, rules, rng, now),
        PendingAction::Skill { skill_id, aim } => {
            launch_skill(entity, skill_id, aim, catalog, rules, rng, now)
        }
    }
}

fn launch_weapon<R: Rng>(
    entity: &mut CombatEntity,
    weapon_id: i32,
    action_id: u8,
    catalog: &ItemCatalog,
    rules: &GameplayRules,
    rng: &mut R,
    now: f64,
) -> LaunchOutcome {
    // The weapon equipped at wind-up must still be equipped and the action
    // sentinel untouched.
    if entity.weapon_id != weapon_id || entity.attacking_action_id != action_id as i16 {
        entity.abort_action();
        return LaunchOutcome::default();
    }
    let Some(weapon) = catalog.weapon(weapon_id) else {
        entity.abort_action();
        return LaunchOutcome::default();
    };
    let Some(animation) = weapon.animation(action_id) else {
        entity.abort_action();
        return LaunchOutcome::default();
    };
    let Some(template) = weapon.projectile_for(action_id) else {
        entity.abort_action();
        return LaunchOutcome::default();
    };

    let spread = entity.total_spread_damages(catalog, rules);
    let damage = roll_damage(entity.total_attack(catalog, rules), None, spread, rules, rng);
    let directives = fan_out(
        entity,
        template,
        entity.direction,
        spread,
        damage,
        DamageSource::Weapon { weapon_id },
        action_id,
    );

    enter_recovery(entity, animation.total_duration(), animation.launch_delay(), now);
    LaunchOutcome {
        directives,
        self_effect: None,
    }
}

fn launch_skill<R: Rng>(
    entity: &mut CombatEntity,
    skill_id: i32,
    aim: Vec3,
    catalog: &ItemCatalog,
    rules: &GameplayRules,
    rng: &mut R,
    now: f64,
) -> LaunchOutcome {
    if entity.using_skill_hotkey_id == IDLE_HOTKEY {
        entity.abort_action();
        return LaunchOutcome::default();
    }
    // The skill must still be granted by the current loadout.
    let hotkeys = catalog.skills_for_loadout(
        entity.head_id,
        entity.body_id,
        entity.weapon_id,
        &entity.custom_equipment_ids,
    );
    let Some(skill) = hotkeys.values().find(|s| s.data_id() == skill_id).copied() else {
        entity.abort_action();
        return LaunchOutcome::default();
    };

    // Self-buff applies at launch, independent of any projectile.
    let mut self_effect = None;
    if let Some(effect_id) = skill.status_effect_id {
        if let Some(effect) = catalog.status_effect(effect_id) {
            if rng.gen::<f32>() < effect.apply_rate {
                entity.apply_status_effect(effect, now);
                self_effect = Some(effect_id);
            }
        }
    }

    let template = skill
        .attack_animation
        .projectile_override
        .as_ref()
        .or(skill.projectile.as_ref());
    let directives = if let Some(template) = template {
        let spread = skill.spread_damages.max(1);
        let damage = roll_damage(
            entity.total_attack(catalog, rules),
            Some(skill),
            spread,
            rules,
            rng,
        );
        let direction = if aim.length_squared() > f32::EPSILON {
            aim.normalize()
        } else {
            entity.direction
        };
        fan_out(
            entity,
            template,
            direction,
            spread,
            damage,
            DamageSource::Skill { skill_id },
            skill.attack_animation.action_id,
        )
    } else {
        Vec::new()
    };

    enter_recovery(
        entity,
        skill.attack_animation.total_duration(),
        skill.attack_animation.launch_delay(),
        now,
    );
    LaunchOutcome {
        directives,
        self_effect,
    }
}

fn enter_recovery(entity: &mut CombatEntity, total: f32, launch_delay: f32, now: f64) {
    let tail = (total - launch_delay).max(0.0);
    entity.phase = ActionPhase::Recover {
        ends_at: now + tail as f64,
    };
}

fn fan_out(
    entity: &CombatEntity,
    template: &ProjectileTemplate,
    direction: Vec3,
    spread: i32,
    damage: i32,
    source: DamageSource,
    action_id: u8,
) -> Vec<SpawnDirective> {
    spread_rotations(spread)
        .into_iter()
        .map(|degrees| {
            let dir = Quat::from_rotation_y(degrees.to_radians()) * direction;
            SpawnDirective {
                template: template.clone(),
                origin: entity.position + dir * template.spawn_forward_offset,
                direction: dir,
                damage,
                attacker_id: entity.id,
                attacker_team: entity.team_id,
                source,
                action_id,
            }
        })
        .collect()
}
