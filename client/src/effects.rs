//! Resolution of effect notifications into concrete cosmetic assets.
//!
//! The server only names what happened (weapon or skill data id, action id,
//! trigger); which particle asset to play is decided here from the local
//! catalog copy. Unknown ids resolve to nothing rather than erroring, so a
//! catalog mismatch degrades to missing visuals.

use crate::game::ClientGameState;
use glam::Vec3;
use shared::{EffectType, ItemCatalog};

/// A cosmetic effect ready to hand to a presentation layer.
#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedEffect {
    /// Asset key from the catalog, e.g. "fx_bolt_hit".
    pub asset_key: String,
    /// World position the effect plays at.
    pub position: Vec3,
}

/// Something that can present resolved effects. The headless client logs
/// them; a rendering client would spawn particles instead.
pub trait EffectSink {
    fn play(&mut self, effect: ResolvedEffect);
}

/// Sink that writes each effect to the log. Used by the headless client.
#[derive(Debug, Default)]
pub struct LogEffectSink;

impl EffectSink for LogEffectSink {
    fn play(&mut self, effect: ResolvedEffect) {
        log::info!(
            "effect {} at ({:.1}, {:.1}, {:.1})",
            effect.asset_key,
            effect.position.x,
            effect.position.y,
            effect.position.z
        );
    }
}

pub struct EffectResolver<'a> {
    catalog: &'a ItemCatalog,
}

impl<'a> EffectResolver<'a> {
    pub fn new(catalog: &'a ItemCatalog) -> Self {
        Self { catalog }
    }

    /// Maps one effect notification onto an asset, or None when nothing
    /// should play. Effects anchored to hidden characters are suppressed.
    pub fn resolve(
        &self,
        game: &ClientGameState,
        trigger_id: u32,
        effect_type: EffectType,
        data_id: i32,
        action_id: u8,
    ) -> Option<ResolvedEffect> {
        let position = self.trigger_position(game, trigger_id)?;

        let asset_key = match effect_type {
            EffectType::DamageSpawn => self
                .catalog
                .weapon(data_id)?
                .projectile_for(action_id)?
                .spawn_effect
                .clone(),
            EffectType::DamageHit => self
                .catalog
                .weapon(data_id)?
                .projectile_for(action_id)?
                .hit_effect
                .clone(),
            EffectType::SkillSpawn => self.skill_template(data_id)?.spawn_effect.clone(),
            EffectType::SkillHit => self.skill_template(data_id)?.hit_effect.clone(),
            // Traps never made it into the built-in catalog.
            EffectType::TrapHit => return None,
        };

        if asset_key.is_empty() {
            return None;
        }

        Some(ResolvedEffect {
            asset_key,
            position,
        })
    }

    /// The animation override wins over the skill's default template, the
    /// same priority the launch logic uses.
    fn skill_template(&self, skill_id: i32) -> Option<&shared::ProjectileTemplate> {
        let skill = self.catalog.skill(skill_id)?;
        skill
            .attack_animation
            .projectile_override
            .as_ref()
            .or(skill.projectile.as_ref())
    }

    /// Looks the trigger up as a character first, then as a projectile.
    /// Returns None for hidden characters and for triggers the replica no
    /// longer knows about.
    fn trigger_position(&self, game: &ClientGameState, trigger_id: u32) -> Option<Vec3> {
        if let Some(character) = game.character(trigger_id) {
            if character.is_hidden {
                return None;
            }
            return Some(character.position);
        }
        if let Some(projectile) = game.projectile(trigger_id) {
            if let Some(attacker) = game.character(projectile.attacker_id) {
                if attacker.is_hidden {
                    return None;
                }
            }
            return Some(projectile.position);
        }
        None
    }
}
