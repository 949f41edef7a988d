//! Static game-data catalog shared by server and client.
//!
//! Wire messages carry only small integer ids (weapon/skill hash, action id);
//! both sides re-derive the full definition from their local copy of this
//! catalog, which is loaded once at startup and never mutated afterwards.

use crate::stats::CharacterStats;
use crate::MOVE_SPEED_RATE;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Deterministic 32-bit FNV-1a hash of a human-readable identifier.
/// Stable across builds and platforms, so server and client agree on ids
/// without exchanging the catalog itself.
pub fn make_data_id(name: &str) -> i32 {
    let mut hash: u32 = 0x811c9dc5;
    for byte in name.as_bytes() {
        hash ^= *byte as u32;
        hash = hash.wrapping_mul(0x01000193);
    }
    hash as i32
}

/// Static configuration for a class of damage-carrying projectile.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProjectileTemplate {
    pub name: String,
    /// Contact radius, also used for the area sweep around the contact point.
    pub radius: f32,
    pub speed: f32,
    pub life_time: f32,
    pub spawn_forward_offset: f32,
    /// Status effect applied to characters hit by this projectile.
    pub status_effect_id: Option<i32>,
    /// Cosmetic asset keys; only the client resolves these.
    pub spawn_effect: String,
    pub hit_effect: String,
}

impl ProjectileTemplate {
    pub fn data_id(&self) -> i32 {
        make_data_id(&self.name)
    }

    /// s = v * t, plus the contact radius.
    pub fn attack_range(&self) -> f32 {
        self.speed * self.life_time * MOVE_SPEED_RATE + self.radius
    }
}

/// Per-action attack descriptor. Durations are in seconds of un-scaled
/// animation time; `speed` divides both.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AttackAnimation {
    /// 0..=254; 255 is reserved so the i16 idle sentinel never collides.
    pub action_id: u8,
    pub animation_duration: f32,
    /// Time into the animation at which the damage launch occurs.
    pub launch_duration: f32,
    pub speed: f32,
    pub is_left_hand: bool,
    /// Overrides the weapon/skill default template when set.
    pub projectile_override: Option<ProjectileTemplate>,
}

impl AttackAnimation {
    /// Seconds until the launch point, launch clamped into the animation.
    pub fn launch_delay(&self) -> f32 {
        self.launch_duration.min(self.animation_duration) / self.speed
    }

    pub fn total_duration(&self) -> f32 {
        self.animation_duration / self.speed
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WeaponData {
    pub name: String,
    pub stats: CharacterStats,
    pub projectile: Option<ProjectileTemplate>,
    pub attack_animations: Vec<AttackAnimation>,
    /// Skill data ids granted while this weapon is equipped.
    pub skills: Vec<i32>,
}

impl WeaponData {
    pub fn data_id(&self) -> i32 {
        make_data_id(&self.name)
    }

    pub fn animation(&self, action_id: u8) -> Option<&AttackAnimation> {
        self.attack_animations
            .iter()
            .find(|anim| anim.action_id == action_id)
    }

    /// Per-action override takes priority over the weapon default.
    pub fn projectile_for(&self, action_id: u8) -> Option<&ProjectileTemplate> {
        self.animation(action_id)
            .and_then(|anim| anim.projectile_override.as_ref())
            .or(self.projectile.as_ref())
    }

    pub fn attack_range(&self) -> f32 {
        self.projectile
            .as_ref()
            .map(|template| template.attack_range())
            .unwrap_or(0.0)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SkillData {
    pub name: String,
    /// Hotkey slot 0..8 this skill binds to.
    pub hotkey_id: i8,
    pub attack_animation: AttackAnimation,
    pub projectile: Option<ProjectileTemplate>,
    /// Applied to the caster at launch, independent of projectile hits.
    pub status_effect_id: Option<i32>,
    /// Flat addition over the attacker's total attack.
    pub increase_damage: i32,
    /// Rate-based addition over the attacker's total attack.
    pub increase_damage_by_rate: f32,
    /// Fixed fan size; skills ignore the attacker's spread stat.
    pub spread_damages: i32,
    pub cool_down: f32,
}

impl SkillData {
    pub fn data_id(&self) -> i32 {
        make_data_id(&self.name)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StatusEffectData {
    pub name: String,
    /// Chance of actually applying when requested, rolled server-side.
    pub apply_rate: f32,
    pub duration: f32,
    pub stats: CharacterStats,
}

impl StatusEffectData {
    pub fn data_id(&self) -> i32 {
        make_data_id(&self.name)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HeadData {
    pub name: String,
    pub stats: CharacterStats,
    pub skills: Vec<i32>,
}

impl HeadData {
    pub fn data_id(&self) -> i32 {
        make_data_id(&self.name)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BodyData {
    pub name: String,
    pub stats: CharacterStats,
    pub skills: Vec<i32>,
}

impl BodyData {
    pub fn data_id(&self) -> i32 {
        make_data_id(&self.name)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CustomEquipmentData {
    pub name: String,
    /// At most one equipped item per container index.
    pub container_index: i32,
    pub stats: CharacterStats,
    pub skills: Vec<i32>,
}

impl CustomEquipmentData {
    pub fn data_id(&self) -> i32 {
        make_data_id(&self.name)
    }
}

/// Read-only lookup tables keyed by data id. Both sides construct the same
/// catalog at startup; a miss on any id is a no-op for the caller, never an
/// error.
#[derive(Debug, Default)]
pub struct ItemCatalog {
    heads: HashMap<i32, HeadData>,
    bodies: HashMap<i32, BodyData>,
    weapons: HashMap<i32, WeaponData>,
    custom_equipments: HashMap<i32, CustomEquipmentData>,
    skills: HashMap<i32, SkillData>,
    status_effects: HashMap<i32, StatusEffectData>,
    /// First weapon registered; the fallback for invalid loadout requests.
    default_weapon_id: Option<i32>,
}

impl ItemCatalog {
    pub fn new(
        heads: Vec<HeadData>,
        bodies: Vec<BodyData>,
        weapons: Vec<WeaponData>,
        custom_equipments: Vec<CustomEquipmentData>,
        skills: Vec<SkillData>,
        status_effects: Vec<StatusEffectData>,
    ) -> Self {
        let mut catalog = ItemCatalog::default();
        for head in heads {
            catalog.heads.insert(head.data_id(), head);
        }
        for body in bodies {
            catalog.bodies.insert(body.data_id(), body);
        }
        for weapon in weapons {
            let id = weapon.data_id();
            catalog.default_weapon_id.get_or_insert(id);
            catalog.weapons.insert(id, weapon);
        }
        for equipment in custom_equipments {
            catalog
                .custom_equipments
                .insert(equipment.data_id(), equipment);
        }
        for skill in skills {
            catalog.skills.insert(skill.data_id(), skill);
        }
        for effect in status_effects {
            catalog.status_effects.insert(effect.data_id(), effect);
        }
        catalog
    }

    pub fn head(&self, id: i32) -> Option<&HeadData> {
        self.heads.get(&id)
    }

    pub fn body(&self, id: i32) -> Option<&BodyData> {
        self.bodies.get(&id)
    }

    pub fn weapon(&self, id: i32) -> Option<&WeaponData> {
        self.weapons.get(&id)
    }

    pub fn custom_equipment(&self, id: i32) -> Option<&CustomEquipmentData> {
        self.custom_equipments.get(&id)
    }

    pub fn skill(&self, id: i32) -> Option<&SkillData> {
        self.skills.get(&id)
    }

    pub fn status_effect(&self, id: i32) -> Option<&StatusEffectData> {
        self.status_effects.get(&id)
    }

    pub fn weapon_ids(&self) -> impl Iterator<Item = i32> + '_ {
        self.weapons.keys().copied()
    }

    pub fn default_weapon_id(&self) -> Option<i32> {
        self.default_weapon_id
    }

    /// Hotkey map for an equipped loadout. Walk order matches the recompute
    /// order elsewhere (body, head, weapon, custom equipment); a later grant
    /// on the same hotkey replaces an earlier one.
    pub fn skills_for_loadout(
        &self,
        head_id: i32,
        body_id: i32,
        weapon_id: i32,
        custom_equipment_ids: &[i32],
    ) -> HashMap<i8, &SkillData> {
        let mut granted: Vec<&[i32]> = Vec::new();
        if let Some(body) = self.bodies.get(&body_id) {
            granted.push(&body.skills);
        }
        if let Some(head) = self.heads.get(&head_id) {
            granted.push(&head.skills);
        }
        if let Some(weapon) = self.weapons.get(&weapon_id) {
            granted.push(&weapon.skills);
        }
        for equipment_id in custom_equipment_ids {
            if let Some(equipment) = self.custom_equipments.get(equipment_id) {
                granted.push(&equipment.skills);
            }
        }

        let mut hotkeys: HashMap<i8, &SkillData> = HashMap::new();
        for skill_id in granted.into_iter().flatten() {
            if let Some(skill) = self.skills.get(skill_id) {
                hotkeys.insert(skill.hotkey_id, skill);
            }
        }
        hotkeys
    }
}

/// Built-in catalog used by the server and the headless client. Stands in
/// for the asset pipeline, which is an external collaborator.
pub fn default_catalog() -> ItemCatalog {
    let burn = StatusEffectData {
        name: "Burn".to_string(),
        apply_rate: 0.35,
        duration: 4.0,
        stats: CharacterStats {
            add_defend: -5,
            reduce_receive_damage_rate: -0.1,
            ..Default::default()
        },
    };
    let iron_skin = StatusEffectData {
        name: "Iron Skin".to_string(),
        apply_rate: 1.0,
        duration: 6.0,
        stats: CharacterStats {
            add_defend: 15,
            add_block_reduce_damage_rate: 0.2,
            ..Default::default()
        },
    };

    let bolt = ProjectileTemplate {
        name: "Bolt".to_string(),
        radius: 0.6,
        speed: 60.0,
        life_time: 1.2,
        spawn_forward_offset: 0.8,
        status_effect_id: None,
        spawn_effect: "fx_bolt_spawn".to_string(),
        hit_effect: "fx_bolt_hit".to_string(),
    };
    let heavy_bolt = ProjectileTemplate {
        name: "Heavy Bolt".to_string(),
        radius: 1.1,
        speed: 45.0,
        life_time: 1.4,
        spawn_forward_offset: 0.8,
        status_effect_id: None,
        spawn_effect: "fx_heavy_bolt_spawn".to_string(),
        hit_effect: "fx_heavy_bolt_hit".to_string(),
    };
    let fireball = ProjectileTemplate {
        name: "Fireball".to_string(),
        radius: 1.6,
        speed: 40.0,
        life_time: 1.6,
        spawn_forward_offset: 1.0,
        status_effect_id: Some(make_data_id("Burn")),
        spawn_effect: "fx_fireball_spawn".to_string(),
        hit_effect: "fx_fireball_hit".to_string(),
    };

    let blaster = WeaponData {
        name: "Blaster".to_string(),
        stats: CharacterStats {
            add_attack: 5,
            ..Default::default()
        },
        projectile: Some(bolt.clone()),
        attack_animations: vec![
            AttackAnimation {
                action_id: 0,
                animation_duration: 0.6,
                launch_duration: 0.2,
                speed: 1.0,
                is_left_hand: false,
                projectile_override: None,
            },
            AttackAnimation {
                action_id: 1,
                animation_duration: 0.8,
                launch_duration: 0.3,
                speed: 1.0,
                is_left_hand: true,
                projectile_override: Some(heavy_bolt),
            },
        ],
        skills: vec![make_data_id("Flame Burst")],
    };
    let splitter = WeaponData {
        name: "Splitter".to_string(),
        stats: CharacterStats {
            add_attack: 2,
            add_spread_damages: 2,
            ..Default::default()
        },
        projectile: Some(bolt),
        attack_animations: vec![AttackAnimation {
            action_id: 0,
            animation_duration: 0.9,
            launch_duration: 0.35,
            speed: 1.0,
            is_left_hand: false,
            projectile_override: None,
        }],
        skills: vec![],
    };

    let flame_burst = SkillData {
        name: "Flame Burst".to_string(),
        hotkey_id: 0,
        attack_animation: AttackAnimation {
            action_id: 10,
            animation_duration: 1.0,
            launch_duration: 0.4,
            speed: 1.0,
            is_left_hand: false,
            projectile_override: None,
        },
        projectile: Some(fireball),
        status_effect_id: None,
        increase_damage: 10,
        increase_damage_by_rate: 0.25,
        spread_damages: 2,
        cool_down: 5.0,
    };
    let guard_stance = SkillData {
        name: "Guard Stance".to_string(),
        hotkey_id: 1,
        attack_animation: AttackAnimation {
            action_id: 11,
            animation_duration: 0.5,
            launch_duration: 0.2,
            speed: 1.0,
            is_left_hand: false,
            projectile_override: None,
        },
        projectile: None,
        status_effect_id: Some(make_data_id("Iron Skin")),
        increase_damage: 0,
        increase_damage_by_rate: 0.0,
        spread_damages: 0,
        cool_down: 8.0,
    };

    let rookie_helm = HeadData {
        name: "Rookie Helm".to_string(),
        stats: CharacterStats {
            add_hp: 20,
            ..Default::default()
        },
        skills: vec![],
    };
    let scout = BodyData {
        name: "Scout".to_string(),
        stats: CharacterStats {
            add_move_speed: 5,
            ..Default::default()
        },
        skills: vec![make_data_id("Guard Stance")],
    };
    let lucky_charm = CustomEquipmentData {
        name: "Lucky Charm".to_string(),
        container_index: 0,
        stats: CharacterStats {
            add_exp_rate: 0.1,
            add_score_rate: 0.1,
            ..Default::default()
        },
        skills: vec![],
    };

    ItemCatalog::new(
        vec![rookie_helm],
        vec![scout],
        vec![blaster, splitter],
        vec![lucky_charm],
        vec![flame_burst, guard_stance],
        vec![burn, iron_skin],
    )
}
