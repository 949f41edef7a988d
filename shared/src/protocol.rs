//! Wire protocol between server and client.
//!
//! Every datagram is one bincode-serialized [`Packet`]. The server is the
//! only writer of authoritative state; clients send commands and receive
//! snapshots plus one-shot notifications.

use glam::Vec3;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Category of a cosmetic effect notification. The numeric values are part
/// of the wire format and must not be reordered.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[repr(u8)]
pub enum EffectType {
    DamageSpawn = 0,
    DamageHit = 1,
    /// Kept for wire compatibility; nothing in the built-in catalog maps it.
    TrapHit = 2,
    SkillSpawn = 3,
    SkillHit = 4,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub enum Packet {
    // client -> server
    Connect {
        client_version: u32,
    },
    Join {
        player_name: String,
        head_id: i32,
        body_id: i32,
        weapon_id: i32,
        custom_equipment_ids: Vec<i32>,
        /// Free-form opaque payload; the server stores it verbatim.
        extra: String,
    },
    Input {
        sequence: u32,
        timestamp: u64,
        move_dir: Vec3,
        aim_dir: Vec3,
        is_blocking: bool,
    },
    Attack,
    StopAttack,
    UseSkill {
        hotkey_id: i8,
        aim: Vec3,
    },
    AddAttribute {
        name: String,
    },
    Respawn,
    Disconnect,

    // server -> client
    Connected {
        client_id: u32,
    },
    Joined {
        entity_id: u32,
    },
    GameState {
        tick: u32,
        timestamp: u64,
        last_processed_input: HashMap<u32, u32>,
        characters: Vec<CharacterSnapshot>,
        projectiles: Vec<ProjectileSnapshot>,
    },
    /// Attack started; observers replay the matching animation locally.
    AttackNotify {
        weapon_id: i32,
        action_id: u8,
        direction: Vec3,
        attacker_id: u32,
        add_rotation_x: f32,
        add_rotation_y: f32,
    },
    SkillUseNotify {
        skill_id: i32,
        target_position: Vec3,
        attacker_id: u32,
        add_rotation_x: f32,
        add_rotation_y: f32,
    },
    /// One per logical cosmetic event per connection. `trigger_id` names the
    /// entity or projectile the effect attaches to.
    EffectNotify {
        trigger_id: u32,
        effect_type: EffectType,
        data_id: i32,
        action_id: u8,
    },
    ApplyStatusEffect {
        target_id: u32,
        data_id: i32,
    },
    Disconnected {
        reason: String,
    },
}

/// Per-character slice of an authoritative [`Packet::GameState`].
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct CharacterSnapshot {
    pub id: u32,
    pub name: String,
    pub team_id: u8,
    pub position: Vec3,
    pub direction: Vec3,
    pub hp: i32,
    pub level: i32,
    pub exp: i32,
    pub stat_point: i32,
    pub score: i32,
    pub kill_count: i32,
    pub die_count: i32,
    pub is_dead: bool,
    pub is_blocking: bool,
    pub is_invincible: bool,
    pub is_hidden: bool,
    pub head_id: i32,
    pub body_id: i32,
    pub weapon_id: i32,
    /// -1 while idle, otherwise the running attack animation's action id.
    pub attacking_action_id: i16,
    /// -1 while idle, otherwise the hotkey of the skill being cast.
    pub using_skill_hotkey_id: i8,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct ProjectileSnapshot {
    pub id: u32,
    /// Data id of the projectile template this instance was spawned from.
    pub template_id: i32,
    pub position: Vec3,
    pub direction: Vec3,
    pub attacker_id: u32,
    pub speed: f32,
}

/// Decoded movement command, buffered server-side until the tick that
/// consumes it.
#[derive(Debug, Clone)]
pub struct InputState {
    pub sequence: u32,
    pub timestamp: u64,
    pub move_dir: Vec3,
    pub aim_dir: Vec3,
    pub is_blocking: bool,
}

/// Yaw offsets in degrees for a fan of `count` simultaneous projectiles.
///
/// Small fans center symmetrically around the aim direction at 30 degree
/// spacing; anything wider than 16 wraps the full circle instead.
pub fn spread_rotations(count: i32) -> Vec<f32> {
    let count = count.max(1);
    if count <= 16 {
        let first = -((count - 1) as f32) * 15.0;
        (0..count).map(|i| first + i as f32 * 30.0).collect()
    } else {
        let spacing = 360.0 / count as f32;
        (0..count).map(|i| i as f32 * spacing).collect()
    }
}
