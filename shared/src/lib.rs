pub mod catalog;
pub mod protocol;
pub mod stats;

pub use catalog::{
    default_catalog, make_data_id, AttackAnimation, BodyData, CustomEquipmentData, HeadData,
    ItemCatalog, ProjectileTemplate, SkillData, StatusEffectData, WeaponData,
};
pub use protocol::{CharacterSnapshot, EffectType, InputState, Packet, ProjectileSnapshot};
pub use stats::CharacterStats;

/// World units travelled per second per point of speed. Applies to both
/// character move speed and projectile speed.
pub const MOVE_SPEED_RATE: f32 = 0.1;

/// Half-extent of the square arena, centered on the origin. The boundary is
/// non-ignorable geometry for projectiles.
pub const ARENA_EXTENT: f32 = 50.0;

/// Body radius used for projectile contact tests.
pub const CHARACTER_RADIUS: f32 = 0.6;

pub const PROTOCOL_VERSION: u32 = 1;

/// Sentinel for "no attack animation running".
pub const IDLE_ACTION: i16 = -1;

/// Sentinel for "no skill being cast".
pub const IDLE_HOTKEY: i8 = -1;
