//! Authoritative game state and the fixed-tick update
//!
//! Owns every entity and in-flight projectile, applies commands (from
//! connections or bot controllers, through the same path), advances the
//! action machines and produces snapshots. The network layer is the only
//! caller; nothing here touches a socket.

use crate::behavior::{BehaviorController, BotController, Command, WorldView};
use crate::combat;
use crate::effects::{EffectEvent, EffectNotifier};
use crate::entity::{ActionPhase, CombatEntity};
use crate::projectile::{resolve_contacts, DamageProjectile};
use crate::rules::GameplayRules;
use glam::Vec3;
use log::{debug, info};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use shared::{
    CharacterSnapshot, InputState, ItemCatalog, ProjectileSnapshot, ARENA_EXTENT, CHARACTER_RADIUS,
    MOVE_SPEED_RATE,
};
use std::collections::HashMap;

/// One-shot broadcast produced by a tick, drained by the network layer.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum OutgoingEvent {
    AttackStarted {
        attacker_id: u32,
        weapon_id: i32,
        action_id: u8,
        direction: Vec3,
    },
    SkillUsed {
        attacker_id: u32,
        skill_id: i32,
        target_position: Vec3,
    },
    StatusEffectApplied {
        target_id: u32,
        data_id: i32,
    },
}

pub struct GameState {
    pub tick: u32,
    /// Simulation clock in seconds; every timer in the game compares
    /// against this, never against wall time.
    pub time: f64,
    pub rules: GameplayRules,
    pub catalog: ItemCatalog,
    pub entities: HashMap<u32, CombatEntity>,
    pub projectiles: Vec<DamageProjectile>,

    client_entities: HashMap<u32, u32>,
    bots: HashMap<u32, BotController>,
    next_entity_id: u32,
    next_projectile_id: u32,
    rng: StdRng,
    notifier: EffectNotifier,
    events: Vec<OutgoingEvent>,
}

impl GameState {
    pub fn new(rules: GameplayRules, catalog: ItemCatalog, seed: u64) -> Self {
        Self {
            tick: 0,
            time: 0.0,
            rules,
            catalog,
            entities: HashMap::new(),
            projectiles: Vec::new(),
            client_entities: HashMap::new(),
            bots: HashMap::new(),
            next_entity_id: 1,
            next_projectile_id: 1,
            rng: StdRng::seed_from_u64(seed),
            notifier: EffectNotifier::new(),
            events: Vec::new(),
        }
    }

    fn random_spawn_point(&mut self) -> Vec3 {
        let extent = ARENA_EXTENT * 0.8;
        Vec3::new(
            self.rng.gen_range(-extent..extent),
            0.0,
            self.rng.gen_range(-extent..extent),
        )
    }

    /// Creates the entity for a joining client. Invalid weapon ids fall back
    /// to the catalog default so every player can fight.
    pub fn spawn_player(
        &mut self,
        client_id: u32,
        name: String,
        team_id: u8,
        head_id: i32,
        body_id: i32,
        weapon_id: i32,
        custom_equipment_ids: Vec<i32>,
        extra: String,
    ) -> u32 {
        let weapon_id = if self.catalog.weapon(weapon_id).is_some() {
            weapon_id
        } else {
            self.catalog.default_weapon_id().unwrap_or(weapon_id)
        };
        let custom_equipment_ids: Vec<i32> = custom_equipment_ids
            .into_iter()
            .filter(|id| self.catalog.custom_equipment(*id).is_some())
            .collect();

        let id = self.next_entity_id;
        self.next_entity_id += 1;
        let position = self.random_spawn_point();
        let mut entity = CombatEntity::new(
            id,
            name,
            team_id,
            position,
            head_id,
            body_id,
            weapon_id,
            custom_equipment_ids,
            &self.catalog,
            &self.rules,
            self.time,
        );
        entity.extra = extra;
        info!("Spawned entity {} for client {}", id, client_id);
        self.entities.insert(id, entity);
        self.client_entities.insert(client_id, id);
        id
    }

    pub fn spawn_bot(&mut self, name: String, team_id: u8) -> u32 {
        let id = self.next_entity_id;
        self.next_entity_id += 1;
        let position = self.random_spawn_point();
        let weapon_id = self.catalog.default_weapon_id().unwrap_or(0);
        let mut entity = CombatEntity::new(
            id,
            name,
            team_id,
            position,
            0,
            0,
            weapon_id,
            vec![],
            &self.catalog,
            &self.rules,
            self.time,
        );
        entity.is_bot = true;
        self.entities.insert(id, entity);
        self.bots.insert(id, BotController::new(self.rng.gen()));
        info!("Spawned bot entity {}", id);
        id
    }

    pub fn entity_of_client(&self, client_id: u32) -> Option<u32> {
        self.client_entities.get(&client_id).copied()
    }

    pub fn remove_client(&mut self, client_id: u32) {
        if let Some(entity_id) = self.client_entities.remove(&client_id) {
            self.entities.remove(&entity_id);
            info!("Removed entity {} of client {}", entity_id, client_id);
        }
    }

    /// Movement and aim for one buffered input. Commands from connections
    /// without a joined entity are dropped.
    pub fn apply_input(&mut self, client_id: u32, input: &InputState, dt: f32) {
        let Some(entity_id) = self.entity_of_client(client_id) else {
            debug!("Input from client {} with no entity", client_id);
            return;
        };
        let Some(entity) = self.entities.get_mut(&entity_id) else {
            return;
        };
        if entity.is_dead() {
            return;
        }

        entity.is_blocking = input.is_blocking;
        if input.aim_dir.length_squared() > f32::EPSILON {
            entity.direction = input.aim_dir.normalize();
        }
        if input.move_dir.length_squared() > f32::EPSILON {
            let dir = input.move_dir.normalize();
            let speed = entity.total_move_speed(&self.catalog, &self.rules) as f32;
            entity.position += dir * speed * MOVE_SPEED_RATE * dt;
            let bound = ARENA_EXTENT - CHARACTER_RADIUS;
            entity.position.x = entity.position.x.clamp(-bound, bound);
            entity.position.z = entity.position.z.clamp(-bound, bound);
        }
    }

    /// Command entry point shared by connections and bot controllers. The
    /// caller has already resolved authority; `entity_id` must be the
    /// command's own entity.
    pub fn handle_command(&mut self, entity_id: u32, command: Command, dt: f32) {
        let Some(entity) = self.entities.get_mut(&entity_id) else {
            return;
        };
        match command {
            Command::Aim { dir } => {
                if entity.is_dead() || dir.length_squared() <= f32::EPSILON {
                    return;
                }
                entity.direction = dir.normalize();
            }
            Command::Move { dir } => {
                if entity.is_dead() || dir.length_squared() <= f32::EPSILON {
                    return;
                }
                let speed = entity.total_move_speed(&self.catalog, &self.rules) as f32;
                entity.position += dir.normalize() * speed * MOVE_SPEED_RATE * dt;
                let bound = ARENA_EXTENT - CHARACTER_RADIUS;
                entity.position.x = entity.position.x.clamp(-bound, bound);
                entity.position.z = entity.position.z.clamp(-bound, bound);
            }
            Command::StartAttack => entity.wants_attack = true,
            Command::StopAttack => entity.wants_attack = false,
            Command::UseSkill { hotkey_id, aim } => {
                entity.queued_skill = Some((hotkey_id, aim));
            }
        }
    }

    /// Authority-checked command from a connection.
    pub fn handle_client_command(&mut self, client_id: u32, command: Command, dt: f32) {
        match self.entity_of_client(client_id) {
            Some(entity_id) => self.handle_command(entity_id, command, dt),
            None => debug!("Command from client {} with no entity", client_id),
        }
    }

    pub fn handle_add_attribute(&mut self, client_id: u32, name: &str) -> bool {
        let Some(entity_id) = self.entity_of_client(client_id) else {
            return false;
        };
        let Some(entity) = self.entities.get_mut(&entity_id) else {
            return false;
        };
        entity.add_attribute(name, &self.rules)
    }

    pub fn handle_respawn(&mut self, client_id: u32) -> bool {
        let Some(entity_id) = self.entity_of_client(client_id) else {
            return false;
        };
        let now = self.time;
        let position = self.random_spawn_point();
        let Some(entity) = self.entities.get_mut(&entity_id) else {
            return false;
        };
        let Some(died_at) = entity.death_time else {
            return false;
        };
        if !self.rules.can_respawn((now - died_at) as f32) {
            return false;
        }
        if self.catalog.weapon(entity.weapon_id).is_none() {
            if let Some(default) = self.catalog.default_weapon_id() {
                entity.set_weapon(default);
            }
        }
        entity.position = position;
        entity.respawn(&self.catalog, &self.rules, now);
        true
    }

    /// Advances the simulation one tick.
    pub fn update(&mut self, dt: f32) {
        self.time += dt as f64;
        self.tick += 1;
        let now = self.time;

        self.run_bots(dt);
        self.update_entities(now);
        self.update_projectiles(dt, now);
    }

    fn run_bots(&mut self, dt: f32) {
        let mut pending: Vec<(u32, Vec<Command>)> = Vec::new();
        {
            let world = WorldView {
                entities: &self.entities,
                catalog: &self.catalog,
                now: self.time,
            };
            for (entity_id, controller) in self.bots.iter_mut() {
                if let Some(me) = world.entities.get(entity_id) {
                    pending.push((*entity_id, controller.think(me, &world)));
                }
            }
        }
        for (entity_id, commands) in pending {
            for command in commands {
                self.handle_command(entity_id, command, dt);
            }
        }
    }

    fn update_entities(&mut self, now: f64) {
        let entity_ids: Vec<u32> = self.entities.keys().copied().collect();
        for entity_id in entity_ids {
            // Bot respawn is automatic; players ask for theirs.
            let auto_respawn = {
                let Some(entity) = self.entities.get(&entity_id) else {
                    continue;
                };
                entity.is_bot
                    && entity
                        .death_time
                        .map(|died| self.rules.can_respawn((now - died) as f32))
                        .unwrap_or(false)
            };
            if auto_respawn {
                let position = self.random_spawn_point();
                if let Some(entity) = self.entities.get_mut(&entity_id) {
                    entity.position = position;
                    entity.respawn(&self.catalog, &self.rules, now);
                }
                continue;
            }

            let Some(entity) = self.entities.get_mut(&entity_id) else {
                continue;
            };
            entity.update_status_effects(now);
            if entity.is_dead() {
                continue;
            }

            match entity.phase {
                ActionPhase::Idle => {
                    if let Some((hotkey_id, aim)) = entity.queued_skill.take() {
                        if let Some(start) = combat::begin_skill(
                            entity,
                            hotkey_id,
                            aim,
                            &self.catalog,
                            &self.rules,
                            now,
                        ) {
                            self.events.push(OutgoingEvent::SkillUsed {
                                attacker_id: entity_id,
                                skill_id: start.skill_id,
                                target_position: start.target_position,
                            });
                            continue;
                        }
                    }
                    if entity.wants_attack {
                        if let Some(start) = combat::begin_attack(
                            entity,
                            &self.catalog,
                            &self.rules,
                            &mut self.rng,
                            now,
                        ) {
                            self.events.push(OutgoingEvent::AttackStarted {
                                attacker_id: entity_id,
                                weapon_id: start.weapon_id,
                                action_id: start.action_id,
                                direction: start.direction,
                            });
                        }
                    }
                }
                ActionPhase::WindUp { launch_at, .. } => {
                    if now >= launch_at {
                        let outcome =
                            combat::launch(entity, &self.catalog, &self.rules, &mut self.rng, now);
                        if let Some(effect_id) = outcome.self_effect {
                            self.events.push(OutgoingEvent::StatusEffectApplied {
                                target_id: entity_id,
                                data_id: effect_id,
                            });
                        }
                        for directive in outcome.directives {
                            let id = self.next_projectile_id;
                            self.next_projectile_id += 1;
                            let projectile = DamageProjectile::from_directive(id, directive, now);
                            self.notifier.notify(
                                projectile.id,
                                projectile.spawn_effect_type(),
                                projectile.effect_data_id(),
                                projectile.action_id,
                            );
                            self.projectiles.push(projectile);
                        }
                    }
                }
                ActionPhase::Recover { ends_at } => {
                    if now >= ends_at {
                        entity.abort_action();
                    }
                }
            }
        }
    }

    fn update_projectiles(&mut self, dt: f32, now: f64) {
        let GameState {
            entities,
            projectiles,
            catalog,
            rules,
            rng,
            notifier,
            events,
            ..
        } = self;

        projectiles.retain_mut(|projectile| {
            projectile.advance(dt);
            let resolution =
                resolve_contacts(projectile, entities, catalog, rules, rng, notifier, now);
            for (target_id, data_id) in resolution.status_applied {
                events.push(OutgoingEvent::StatusEffectApplied { target_id, data_id });
            }
            !resolution.destroyed && !projectile.expired(now)
        });
    }

    pub fn snapshots(&self) -> (Vec<CharacterSnapshot>, Vec<ProjectileSnapshot>) {
        let characters = self
            .entities
            .values()
            .map(|e| e.snapshot_at(self.time))
            .collect();
        let projectiles = self.projectiles.iter().map(|p| p.snapshot()).collect();
        (characters, projectiles)
    }

    pub fn drain_events(&mut self) -> Vec<OutgoingEvent> {
        std::mem::take(&mut self.events)
    }

    pub fn drain_effects(&mut self) -> Vec<EffectEvent> {
        self.notifier.drain()
    }
}
