//! Client-side replica of the authoritative game state.
//!
//! The server is the only writer; every snapshot replaces the replica
//! wholesale. The client keeps no simulation of its own, it only records
//! what the server said and answers queries against it.

use shared::{CharacterSnapshot, ProjectileSnapshot};
use std::collections::HashMap;

#[derive(Debug, Default)]
pub struct ClientGameState {
    pub tick: u32,
    pub server_timestamp: u64,
    pub characters: HashMap<u32, CharacterSnapshot>,
    pub projectiles: Vec<ProjectileSnapshot>,
    pub last_processed_input: HashMap<u32, u32>,
    /// Entity id the server assigned us on join, if any.
    pub entity_id: Option<u32>,
}

impl ClientGameState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replaces the replica with a fresh server snapshot. Stale snapshots
    /// (an earlier tick than what we already hold) are dropped.
    pub fn apply_server_state(
        &mut self,
        tick: u32,
        timestamp: u64,
        last_processed_input: HashMap<u32, u32>,
        characters: Vec<CharacterSnapshot>,
        projectiles: Vec<ProjectileSnapshot>,
    ) -> bool {
        if tick <= self.tick && self.tick != 0 {
            return false;
        }

        self.tick = tick;
        self.server_timestamp = timestamp;
        self.last_processed_input = last_processed_input;
        self.characters = characters
            .into_iter()
            .map(|character| (character.id, character))
            .collect();
        self.projectiles = projectiles;
        true
    }

    pub fn our_character(&self) -> Option<&CharacterSnapshot> {
        self.entity_id.and_then(|id| self.characters.get(&id))
    }

    pub fn character(&self, id: u32) -> Option<&CharacterSnapshot> {
        self.characters.get(&id)
    }

    pub fn projectile(&self, id: u32) -> Option<&ProjectileSnapshot> {
        self.projectiles.iter().find(|projectile| projectile.id == id)
    }

    /// Characters sorted by score, highest first. Ties break on kills.
    pub fn scoreboard(&self) -> Vec<&CharacterSnapshot> {
        let mut entries: Vec<&CharacterSnapshot> = self.characters.values().collect();
        entries.sort_by(|a, b| {
            b.score
                .cmp(&a.score)
                .then(b.kill_count.cmp(&a.kill_count))
                .then(a.id.cmp(&b.id))
        });
        entries
    }
}
