//! # Combat Server Library
//!
//! Authoritative server for the arena combat game. The server owns the
//! canonical game state: character vitals, experience and levels, equipped
//! items, status effects and every projectile in flight. Clients send
//! commands and receive state; they never write state themselves.
//!
//! ## Core Responsibilities
//!
//! ### Authoritative Simulation
//! All combat resolution happens here: attack wind-ups and launches, spread
//! fans, damage variance, defend/block mitigation, leech, kill rewards and
//! leveling. Clients receive the results through snapshots and one-shot
//! notifications and conform to them.
//!
//! ### Command Validation
//! A connection may only command the entity it joined as. Commands arriving
//! without a joined entity, or for someone else's entity, are dropped
//! silently and logged at debug level.
//!
//! ### State Broadcasting
//! Every tick the server broadcasts a full snapshot plus the tick's one-shot
//! events (attack starts, skill uses, status effect applications and
//! cosmetic effect triggers). Each logical event reaches each connection
//! exactly once.
//!
//! ## Module Organization
//!
//! - [`rules`] — tunable gameplay numbers and policy predicates, built once
//!   and passed by reference.
//! - [`stats`] — lazily cached aggregation of every stat contributor.
//! - [`entity`] — combat entity state and the timed action machine.
//! - [`combat`] — attack/skill launch resolution and damage rolls.
//! - [`projectile`] — projectile travel, contact rules and damage
//!   application.
//! - [`effects`] — per-tick cosmetic effect queue with deduplication.
//! - [`behavior`] — the controller seam shared by players and bots.
//! - [`game`] — the tick loop tying the systems together.
//! - [`client_manager`] — connection lifecycle and input buffering.
//! - [`network`] — UDP socket tasks and the main server loop.
//!
//! ## Usage Example
//!
//! ```rust,no_run
//! use server::game::GameState;
//! use server::network::Server;
//! use server::rules::GameplayRules;
//! use shared::default_catalog;
//! use std::time::Duration;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let game = GameState::new(GameplayRules::default(), default_catalog(), 42);
//!     let mut server = Server::new(
//!         "127.0.0.1:8080",
//!         Duration::from_millis(16), // 60Hz
//!         32,
//!         game,
//!         4, // bots
//!     )
//!     .await?;
//!     server.run().await?;
//!     Ok(())
//! }
//! ```

pub mod behavior;
pub mod client_manager;
pub mod combat;
pub mod effects;
pub mod entity;
pub mod game;
pub mod network;
pub mod projectile;
pub mod rules;
pub mod stats;
