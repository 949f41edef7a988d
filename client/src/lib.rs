//! # Combat Client Library
//!
//! Headless client for the arena combat server. It speaks the shared UDP
//! protocol, mirrors the authoritative state the server broadcasts, and
//! turns effect notifications into concrete cosmetic assets. There is no
//! rendering here; a presentation layer plugs in through the
//! [`effects::EffectSink`] trait.
//!
//! ## Architecture Overview
//!
//! The client never simulates combat. Every snapshot from the server
//! replaces the local replica wholesale, and everything the client shows
//! (vitals, scoreboard, effects) is a pure function of that replica plus
//! the static item catalog.
//!
//! ### Authoritative Replica
//! [`game::ClientGameState`] holds the last accepted snapshot: characters,
//! projectiles and the per-client input acknowledgment map. Stale snapshots
//! arriving out of order are dropped.
//!
//! ### Effect Resolution
//! The server describes effects by id only (weapon or skill data id plus an
//! action id). [`effects::EffectResolver`] maps those onto the asset keys in
//! the local catalog copy, anchors them to the triggering character or
//! projectile, and suppresses anything anchored to a hidden character.
//!
//! ### Network Loop
//! [`network::Client`] owns the UDP socket: the connect/join handshake,
//! periodic keep-alive inputs, and dispatch of every server packet into the
//! replica or the effect sink.
//!
//! ## Usage Example
//!
//! ```rust,no_run
//! use client::network::{Client, Loadout};
//! use shared::{default_catalog, make_data_id};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let loadout = Loadout {
//!         player_name: "kestrel".to_string(),
//!         head_id: make_data_id("Rookie Helm"),
//!         body_id: make_data_id("Scout"),
//!         weapon_id: make_data_id("Blaster"),
//!         custom_equipment_ids: vec![make_data_id("Lucky Charm")],
//!         extra: String::new(),
//!     };
//!     let mut client = Client::new("127.0.0.1:8080", loadout, default_catalog(), 0).await?;
//!     client.run().await?;
//!     Ok(())
//! }
//! ```

pub mod effects;
pub mod game;
pub mod network;
