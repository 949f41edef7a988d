//! Headless UDP client: connection handshake, command sending and snapshot
//! ingestion. Presentation is delegated to an [`EffectSink`]; the default
//! binary wires in the logging sink.

use crate::effects::{EffectResolver, EffectSink, LogEffectSink};
use crate::game::ClientGameState;
use bincode::{deserialize, serialize};
use glam::Vec3;
use log::{debug, error, info, warn};
use shared::{ItemCatalog, Packet, PROTOCOL_VERSION};
use std::net::SocketAddr;
use std::time::{Duration, SystemTime, UNIX_EPOCH};
use tokio::net::UdpSocket;
use tokio::time::{interval, sleep};

/// Loadout requested at join time. Invalid ids are fine; the server falls
/// back to defaults.
#[derive(Debug, Clone)]
pub struct Loadout {
    pub player_name: String,
    pub head_id: i32,
    pub body_id: i32,
    pub weapon_id: i32,
    pub custom_equipment_ids: Vec<i32>,
    /// Free-form payload forwarded to the server unchanged.
    pub extra: String,
}

pub struct Client {
    socket: UdpSocket,
    server_addr: SocketAddr,
    client_id: Option<u32>,
    connected: bool,

    loadout: Loadout,
    game_state: ClientGameState,
    catalog: ItemCatalog,
    effect_sink: LogEffectSink,

    sequence: u32,
    ping_ms: u64,
    fake_ping_ms: u64,
}

impl Client {
    pub async fn new(
        server_addr: &str,
        loadout: Loadout,
        catalog: ItemCatalog,
        fake_ping_ms: u64,
    ) -> Result<Self, Box<dyn std::error::Error>> {
        let socket = UdpSocket::bind("0.0.0.0:0").await?;
        let server_addr = server_addr.parse()?;

        Ok(Client {
            socket,
            server_addr,
            client_id: None,
            connected: false,
            loadout,
            game_state: ClientGameState::new(),
            catalog,
            effect_sink: LogEffectSink,
            sequence: 0,
            ping_ms: 0,
            fake_ping_ms,
        })
    }

    async fn connect(&mut self) -> Result<(), Box<dyn std::error::Error>> {
        info!("Connecting to server...");

        let packet = Packet::Connect {
            client_version: PROTOCOL_VERSION,
        };
        self.send_packet(&packet).await?;

        Ok(())
    }

    async fn send_packet(&self, packet: &Packet) -> Result<(), Box<dyn std::error::Error>> {
        if self.fake_ping_ms > 0 {
            sleep(Duration::from_millis(self.fake_ping_ms / 2)).await;
        }

        let data = serialize(packet)?;
        self.socket.send_to(&data, self.server_addr).await?;
        Ok(())
    }

    async fn handle_packet(&mut self, packet: Packet) -> Result<(), Box<dyn std::error::Error>> {
        match packet {
            Packet::Connected { client_id } => {
                info!("Connected! Client ID: {}", client_id);
                self.client_id = Some(client_id);
                self.connected = true;

                let join = Packet::Join {
                    player_name: self.loadout.player_name.clone(),
                    head_id: self.loadout.head_id,
                    body_id: self.loadout.body_id,
                    weapon_id: self.loadout.weapon_id,
                    custom_equipment_ids: self.loadout.custom_equipment_ids.clone(),
                    extra: self.loadout.extra.clone(),
                };
                self.send_packet(&join).await?;
            }

            Packet::Joined { entity_id } => {
                info!("Joined as entity {}", entity_id);
                self.game_state.entity_id = Some(entity_id);
            }

            Packet::GameState {
                tick,
                timestamp,
                last_processed_input,
                characters,
                projectiles,
            } => {
                let now = SystemTime::now()
                    .duration_since(UNIX_EPOCH)
                    .unwrap_or(Duration::from_secs(0))
                    .as_millis() as u64;

                if timestamp > 0 {
                    self.ping_ms = now.saturating_sub(timestamp);
                }

                self.game_state.apply_server_state(
                    tick,
                    timestamp,
                    last_processed_input,
                    characters,
                    projectiles,
                );
            }

            Packet::AttackNotify {
                weapon_id,
                action_id,
                attacker_id,
                ..
            } => {
                debug!(
                    "entity {} started attack {} with weapon {}",
                    attacker_id, action_id, weapon_id
                );
            }

            Packet::SkillUseNotify {
                skill_id,
                attacker_id,
                ..
            } => {
                debug!("entity {} used skill {}", attacker_id, skill_id);
            }

            Packet::EffectNotify {
                trigger_id,
                effect_type,
                data_id,
                action_id,
            } => {
                let resolver = EffectResolver::new(&self.catalog);
                if let Some(effect) = resolver.resolve(
                    &self.game_state,
                    trigger_id,
                    effect_type,
                    data_id,
                    action_id,
                ) {
                    self.effect_sink.play(effect);
                }
            }

            Packet::ApplyStatusEffect { target_id, data_id } => {
                let name = self
                    .catalog
                    .status_effect(data_id)
                    .map(|effect| effect.name.as_str())
                    .unwrap_or("unknown");
                info!("status effect '{}' applied to entity {}", name, target_id);
            }

            Packet::Disconnected { reason } => {
                warn!("Disconnected: {}", reason);
                self.connected = false;
                self.client_id = None;
            }

            _ => {
                warn!("Unexpected packet type");
            }
        }

        Ok(())
    }

    /// Idle input doubling as a keep-alive. A rendering client would fill
    /// this from captured controls instead.
    async fn send_input(&mut self) -> Result<(), Box<dyn std::error::Error>> {
        if !self.connected || self.client_id.is_none() {
            return Ok(());
        }

        self.sequence += 1;
        let timestamp = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap_or(Duration::from_secs(0))
            .as_millis() as u64;

        let packet = Packet::Input {
            sequence: self.sequence,
            timestamp,
            move_dir: Vec3::ZERO,
            aim_dir: Vec3::Z,
            is_blocking: false,
        };

        self.send_packet(&packet).await
    }

    fn log_status(&self) {
        let Some(me) = self.game_state.our_character() else {
            return;
        };
        info!(
            "tick {} ping {}ms | hp {} lvl {} exp {} score {} | {} characters, {} projectiles",
            self.game_state.tick,
            self.ping_ms,
            me.hp,
            me.level,
            me.exp,
            me.score,
            self.game_state.characters.len(),
            self.game_state.projectiles.len(),
        );
    }

    pub async fn run(&mut self) -> Result<(), Box<dyn std::error::Error>> {
        self.connect().await?;

        let mut input_interval = interval(Duration::from_millis(16));
        let mut status_interval = interval(Duration::from_secs(5));

        let mut buffer = [0u8; 16384];

        loop {
            tokio::select! {
                result = self.socket.recv_from(&mut buffer) => {
                    match result {
                        Ok((len, _)) => {
                            if self.fake_ping_ms > 0 {
                                sleep(Duration::from_millis(self.fake_ping_ms / 2)).await;
                            }

                            match deserialize::<Packet>(&buffer[0..len]) {
                                Ok(packet) => self.handle_packet(packet).await?,
                                Err(e) => debug!("Malformed packet: {}", e),
                            }
                        },
                        Err(e) => error!("Error receiving packet: {}", e),
                    }
                },

                _ = input_interval.tick() => {
                    if let Err(e) = self.send_input().await {
                        error!("Error sending input: {}", e);
                    }
                },

                _ = status_interval.tick() => {
                    self.log_status();
                },

                _ = tokio::signal::ctrl_c() => {
                    info!("Shutting down");
                    break;
                },
            }
        }

        if self.connected {
            let _ = self.send_packet(&Packet::Disconnect).await;
        }

        Ok(())
    }
}
