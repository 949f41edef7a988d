//! Server network layer handling UDP communications and game loop coordination

use crate::client_manager::ClientManager;
use crate::game::{GameState, OutgoingEvent};
use bincode::{deserialize, serialize};
use log::{debug, error, info, warn};
use shared::{InputState, Packet, PROTOCOL_VERSION};
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::{Duration, Instant, SystemTime, UNIX_EPOCH};
use tokio::net::UdpSocket;
use tokio::sync::{mpsc, RwLock};
use tokio::time::interval;

/// Messages sent from network tasks to main server loop
#[derive(Debug)]
pub enum ServerMessage {
    PacketReceived {
        packet: Packet,
        addr: SocketAddr,
    },
    ClientTimeout {
        client_id: u32,
    },
    #[allow(dead_code)]
    Shutdown,
}

/// Messages sent from game loop to network tasks
#[derive(Debug)]
pub enum GameMessage {
    SendPacket {
        packet: Packet,
        addr: SocketAddr,
    },
    BroadcastPacket {
        packet: Packet,
        exclude: Option<u32>,
    },
}

/// Main server coordinating networking and the authoritative simulation
pub struct Server {
    socket: Arc<UdpSocket>,
    clients: Arc<RwLock<ClientManager>>,
    game_state: GameState,
    tick_duration: Duration,

    // Communication channels
    server_tx: mpsc::UnboundedSender<ServerMessage>,
    server_rx: mpsc::UnboundedReceiver<ServerMessage>,
    game_tx: mpsc::UnboundedSender<GameMessage>,
    game_rx: mpsc::UnboundedReceiver<GameMessage>,
}

impl Server {
    pub async fn new(
        addr: &str,
        tick_duration: Duration,
        max_clients: usize,
        mut game_state: GameState,
        bot_count: usize,
    ) -> Result<Self, Box<dyn std::error::Error>> {
        let socket = Arc::new(UdpSocket::bind(addr).await?);
        info!("Server listening on {}", addr);

        for i in 0..bot_count {
            game_state.spawn_bot(format!("bot_{}", i), 0);
        }

        let (server_tx, server_rx) = mpsc::unbounded_channel();
        let (game_tx, game_rx) = mpsc::unbounded_channel();

        Ok(Server {
            socket,
            clients: Arc::new(RwLock::new(ClientManager::new(max_clients))),
            game_state,
            tick_duration,
            server_tx,
            server_rx,
            game_tx,
            game_rx,
        })
    }

    /// Spawns task that continuously listens for incoming packets
    async fn spawn_network_receiver(&self) {
        let socket = Arc::clone(&self.socket);
        let server_tx = self.server_tx.clone();

        tokio::spawn(async move {
            let mut buffer = [0u8; 2048];

            loop {
                match socket.recv_from(&mut buffer).await {
                    Ok((len, addr)) => {
                        if let Ok(packet) = deserialize::<Packet>(&buffer[0..len]) {
                            if let Err(e) =
                                server_tx.send(ServerMessage::PacketReceived { packet, addr })
                            {
                                error!("Failed to send packet to main loop: {}", e);
                                break;
                            }
                        } else {
                            warn!("Failed to deserialize packet from {}", addr);
                        }
                    }
                    Err(e) => {
                        error!("Error receiving packet: {}", e);
                        tokio::time::sleep(Duration::from_millis(10)).await;
                    }
                }
            }
        });
    }

    /// Spawns task that processes outgoing packet queue
    async fn spawn_network_sender(&mut self) {
        let socket = Arc::clone(&self.socket);
        let clients = Arc::clone(&self.clients);
        let mut game_rx = std::mem::replace(&mut self.game_rx, mpsc::unbounded_channel().1);

        tokio::spawn(async move {
            while let Some(message) = game_rx.recv().await {
                match message {
                    GameMessage::SendPacket { packet, addr } => {
                        if let Err(e) = Self::send_packet_impl(&socket, &packet, addr).await {
                            error!("Failed to send packet to {}: {}", addr, e);
                        }
                    }
                    GameMessage::BroadcastPacket { packet, exclude } => {
                        let client_addrs = {
                            let clients_guard = clients.read().await;
                            clients_guard.get_client_addrs()
                        };

                        for (client_id, addr) in client_addrs {
                            if Some(client_id) == exclude {
                                continue;
                            }

                            if let Err(e) = Self::send_packet_impl(&socket, &packet, addr).await {
                                error!("Failed to send to client {}: {}", client_id, e);
                            }
                        }
                    }
                }
            }
        });
    }

    /// Spawns task that monitors client timeouts
    async fn spawn_timeout_checker(&self) {
        let clients = Arc::clone(&self.clients);
        let server_tx = self.server_tx.clone();

        tokio::spawn(async move {
            let mut interval = tokio::time::interval(Duration::from_secs(1));

            loop {
                interval.tick().await;

                let timed_out = {
                    let mut clients_guard = clients.write().await;
                    clients_guard.check_timeouts()
                };

                for client_id in timed_out {
                    if let Err(e) = server_tx.send(ServerMessage::ClientTimeout { client_id }) {
                        error!("Failed to send timeout message: {}", e);
                        break;
                    }
                }
            }
        });
    }

    async fn send_packet_impl(
        socket: &UdpSocket,
        packet: &Packet,
        addr: SocketAddr,
    ) -> Result<(), Box<dyn std::error::Error>> {
        let data = serialize(packet)?;
        socket.send_to(&data, addr).await?;
        Ok(())
    }

    async fn send_packet(&self, packet: &Packet, addr: SocketAddr) {
        if let Err(e) = self.game_tx.send(GameMessage::SendPacket {
            packet: packet.clone(),
            addr,
        }) {
            error!("Failed to queue packet for sending: {}", e);
        }
    }

    async fn broadcast_packet(&self, packet: &Packet, exclude: Option<u32>) {
        if let Err(e) = self.game_tx.send(GameMessage::BroadcastPacket {
            packet: packet.clone(),
            exclude,
        }) {
            error!("Failed to queue broadcast packet: {}", e);
        }
    }

    async fn client_id_for(&self, addr: SocketAddr) -> Option<u32> {
        let clients = self.clients.read().await;
        clients.find_client_by_addr(addr)
    }

    /// Processes incoming packets. Combat commands are only honored for the
    /// connection owning the entity; anything else is dropped with a debug
    /// log, never an error back to the sender.
    async fn handle_packet(&mut self, packet: Packet, addr: SocketAddr) {
        match packet {
            Packet::Connect { client_version } => {
                info!(
                    "Client connecting from {} (version: {})",
                    addr, client_version
                );

                if client_version != PROTOCOL_VERSION {
                    let response = Packet::Disconnected {
                        reason: "Protocol version mismatch".to_string(),
                    };
                    self.send_packet(&response, addr).await;
                    return;
                }

                // Remove existing connection if present
                if let Some(existing_id) = self.client_id_for(addr).await {
                    info!("Removing existing client {} from {}", existing_id, addr);
                    let mut clients = self.clients.write().await;
                    clients.remove_client(&existing_id);
                    self.game_state.remove_client(existing_id);
                }

                let client_id = {
                    let mut clients = self.clients.write().await;
                    clients.add_client(addr)
                };

                if let Some(client_id) = client_id {
                    let response = Packet::Connected { client_id };
                    self.send_packet(&response, addr).await;
                } else {
                    let response = Packet::Disconnected {
                        reason: "Server full".to_string(),
                    };
                    self.send_packet(&response, addr).await;
                }
            }

            Packet::Join {
                player_name,
                head_id,
                body_id,
                weapon_id,
                custom_equipment_ids,
                extra,
            } => {
                let Some(client_id) = self.client_id_for(addr).await else {
                    debug!("Join from unknown address {}", addr);
                    return;
                };
                if self.game_state.entity_of_client(client_id).is_some() {
                    debug!("Client {} already joined", client_id);
                    return;
                }
                {
                    let mut clients = self.clients.write().await;
                    clients.touch(client_id);
                }
                let entity_id = self.game_state.spawn_player(
                    client_id,
                    player_name,
                    0,
                    head_id,
                    body_id,
                    weapon_id,
                    custom_equipment_ids,
                    extra,
                );
                let response = Packet::Joined { entity_id };
                self.send_packet(&response, addr).await;
            }

            Packet::Input {
                sequence,
                timestamp,
                move_dir,
                aim_dir,
                is_blocking,
            } => {
                if let Some(client_id) = self.client_id_for(addr).await {
                    let input = InputState {
                        sequence,
                        timestamp,
                        move_dir,
                        aim_dir,
                        is_blocking,
                    };

                    let mut clients = self.clients.write().await;
                    clients.add_input(client_id, input);
                }
            }

            Packet::Attack => {
                if let Some(client_id) = self.client_id_for(addr).await {
                    self.clients.write().await.touch(client_id);
                    self.game_state.handle_client_command(
                        client_id,
                        crate::behavior::Command::StartAttack,
                        0.0,
                    );
                }
            }

            Packet::StopAttack => {
                if let Some(client_id) = self.client_id_for(addr).await {
                    self.clients.write().await.touch(client_id);
                    self.game_state.handle_client_command(
                        client_id,
                        crate::behavior::Command::StopAttack,
                        0.0,
                    );
                }
            }

            Packet::UseSkill { hotkey_id, aim } => {
                if let Some(client_id) = self.client_id_for(addr).await {
                    self.clients.write().await.touch(client_id);
                    self.game_state.handle_client_command(
                        client_id,
                        crate::behavior::Command::UseSkill { hotkey_id, aim },
                        0.0,
                    );
                }
            }

            Packet::AddAttribute { name } => {
                if let Some(client_id) = self.client_id_for(addr).await {
                    self.clients.write().await.touch(client_id);
                    if !self.game_state.handle_add_attribute(client_id, &name) {
                        debug!("Rejected attribute spend '{}' from client {}", name, client_id);
                    }
                }
            }

            Packet::Respawn => {
                if let Some(client_id) = self.client_id_for(addr).await {
                    self.clients.write().await.touch(client_id);
                    self.game_state.handle_respawn(client_id);
                }
            }

            Packet::Disconnect => {
                if let Some(client_id) = self.client_id_for(addr).await {
                    let mut clients = self.clients.write().await;
                    clients.remove_client(&client_id);
                    self.game_state.remove_client(client_id);
                }
            }

            _ => {
                warn!("Unexpected packet type from client at {}", addr);
            }
        }
    }

    /// Applies buffered inputs, splitting the tick evenly across each
    /// client's backlog so a chatty client doesn't move further than a
    /// quiet one.
    async fn process_inputs(&mut self, dt: f32) {
        let all_inputs = {
            let clients = self.clients.read().await;
            clients.get_chronological_inputs()
        };

        if !all_inputs.is_empty() {
            let mut per_client: std::collections::HashMap<u32, u32> =
                std::collections::HashMap::new();
            for (client_id, _) in &all_inputs {
                *per_client.entry(*client_id).or_insert(0) += 1;
            }

            for (client_id, input) in &all_inputs {
                let share = dt / per_client[client_id] as f32;
                self.game_state.apply_input(*client_id, input, share);

                let mut clients = self.clients.write().await;
                clients.mark_input_processed(*client_id, input.sequence);
            }

            let mut clients = self.clients.write().await;
            clients.cleanup_processed_inputs();
        }

        self.game_state.update(dt);
    }

    /// Broadcasts the authoritative state to all connected clients
    async fn broadcast_game_state(&mut self) {
        let client_count = {
            let clients = self.clients.read().await;
            clients.len()
        };

        if client_count == 0 {
            return;
        }

        let (characters, projectiles) = self.game_state.snapshots();
        let last_processed_input = {
            let clients = self.clients.read().await;
            clients.get_last_processed_inputs()
        };

        // Take timestamp as close to transmission as possible
        let timestamp = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap_or(Duration::from_secs(0))
            .as_millis();
        let timestamp_safe = (timestamp.min(u64::MAX as u128)) as u64;

        let packet = Packet::GameState {
            tick: self.game_state.tick,
            timestamp: timestamp_safe,
            last_processed_input,
            characters,
            projectiles,
        };

        self.broadcast_packet(&packet, None).await;
    }

    /// Broadcasts the tick's one-shot notifications: attack and skill
    /// starts, status effect applications, and cosmetic effect triggers.
    async fn broadcast_events(&mut self) {
        for event in self.game_state.drain_events() {
            let packet = match event {
                OutgoingEvent::AttackStarted {
                    attacker_id,
                    weapon_id,
                    action_id,
                    direction,
                } => Packet::AttackNotify {
                    weapon_id,
                    action_id,
                    direction,
                    attacker_id,
                    add_rotation_x: (-direction.y).asin().to_degrees(),
                    add_rotation_y: direction.x.atan2(direction.z).to_degrees(),
                },
                OutgoingEvent::SkillUsed {
                    attacker_id,
                    skill_id,
                    target_position,
                } => Packet::SkillUseNotify {
                    skill_id,
                    target_position,
                    attacker_id,
                    add_rotation_x: 0.0,
                    add_rotation_y: 0.0,
                },
                OutgoingEvent::StatusEffectApplied { target_id, data_id } => {
                    Packet::ApplyStatusEffect { target_id, data_id }
                }
            };
            self.broadcast_packet(&packet, None).await;
        }

        for effect in self.game_state.drain_effects() {
            let packet = Packet::EffectNotify {
                trigger_id: effect.trigger_id,
                effect_type: effect.effect_type,
                data_id: effect.data_id,
                action_id: effect.action_id,
            };
            self.broadcast_packet(&packet, None).await;
        }
    }

    /// Main server loop coordinating all operations
    pub async fn run(&mut self) -> Result<(), Box<dyn std::error::Error>> {
        self.spawn_network_receiver().await;
        self.spawn_network_sender().await;
        self.spawn_timeout_checker().await;

        let mut tick_interval = interval(self.tick_duration);
        let mut last_tick = Instant::now();

        info!("Server started successfully");

        loop {
            tokio::select! {
                // Handle network events
                message = self.server_rx.recv() => {
                    match message {
                        Some(ServerMessage::PacketReceived { packet, addr }) => {
                            self.handle_packet(packet, addr).await;
                        },
                        Some(ServerMessage::ClientTimeout { client_id }) => {
                            self.game_state.remove_client(client_id);
                        },
                        Some(ServerMessage::Shutdown) | None => {
                            info!("Server shutting down");
                            break;
                        }
                    }
                },

                // Handle server tick events
                _ = tick_interval.tick() => {
                    let now = Instant::now();
                    let dt = now.duration_since(last_tick).as_secs_f32();
                    last_tick = now;

                    self.process_inputs(dt).await;
                    self.broadcast_game_state().await;
                    self.broadcast_events().await;

                    // Periodic performance monitoring
                    if self.game_state.tick % 600 == 0 {
                        let client_count = {
                            let clients = self.clients.read().await;
                            clients.len()
                        };

                        if client_count > 0 {
                            debug!("Tick {}: {} clients, {} entities, {} projectiles, {:.1}Hz",
                                   self.game_state.tick, client_count,
                                   self.game_state.entities.len(),
                                   self.game_state.projectiles.len(), 1.0 / dt);
                        }
                    }
                },
            }
        }

        Ok(())
    }
}
