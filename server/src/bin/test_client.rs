//! Headless smoke-test client. Connects, joins with the default loadout,
//! walks forward while attacking for a few seconds, then disconnects.
//! Useful for poking a running server without the real client.

use bincode::{deserialize, serialize};
use glam::Vec3;
use shared::{Packet, PROTOCOL_VERSION};
use std::time::{Duration, SystemTime, UNIX_EPOCH};
use tokio::net::UdpSocket;
use tokio::time::sleep;

fn get_timestamp() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as u64)
        .unwrap_or(0)
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let server_addr = std::env::args()
        .nth(1)
        .unwrap_or_else(|| "127.0.0.1:8080".to_string());

    let socket = UdpSocket::bind("127.0.0.1:0").await?;
    socket.connect(&server_addr).await?;
    println!("Connecting to {}", server_addr);

    let connect = Packet::Connect {
        client_version: PROTOCOL_VERSION,
    };
    socket.send(&serialize(&connect)?).await?;

    let mut buf = vec![0u8; 8192];
    let len = socket.recv(&mut buf).await?;
    let client_id = match deserialize::<Packet>(&buf[..len])? {
        Packet::Connected { client_id } => {
            println!("Connected as client {}", client_id);
            client_id
        }
        Packet::Disconnected { reason } => {
            println!("Connection rejected: {}", reason);
            return Ok(());
        }
        other => {
            println!("Unexpected response: {:?}", other);
            return Ok(());
        }
    };

    let join = Packet::Join {
        player_name: format!("tester-{}", client_id),
        head_id: 0,
        body_id: 0,
        weapon_id: 0,
        custom_equipment_ids: Vec::new(),
        extra: String::new(),
    };
    socket.send(&serialize(&join)?).await?;

    let len = socket.recv(&mut buf).await?;
    match deserialize::<Packet>(&buf[..len])? {
        Packet::Joined { entity_id } => println!("Joined as entity {}", entity_id),
        other => println!("Unexpected response: {:?}", other),
    }

    socket.send(&serialize(&Packet::Attack)?).await?;

    let mut snapshots_seen = 0u32;
    for sequence in 1..=120u32 {
        let input = Packet::Input {
            sequence,
            timestamp: get_timestamp(),
            move_dir: Vec3::Z,
            aim_dir: Vec3::Z,
            is_blocking: false,
        };
        socket.send(&serialize(&input)?).await?;

        // Drain whatever the server broadcast since the last input.
        while let Ok(len) = socket.try_recv(&mut buf) {
            match deserialize::<Packet>(&buf[..len]) {
                Ok(Packet::GameState {
                    tick, characters, ..
                }) => {
                    snapshots_seen += 1;
                    if snapshots_seen % 60 == 1 {
                        println!("tick {}: {} characters", tick, characters.len());
                        for character in &characters {
                            println!(
                                "  entity {} '{}' hp {} lvl {} at ({:.1}, {:.1})",
                                character.id,
                                character.name,
                                character.hp,
                                character.level,
                                character.position.x,
                                character.position.z,
                            );
                        }
                    }
                }
                Ok(Packet::AttackNotify {
                    attacker_id,
                    action_id,
                    ..
                }) => println!("attack: entity {} action {}", attacker_id, action_id),
                Ok(Packet::SkillUseNotify {
                    attacker_id,
                    skill_id,
                    ..
                }) => println!("skill: entity {} skill {}", attacker_id, skill_id),
                Ok(Packet::EffectNotify {
                    trigger_id,
                    effect_type,
                    ..
                }) => println!("effect: {:?} on {}", effect_type, trigger_id),
                Ok(Packet::ApplyStatusEffect { target_id, data_id }) => {
                    println!("status effect {} applied to entity {}", data_id, target_id)
                }
                Ok(_) => {}
                Err(e) => println!("bad packet: {}", e),
            }
        }

        sleep(Duration::from_millis(50)).await;
    }

    socket.send(&serialize(&Packet::StopAttack)?).await?;
    socket.send(&serialize(&Packet::Disconnect)?).await?;
    println!("Disconnected ({} snapshots received)", snapshots_seen);

    Ok(())
}
