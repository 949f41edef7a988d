//! Integration tests for the authoritative combat server
//!
//! These tests run cross-component scenarios through the real game loop and
//! validate the wire protocol over real sockets.

use bincode::{deserialize, serialize};
use glam::Vec3;
use rand::rngs::StdRng;
use rand::SeedableRng;
use server::behavior::Command;
use server::combat::{DamageSource, SpawnDirective};
use server::effects::EffectNotifier;
use server::entity::CombatEntity;
use server::game::{GameState, OutgoingEvent};
use server::projectile::{resolve_contacts, DamageProjectile};
use server::rules::GameplayRules;
use shared::{default_catalog, make_data_id, Packet};
use std::collections::HashMap;
use std::net::UdpSocket;
use std::thread;
use std::time::Duration;
use tokio::time::sleep;

/// NETWORK PROTOCOL TESTS
mod protocol_tests {
    use super::*;
    use shared::EffectType;

    /// Tests packet serialization round-trip for network protocol validation
    #[tokio::test]
    async fn packet_serialization_roundtrip() {
        let test_packets = vec![
            Packet::Connect { client_version: 1 },
            Packet::Join {
                player_name: "tester".to_string(),
                head_id: make_data_id("Rookie Helm"),
                body_id: make_data_id("Scout"),
                weapon_id: make_data_id("Blaster"),
                custom_equipment_ids: vec![make_data_id("Lucky Charm")],
                extra: "skin=ember".to_string(),
            },
            Packet::Input {
                sequence: 42,
                timestamp: 123456789,
                move_dir: Vec3::X,
                aim_dir: Vec3::Z,
                is_blocking: true,
            },
            Packet::UseSkill {
                hotkey_id: 1,
                aim: Vec3::Z,
            },
            Packet::EffectNotify {
                trigger_id: 7,
                effect_type: EffectType::DamageHit,
                data_id: make_data_id("Blaster"),
                action_id: 0,
            },
            Packet::Disconnected {
                reason: "Test".to_string(),
            },
        ];

        for packet in test_packets {
            let serialized = serialize(&packet).unwrap();
            let deserialized: Packet = deserialize(&serialized).unwrap();

            // Verify packet type matches (simplified check)
            match (&packet, &deserialized) {
                (Packet::Connect { .. }, Packet::Connect { .. }) => {}
                (Packet::Join { .. }, Packet::Join { .. }) => {}
                (Packet::Input { .. }, Packet::Input { .. }) => {}
                (Packet::UseSkill { .. }, Packet::UseSkill { .. }) => {}
                (Packet::EffectNotify { .. }, Packet::EffectNotify { .. }) => {}
                (Packet::Disconnected { .. }, Packet::Disconnected { .. }) => {}
                _ => panic!("Packet type mismatch after serialization"),
            }
        }
    }

    /// Tests real UDP socket communication
    #[tokio::test]
    async fn udp_socket_communication() {
        let server_socket = UdpSocket::bind("127.0.0.1:0").expect("Failed to bind server socket");
        let server_addr = server_socket.local_addr().unwrap();

        // Echo server
        let server_socket_clone = server_socket.try_clone().unwrap();
        thread::spawn(move || {
            let mut buf = [0; 1024];
            if let Ok((size, client_addr)) = server_socket_clone.recv_from(&mut buf) {
                let _ = server_socket_clone.send_to(&buf[..size], client_addr);
            }
        });

        sleep(Duration::from_millis(10)).await;

        let client_socket = UdpSocket::bind("127.0.0.1:0").expect("Failed to bind client socket");
        client_socket
            .set_read_timeout(Some(Duration::from_millis(100)))
            .unwrap();

        let test_packet = Packet::Connect { client_version: 1 };
        let serialized = serialize(&test_packet).unwrap();

        client_socket.send_to(&serialized, server_addr).unwrap();

        let mut buf = [0; 1024];
        let (size, _) = client_socket.recv_from(&mut buf).unwrap();
        let received_packet: Packet = deserialize(&buf[..size]).unwrap();

        match received_packet {
            Packet::Connect { client_version } => assert_eq!(client_version, 1),
            _ => panic!("Wrong packet type received"),
        }
    }

    /// Tests malformed packet handling
    #[test]
    fn malformed_packet_handling() {
        let valid_packet = Packet::Connect { client_version: 1 };
        let valid_data = serialize(&valid_packet).unwrap();

        // Test truncated packet
        let truncated_data = &valid_data[..valid_data.len() / 2];
        let result: Result<Packet, _> = deserialize(truncated_data);
        assert!(
            result.is_err(),
            "Should fail to deserialize truncated packet"
        );

        // Test corrupted packet
        let mut corrupted_data = valid_data.clone();
        if !corrupted_data.is_empty() {
            corrupted_data[0] = 0xFF; // Corrupt first byte
        }
        let result: Result<Packet, _> = deserialize(&corrupted_data);
        assert!(
            result.is_err(),
            "Should fail to deserialize corrupted packet"
        );

        // Test empty packet
        let empty_data = vec![];
        let result: Result<Packet, _> = deserialize(&empty_data);
        assert!(result.is_err(), "Should fail to deserialize empty packet");
    }
}

/// STAT AGGREGATION INTEGRATION TESTS
mod stat_tests {
    use super::*;

    /// Tests that equipment contributions add up and disappear on unequip
    #[test]
    fn equipment_additivity_and_removal() {
        let catalog = default_catalog();
        let rules = GameplayRules::default();
        let mut entity = test_entity(1, &catalog, &rules);

        let base_attack = rules.base_attack.at_level(1, rules.max_level);
        assert_eq!(entity.total_attack(&catalog, &rules), base_attack + 5);

        entity.set_weapon(make_data_id("Splitter"));
        assert_eq!(entity.total_attack(&catalog, &rules), base_attack + 2);
        assert_eq!(entity.total_spread_damages(&catalog, &rules), 3);

        // Unequipping to an unknown id drops the contribution entirely.
        entity.set_weapon(0);
        assert_eq!(entity.total_attack(&catalog, &rules), base_attack);
        assert_eq!(entity.total_spread_damages(&catalog, &rules), 1);
    }

    /// Tests that spent attribute points flow into derived totals
    #[test]
    fn attribute_spending_feeds_totals() {
        let catalog = default_catalog();
        let rules = GameplayRules::default();
        let mut entity = test_entity(1, &catalog, &rules);
        entity.stat_point = 3;

        let before = entity.total_attack(&catalog, &rules);
        assert!(entity.add_attribute("Might", &rules));
        assert!(entity.add_attribute("Might", &rules));
        assert_eq!(entity.total_attack(&catalog, &rules), before + 4);
        assert_eq!(entity.stat_point, 1);

        // Unknown attribute names never consume points.
        assert!(!entity.add_attribute("Luck", &rules));
        assert_eq!(entity.stat_point, 1);
    }

    /// Tests that a reapplied status effect refreshes instead of stacking
    #[test]
    fn status_effects_refresh_and_expire() {
        let catalog = default_catalog();
        let rules = GameplayRules::default();
        let mut entity = test_entity(1, &catalog, &rules);
        let burn = catalog.status_effect(make_data_id("Burn")).unwrap().clone();

        let clean_defend = entity.total_defend(&catalog, &rules);

        entity.apply_status_effect(&burn, 0.0);
        entity.apply_status_effect(&burn, 1.0);
        assert_eq!(entity.status_effects.len(), 1);
        assert_eq!(entity.total_defend(&catalog, &rules), clean_defend - 5);

        // The refresh at t=1 pushed expiry to t=5.
        entity.update_status_effects(4.5);
        assert_eq!(entity.status_effects.len(), 1);
        entity.update_status_effects(5.1);
        assert!(entity.status_effects.is_empty());
        assert_eq!(entity.total_defend(&catalog, &rules), clean_defend);
    }
}

/// COMBAT SCENARIO TESTS
///
/// Full attack cycles through the game loop: command in, wind-up, launch,
/// projectile flight, contact resolution.
mod combat_scenario_tests {
    use super::*;

    /// Tests the damage formula end to end for a single weapon hit
    #[test]
    fn weapon_hit_applies_expected_damage() {
        let mut game = deterministic_game();
        let attacker = join_basic(&mut game, 1, 1, "Blaster");
        let victim = join_basic(&mut game, 2, 2, "Blaster");
        face_off(&mut game, attacker, victim);

        single_attack(&mut game, 1);
        step(&mut game, 2.0);

        // attack 20 base + 5 weapon, defend 5 base: 25 - 5 = 20 off 100.
        assert_eq!(game.entities[&victim].hp, 80);
        assert_eq!(game.entities[&attacker].hp, 100);
        assert!(game.projectiles.is_empty());
    }

    /// Tests defend and block mitigation stacking on the same hit
    #[test]
    fn iron_skin_and_blocking_mitigate_damage() {
        // Iron skin alone: 25 damage against 5 + 15 defend leaves 5.
        let mut game = deterministic_game();
        let attacker = join_basic(&mut game, 1, 1, "Blaster");
        let victim = join_basic(&mut game, 2, 2, "Blaster");
        face_off(&mut game, attacker, victim);
        let iron_skin = game
            .catalog
            .status_effect(make_data_id("Iron Skin"))
            .unwrap()
            .clone();
        let now = game.time;
        game.entities
            .get_mut(&victim)
            .unwrap()
            .apply_status_effect(&iron_skin, now);

        single_attack(&mut game, 1);
        step(&mut game, 2.0);
        assert_eq!(game.entities[&victim].hp, 95);

        // Blocking on top adds a 20% cut of the rated damage and the floor
        // takes the hit to zero.
        let mut game = deterministic_game();
        let attacker = join_basic(&mut game, 1, 1, "Blaster");
        let victim = join_basic(&mut game, 2, 2, "Blaster");
        face_off(&mut game, attacker, victim);
        let now = game.time;
        {
            let entity = game.entities.get_mut(&victim).unwrap();
            entity.apply_status_effect(&iron_skin, now);
            entity.is_blocking = true;
        }

        single_attack(&mut game, 1);
        step(&mut game, 2.0);
        assert_eq!(game.entities[&victim].hp, 100);
    }

    /// Tests that a spread weapon launches a symmetric fan
    #[test]
    fn spread_weapon_launches_symmetric_fan() {
        let mut game = deterministic_game();
        let attacker = join_basic(&mut game, 1, 1, "Splitter");
        {
            let entity = game.entities.get_mut(&attacker).unwrap();
            entity.position = Vec3::ZERO;
            entity.direction = Vec3::Z;
        }

        game.handle_client_command(1, Command::StartAttack, 0.0);
        let launched = step_until(&mut game, 1.0, |g| !g.projectiles.is_empty());
        assert!(launched, "no projectiles after a full second");
        game.handle_client_command(1, Command::StopAttack, 0.0);

        assert_eq!(game.projectiles.len(), 3);
        let mut xs: Vec<f32> = game.projectiles.iter().map(|p| p.direction.x).collect();
        xs.sort_by(|a, b| a.partial_cmp(b).unwrap());
        // Rotations of -30, 0, +30 degrees around the +Z aim.
        assert!((xs[0] + 0.5).abs() < 1e-4);
        assert!(xs[1].abs() < 1e-4);
        assert!((xs[2] - 0.5).abs() < 1e-4);
    }

    /// Tests kill rewards: exp, score and kill count on the attacker
    #[test]
    fn kill_awards_exp_and_score() {
        let mut game = deterministic_game();
        let attacker = join_basic(&mut game, 1, 1, "Blaster");
        let victim = join_basic(&mut game, 2, 2, "Blaster");
        face_off(&mut game, attacker, victim);
        game.entities.get_mut(&victim).unwrap().hp = 1;

        single_attack(&mut game, 1);
        step(&mut game, 2.0);

        let victim_entity = &game.entities[&victim];
        assert!(victim_entity.is_dead());
        assert_eq!(victim_entity.die_count, 1);

        // Level 1 victim: 15 exp and 100 score at rate 1.0.
        let attacker_entity = &game.entities[&attacker];
        assert_eq!(attacker_entity.exp, 15);
        assert_eq!(attacker_entity.score, 100);
        assert_eq!(attacker_entity.kill_count, 1);
    }

    /// Tests that one projectile damages every clustered target exactly once
    #[test]
    fn area_sweep_damages_each_target_once() {
        let catalog = default_catalog();
        let rules = GameplayRules {
            min_attack_vary_rate: 0.0,
            max_attack_vary_rate: 0.0,
            invincible_duration: 0.0,
            ..Default::default()
        };
        let mut rng = StdRng::seed_from_u64(3);
        let mut notifier = EffectNotifier::new();

        let mut entities = HashMap::new();
        for id in 1..=3 {
            let mut entity = test_entity(id, &catalog, &rules);
            entity.team_id = 2;
            entity.position = Vec3::new(0.3 * id as f32, 0.0, 5.0);
            entities.insert(id, entity);
        }

        let template = catalog
            .weapon(make_data_id("Blaster"))
            .unwrap()
            .projectile_for(0)
            .unwrap()
            .clone();
        let mut projectile = DamageProjectile::from_directive(
            900,
            SpawnDirective {
                template,
                origin: Vec3::new(0.6, 0.0, 5.0),
                direction: Vec3::Z,
                damage: 30,
                attacker_id: 99,
                attacker_team: 1,
                source: DamageSource::Weapon {
                    weapon_id: make_data_id("Blaster"),
                },
                action_id: 0,
            },
            0.0,
        );

        let resolution = resolve_contacts(
            &mut projectile,
            &mut entities,
            &catalog,
            &rules,
            &mut rng,
            &mut notifier,
            0.0,
        );
        assert!(resolution.destroyed);
        for id in 1..=3 {
            // 30 rated against 5 base defend.
            assert_eq!(entities[&id].hp, 120 - 25, "target {} hit once", id);
        }

        // A resolved projectile is inert on later ticks.
        let again = resolve_contacts(
            &mut projectile,
            &mut entities,
            &catalog,
            &rules,
            &mut rng,
            &mut notifier,
            0.1,
        );
        assert!(again.destroyed);
        for id in 1..=3 {
            assert_eq!(entities[&id].hp, 95);
        }
    }

    /// Tests multi-level carry-forward from one large exp grant
    #[test]
    fn leveling_carries_surplus_exp_forward() {
        let catalog = default_catalog();
        let rules = GameplayRules::default();
        let mut entity = test_entity(1, &catalog, &rules);

        // 30 to clear level 1, 36 to clear level 2.
        assert_eq!(rules.exp_threshold(1), 30);
        assert_eq!(rules.exp_threshold(2), 36);

        let gained = entity.gain_exp(70, &rules);
        assert_eq!(gained, 2);
        assert_eq!(entity.level, 3);
        assert_eq!(entity.exp, 4);
        assert_eq!(entity.stat_point, 2 * rules.adding_stat_point);
    }

    /// Tests that a skill on cooldown cannot be cast again
    #[test]
    fn skill_cooldown_blocks_immediate_reuse() {
        let mut game = deterministic_game();
        let caster = join_loadout(&mut game, 1, 1, "Rookie Helm", "Scout", "Blaster");

        game.handle_client_command(
            1,
            Command::UseSkill {
                hotkey_id: 1,
                aim: Vec3::Z,
            },
            0.0,
        );
        step(&mut game, 1.0);

        game.handle_client_command(
            1,
            Command::UseSkill {
                hotkey_id: 1,
                aim: Vec3::Z,
            },
            0.0,
        );
        step(&mut game, 1.0);

        let uses = game
            .drain_events()
            .iter()
            .filter(|e| matches!(e, OutgoingEvent::SkillUsed { attacker_id, .. } if *attacker_id == caster))
            .count();
        assert_eq!(uses, 1, "second cast inside the 8s cooldown must be refused");
    }
}

/// COMMAND AUTHORITY TESTS
mod authority_tests {
    use super::*;

    /// Tests that a client can only ever command its own entity
    #[test]
    fn client_commands_stay_with_own_entity() {
        let mut game = deterministic_game();
        let first = join_basic(&mut game, 1, 1, "Blaster");
        let second = join_basic(&mut game, 2, 2, "Blaster");

        game.handle_client_command(1, Command::StartAttack, 0.0);
        assert!(game.entities[&first].wants_attack);
        assert!(!game.entities[&second].wants_attack);

        // A connection that never joined commands nothing.
        game.handle_client_command(42, Command::StartAttack, 0.0);
        step(&mut game, 0.2);
        assert!(!game.entities[&second].wants_attack);
    }
}

// HELPER FUNCTIONS

/// Rules with variance and spawn protection zeroed so damage is exact.
fn deterministic_game() -> GameState {
    let rules = GameplayRules {
        min_attack_vary_rate: 0.0,
        max_attack_vary_rate: 0.0,
        invincible_duration: 0.0,
        ..Default::default()
    };
    GameState::new(rules, default_catalog(), 11)
}

fn test_entity(id: u32, catalog: &shared::ItemCatalog, rules: &GameplayRules) -> CombatEntity {
    CombatEntity::new(
        id,
        format!("entity_{}", id),
        0,
        Vec3::ZERO,
        make_data_id("Rookie Helm"),
        0,
        make_data_id("Blaster"),
        vec![],
        catalog,
        rules,
        0.0,
    )
}

/// Joins a player with no armor so base stats apply.
fn join_basic(game: &mut GameState, client_id: u32, team_id: u8, weapon: &str) -> u32 {
    game.spawn_player(
        client_id,
        format!("player_{}", client_id),
        team_id,
        0,
        0,
        make_data_id(weapon),
        vec![],
        String::new(),
    )
}

fn join_loadout(
    game: &mut GameState,
    client_id: u32,
    team_id: u8,
    head: &str,
    body: &str,
    weapon: &str,
) -> u32 {
    game.spawn_player(
        client_id,
        format!("player_{}", client_id),
        team_id,
        make_data_id(head),
        make_data_id(body),
        make_data_id(weapon),
        vec![],
        String::new(),
    )
}

/// Places the attacker at the origin aiming straight at the victim.
fn face_off(game: &mut GameState, attacker: u32, victim: u32) {
    {
        let entity = game.entities.get_mut(&attacker).unwrap();
        entity.position = Vec3::ZERO;
        entity.direction = Vec3::Z;
    }
    let entity = game.entities.get_mut(&victim).unwrap();
    entity.position = Vec3::new(0.0, 0.0, 3.0);
    entity.direction = Vec3::NEG_Z;
}

/// Runs exactly one attack cycle: starts attacking and stops again as soon
/// as the wind-up has begun.
fn single_attack(game: &mut GameState, client_id: u32) {
    game.handle_client_command(client_id, Command::StartAttack, 0.0);
    let started = step_until(game, 1.0, |g| {
        g.drain_events()
            .iter()
            .any(|e| matches!(e, OutgoingEvent::AttackStarted { .. }))
    });
    assert!(started, "attack never started");
    game.handle_client_command(client_id, Command::StopAttack, 0.0);
}

fn step(game: &mut GameState, seconds: f32) {
    let dt = 1.0 / 60.0;
    let steps = (seconds / dt).ceil() as usize;
    for _ in 0..steps {
        game.update(dt);
    }
}

fn step_until<F: FnMut(&mut GameState) -> bool>(
    game: &mut GameState,
    max_seconds: f32,
    mut done: F,
) -> bool {
    let dt = 1.0 / 60.0;
    let steps = (max_seconds / dt).ceil() as usize;
    for _ in 0..steps {
        game.update(dt);
        if done(game) {
            return true;
        }
    }
    false
}
