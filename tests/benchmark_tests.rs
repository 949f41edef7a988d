//! Performance benchmarks for critical game systems

use glam::Vec3;
use server::entity::CombatEntity;
use server::game::GameState;
use server::rules::GameplayRules;
use shared::{default_catalog, make_data_id, InputState};
use std::time::Instant;

fn bench_entity(id: u32, catalog: &shared::ItemCatalog, rules: &GameplayRules) -> CombatEntity {
    CombatEntity::new(
        id,
        format!("entity_{}", id),
        (id % 4) as u8 + 1,
        Vec3::new(id as f32 * 0.5, 0.0, 0.0),
        make_data_id("Rookie Helm"),
        make_data_id("Scout"),
        make_data_id("Blaster"),
        vec![make_data_id("Lucky Charm")],
        catalog,
        rules,
        0.0,
    )
}

/// Benchmarks cached stat reads, the hot path of every damage calculation
#[test]
fn benchmark_stat_cache_reads() {
    let catalog = default_catalog();
    let rules = GameplayRules::default();
    let entity = bench_entity(1, &catalog, &rules);

    let iterations = 100_000;
    let start = Instant::now();

    let mut total = 0i64;
    for _ in 0..iterations {
        total += entity.total_attack(&catalog, &rules) as i64;
    }

    let duration = start.elapsed();
    println!(
        "Stat cache reads: {} iterations in {:?} ({:.2} ns/iter, checksum {})",
        iterations,
        duration,
        duration.as_nanos() as f64 / iterations as f64,
        total
    );

    // Should complete in under 100ms for 100k iterations
    assert!(duration.as_millis() < 100);
}

/// Benchmarks full stat recomputation after contributor changes
#[test]
fn benchmark_stat_recompute() {
    let catalog = default_catalog();
    let rules = GameplayRules::default();
    let mut entity = bench_entity(1, &catalog, &rules);
    let blaster = make_data_id("Blaster");
    let splitter = make_data_id("Splitter");

    let iterations = 10_000;
    let start = Instant::now();

    for i in 0..iterations {
        // Each swap invalidates the cache, forcing the full contributor walk.
        entity.set_weapon(if i % 2 == 0 { splitter } else { blaster });
        let _ = entity.total_attack(&catalog, &rules);
    }

    let duration = start.elapsed();
    println!(
        "Stat recompute: {} iterations in {:?} ({:.2} μs/iter)",
        iterations,
        duration,
        duration.as_micros() as f64 / iterations as f64
    );

    // Should complete in under 1 second
    assert!(duration.as_millis() < 1000);
}

/// Benchmarks the full game tick with a crowded arena
#[test]
fn benchmark_game_tick_with_many_entities() {
    let mut game = GameState::new(GameplayRules::default(), default_catalog(), 5);
    for i in 0..50 {
        game.spawn_bot(format!("bot_{}", i), (i % 4) as u8 + 1);
    }

    let dt = 1.0 / 60.0;
    let iterations = 1000;
    let start = Instant::now();

    for _ in 0..iterations {
        game.update(dt);
        let _ = game.drain_events();
        let _ = game.drain_effects();
    }

    let duration = start.elapsed();
    println!(
        "Game tick: {} bots × {} frames in {:?} ({:.2} μs/frame)",
        game.entities.len(),
        iterations,
        duration,
        duration.as_micros() as f64 / iterations as f64
    );

    // 1000 ticks with 50 fighting bots should complete in under 5 seconds
    assert!(duration.as_millis() < 5000);
}

/// Benchmarks snapshot production and wire serialization together
#[test]
fn benchmark_snapshot_serialization() {
    use bincode::{deserialize, serialize};
    use shared::Packet;
    use std::collections::HashMap;

    let mut game = GameState::new(GameplayRules::default(), default_catalog(), 5);
    for i in 0..50 {
        game.spawn_bot(format!("bot_{}", i), (i % 4) as u8 + 1);
    }
    // Let the bots fight a little so projectiles are in the snapshot too.
    for _ in 0..120 {
        game.update(1.0 / 60.0);
    }

    let mut last_processed_input = HashMap::new();
    for i in 0..50u32 {
        last_processed_input.insert(i, i * 10);
    }

    let iterations = 1_000;
    let start = Instant::now();

    for _ in 0..iterations {
        let (characters, projectiles) = game.snapshots();
        let packet = Packet::GameState {
            tick: game.tick,
            timestamp: 1234567890,
            last_processed_input: last_processed_input.clone(),
            characters,
            projectiles,
        };
        let serialized = serialize(&packet).unwrap();
        let _deserialized: Packet = deserialize(&serialized).unwrap();
    }

    let duration = start.elapsed();
    println!(
        "Snapshot serialization: {} roundtrips in {:?} ({:.2} μs/roundtrip)",
        iterations,
        duration,
        duration.as_micros() as f64 / iterations as f64
    );

    // Should handle 1000 full-state roundtrips in under 2 seconds
    assert!(duration.as_millis() < 2000);
}

/// Stress tests input ordering under high load
#[test]
fn stress_test_many_inputs() {
    let inputs: Vec<InputState> = (0..1000)
        .map(|i| InputState {
            sequence: i,
            timestamp: i as u64 * 16,
            move_dir: if i % 3 == 0 { Vec3::X } else { Vec3::Z },
            aim_dir: Vec3::Z,
            is_blocking: i % 7 == 0,
        })
        .collect();

    let start = Instant::now();

    let mut sorted_inputs = inputs.clone();
    sorted_inputs.sort_by_key(|input| input.timestamp);

    // Verify sorting worked correctly
    for i in 1..sorted_inputs.len() {
        assert!(sorted_inputs[i].timestamp >= sorted_inputs[i - 1].timestamp);
    }

    let duration = start.elapsed();
    println!(
        "Input processing: {} inputs in {:?}",
        inputs.len(),
        duration
    );

    // Should complete in under 100ms
    assert!(duration.as_millis() < 100);
}

/// Benchmarks server input processing performance
#[test]
fn benchmark_server_input_processing() {
    use server::client_manager::ClientManager;

    let mut client_manager = ClientManager::new(50);

    // Add clients and inputs
    for i in 1..=10 {
        let addr = format!("127.0.0.1:{}", 8000 + i).parse().unwrap();
        client_manager.add_client(addr);

        // Add many inputs per client
        for j in 1..=100 {
            let input = InputState {
                sequence: j,
                timestamp: j as u64 * 16,
                move_dir: Vec3::X,
                aim_dir: Vec3::Z,
                is_blocking: j % 5 == 0,
            };
            client_manager.add_input(i, input);
        }
    }

    let start = Instant::now();

    // Get chronological inputs (this is the expensive operation)
    let chronological_inputs = client_manager.get_chronological_inputs();

    let duration = start.elapsed();
    println!(
        "Input processing: {} inputs processed in {:?}",
        chronological_inputs.len(),
        duration
    );

    // Should process 1000 inputs in under 10ms
    assert!(duration.as_millis() < 10);
}

/// Benchmarks spread fan geometry for the widest supported fans
#[test]
fn benchmark_spread_fan_geometry() {
    use glam::Quat;
    use shared::protocol::spread_rotations;

    let iterations = 10_000;
    let start = Instant::now();

    let mut checksum = 0.0f32;
    for i in 0..iterations {
        let count = (i % 32) + 1;
        for degrees in spread_rotations(count) {
            let dir = Quat::from_rotation_y(degrees.to_radians()) * Vec3::Z;
            checksum += dir.x;
        }
    }

    let duration = start.elapsed();
    println!(
        "Spread fans: {} fans in {:?} ({:.2} μs/fan, checksum {})",
        iterations,
        duration,
        duration.as_micros() as f64 / iterations as f64,
        checksum
    );

    // Should complete in under 500ms
    assert!(duration.as_millis() < 500);
}

/// Benchmarks client replica ingestion of full snapshots
#[test]
fn benchmark_client_snapshot_ingestion() {
    use client::game::ClientGameState;
    use std::collections::HashMap;

    let mut game = GameState::new(GameplayRules::default(), default_catalog(), 5);
    for i in 0..50 {
        game.spawn_bot(format!("bot_{}", i), (i % 4) as u8 + 1);
    }
    game.update(1.0 / 60.0);
    let (characters, projectiles) = game.snapshots();

    let mut client_state = ClientGameState::new();

    let iterations = 1_000;
    let start = Instant::now();

    for i in 0..iterations {
        client_state.apply_server_state(
            i + 1,
            i as u64 * 16,
            HashMap::new(),
            characters.clone(),
            projectiles.clone(),
        );
    }

    let duration = start.elapsed();
    println!(
        "Snapshot ingestion: {} snapshots in {:?} ({:.2} μs/snapshot)",
        iterations,
        duration,
        duration.as_micros() as f64 / iterations as f64
    );

    // Should ingest 1000 snapshots of 50 characters in under 500ms
    assert!(duration.as_millis() < 500);
}
