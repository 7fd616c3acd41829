//! Performance benchmarks for the submission path and event fan-out

use server::cooldown::CooldownPolicy;
use server::engine::Engine;
use server::gateway::{BroadcastGateway, ChannelGateway};
use server::grid::GridStore;
use server::registry::{Session, SessionId};
use shared::{Move, ServerEvent, SubmitRequest, COLS, ROWS};
use std::time::Instant;
use tokio::sync::mpsc;

/// Gateway that only counts deliveries
#[derive(Default)]
struct CountingGateway {
    broadcasts: usize,
    direct: usize,
}

impl BroadcastGateway for CountingGateway {
    fn broadcast(&mut self, _event: &ServerEvent) {
        self.broadcasts += 1;
    }

    fn send_to(&mut self, _session: SessionId, _event: &ServerEvent) {
        self.direct += 1;
    }
}

/// Benchmarks end-to-end submission handling through the engine
#[test]
fn benchmark_submission_throughput() {
    let mut engine = Engine::new(0, CountingGateway::default());
    engine.connect(Session::new(SessionId(1), "127.0.0.1:9000".parse().unwrap()));

    let iterations = 10_000;
    let requests: Vec<SubmitRequest> = (0..iterations)
        .map(|i| SubmitRequest::new(i % ROWS, (i / ROWS) % COLS, "é", &format!("player-{}", i)))
        .collect();

    let start = Instant::now();
    for (i, request) in requests.iter().enumerate() {
        let ack = engine.submit(SessionId(1), Some(i as u64), request, i as u64);
        assert!(ack.ok);
    }
    let duration = start.elapsed();

    println!(
        "Submissions: {} in {:?} ({:.2} μs/submit)",
        iterations,
        duration,
        duration.as_micros() as f64 / iterations as f64
    );

    assert_eq!(engine.coordinator().grid().history().len(), iterations);
    assert_eq!(engine.gateway().broadcasts, iterations + 1);
    assert_eq!(engine.gateway().direct, iterations + 1);

    // Should complete in under 2 seconds
    assert!(duration.as_millis() < 2000);
}

/// Benchmarks rejected submissions, which must stay cheap under spam
#[test]
fn benchmark_cooldown_rejections() {
    let mut engine = Engine::new(60, CountingGateway::default());
    let request = SubmitRequest::new(0, 0, "A", "spammer");
    assert!(engine.submit(SessionId(1), None, &request, 0).ok);

    let iterations = 50_000;
    let start = Instant::now();
    for i in 0..iterations {
        let ack = engine.submit(SessionId(1), None, &request, 1 + i as u64);
        assert!(!ack.ok);
    }
    let duration = start.elapsed();

    println!(
        "Rejections: {} in {:?} ({:.2} ns/iter)",
        iterations,
        duration,
        duration.as_nanos() as f64 / iterations as f64
    );

    assert_eq!(engine.coordinator().grid().history().len(), 1);
    assert!(duration.as_millis() < 2000);
}

/// Benchmarks cooldown evaluation against a large player table
#[test]
fn benchmark_cooldown_evaluation() {
    let mut policy = CooldownPolicy::new(30);
    for i in 0..10_000u64 {
        policy.record(&format!("player-{}", i), i);
    }

    let iterations = 100_000u64;
    let start = Instant::now();
    let mut admitted = 0;
    for i in 0..iterations {
        let player = format!("player-{}", i % 10_000);
        if policy.evaluate(&player, 20_000) == server::cooldown::Verdict::Admit {
            admitted += 1;
        }
    }
    let duration = start.elapsed();

    println!(
        "Cooldown evaluation: {} iterations in {:?}",
        iterations, duration
    );

    // Every player was accepted less than 30s before t=20s
    assert_eq!(admitted, 0);
    assert!(duration.as_millis() < 1000);
}

/// Benchmarks rebuilding the grid from a long history
#[test]
fn benchmark_history_replay() {
    let history: Vec<Move> = (0..10_000)
        .map(|i| Move {
            row: i % ROWS,
            col: (i * 7) % COLS,
            ch: "x".to_string(),
            by: format!("player-{}", i),
            at: i as u64,
        })
        .collect();

    let iterations = 50;
    let start = Instant::now();
    for _ in 0..iterations {
        let grid = GridStore::replay(&history).unwrap();
        assert_eq!(grid.len(), ROWS);
    }
    let duration = start.elapsed();

    println!(
        "Replay of {} moves: {} iterations in {:?}",
        history.len(),
        iterations,
        duration
    );

    assert!(duration.as_millis() < 2000);
}

/// Benchmarks update fan-out to many connected sessions
#[test]
fn benchmark_broadcast_fanout() {
    let sessions = 200;
    let mut gateway = ChannelGateway::new();
    let mut receivers = Vec::with_capacity(sessions);
    for id in 0..sessions {
        let (tx, rx) = mpsc::unbounded_channel();
        gateway.attach(SessionId(id as u64), tx);
        receivers.push(rx);
    }

    let event = ServerEvent::Update(Move {
        row: 1,
        col: 1,
        ch: "A".to_string(),
        by: "P1".to_string(),
        at: 0,
    });

    let broadcasts = 500;
    let start = Instant::now();
    for _ in 0..broadcasts {
        gateway.broadcast(&event);
    }
    let duration = start.elapsed();

    println!(
        "Fan-out: {} broadcasts to {} sessions in {:?}",
        broadcasts, sessions, duration
    );

    let mut delivered = 0;
    for rx in &mut receivers {
        while rx.try_recv().is_ok() {
            delivered += 1;
        }
    }
    assert_eq!(delivered, sessions * broadcasts);
    assert!(duration.as_millis() < 2000);
}
