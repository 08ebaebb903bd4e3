//! Per-tick forwarding from agents to their owned pawns.

use kitbase_server::PawnConfig;
use kitbase_shared::{NetworkAuthoritative, OwnerChange};
use kitbase_test::{HookCall, HookLog, RecordingClient, RecordingPawn, TestHost};

fn init_logging() {
    env_logger::builder().is_test(true).try_init().ok();
}

#[test]
fn host_simulates_pawns_of_its_own_agents() {
    init_logging();
    let mut host = TestHost::new();
    let log = HookLog::new();
    let npc = host.server.spawn_bot("guard", false);
    let pawn = host
        .server
        .spawn_pawn_with_behavior(PawnConfig::default(), Box::new(RecordingPawn::new(&log)));
    host.server.add_pawn(&npc, &pawn);

    host.server.simulate(0.25);

    assert_eq!(
        log.calls(),
        vec![
            HookCall::OwnerChanged(OwnerChange {
                old: None,
                new: Some(npc)
            }),
            HookCall::Simulated(0.25),
        ]
    );
}

#[test]
fn host_skips_proxies_of_remote_players() {
    init_logging();
    let mut host = TestHost::new();
    let log = HookLog::new();
    let ann = host.connect("ann");
    let agent = host.agent_of(&ann);
    let pawn = host
        .server
        .spawn_pawn_with_behavior(PawnConfig::default(), Box::new(RecordingPawn::new(&log)));
    host.server.add_pawn(&agent, &pawn);

    host.server.simulate(0.25);

    assert_eq!(log.count(|call| matches!(call, HookCall::Simulated(_))), 0);
}

#[test]
fn frozen_and_unowned_pawns_are_not_simulated() {
    init_logging();
    let mut host = TestHost::new();
    let log = HookLog::new();
    let npc = host.server.spawn_bot("guard", false);
    let frozen = host
        .server
        .spawn_pawn_with_behavior(PawnConfig::default(), Box::new(RecordingPawn::frozen(&log)));
    host.server
        .spawn_pawn_with_behavior(PawnConfig::default(), Box::new(RecordingPawn::new(&log)));
    host.server.add_pawn(&npc, &frozen);

    host.server.simulate(0.25);

    assert_eq!(log.count(|call| matches!(call, HookCall::Simulated(_))), 0);
}

#[test]
fn every_owned_pawn_is_visited_once_per_tick() {
    init_logging();
    let mut host = TestHost::new();
    let log = HookLog::new();
    let npc = host.server.spawn_bot("guard", false);
    for _ in 0..3 {
        let pawn = host
            .server
            .spawn_pawn_with_behavior(PawnConfig::default(), Box::new(RecordingPawn::new(&log)));
        host.server.add_pawn(&npc, &pawn);
    }

    host.server.simulate(0.1);

    assert_eq!(log.count(|call| matches!(call, HookCall::Simulated(_))), 3);
}

#[test]
fn client_simulates_what_the_replica_says_it_owns() {
    init_logging();
    let mut host = TestHost::new();
    let log = HookLog::new();
    let ann = host.connect_with_behaviors(
        "ann",
        Box::new(RecordingClient::new(&log)),
        Box::new(kitbase_server::BasicAgent),
    );
    let agent = host.agent_of(&ann);
    let mine = host.server.spawn_pawn(PawnConfig::default());
    host.server.spawn_pawn(PawnConfig::default());
    host.server.add_pawn(&agent, &mine);

    // not replicated yet
    host.client_mut(&ann).simulate(0.1);
    assert!(log.calls().is_empty());

    host.exchange_messages();
    host.client_mut(&ann).simulate(0.1);
    assert_eq!(log.calls(), vec![HookCall::SimulatedPawn(mine)]);
}

#[test]
fn authority_is_reported_per_process() {
    init_logging();
    let mut host = TestHost::new();
    let ann = host.connect("ann");

    assert!(host.server.is_authoritative());
    assert!(!host.client(&ann).is_authoritative());
}
