//! A user hook that errors or panics is contained: it is reported as an
//! error event and the protocol carries on with a conservative default.

use kitbase_client::{ErrorEvent as ClientErrorEvent, TransferEvent as ClientTransferEvent};
use kitbase_server::{BasicAgent, ErrorEvent, GainPawnEvent, PawnConfig};
use kitbase_shared::{
    AttemptResult, AuthorityError, DenyReason, TransferOutcome, TransferStatus,
};
use kitbase_test::{
    assert_consistent, assert_owned_by, assert_unowned, Fault, FaultyAgent, FaultyPawn, HookCall,
    HookLog, RecordingClient, TestHost,
};

fn init_logging() {
    env_logger::builder().is_test(true).try_init().ok();
}

#[test]
fn eligibility_hook_error_denies() {
    init_logging();
    let mut host = TestHost::new();
    let npc = host.server.spawn_bot("guard", false);
    let pawn = host.server.spawn_pawn_with_behavior(
        PawnConfig::default(),
        Box::new(FaultyPawn::on_eligibility(Fault::Error)),
    );

    assert_eq!(
        host.server.try_take_pawn(&npc, &pawn),
        TransferOutcome::Denied(DenyReason::HookFault)
    );
    assert_unowned!(host.server, pawn);

    let errors: Vec<_> = host.server.take_events().read::<ErrorEvent>().collect();
    assert_eq!(
        errors,
        vec![AuthorityError::CallbackFault {
            hook: "allow_ownership",
            message: "allow_ownership refused".to_string(),
        }]
    );
}

#[test]
fn eligibility_hook_panic_denies_and_server_keeps_going() {
    init_logging();
    let mut host = TestHost::new();
    let ann = host.connect("ann");
    let agent = host.agent_of(&ann);
    let broken = host.server.spawn_pawn_with_behavior(
        PawnConfig::default(),
        Box::new(FaultyPawn::on_eligibility(Fault::Panic)),
    );
    let healthy = host.server.spawn_pawn(PawnConfig::default());
    host.exchange_messages();

    assert_eq!(host.client_mut(&ann).request_take_pawn(&broken), AttemptResult::Request);
    host.exchange_messages();
    assert_eq!(host.client(&ann).transfer_status(&broken), TransferStatus::Denied);
    assert_unowned!(host.server, broken);

    let errors: Vec<_> = host.server.take_events().read::<ErrorEvent>().collect();
    assert_eq!(errors.len(), 1);
    assert_eq!(errors[0].deny_reason(), DenyReason::HookFault);
    match &errors[0] {
        AuthorityError::CallbackFault { hook, message } => {
            assert_eq!(*hook, "allow_ownership");
            assert!(message.contains("blew up"));
        }
        other => panic!("expected CallbackFault, got {:?}", other),
    }

    assert_eq!(host.client_mut(&ann).request_take_pawn(&healthy), AttemptResult::Request);
    host.exchange_messages();
    assert_owned_by!(host.server, healthy, agent);
    assert_consistent!(host);
}

#[test]
fn notification_hook_fault_does_not_undo_transfer() {
    init_logging();
    let mut host = TestHost::new();
    let npc = host.server.spawn_bot_with_behavior(
        "guard",
        false,
        Box::new(FaultyAgent::new(Fault::Panic)),
    );
    let pawn = host.server.spawn_pawn(PawnConfig::default());

    assert_eq!(host.server.add_pawn(&npc, &pawn), AttemptResult::Success);
    assert_owned_by!(host.server, pawn, npc);

    let mut events = host.server.take_events();
    let gains: Vec<_> = events.read::<GainPawnEvent>().collect();
    assert_eq!(gains, vec![(npc, pawn)]);
    let errors: Vec<_> = events.read::<ErrorEvent>().collect();
    assert_eq!(errors.len(), 1);
    assert_eq!(errors[0].deny_reason(), DenyReason::HookFault);

    host.server.remove_pawn(&npc, &pawn);
    assert_unowned!(host.server, pawn);
    assert!(host.server.owned_pawns(&npc).is_empty());
    assert!(host.server.take_events().has::<ErrorEvent>());
    assert!(host.server.registry().check_consistency().is_ok());
}

#[test]
fn client_response_hook_fault_keeps_the_outcome() {
    init_logging();
    let mut host = TestHost::new();
    let log = HookLog::new();
    let ann = host.connect_with_behaviors(
        "ann",
        Box::new(RecordingClient::faulty(&log, Fault::Error)),
        Box::new(BasicAgent),
    );
    let pawn = host.server.spawn_pawn(PawnConfig::default());
    host.exchange_messages();

    host.client_mut(&ann).request_take_pawn(&pawn);
    host.exchange_messages();

    let client = host.client_mut(&ann);
    assert_eq!(client.transfer_status(&pawn), TransferStatus::Approved);
    let mut events = client.take_events();
    let outcomes: Vec<_> = events.read::<ClientTransferEvent>().collect();
    assert_eq!(outcomes, vec![(pawn, TransferOutcome::Approved)]);
    let errors: Vec<_> = events.read::<ClientErrorEvent>().collect();
    assert_eq!(
        errors,
        vec![AuthorityError::CallbackFault {
            hook: "on_take_pawn_response",
            message: "on_take_pawn_response refused".to_string(),
        }]
    );
    assert_eq!(
        log.count(|call| matches!(call, HookCall::TakePawnResponse(..))),
        1
    );
}

#[test]
fn simulate_fault_only_skips_the_faulty_pawn() {
    init_logging();
    let mut host = TestHost::new();
    let log = HookLog::new();
    let npc = host.server.spawn_bot("guard", false);
    let broken = host.server.spawn_pawn_with_behavior(
        PawnConfig::default(),
        Box::new(FaultyPawn::on_simulate(Fault::Panic)),
    );
    let healthy = host.server.spawn_pawn_with_behavior(
        PawnConfig::default(),
        Box::new(kitbase_test::RecordingPawn::new(&log)),
    );
    host.server.add_pawn(&npc, &broken);
    host.server.add_pawn(&npc, &healthy);
    host.server.take_events();

    host.server.simulate(0.5);
    host.server.simulate(0.5);

    assert_eq!(log.count(|call| matches!(call, HookCall::Simulated(_))), 2);
    let errors: Vec<_> = host.server.take_events().read::<ErrorEvent>().collect();
    assert_eq!(errors.len(), 2);
    assert_owned_by!(host.server, broken, npc);
}
