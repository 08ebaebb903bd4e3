/// Assert that the server registry is consistent and every open client
/// agrees with it about pawn owners
#[macro_export]
macro_rules! assert_consistent {
    ($host:expr) => {
        if let Err(problem) = $host.check_consistency() {
            panic!("ownership state is inconsistent: {}", problem);
        }
    };
}

/// Assert that a pawn is owned by exactly the given agent, on the server
/// and in the agent's owned set
#[macro_export]
macro_rules! assert_owned_by {
    ($server:expr, $pawn:expr, $agent:expr) => {
        assert_eq!($server.owner_of(&$pawn), Some($agent), "owner of {:?}", $pawn);
        assert!(
            $server.owned_pawns(&$agent).contains(&$pawn),
            "{:?} missing from owned set of {:?}",
            $pawn,
            $agent
        );
    };
}

/// Assert that a pawn has no owner on the server
#[macro_export]
macro_rules! assert_unowned {
    ($server:expr, $pawn:expr) => {
        assert_eq!($server.owner_of(&$pawn), None, "{:?} should be unowned", $pawn);
    };
}
