use crate::core::execution::{
    ExecutionStatus, ExecutionType, StrategyStatus, aggregate_status, can_review, can_transition,
};

#[test]
fn pending_moves_to_every_terminal_status() {
    for to in [
        ExecutionStatus::Success,
        ExecutionStatus::Failure,
        ExecutionStatus::Partial,
    ] {
        assert!(can_transition(ExecutionStatus::Pending, to));
    }
}

#[test]
fn terminal_statuses_never_move() {
    let all = [
        ExecutionStatus::Pending,
        ExecutionStatus::Success,
        ExecutionStatus::Failure,
        ExecutionStatus::Partial,
    ];
    for from in [
        ExecutionStatus::Success,
        ExecutionStatus::Failure,
        ExecutionStatus::Partial,
    ] {
        for to in all {
            assert_eq!(
                can_transition(from, to),
                from == to,
                "unexpected transition {:?} -> {:?}",
                from,
                to
            );
        }
    }
}

#[test]
fn reviewer_actions() {
    assert!(can_review(StrategyStatus::Draft, StrategyStatus::Pending));
    assert!(can_review(StrategyStatus::Pending, StrategyStatus::Approved));
    assert!(can_review(StrategyStatus::Pending, StrategyStatus::Rejected));
    assert!(can_review(StrategyStatus::Rejected, StrategyStatus::Pending));
    assert!(can_review(StrategyStatus::Completed, StrategyStatus::Pending));

    assert!(!can_review(StrategyStatus::Approved, StrategyStatus::Approved));
    assert!(!can_review(StrategyStatus::Approved, StrategyStatus::InProgress));
    assert!(!can_review(StrategyStatus::InProgress, StrategyStatus::Approved));
    assert!(!can_review(StrategyStatus::Rejected, StrategyStatus::Approved));
}

#[test]
fn aggregate_follows_success_count() {
    for total in 0..6usize {
        for succeeded in 0..=total {
            let expected = if total > 0 && succeeded == total {
                ExecutionStatus::Success
            } else if succeeded > 0 {
                ExecutionStatus::Partial
            } else {
                ExecutionStatus::Failure
            };
            assert_eq!(aggregate_status(succeeded, total), expected, "S={} N={}", succeeded, total);
        }
    }
}

#[test]
fn statuses_round_trip_through_strings() {
    for status in [
        StrategyStatus::Draft,
        StrategyStatus::Pending,
        StrategyStatus::Approved,
        StrategyStatus::Rejected,
        StrategyStatus::InProgress,
        StrategyStatus::Completed,
    ] {
        assert_eq!(StrategyStatus::parse(status.as_str()), Some(status));
    }
    assert_eq!(ExecutionType::parse("agent"), Some(ExecutionType::Agent));
    assert_eq!(ExecutionType::parse("workflow"), None);
    assert_eq!(ExecutionStatus::parse("done"), None);
}
