//! Property-based tests for the patch round-trip law.
//!
//! Uses proptest to verify, over arbitrary snapshots and patches:
//! 1. Applying a patch and then its inverse restores the snapshot exactly.
//! 2. Patches targeting an absent id leave the snapshot unchanged and
//!    yield a no-op inverse.

use chrono::DateTime;
use proptest::prelude::*;

use todoterm::cache::{Snapshot, TodolistPatch};
use todoterm::todolists::{DomainTodolist, TodolistFilter};
use todoterm_proto::todolist::TodolistId;

// --- Strategies ---

/// Strategy for generating arbitrary filter values.
fn arb_filter() -> impl Strategy<Value = TodolistFilter> {
    prop_oneof![
        Just(TodolistFilter::All),
        Just(TodolistFilter::Active),
        Just(TodolistFilter::Completed),
    ]
}

/// Strategy for generating a todolist with a fixed id.
///
/// Snapshot ids are unique in the real system (they are server-minted), so
/// callers pick distinct `id` values.
fn arb_todolist(id: u8) -> impl Strategy<Value = DomainTodolist> {
    ("[a-zA-Z0-9 ]{0,24}", arb_filter(), any::<i64>(), 0i64..4_000_000_000).prop_map(
        move |(title, filter, order, secs)| DomainTodolist {
            id: TodolistId::new(format!("id-{id}")),
            title,
            added_date: DateTime::from_timestamp(secs, 0).unwrap_or_default(),
            order,
            filter,
        },
    )
}

/// Strategy for generating snapshots with unique ids.
fn arb_snapshot() -> impl Strategy<Value = Snapshot> {
    prop::collection::btree_set(0u8..8, 0..6).prop_flat_map(|ids| {
        ids.into_iter().map(arb_todolist).collect::<Vec<_>>()
    })
}

/// Strategy for generating a snapshot together with a patch over it.
///
/// Patches target present ids, an absent id, or (for inserts) a fresh id
/// not present in the snapshot; insert indexes deliberately overshoot the
/// snapshot length to exercise clamping.
fn arb_snapshot_and_patch() -> impl Strategy<Value = (Snapshot, TodolistPatch)> {
    arb_snapshot().prop_flat_map(|snapshot| {
        let ids: Vec<TodolistId> = snapshot.iter().map(|t| t.id.clone()).collect();
        let target = if ids.is_empty() {
            Just(TodolistId::new("id-absent")).boxed()
        } else {
            prop_oneof![
                prop::sample::select(ids),
                Just(TodolistId::new("id-absent")),
            ]
            .boxed()
        };
        let max_index = snapshot.len() + 2;

        let patch = prop_oneof![
            (0..=max_index, arb_todolist(99)).prop_map(|(index, todolist)| {
                TodolistPatch::Insert { index, todolist }
            }),
            target
                .clone()
                .prop_map(|id| TodolistPatch::RemoveById { id }),
            (target.clone(), "[a-zA-Z0-9 ]{0,24}")
                .prop_map(|(id, title)| TodolistPatch::SetTitle { id, title }),
            (target, arb_filter())
                .prop_map(|(id, filter)| TodolistPatch::SetFilter { id, filter }),
            Just(TodolistPatch::Noop),
        ];

        (Just(snapshot), patch)
    })
}

// --- Properties ---

proptest! {
    /// Round-trip law: for every patch `p` and snapshot `s`,
    /// `inverse(p)(p(s)) == s`.
    #[test]
    fn inverse_restores_the_snapshot((snapshot, patch) in arb_snapshot_and_patch()) {
        let original = snapshot.clone();
        let mut working = snapshot;

        let inverse = patch.apply(&mut working);
        let _ = inverse.apply(&mut working);

        prop_assert_eq!(working, original);
    }

    /// A remove targeting an absent id is an idempotent no-op, and its
    /// inverse is a no-op too.
    #[test]
    fn remove_of_absent_id_is_a_noop(snapshot in arb_snapshot()) {
        let original = snapshot.clone();
        let mut working = snapshot;

        let patch = TodolistPatch::RemoveById { id: TodolistId::new("zz-absent") };
        let inverse = patch.apply(&mut working);

        prop_assert_eq!(&working, &original);
        prop_assert_eq!(&inverse, &TodolistPatch::Noop);

        let second = inverse.apply(&mut working);
        prop_assert_eq!(&working, &original);
        prop_assert_eq!(second, TodolistPatch::Noop);
    }

    /// A field update targeting an absent id is a no-op with a no-op inverse.
    #[test]
    fn update_of_absent_id_is_a_noop(snapshot in arb_snapshot(), title in "[a-z]{1,12}") {
        let original = snapshot.clone();
        let mut working = snapshot;

        let patch = TodolistPatch::SetTitle { id: TodolistId::new("zz-absent"), title };
        let inverse = patch.apply(&mut working);

        prop_assert_eq!(working, original);
        prop_assert_eq!(inverse, TodolistPatch::Noop);
    }

    /// Applying a patch twice and its inverse twice also restores the
    /// snapshot (inverses are computed per application, not per patch).
    #[test]
    fn repeated_application_round_trips((snapshot, patch) in arb_snapshot_and_patch()) {
        let original = snapshot.clone();
        let mut working = snapshot;

        let first_inverse = patch.apply(&mut working);
        let second_inverse = patch.apply(&mut working);
        let _ = second_inverse.apply(&mut working);
        let _ = first_inverse.apply(&mut working);

        prop_assert_eq!(working, original);
    }
}
