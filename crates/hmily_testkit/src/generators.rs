//! Property-based test generators using proptest.
//!
//! Generated records always fit within the repository's read buffer.

use hmily_repository::{HmilyAction, Invocation, Participant, ParticipantUndo, Transaction};
use proptest::prelude::*;

/// Strategy for valid application names.
pub fn app_name_strategy() -> impl Strategy<Value = String> {
    prop::string::string_regex("[a-z][a-z0-9-]{0,15}").expect("Invalid regex")
}

/// Strategy for status codes, including the terminal ones.
pub fn status_strategy() -> impl Strategy<Value = i32> {
    prop_oneof![
        Just(HmilyAction::PreTry.code()),
        Just(HmilyAction::Trying.code()),
        Just(HmilyAction::Confirming.code()),
        Just(HmilyAction::Canceling.code()),
        Just(HmilyAction::Delete.code()),
        Just(HmilyAction::Death.code()),
    ]
}

/// Strategy for branch protocols.
pub fn trans_type_strategy() -> impl Strategy<Value = String> {
    prop_oneof![Just("TCC".to_string()), Just("TAC".to_string()), Just("SAGA".to_string())]
}

/// Strategy for recorded invocations.
pub fn invocation_strategy() -> impl Strategy<Value = Invocation> {
    (
        prop::string::string_regex("[a-z]{1,8}(\\.[A-Z][a-z]{1,8}){1,2}").expect("Invalid regex"),
        prop::string::string_regex("[a-z]{1,12}").expect("Invalid regex"),
        prop::collection::vec(prop::string::string_regex("[a-z]{1,8}").expect("Invalid regex"), 0..3),
        prop::collection::vec(any::<u8>(), 0..64),
    )
        .prop_map(|(target_class, method_name, parameter_types, args)| Invocation {
            target_class,
            method_name,
            parameter_types,
            args,
        })
}

/// Strategy for transactions of `app_name`, with unset timestamps.
pub fn transaction_strategy(app_name: String) -> impl Strategy<Value = Transaction> {
    (any::<u64>(), status_strategy(), trans_type_strategy(), 0u32..10, 0u32..10).prop_map(
        move |(trans_id, status, trans_type, version, retry)| {
            let mut tx = Transaction::new(trans_id, app_name.clone())
                .with_status(status)
                .with_trans_type(trans_type);
            tx.version = version;
            tx.retry = retry;
            tx
        },
    )
}

/// Strategy for participants of `app_name`, with unset timestamps.
pub fn participant_strategy(app_name: String) -> impl Strategy<Value = Participant> {
    (
        any::<u64>(),
        any::<u64>(),
        proptest::option::of(any::<u64>()),
        status_strategy(),
        trans_type_strategy(),
        proptest::option::of(invocation_strategy()),
        proptest::option::of(invocation_strategy()),
    )
        .prop_map(
            move |(participant_id, trans_id, ref_id, status, trans_type, confirm, cancel)| {
                let mut p = Participant::new(participant_id, trans_id, app_name.clone())
                    .with_status(status)
                    .with_trans_type(trans_type);
                p.participant_ref_id = ref_id;
                p.confirm_method = confirm.as_ref().map(|i| i.method_name.clone());
                p.cancel_method = cancel.as_ref().map(|i| i.method_name.clone());
                p.confirm_invocation = confirm;
                p.cancel_invocation = cancel;
                p
            },
        )
}

/// Strategy for undo records, with unset timestamps.
pub fn undo_strategy() -> impl Strategy<Value = ParticipantUndo> {
    (
        any::<u64>(),
        any::<u64>(),
        any::<u64>(),
        status_strategy(),
        prop::collection::vec(any::<u8>(), 0..256),
    )
        .prop_map(|(undo_id, participant_id, trans_id, status, payload)| {
            ParticipantUndo::new(undo_id, participant_id, trans_id)
                .with_status(status)
                .with_payload(payload)
        })
}
