//! Benchmarks for the Hmily transaction repository.
//!
//! Run with `cargo bench -p hmily_bench`.

#![deny(unsafe_code)]
#![warn(missing_docs)]

use hmily_repository::{HmilyAction, Invocation, Participant};

/// A participant shaped like the ones coordinators store, with invocation
/// arguments of `args_len` bytes.
pub fn sample_participant(participant_id: u64, args_len: usize) -> Participant {
    let invocation = |method: &str| Invocation {
        target_class: "com.example.account.AccountService".to_string(),
        method_name: method.to_string(),
        parameter_types: vec!["AccountDTO".to_string()],
        args: (0..args_len).map(|i| (i % 256) as u8).collect(),
    };
    let mut p = Participant::new(participant_id, participant_id / 10, "bench")
        .with_status(HmilyAction::Trying);
    p.target_class = Some("com.example.account.AccountService".to_string());
    p.target_method = Some("payment".to_string());
    p.confirm_method = Some("confirm".to_string());
    p.cancel_method = Some("cancel".to_string());
    p.confirm_invocation = Some(invocation("confirm"));
    p.cancel_invocation = Some(invocation("cancel"));
    p
}
