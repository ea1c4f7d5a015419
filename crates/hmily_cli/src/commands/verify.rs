//! Verify command implementation.

use super::{CliError, Target};

/// Runs the verify command.
pub fn run(target: &Target) -> Result<(), Box<dyn std::error::Error>> {
    println!("Verifying repository at {:?}", target.path());
    println!();

    let repo = target.open()?;
    let problems = repo.verify();
    for problem in &problems {
        println!("  {problem}");
    }

    println!();
    if problems.is_empty() {
        println!("✓ Repository verification passed");
        Ok(())
    } else {
        println!("✗ Repository verification failed");
        Err(CliError::VerificationFailed {
            count: problems.len(),
        }
        .into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commands::test_support::populated;
    use std::fs;

    #[test]
    fn clean_repository_passes() {
        let (_temp, target) = populated();
        assert!(run(&target).is_ok());
    }

    #[test]
    fn corrupt_record_fails() {
        let (temp, target) = populated();
        fs::write(temp.path().join("hmily").join("1"), b"").unwrap();

        let err = run(&target).unwrap_err();
        assert!(err.to_string().contains("1 unreadable"));
    }
}
