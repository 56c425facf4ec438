//! Helpers for acceptance tests that talk to AWS.
//!
//! Acceptance tests create real resources and only run when `SWEEP_ACC` is
//! set. Everything they create is named with [`RESOURCE_PREFIX`] so that a
//! later sweep can find it.
use crate::Error;

/// Prefix of every name an acceptance test creates.
pub const RESOURCE_PREFIX: &str = "tf-acc-test";

/// Set to any non-empty value to run acceptance tests.
pub const ACC_ENV: &str = "SWEEP_ACC";

pub fn enabled() -> bool {
    std::env::var(ACC_ENV).is_ok_and(|value| !value.is_empty())
}

/// Whether `test` should be skipped, logging why.
pub fn skip(test: &str) -> bool {
    if enabled() {
        false
    } else {
        log::warn!("skipping acceptance test {test}, set {ACC_ENV}=1 to run it");
        true
    }
}

/// A fixture that must exist before a test runs, for example an IAM role.
pub fn fixture(name: &str) -> Option<String> {
    match std::env::var(name) {
        Ok(value) if !value.is_empty() => Some(value),
        _ => {
            log::warn!("missing acceptance test fixture {name}");
            None
        }
    }
}

/// `prefix` followed by a random suffix.
pub fn random_with_prefix(prefix: &str) -> String {
    let suffix = uuid::Uuid::new_v4().simple().to_string();
    format!("{prefix}-{}", &suffix[..12])
}

/// A random name a sweep will recognize as test debris.
pub fn random_name() -> String {
    random_with_prefix(RESOURCE_PREFIX)
}

/// Whether `error` means the service is not available for this test run,
/// in which case the test is skipped rather than failed.
pub fn pre_check_skip(test: &str, error: &Error) -> bool {
    if error.skip_sweep() {
        log::warn!("skipping acceptance test {test}: {error}");
        true
    } else {
        false
    }
}
