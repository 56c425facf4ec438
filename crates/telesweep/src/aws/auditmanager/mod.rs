//! AWS Audit Manager.
use crate::ApiError;

pub mod control;
pub mod sweep;

pub use control::{Control, ControlMappingSource, ControlOutput};

/// Whether `error` means Audit Manager has not been set up in this account
/// and region, for example:
///
/// `AccessDeniedException: Please complete AWS Audit Manager setup from home
/// page to enable this action in this account.`
pub fn is_complete_setup_error(error: &ApiError) -> bool {
    error.is_code("AccessDeniedException")
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn complete_setup() {
        assert!(is_complete_setup_error(&ApiError::service(
            "AccessDeniedException",
            "Please complete AWS Audit Manager setup from home page to enable this action in this account."
        )));
        assert!(!is_complete_setup_error(&ApiError::service(
            "ValidationException",
            "bad"
        )));
    }
}
