//! Remote API errors.
//!
//! Every SDK error is normalized into an [`ApiError`] so that the sweep
//! machinery can classify failures without knowing which service they came
//! from.

/// How a remote call failed.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ApiErrorKind {
    /// The service answered with an error response.
    Service,
    /// The request never got a response (DNS, credentials, connection, timeout).
    Transport,
    /// Anything else, for example a request that could not be constructed.
    Other,
}

/// A normalized remote API failure.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ApiError {
    kind: ApiErrorKind,
    code: Option<String>,
    message: Option<String>,
    detail: String,
}

/// Error codes that mean a sweep cannot run in this account, partition or
/// region, optionally qualified by a fragment of the error message.
const SKIP_SWEEP: &[(&str, Option<&str>)] = &[
    // GovCloud endpoints commonly answer with a bare AccessDeniedException.
    ("AccessDeniedException", None),
    ("UnsupportedOperation", None),
    ("UnsupportedOperationException", None),
    ("UnknownOperationException", None),
    ("UnrecognizedClientException", None),
    ("InvalidClientTokenId", None),
    ("InvalidAction", Some("is not available")),
    ("InvalidAction", Some("is not supported")),
    ("InvalidAction", Some("is not valid")),
    ("InvalidAction", Some("Unavailable Operation")),
    ("BadRequestException", Some("not supported")),
    ("InvalidParameterValue", Some("not permitted in this API version")),
    ("InvalidParameterValue", Some("Access Denied to API Version")),
    ("UnauthorizedException", Some("API is not available in")),
    ("ValidationException", Some("Account is not whitelisted")),
];

/// Fragments of transport failures that mean the endpoint or the
/// credentials are not there at all. Compared case-insensitively.
const SKIP_SWEEP_TRANSPORT: &[&str] = &[
    "dns error",
    "failed to lookup address",
    "no such host",
    "no credentials",
    "failed to load credentials",
    "credential provider was not enabled",
    "no providers in chain provided credentials",
];

const NOT_FOUND: &[&str] = &["ResourceNotFoundException", "NotFoundException", "NoSuchEntity"];

impl ApiError {
    /// An error response from the service.
    pub fn service(code: impl Into<String>, message: impl Into<String>) -> Self {
        let code = code.into();
        let message = message.into();
        let detail = if message.is_empty() {
            code.clone()
        } else {
            format!("{code}: {message}")
        };
        Self {
            kind: ApiErrorKind::Service,
            code: Some(code),
            message: Some(message).filter(|m| !m.is_empty()),
            detail,
        }
    }

    /// A failure to get any response from the service.
    pub fn transport(detail: impl Into<String>) -> Self {
        Self {
            kind: ApiErrorKind::Transport,
            code: None,
            message: None,
            detail: detail.into(),
        }
    }

    /// Any other failure.
    pub fn other(detail: impl Into<String>) -> Self {
        Self {
            kind: ApiErrorKind::Other,
            code: None,
            message: None,
            detail: detail.into(),
        }
    }

    /// Replaces the human readable detail, keeping code and message.
    pub fn with_detail(mut self, detail: impl Into<String>) -> Self {
        self.detail = detail.into();
        self
    }

    pub fn kind(&self) -> ApiErrorKind {
        self.kind
    }

    pub fn code(&self) -> Option<&str> {
        self.code.as_deref()
    }

    pub fn message(&self) -> Option<&str> {
        self.message.as_deref()
    }

    pub fn detail(&self) -> &str {
        &self.detail
    }

    /// Whether the service answered with the given error code.
    pub fn is_code(&self, code: &str) -> bool {
        self.code() == Some(code)
    }

    /// Whether the service answered with the given error code and a message
    /// containing `fragment`.
    pub fn is_code_with_message(&self, code: &str, fragment: &str) -> bool {
        self.is_code(code) && self.message().is_some_and(|m| m.contains(fragment))
    }

    /// Whether this error means the remote object does not exist.
    pub fn is_not_found(&self) -> bool {
        NOT_FOUND.iter().any(|code| self.is_code(code))
    }

    /// Whether this error means sweeping cannot run here at all, in which
    /// case the sweep ends successfully without deleting anything.
    pub fn skip_sweep(&self) -> bool {
        match self.kind {
            ApiErrorKind::Service => SKIP_SWEEP.iter().any(|(code, fragment)| match fragment {
                Some(fragment) => self.is_code_with_message(code, fragment),
                None => self.is_code(code),
            }),
            ApiErrorKind::Transport | ApiErrorKind::Other => {
                let detail = self.detail.to_lowercase();
                SKIP_SWEEP_TRANSPORT
                    .iter()
                    .any(|fragment| detail.contains(fragment))
            }
        }
    }
}

impl core::fmt::Display for ApiError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.detail)
    }
}

impl std::error::Error for ApiError {}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn bare_access_denied_skips() {
        let err = ApiError::service(
            "AccessDeniedException",
            "Please complete AWS Audit Manager setup from home page to enable this action in this account.",
        );
        assert!(err.skip_sweep());
        assert!(!err.is_not_found());
    }

    #[test]
    fn qualified_codes_need_their_message() {
        let supported = ApiError::service("InvalidAction", "The action is fine");
        assert!(!supported.skip_sweep());

        let unsupported = ApiError::service(
            "InvalidAction",
            "Operation (ListPlatformApplications) is not supported in this region",
        );
        assert!(unsupported.skip_sweep());

        let vpc_link = ApiError::service(
            "BadRequestException",
            "vpc link not supported for region us-gov-west-1",
        );
        assert!(vpc_link.skip_sweep());
    }

    #[test]
    fn throttling_does_not_skip() {
        let err = ApiError::service("ThrottlingException", "Rate exceeded");
        assert!(!err.skip_sweep());
        assert!(!err.is_not_found());
    }

    #[test]
    fn transport_failures_skip_on_dns_and_credentials() {
        let dns = ApiError::transport(
            "dispatch failure: io error: error trying to connect: dns error: failed to lookup address information",
        );
        assert!(dns.skip_sweep());

        let creds = ApiError::transport("dispatch failure: other: No credentials in the property bag");
        assert!(creds.skip_sweep());

        let reset = ApiError::transport("dispatch failure: io error: connection reset by peer");
        assert!(!reset.skip_sweep());
    }

    #[test]
    fn not_found_codes() {
        assert!(ApiError::service("NotFoundException", "Channel not found").is_not_found());
        assert!(ApiError::service("ResourceNotFoundException", "").is_not_found());
        assert!(!ApiError::transport("ResourceNotFoundException").is_not_found());
    }

    #[test]
    fn display_is_code_and_message() {
        let err = ApiError::service("ConflictException", "Channel is running");
        assert_eq!("ConflictException: Channel is running", err.to_string());
        assert_eq!(
            "ConflictException",
            ApiError::service("ConflictException", "").to_string()
        );
    }
}
