//! # Telesweep
//!
//! Telesweep drives the lifecycle of AWS resources from Rust and cleans up
//! after the acceptance tests that exercise them.
//!
//! It provides two things:
//!
//! - **Resource lifecycles**: typed local definitions (see [`Resource`]) that
//!   translate directly into AWS SDK calls for create, read, update, delete
//!   and import. There is no wrapper layer or plan engine between your code
//!   and the platform API.
//! - **Sweepers**: bulk deletion of leftover test resources. Each resource
//!   type implements [`Sweepable`] once (list a page, describe an item,
//!   delete an item) and a generic driver pages through the remote objects,
//!   builds a [`SweepResource`] for each and hands the batch to the
//!   [`SweepOrchestrator`], which deletes them with bounded concurrency and
//!   aggregates every failure into a single [`Errors`] value.
//!
//! ## Usage
//!
//! Sweepers are typically run from the `sweeper` command line program after
//! an acceptance test run, against one or more regions:
//!
//! ```sh
//! RUST_LOG=info sweeper run --region us-west-2 --sweep-run aws_auditmanager_control
//! ```
//!
//! Sweepers declare dependencies on other sweepers by name. [`Sweepers`]
//! orders them into batches so that a sweeper only runs after everything it
//! depends on.
//!
//! ## Error Handling
//!
//! Telesweep exposes an error enum [`Error`], which encompasses all errors
//! that may occur during operations. Remote failures are normalized into
//! [`ApiError`], which knows whether an error means "already gone"
//! ([`ApiError::is_not_found`]) or "this sweep cannot run here"
//! ([`ApiError::skip_sweep`]).
use std::future::Future;

pub use telesweep_derive::Identity;

pub mod acctest;
pub mod api;
pub mod attributes;
pub mod aws;
pub mod config;
pub mod orchestrator;
pub mod paginate;
pub mod sweeper;

pub use api::ApiError;
pub use attributes::{Attributes, Id, Identity};
pub use config::SweepConfig;
pub use orchestrator::{sweep_orchestrator, Errors, SweepOrchestrator, SweepResource};
pub use paginate::{Page, Paginator};
pub use sweeper::{
    sweep, RegionalClients, SweepOutcome, SweepRecord, SweepReport, SweepStatus, Sweepable,
    Sweepers,
};

/// Marker trait for userland errors.
pub trait UserError: core::fmt::Display + core::fmt::Debug + Send + Sync + 'static {}
impl<T: core::fmt::Display + core::fmt::Debug + Send + Sync + 'static> UserError for T {}

fn chain(error: &anyhow::Error) -> String {
    error
        .chain()
        .map(|e| format!("{e}"))
        .collect::<Vec<_>>()
        .join("\n -> ")
}

/// Top-level error enum that encompasses all errors.
#[derive(snafu::Snafu, Debug)]
#[snafu(visibility(pub(crate)))]
pub enum Error {
    #[snafu(display("{}", chain(error)))]
    Sdk { error: anyhow::Error },

    #[snafu(display("{source}"))]
    Api { source: ApiError },

    #[snafu(display("{resource_type} '{id}' not found"))]
    NotFound { resource_type: &'static str, id: String },

    #[snafu(display("Could not retrieve {description} in {region}: {source}"))]
    List {
        description: &'static str,
        region: String,
        source: ApiError,
    },

    #[snafu(display("Could not delete {resource_type} ({attributes}): {source}"))]
    Delete {
        resource_type: &'static str,
        attributes: Attributes,
        source: Box<Error>,
    },

    #[snafu(display("Delete task did not complete: {msg}"))]
    DeleteTask { msg: String },

    #[snafu(display("Error sweeping {description} for {region}: {source}"))]
    Sweep {
        description: &'static str,
        region: String,
        source: Errors,
    },

    #[snafu(display("Sweeper '{name}' in {region} did not complete: {msg}"))]
    SweeperTask {
        name: &'static str,
        region: String,
        msg: String,
    },

    #[snafu(display("Could not create a client for region '{region}': {msg}"))]
    Client { region: String, msg: String },

    #[snafu(display("Could not build sweeper schedule: {msg}"))]
    Schedule { msg: String },

    #[snafu(display("No sweeper is registered under the name '{name}'"))]
    UnknownSweeper { name: String },

    #[snafu(display("Could not read config file '{path:?}': {source}"))]
    ConfigRead {
        path: std::path::PathBuf,
        source: std::io::Error,
    },

    #[snafu(display("Could not parse config file '{path:?}': {source}"))]
    ConfigParse {
        path: std::path::PathBuf,
        source: toml::de::Error,
    },

    #[snafu(display("Error during '{name}' creation: {}", chain(error)))]
    Create { name: String, error: anyhow::Error },

    #[snafu(display("Error during '{name}' read and import: {}", chain(error)))]
    Read { name: String, error: anyhow::Error },

    #[snafu(display("Error during '{name}' update: {}", chain(error)))]
    Update { name: String, error: anyhow::Error },

    #[snafu(display("Error during '{name}' destruction: {}", chain(error)))]
    Destroy { name: String, error: anyhow::Error },

    #[snafu(display("Timed out after {secs} seconds waiting for {what}"))]
    Timeout { what: String, secs: u64 },
}

impl From<anyhow::Error> for Error {
    fn from(error: anyhow::Error) -> Self {
        Error::Sdk { error }
    }
}

impl From<ApiError> for Error {
    fn from(source: ApiError) -> Self {
        Error::Api { source }
    }
}

/// Finds the first [`ApiError`] in an `anyhow` chain.
fn api_error_in(error: &anyhow::Error) -> Option<&ApiError> {
    error.chain().find_map(|e| e.downcast_ref::<ApiError>())
}

impl Error {
    /// Whether this error means the remote object does not exist.
    ///
    /// Deleting an object that is already gone counts as a successful
    /// deletion.
    pub fn is_not_found(&self) -> bool {
        match self {
            Error::NotFound { .. } => true,
            Error::Api { source } | Error::List { source, .. } => source.is_not_found(),
            Error::Delete { source, .. } => source.is_not_found(),
            Error::Sdk { error }
            | Error::Create { error, .. }
            | Error::Read { error, .. }
            | Error::Update { error, .. }
            | Error::Destroy { error, .. } => {
                if let Some(inner) = error.downcast_ref::<Error>() {
                    return inner.is_not_found();
                }
                api_error_in(error).is_some_and(ApiError::is_not_found)
            }
            _ => false,
        }
    }

    /// Whether this error means sweeping cannot run in this account or region.
    pub fn skip_sweep(&self) -> bool {
        match self {
            Error::Api { source } | Error::List { source, .. } => source.skip_sweep(),
            Error::Delete { source, .. } => source.skip_sweep(),
            Error::Sweep { source, .. } => !source.is_empty() && source.iter().all(Error::skip_sweep),
            Error::Sdk { error }
            | Error::Create { error, .. }
            | Error::Read { error, .. }
            | Error::Update { error, .. }
            | Error::Destroy { error, .. } => api_error_in(error).is_some_and(ApiError::skip_sweep),
            _ => false,
        }
    }
}

pub type Result<T, E = Error> = core::result::Result<T, E>;

/// IaC resources.
///
/// Represents a resource created on a platform, with the full
/// create/read/update/delete/import lifecycle.
pub trait Resource:
    core::fmt::Debug
    + Clone
    + PartialEq
    + serde::Serialize
    + serde::de::DeserializeOwned
    + Send
    + Sync
    + 'static
{
    /// Type of the platform/resource provider.
    ///
    /// For example [`aws::AwsClient`] in the case of amazon web services.
    type Provider;

    /// Errors that may occur interacting with the provider.
    type Error: UserError;

    /// The remote state of this resource, known after creation.
    type Output: core::fmt::Debug
        + Clone
        + PartialEq
        + serde::Serialize
        + serde::de::DeserializeOwned
        + 'static;

    /// Creates a new resource on the platform.
    fn create(
        &self,
        provider: &Self::Provider,
    ) -> impl Future<Output = Result<Self::Output, Self::Error>>;

    /// Reads the current state of a previously created resource from the
    /// platform, returning the refreshed local definition and remote state.
    fn read(
        provider: &Self::Provider,
        previous_remote: &Self::Output,
    ) -> impl Future<Output = Result<(Self, Self::Output), Self::Error>>;

    /// Updates an existing resource on the platform.
    ///
    /// Takes the previous local and remote states of the resource.
    fn update(
        &self,
        provider: &Self::Provider,
        previous_local: &Self,
        previous_remote: &Self::Output,
    ) -> impl Future<Output = Result<Self::Output, Self::Error>>;

    /// Deletes a resource from the platform.
    ///
    /// Deleting a resource that no longer exists succeeds.
    fn delete(
        &self,
        provider: &Self::Provider,
        previous_remote: &Self::Output,
    ) -> impl Future<Output = Result<(), Self::Error>>;

    /// Imports a pre-existing resource from the platform by its identifier.
    fn import(
        provider: &Self::Provider,
        id: &str,
    ) -> impl Future<Output = Result<(Self, Self::Output), Self::Error>>;
}

/// Logs the difference between two local definitions, one line per change.
pub(crate) fn log_update<T: core::fmt::Debug + PartialEq>(name: &str, previous: &T, next: &T) {
    let cmp = pretty_assertions::Comparison::new(previous, next);
    let change_string = format!("{cmp}")
        .lines()
        .map(|line| format!("  {line}"))
        .collect::<Vec<_>>()
        .join("\n");
    log::info!("updating '{name}':\n{change_string}");
}
