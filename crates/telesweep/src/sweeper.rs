//! Sweepers: bulk deletion of leftover remote objects, one resource type at
//! a time.
use std::{collections::HashMap, future::Future, pin::Pin, sync::Arc};

use snafu::OptionExt;
use tokio::task::JoinSet;

use crate::{
    orchestrator::sweep_orchestrator, ApiError, Error, Errors, Identity, Paginator, Page, Result,
    SweepResource, UnknownSweeperSnafu,
};

/// A resource type that can be swept.
///
/// Implementors provide the three remote calls a sweep needs. The generic
/// [`sweep`] driver does everything else.
pub trait Sweepable: 'static {
    /// Region-scoped handle used for every call.
    type Client: Send + Sync + 'static;

    /// One item of a list call.
    type Summary: Send + 'static;

    /// Identifying fields needed to delete one object.
    type Identity: Identity;

    /// Registered sweeper name, for example `aws_auditmanager_control`.
    const NAME: &'static str;

    /// Human readable label, for example `AuditManager Controls`.
    const DESCRIPTION: &'static str;

    /// Names of the sweepers that must run before this one.
    const DEPENDENCIES: &'static [&'static str] = &[];

    /// Requests one page of summaries.
    fn list_page(
        client: &Self::Client,
        next_token: Option<String>,
    ) -> impl Future<Output = Result<Page<Self::Summary>, ApiError>> + Send;

    /// Extracts the identity of a listed object, if it has one.
    fn describe(summary: &Self::Summary) -> Option<Self::Identity>;

    /// Deletes one object.
    fn delete(
        client: &Self::Client,
        identity: &Self::Identity,
    ) -> impl Future<Output = Result<()>> + Send;

    /// Whether a listing error means the service is not enabled in this
    /// account or region, which is the same as there being nothing to sweep.
    fn is_service_not_enabled(_error: &ApiError) -> bool {
        false
    }
}

/// How a sweep ended, when it did not fail.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum SweepOutcome {
    /// Listed objects were handed to the orchestrator and all of them are
    /// gone.
    Swept { count: usize },
    /// The sweep cannot run in this account or region.
    Skipped { reason: String },
}

impl core::fmt::Display for SweepOutcome {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SweepOutcome::Swept { count: 1 } => f.write_str("swept 1 resource"),
            SweepOutcome::Swept { count } => write!(f, "swept {count} resources"),
            SweepOutcome::Skipped { reason } => write!(f, "skipped: {reason}"),
        }
    }
}

/// Sweeps every object of type `S` in `region`.
///
/// Lists page by page, describes each summary and deletes the results with
/// the process-wide concurrency.
pub async fn sweep<S: Sweepable>(region: &str, client: Arc<S::Client>) -> Result<SweepOutcome> {
    let list_client: &S::Client = &client;
    let mut paginator = Paginator::new(move |token| S::list_page(list_client, token));
    let mut resources = vec![];
    while paginator.has_more_pages() {
        let page = match paginator.next_page().await {
            Ok(page) => page,
            Err(e) if S::is_service_not_enabled(&e) => {
                log::warn!("{} not enabled in {region}: {e}", S::DESCRIPTION);
                return Ok(SweepOutcome::Swept { count: 0 });
            }
            Err(e) if e.skip_sweep() => {
                log::warn!("Skipping {} sweep for {region}: {e}", S::DESCRIPTION);
                return Ok(SweepOutcome::Skipped {
                    reason: e.to_string(),
                });
            }
            Err(source) => {
                return Err(Error::List {
                    description: S::DESCRIPTION,
                    region: region.to_owned(),
                    source,
                })
            }
        };
        for summary in page.iter() {
            match S::describe(summary) {
                Some(identity) => resources.push(SweepResource::new::<S>(client.clone(), identity)),
                None => log::warn!("{} in {region} has no identifier, skipping", S::NAME),
            }
        }
    }

    let count = resources.len();
    log::info!("sweeping {count} {} in {region}", S::DESCRIPTION);
    match sweep_orchestrator(resources).await {
        Ok(()) => Ok(SweepOutcome::Swept { count }),
        Err(errors) if errors.iter().all(Error::skip_sweep) => {
            log::warn!("Skipping {} sweep for {region}: {errors}", S::DESCRIPTION);
            Ok(SweepOutcome::Skipped {
                reason: errors.to_string(),
            })
        }
        Err(source) => Err(Error::Sweep {
            description: S::DESCRIPTION,
            region: region.to_owned(),
            source,
        }),
    }
}

/// Hands out region-scoped clients.
pub trait RegionalClients: Send + Sync {
    type Client: Send + Sync + 'static;

    fn client(&self, region: &str) -> impl Future<Output = Result<Arc<Self::Client>>> + Send;
}

type SweepFuture = Pin<Box<dyn Future<Output = Result<SweepOutcome>> + Send>>;

fn run_sweep<S: Sweepable>(region: String, client: Arc<S::Client>) -> SweepFuture {
    Box::pin(async move { sweep::<S>(&region, client).await })
}

/// A registered sweeper.
pub struct Registration<C> {
    pub name: &'static str,
    pub description: &'static str,
    pub dependencies: &'static [&'static str],
    run: fn(String, Arc<C>) -> SweepFuture,
}

impl<C> core::fmt::Debug for Registration<C> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Registration")
            .field("name", &self.name)
            .field("description", &self.description)
            .field("dependencies", &self.dependencies)
            .finish_non_exhaustive()
    }
}

/// What happened to one sweeper in one region.
#[derive(Clone, Debug, PartialEq, Eq, serde::Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum SweepStatus {
    Swept { count: usize },
    Skipped { reason: String },
    Failed,
}

impl From<SweepOutcome> for SweepStatus {
    fn from(outcome: SweepOutcome) -> Self {
        match outcome {
            SweepOutcome::Swept { count } => SweepStatus::Swept { count },
            SweepOutcome::Skipped { reason } => SweepStatus::Skipped { reason },
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, serde::Serialize)]
pub struct SweepRecord {
    pub region: String,
    pub name: &'static str,
    #[serde(flatten)]
    pub status: SweepStatus,
}

/// The result of [`Sweepers::run`].
#[derive(Debug, Default)]
pub struct SweepReport {
    /// Per region, per sweeper statuses in the order they ran.
    pub records: Vec<SweepRecord>,
    /// Every failure of the run.
    pub errors: Errors,
}

impl SweepReport {
    pub fn is_success(&self) -> bool {
        self.errors.is_empty()
    }

    pub fn status(&self, region: &str, name: &str) -> Option<&SweepStatus> {
        self.records
            .iter()
            .find(|r| r.region == region && r.name == name)
            .map(|r| &r.status)
    }

    fn record(&mut self, region: &str, name: &'static str, status: SweepStatus) {
        self.records.push(SweepRecord {
            region: region.to_owned(),
            name,
            status,
        });
    }
}

/// Registry of sweepers sharing a client type.
pub struct Sweepers<C> {
    registrations: Vec<Registration<C>>,
}

impl<C> Default for Sweepers<C> {
    fn default() -> Self {
        Sweepers {
            registrations: vec![],
        }
    }
}

impl<C: Send + Sync + 'static> Sweepers<C> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers `S`. A second registration under the same name is ignored.
    pub fn add<S: Sweepable<Client = C>>(&mut self) -> &mut Self {
        if self.get(S::NAME).is_some() {
            log::warn!("sweeper '{}' is already registered, ignoring", S::NAME);
            return self;
        }
        self.registrations.push(Registration {
            name: S::NAME,
            description: S::DESCRIPTION,
            dependencies: S::DEPENDENCIES,
            run: run_sweep::<S>,
        });
        self
    }

    pub fn with<S: Sweepable<Client = C>>(mut self) -> Self {
        self.add::<S>();
        self
    }

    pub fn get(&self, name: &str) -> Option<&Registration<C>> {
        self.registrations.iter().find(|r| r.name == name)
    }

    /// Registered sweepers, in registration order.
    pub fn iter(&self) -> impl Iterator<Item = &Registration<C>> {
        self.registrations.iter()
    }

    pub fn len(&self) -> usize {
        self.registrations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.registrations.is_empty()
    }

    fn index_of(&self, name: &str) -> Option<usize> {
        self.registrations.iter().position(|r| r.name == name)
    }

    /// Orders the sweepers named in `filter`, and everything they depend on,
    /// into batches. Every sweeper comes after all of its dependencies.
    ///
    /// An empty filter selects every registered sweeper.
    pub fn schedule(&self, filter: &[impl AsRef<str>]) -> Result<Vec<Vec<&'static str>>> {
        let mut queue = if filter.is_empty() {
            (0..self.registrations.len()).collect::<Vec<_>>()
        } else {
            filter
                .iter()
                .map(|name| {
                    let name = name.as_ref();
                    self.index_of(name).context(UnknownSweeperSnafu { name })
                })
                .collect::<Result<Vec<_>>>()?
        };

        let mut selected = vec![];
        while let Some(index) = queue.pop() {
            if selected.contains(&index) {
                continue;
            }
            selected.push(index);
            let registration = &self.registrations[index];
            for dependency in registration.dependencies {
                match self.index_of(dependency) {
                    Some(dependency) => queue.push(dependency),
                    None => log::warn!(
                        "sweeper '{}' depends on '{dependency}', which is not registered",
                        registration.name
                    ),
                }
            }
        }
        selected.sort_unstable();

        let mut dag: dagga::Dag<usize, usize> = dagga::Dag::default();
        for index in selected {
            let registration = &self.registrations[index];
            log::trace!("scheduling sweeper {}", registration.name);
            let node = dagga::Node::new(index)
                .with_name(registration.name)
                .with_reads(
                    registration
                        .dependencies
                        .iter()
                        .filter_map(|dependency| self.index_of(dependency)),
                )
                .with_result(index);
            dag.add_node(node);
        }
        let schedule = dag
            .build_schedule()
            .map_err(|e| Error::Schedule { msg: e.to_string() })?;

        Ok(schedule
            .batches
            .into_iter()
            .map(|batch| {
                let mut indices = batch
                    .into_iter()
                    .map(|node| node.into_inner())
                    .collect::<Vec<_>>();
                indices.sort_unstable();
                indices
                    .into_iter()
                    .map(|index| self.registrations[index].name)
                    .collect()
            })
            .collect())
    }

    /// Runs the scheduled sweepers in every region.
    ///
    /// Sweepers in the same batch run concurrently. A failure stops the
    /// remaining batches of that region unless `allow_failures` is set.
    pub async fn run<R>(
        &self,
        regions: &[String],
        clients: &R,
        filter: &[impl AsRef<str>],
        allow_failures: bool,
    ) -> Result<SweepReport>
    where
        R: RegionalClients<Client = C>,
    {
        let batches = self.schedule(filter)?;
        let mut report = SweepReport::default();
        for region in regions {
            log::info!("sweeping region {region}");
            let client = match clients.client(region).await {
                Ok(client) => client,
                Err(e) if e.skip_sweep() => {
                    log::warn!("Skipping region {region}: {e}");
                    for name in batches.iter().flatten() {
                        report.record(region, *name, SweepStatus::Skipped { reason: e.to_string() });
                    }
                    continue;
                }
                Err(e) => {
                    log::error!("could not create a client for {region}: {e}");
                    for name in batches.iter().flatten() {
                        report.record(region, *name, SweepStatus::Failed);
                    }
                    report.errors.push(e);
                    continue;
                }
            };

            for (i, batch) in batches.iter().enumerate() {
                log::debug!("running batch {i} in {region}: {batch:?}");
                let mut set = JoinSet::new();
                let mut names = HashMap::new();
                for &name in batch {
                    let Some(registration) = self.get(name) else {
                        continue;
                    };
                    let future = (registration.run)(region.clone(), client.clone());
                    let handle = set.spawn(future);
                    names.insert(handle.id(), name);
                }

                let mut results = vec![];
                while let Some(joined) = set.join_next_with_id().await {
                    match joined {
                        Ok((id, result)) => {
                            results.push((names.get(&id).copied().unwrap_or("unknown"), result))
                        }
                        Err(e) => {
                            let name = names.get(&e.id()).copied().unwrap_or("unknown");
                            results.push((
                                name,
                                Err(Error::SweeperTask {
                                    name,
                                    region: region.clone(),
                                    msg: e.to_string(),
                                }),
                            ));
                        }
                    }
                }
                results.sort_by_key(|(name, _)| batch.iter().position(|n| n == name));

                let mut failed = false;
                for (name, result) in results {
                    match result {
                        Ok(outcome) => {
                            log::info!("{name} in {region}: {outcome}");
                            report.record(region, name, outcome.into());
                        }
                        Err(e) => {
                            log::error!("{name} in {region} failed: {e}");
                            report.record(region, name, SweepStatus::Failed);
                            report.errors.push(e);
                            failed = true;
                        }
                    }
                }
                if failed && !allow_failures {
                    log::warn!("stopping sweep of {region} after failures in batch {i}");
                    break;
                }
            }
        }
        Ok(report)
    }
}
