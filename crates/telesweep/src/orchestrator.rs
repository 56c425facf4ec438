//! Bounded concurrency deletion of disposal descriptors.
use std::{future::Future, pin::Pin, sync::Arc};

use tokio::{sync::Semaphore, task::JoinSet};

use crate::{config, Attributes, Error, Identity, Result, Sweepable};

/// A boxed, sendable deletion.
pub type DeleteFuture = Pin<Box<dyn Future<Output = Result<()>> + Send>>;

/// One remote object slated for deletion.
///
/// Built while listing, consumed exactly once by a [`SweepOrchestrator`].
pub struct SweepResource {
    resource_type: &'static str,
    attributes: Attributes,
    delete: Box<dyn FnOnce() -> DeleteFuture + Send>,
}

impl core::fmt::Debug for SweepResource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SweepResource")
            .field("resource_type", &self.resource_type)
            .field("attributes", &self.attributes)
            .finish_non_exhaustive()
    }
}

impl SweepResource {
    /// Binds `identity` to the delete routine of `S` and a shared client.
    pub fn new<S: Sweepable>(client: Arc<S::Client>, identity: S::Identity) -> Self {
        let attributes = identity.attributes();
        Self::from_fn(S::NAME, attributes, move || async move {
            S::delete(&client, &identity).await
        })
    }

    /// A descriptor with an arbitrary delete routine.
    pub fn from_fn<F>(
        resource_type: &'static str,
        attributes: Attributes,
        delete: impl FnOnce() -> F + Send + 'static,
    ) -> Self
    where
        F: Future<Output = Result<()>> + Send + 'static,
    {
        SweepResource {
            resource_type,
            attributes,
            delete: Box::new(move || Box::pin(delete()) as DeleteFuture),
        }
    }

    pub fn resource_type(&self) -> &'static str {
        self.resource_type
    }

    pub fn attributes(&self) -> &Attributes {
        &self.attributes
    }
}

/// An ordered collection of failures, reported as one.
#[derive(Debug, Default)]
pub struct Errors {
    errors: Vec<Error>,
}

impl Errors {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, error: Error) {
        self.errors.push(error);
    }

    pub fn extend(&mut self, errors: Errors) {
        self.errors.extend(errors.errors);
    }

    pub fn iter(&self) -> impl Iterator<Item = &Error> {
        self.errors.iter()
    }

    pub fn len(&self) -> usize {
        self.errors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.errors.is_empty()
    }

    /// `Ok` when nothing was collected.
    pub fn into_result(self) -> Result<(), Errors> {
        if self.errors.is_empty() {
            Ok(())
        } else {
            Err(self)
        }
    }
}

impl IntoIterator for Errors {
    type Item = Error;
    type IntoIter = std::vec::IntoIter<Error>;

    fn into_iter(self) -> Self::IntoIter {
        self.errors.into_iter()
    }
}

impl FromIterator<Error> for Errors {
    fn from_iter<T: IntoIterator<Item = Error>>(iter: T) -> Self {
        Errors {
            errors: iter.into_iter().collect(),
        }
    }
}

impl core::fmt::Display for Errors {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self.errors.len() {
            1 => f.write_str("1 error occurred:")?,
            n => write!(f, "{n} errors occurred:")?,
        }
        for error in self.errors.iter() {
            write!(f, "\n\t* {error}")?;
        }
        Ok(())
    }
}

impl std::error::Error for Errors {}

/// Executes deletions with at most `width` in flight.
#[derive(Clone, Copy, Debug)]
pub struct SweepOrchestrator {
    width: usize,
}

impl SweepOrchestrator {
    /// A `width` of zero is raised to one.
    pub fn new(width: usize) -> Self {
        SweepOrchestrator {
            width: width.max(1),
        }
    }

    pub fn width(&self) -> usize {
        self.width
    }

    /// Deletes every resource, collecting failures in descriptor order.
    ///
    /// Objects that are already gone count as deleted. A delete routine that
    /// panics fails only its own descriptor.
    pub async fn run(&self, resources: Vec<SweepResource>) -> Result<(), Errors> {
        let semaphore = Arc::new(Semaphore::new(self.width));
        let mut set = JoinSet::new();
        let mut details = Vec::with_capacity(resources.len());
        for (index, resource) in resources.into_iter().enumerate() {
            let SweepResource {
                resource_type,
                attributes,
                delete,
            } = resource;
            details.push((resource_type, attributes.clone()));
            let semaphore = semaphore.clone();
            set.spawn(async move {
                // The semaphore is never closed.
                let _permit = semaphore.acquire_owned().await.ok();
                log::info!("deleting {resource_type} ({attributes})");
                let result = match tokio::spawn(delete()).await {
                    Ok(result) => result,
                    Err(e) => Err(Error::DeleteTask { msg: e.to_string() }),
                };
                (index, result)
            });
        }

        let mut results: Vec<Option<Result<()>>> = details.iter().map(|_| None).collect();
        while let Some(joined) = set.join_next().await {
            match joined {
                Ok((index, result)) => results[index] = Some(result),
                Err(e) => log::error!("delete task failed to join: {e}"),
            }
        }

        let mut errors = Errors::new();
        for ((resource_type, attributes), result) in details.into_iter().zip(results) {
            let error = match result {
                Some(Ok(())) => {
                    log::debug!("deleted {resource_type} ({attributes})");
                    continue;
                }
                Some(Err(e)) if e.is_not_found() => {
                    log::info!("{resource_type} ({attributes}) already deleted");
                    continue;
                }
                Some(Err(e)) => e,
                None => Error::DeleteTask {
                    msg: "task did not complete".to_owned(),
                },
            };
            log::error!("failed to delete {resource_type} ({attributes}): {error}");
            errors.push(Error::Delete {
                resource_type,
                attributes,
                source: Box::new(error),
            });
        }
        errors.into_result()
    }
}

/// Deletes `resources` with the process-wide concurrency.
pub async fn sweep_orchestrator(resources: Vec<SweepResource>) -> Result<(), Errors> {
    SweepOrchestrator::new(config::concurrency())
        .run(resources)
        .await
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::ApiError;

    fn resource(id: &str, result: Result<()>) -> SweepResource {
        SweepResource::from_fn("test_thing", Attributes::new().with("id", id), move || async move {
            result
        })
    }

    #[tokio::test]
    async fn all_succeed() {
        let resources = (0..25).map(|i| resource(&i.to_string(), Ok(()))).collect();
        assert!(SweepOrchestrator::new(4).run(resources).await.is_ok());
    }

    #[tokio::test]
    async fn empty_batch_succeeds() {
        assert!(sweep_orchestrator(vec![]).await.is_ok());
    }

    #[tokio::test]
    async fn failures_in_descriptor_order() {
        let throttled =
            || -> Result<()> { Err(ApiError::service("ThrottlingException", "Rate exceeded").into()) };
        let resources = vec![
            resource("a", Ok(())),
            resource("b", throttled()),
            resource("c", Ok(())),
            resource("d", throttled()),
        ];
        let errors = SweepOrchestrator::new(2).run(resources).await.unwrap_err();
        assert_eq!(2, errors.len());
        let ids = errors
            .iter()
            .map(|e| match e {
                Error::Delete {
                    resource_type,
                    attributes,
                    ..
                } => {
                    assert_eq!("test_thing", *resource_type);
                    attributes.get("id").unwrap().to_owned()
                }
                e => panic!("unexpected {e}"),
            })
            .collect::<Vec<_>>();
        assert_eq!(vec!["b", "d"], ids);
        assert_eq!(
            "2 errors occurred:\n\
             \t* Could not delete test_thing (id=b): ThrottlingException: Rate exceeded\n\
             \t* Could not delete test_thing (id=d): ThrottlingException: Rate exceeded",
            errors.to_string()
        );
    }

    #[tokio::test]
    async fn not_found_is_success() {
        let resources = vec![
            resource("gone", Err(ApiError::service("NotFoundException", "").into())),
            resource(
                "gone-too",
                Err(Error::NotFound {
                    resource_type: "test_thing",
                    id: "gone-too".to_owned(),
                }),
            ),
        ];
        assert!(SweepOrchestrator::new(1).run(resources).await.is_ok());
    }

    #[tokio::test]
    async fn panic_fails_only_its_descriptor() {
        let resources = vec![
            resource("a", Ok(())),
            SweepResource::from_fn("test_thing", Attributes::new().with("id", "boom"), || async {
                if true {
                    panic!("boom");
                }
                Ok(())
            }),
            resource("c", Ok(())),
        ];
        let errors = SweepOrchestrator::new(3).run(resources).await.unwrap_err();
        assert_eq!(1, errors.len());
        let error = errors.into_iter().next().unwrap();
        assert!(matches!(
            &error,
            Error::Delete { source, .. } if matches!(source.as_ref(), Error::DeleteTask { .. })
        ));
    }

    #[test]
    fn zero_width_is_one() {
        assert_eq!(1, SweepOrchestrator::new(0).width());
    }

    #[test]
    fn single_error_display() {
        let errors: Errors = std::iter::once(Error::Schedule {
            msg: "cycle".to_owned(),
        })
        .collect();
        assert_eq!(
            "1 error occurred:\n\t* Could not build sweeper schedule: cycle",
            errors.to_string()
        );
    }
}
