//! Telesweep for AWS.
use std::{
    collections::{BTreeMap, HashMap},
    sync::{Arc, OnceLock},
};

pub use aws_config::SdkConfig;
use aws_config::{BehaviorVersion, Region};
use aws_smithy_runtime_api::client::result::SdkError;
use aws_smithy_types::error::{display::DisplayErrorContext, metadata::ProvideErrorMetadata};
use tokio::sync::Mutex;

use crate::{ApiError, Error, RegionalClients, Result, Sweepers};

pub mod auditmanager;
pub mod medialive;

/// A region-bound handle to AWS.
///
/// Service clients are created on first use and shared afterwards.
pub struct AwsClient {
    region: String,
    config: SdkConfig,
    auditmanager: OnceLock<aws_sdk_auditmanager::Client>,
    medialive: OnceLock<aws_sdk_medialive::Client>,
}

impl core::fmt::Debug for AwsClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AwsClient")
            .field("region", &self.region)
            .finish_non_exhaustive()
    }
}

impl AsRef<SdkConfig> for AwsClient {
    fn as_ref(&self) -> &SdkConfig {
        &self.config
    }
}

impl AwsClient {
    pub fn new(region: impl Into<String>, config: SdkConfig) -> Self {
        AwsClient {
            region: region.into(),
            config,
            auditmanager: OnceLock::new(),
            medialive: OnceLock::new(),
        }
    }

    /// Loads credentials and settings from the standard AWS configuration
    /// chain, optionally from a named profile.
    pub async fn load(region: &str, profile: Option<&str>) -> Result<Self> {
        if region.is_empty() {
            return Err(Error::Client {
                region: region.to_owned(),
                msg: "region must not be empty".to_owned(),
            });
        }
        let mut loader =
            aws_config::defaults(BehaviorVersion::latest()).region(Region::new(region.to_owned()));
        if let Some(profile) = profile {
            loader = loader.profile_name(profile);
        }
        log::debug!("loading aws config for {region}");
        Ok(Self::new(region, loader.load().await))
    }

    pub fn region(&self) -> &str {
        &self.region
    }

    pub fn auditmanager(&self) -> &aws_sdk_auditmanager::Client {
        self.auditmanager
            .get_or_init(|| aws_sdk_auditmanager::Client::new(&self.config))
    }

    pub fn medialive(&self) -> &aws_sdk_medialive::Client {
        self.medialive
            .get_or_init(|| aws_sdk_medialive::Client::new(&self.config))
    }
}

/// Per region [`AwsClient`]s, cached for the life of the process.
#[derive(Debug, Default)]
pub struct SharedClients {
    profile: Option<String>,
    clients: Mutex<HashMap<String, Arc<AwsClient>>>,
}

impl SharedClients {
    pub fn new(profile: Option<String>) -> Self {
        SharedClients {
            profile,
            clients: Mutex::default(),
        }
    }
}

impl RegionalClients for SharedClients {
    type Client = AwsClient;

    async fn client(&self, region: &str) -> Result<Arc<AwsClient>> {
        let mut clients = self.clients.lock().await;
        if let Some(client) = clients.get(region) {
            return Ok(client.clone());
        }
        let client = Arc::new(AwsClient::load(region, self.profile.as_deref()).await?);
        clients.insert(region.to_owned(), client.clone());
        Ok(client)
    }
}

impl<E, R> From<SdkError<E, R>> for ApiError
where
    E: ProvideErrorMetadata + std::error::Error + 'static,
    R: core::fmt::Debug,
{
    fn from(error: SdkError<E, R>) -> Self {
        let detail = DisplayErrorContext(&error).to_string();
        if let Some(service_error) = error.as_service_error() {
            log::trace!("service error: {detail}");
            return ApiError::service(
                service_error.code().unwrap_or("Unknown"),
                service_error.message().unwrap_or_default(),
            );
        }
        match error {
            SdkError::DispatchFailure(_) | SdkError::TimeoutError(_) => ApiError::transport(detail),
            _ => ApiError::other(detail),
        }
    }
}

impl<E, R> From<SdkError<E, R>> for Error
where
    E: ProvideErrorMetadata + std::error::Error + 'static,
    R: core::fmt::Debug,
{
    fn from(error: SdkError<E, R>) -> Self {
        Error::Api {
            source: error.into(),
        }
    }
}

/// Normalizes SDK accessors, which return `&T` for required members and
/// `Option<&T>` otherwise.
pub(crate) trait Present<T> {
    fn present(self) -> Option<T>;
}

impl<'a, T: ?Sized> Present<&'a T> for &'a T {
    fn present(self) -> Option<&'a T> {
        Some(self)
    }
}

impl<T> Present<T> for Option<T> {
    fn present(self) -> Option<T> {
        self
    }
}

/// Converts an optional SDK enum value into its local mirror.
pub(crate) fn mirror<'a, A: 'a, L>(value: Option<&'a A>) -> anyhow::Result<Option<L>>
where
    L: TryFrom<&'a A, Error = anyhow::Error>,
{
    value.map(L::try_from).transpose()
}

/// Declares a local mirror of an SDK string enum, converted through the
/// wire value so that unknown values are reported instead of dropped.
macro_rules! aws_enum {
    ($(#[$meta:meta])* $name:ident => $aws:path { $($variant:ident = $value:literal),+ $(,)? }) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
        pub enum $name {
            $(
                #[serde(rename = $value)]
                $variant,
            )+
        }

        impl $name {
            pub fn as_str(&self) -> &'static str {
                match self {
                    $($name::$variant => $value,)+
                }
            }
        }

        impl From<$name> for $aws {
            fn from(value: $name) -> Self {
                <$aws>::from(value.as_str())
            }
        }

        impl TryFrom<&$aws> for $name {
            type Error = anyhow::Error;

            fn try_from(value: &$aws) -> anyhow::Result<Self> {
                match value.as_str() {
                    $($value => Ok($name::$variant),)+
                    other => anyhow::bail!("unsupported {} '{other}'", stringify!($name)),
                }
            }
        }
    };
}
pub(crate) use aws_enum;

/// Tags to set and tag keys to remove to get from `old` to `new`.
pub(crate) fn tag_changes(
    old: &BTreeMap<String, String>,
    new: &BTreeMap<String, String>,
) -> (HashMap<String, String>, Vec<String>) {
    let set = new
        .iter()
        .filter(|(key, value)| old.get(*key) != Some(*value))
        .map(|(key, value)| (key.clone(), value.clone()))
        .collect();
    let remove = old
        .keys()
        .filter(|key| !new.contains_key(*key))
        .cloned()
        .collect();
    (set, remove)
}

/// Every AWS sweeper.
pub fn sweepers() -> Sweepers<AwsClient> {
    Sweepers::new()
        .with::<auditmanager::sweep::Assessments>()
        .with::<auditmanager::sweep::AssessmentDelegations>()
        .with::<auditmanager::sweep::AssessmentReports>()
        .with::<auditmanager::sweep::Controls>()
        .with::<auditmanager::sweep::Frameworks>()
        .with::<auditmanager::sweep::FrameworkShares>()
        .with::<medialive::sweep::Channels>()
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn registers_every_sweeper() {
        let sweepers = sweepers();
        assert_eq!(7, sweepers.len());
        let names = sweepers.iter().map(|r| r.name).collect::<Vec<_>>();
        assert!(names.contains(&"aws_auditmanager_assessment_delegation"));
        assert!(names.contains(&"aws_medialive_channel"));
    }

    #[test]
    fn assessments_run_after_controls_and_frameworks() {
        let batches = sweepers().schedule(&["aws_auditmanager_assessment"]).unwrap();
        assert_eq!(
            vec![
                vec!["aws_auditmanager_control", "aws_auditmanager_framework"],
                vec!["aws_auditmanager_assessment"],
            ],
            batches
        );
    }

    #[test]
    fn tag_changes_sets_and_removes() {
        let old = BTreeMap::from([
            ("keep".to_owned(), "1".to_owned()),
            ("change".to_owned(), "1".to_owned()),
            ("drop".to_owned(), "1".to_owned()),
        ]);
        let new = BTreeMap::from([
            ("keep".to_owned(), "1".to_owned()),
            ("change".to_owned(), "2".to_owned()),
            ("add".to_owned(), "3".to_owned()),
        ]);
        let (set, remove) = tag_changes(&old, &new);
        assert_eq!(
            HashMap::from([
                ("change".to_owned(), "2".to_owned()),
                ("add".to_owned(), "3".to_owned()),
            ]),
            set
        );
        assert_eq!(vec!["drop".to_owned()], remove);

        let (set, remove) = tag_changes(&new, &new);
        assert!(set.is_empty() && remove.is_empty());
    }

    #[tokio::test]
    async fn empty_region_is_a_client_error() {
        let clients = SharedClients::new(None);
        let err = clients.client("").await.unwrap_err();
        assert!(matches!(err, Error::Client { .. }), "{err}");
    }
}
