//! MediaLive channels.
use std::{collections::BTreeMap, future::Future, time::Duration};

use anyhow::Context;
use aws_sdk_medialive::{operation::describe_channel::DescribeChannelOutput, types as aws};

use super::encoder::EncoderSettings;
use crate::{
    aws::{aws_enum, mirror, tag_changes, AwsClient, Present},
    log_update, ApiError, Error, Resource, Result,
};

const RESOURCE_TYPE: &str = "aws_medialive_channel";

pub const POLL_INTERVAL: Duration = Duration::from_secs(3);
pub const WAIT_TIMEOUT: Duration = Duration::from_secs(5 * 60);

aws_enum! {
    ChannelClass => aws::ChannelClass {
        Standard = "STANDARD",
        SinglePipeline = "SINGLE_PIPELINE",
    }
}

aws_enum! {
    LogLevel => aws::LogLevel {
        Error = "ERROR",
        Warning = "WARNING",
        Info = "INFO",
        Debug = "DEBUG",
        Disabled = "DISABLED",
    }
}

aws_enum! {
    InputCodec => aws::InputCodec {
        Mpeg2 = "MPEG2",
        Avc = "AVC",
        Hevc = "HEVC",
    }
}

aws_enum! {
    InputResolution => aws::InputResolution {
        Sd = "SD",
        Hd = "HD",
        Uhd = "UHD",
    }
}

aws_enum! {
    InputMaximumBitrate => aws::InputMaximumBitrate {
        Max10Mbps = "MAX_10_MBPS",
        Max20Mbps = "MAX_20_MBPS",
        Max50Mbps = "MAX_50_MBPS",
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct InputSpecification {
    pub codec: InputCodec,
    pub input_resolution: InputResolution,
    pub maximum_bitrate: InputMaximumBitrate,
}

impl From<&InputSpecification> for aws::InputSpecification {
    fn from(value: &InputSpecification) -> Self {
        aws::InputSpecification::builder()
            .codec(value.codec.into())
            .resolution(value.input_resolution.into())
            .maximum_bitrate(value.maximum_bitrate.into())
            .build()
    }
}

impl TryFrom<&aws::InputSpecification> for InputSpecification {
    type Error = anyhow::Error;

    fn try_from(value: &aws::InputSpecification) -> anyhow::Result<Self> {
        Ok(InputSpecification {
            codec: value.codec().present().context("missing codec")?.try_into()?,
            input_resolution: value
                .resolution()
                .present()
                .context("missing input resolution")?
                .try_into()?,
            maximum_bitrate: value
                .maximum_bitrate()
                .present()
                .context("missing maximum bitrate")?
                .try_into()?,
        })
    }
}

aws_enum! {
    InputSourceEndBehavior => aws::InputSourceEndBehavior {
        Continue = "CONTINUE",
        Loop = "LOOP",
    }
}

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct InputSettings {
    pub source_end_behavior: Option<InputSourceEndBehavior>,
}

#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct InputAttachment {
    pub input_attachment_name: String,
    pub input_id: String,
    pub input_settings: Option<InputSettings>,
}

impl From<&InputAttachment> for aws::InputAttachment {
    fn from(value: &InputAttachment) -> Self {
        aws::InputAttachment::builder()
            .input_attachment_name(&value.input_attachment_name)
            .input_id(&value.input_id)
            .set_input_settings(value.input_settings.map(|settings| {
                aws::InputSettings::builder()
                    .set_source_end_behavior(settings.source_end_behavior.map(Into::into))
                    .build()
            }))
            .build()
    }
}

impl TryFrom<&aws::InputAttachment> for InputAttachment {
    type Error = anyhow::Error;

    fn try_from(value: &aws::InputAttachment) -> anyhow::Result<Self> {
        Ok(InputAttachment {
            input_attachment_name: value
                .input_attachment_name()
                .present()
                .unwrap_or_default()
                .to_owned(),
            input_id: value.input_id().present().unwrap_or_default().to_owned(),
            input_settings: value
                .input_settings()
                .map(|settings| {
                    anyhow::Ok(InputSettings {
                        source_end_behavior: mirror(settings.source_end_behavior())?,
                    })
                })
                .transpose()?,
        })
    }
}

#[derive(Debug, Default, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct DestinationSettings {
    pub url: Option<String>,
    pub stream_name: Option<String>,
    pub username: Option<String>,
    pub password_param: Option<String>,
}

/// Where the outputs of a channel are sent.
///
/// A destination either lists urls in `settings` or names MediaPackage
/// channels in `media_package_channel_ids`.
#[derive(Debug, Default, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct Destination {
    pub id: String,
    pub settings: Vec<DestinationSettings>,
    #[serde(default)]
    pub media_package_channel_ids: Vec<String>,
}

fn non_empty<T>(items: Vec<T>) -> Option<Vec<T>> {
    (!items.is_empty()).then_some(items)
}

impl From<&Destination> for aws::OutputDestination {
    fn from(value: &Destination) -> Self {
        aws::OutputDestination::builder()
            .id(&value.id)
            .set_settings(non_empty(
                value
                    .settings
                    .iter()
                    .map(|s| {
                        aws::OutputDestinationSettings::builder()
                            .set_url(s.url.clone())
                            .set_stream_name(s.stream_name.clone())
                            .set_username(s.username.clone())
                            .set_password_param(s.password_param.clone())
                            .build()
                    })
                    .collect(),
            ))
            .set_media_package_settings(non_empty(
                value
                    .media_package_channel_ids
                    .iter()
                    .map(|id| {
                        aws::MediaPackageOutputDestinationSettings::builder()
                            .channel_id(id)
                            .build()
                    })
                    .collect(),
            ))
            .build()
    }
}

impl From<&aws::OutputDestination> for Destination {
    fn from(value: &aws::OutputDestination) -> Self {
        Destination {
            id: value.id().present().unwrap_or_default().to_owned(),
            settings: value
                .settings()
                .present()
                .unwrap_or_default()
                .iter()
                .map(|s| DestinationSettings {
                    url: s.url().present().map(str::to_owned),
                    stream_name: s.stream_name().present().map(str::to_owned),
                    username: s.username().present().map(str::to_owned),
                    password_param: s.password_param().present().map(str::to_owned),
                })
                .collect(),
            media_package_channel_ids: value
                .media_package_settings()
                .present()
                .unwrap_or_default()
                .iter()
                .filter_map(|s| s.channel_id().present().map(str::to_owned))
                .collect(),
        }
    }
}

/// A MediaLive channel.
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct Channel {
    pub name: String,
    pub channel_class: ChannelClass,
    pub role_arn: Option<String>,
    pub log_level: Option<LogLevel>,
    pub input_specification: InputSpecification,
    pub input_attachments: Vec<InputAttachment>,
    pub destinations: Vec<Destination>,
    pub encoder_settings: EncoderSettings,
    pub tags: BTreeMap<String, String>,
    /// Whether the channel should be running.
    #[serde(default)]
    pub start_channel: bool,
}

/// Known after creation.
#[derive(Debug, Default, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct ChannelOutput {
    pub channel_id: String,
    pub arn: String,
    pub state: String,
}

fn state_of(out: &DescribeChannelOutput) -> &str {
    out.state().present().map(|s| s.as_str()).unwrap_or_default()
}

impl ChannelOutput {
    fn from_describe(out: &DescribeChannelOutput) -> anyhow::Result<Self> {
        Ok(ChannelOutput {
            channel_id: out.id().present().context("channel missing id")?.to_owned(),
            arn: out.arn().present().unwrap_or_default().to_owned(),
            state: state_of(out).to_owned(),
        })
    }
}

impl Channel {
    /// Splits a described channel into its local definition and remote
    /// state.
    pub fn flatten(out: &DescribeChannelOutput) -> anyhow::Result<(Self, ChannelOutput)> {
        let channel = Channel {
            name: out.name().present().context("channel missing name")?.to_owned(),
            channel_class: out
                .channel_class()
                .present()
                .context("channel missing class")?
                .try_into()?,
            role_arn: out.role_arn().present().map(str::to_owned),
            log_level: out
                .log_level()
                .present()
                .map(TryInto::try_into)
                .transpose()?,
            input_specification: out
                .input_specification()
                .present()
                .context("channel missing input specification")?
                .try_into()?,
            input_attachments: out
                .input_attachments()
                .present()
                .unwrap_or_default()
                .iter()
                .map(InputAttachment::try_from)
                .collect::<anyhow::Result<_>>()?,
            destinations: out
                .destinations()
                .present()
                .unwrap_or_default()
                .iter()
                .map(Into::into)
                .collect(),
            encoder_settings: EncoderSettings::flatten(
                out.encoder_settings()
                    .present()
                    .context("channel missing encoder settings")?,
            )?,
            tags: out
                .tags()
                .present()
                .map(|tags| tags.iter().map(|(k, v)| (k.clone(), v.clone())).collect())
                .unwrap_or_default(),
            start_channel: matches!(state_of(out), "RUNNING" | "STARTING"),
        };
        Ok((channel, ChannelOutput::from_describe(out)?))
    }

    /// Whether anything sent by UpdateChannel differs. The class, tags and
    /// running state each have their own call.
    fn settings_differ(&self, other: &Self) -> bool {
        let mut other = other.clone();
        other.channel_class = self.channel_class;
        other.tags.clone_from(&self.tags);
        other.start_channel = self.start_channel;
        *self != other
    }

    /// The calls that take a channel in `state`, last defined as `previous`,
    /// to this definition.
    ///
    /// Class and settings changes need an idle channel, so a running channel
    /// is stopped before them and started again when it should be running.
    pub fn plan_update(&self, previous: &Self, state: &str) -> Vec<UpdateStep> {
        let class_changed = self.channel_class != previous.channel_class;
        let settings_changed = self.settings_differ(previous);
        let mut running = state == "RUNNING";
        let mut steps = vec![];
        if running && (class_changed || settings_changed) {
            steps.push(UpdateStep::Stop);
            running = false;
        }
        if class_changed {
            steps.push(UpdateStep::UpdateClass);
        }
        if settings_changed {
            steps.push(UpdateStep::UpdateSettings);
        }
        if self.tags != previous.tags {
            steps.push(UpdateStep::UpdateTags);
        }
        match (self.start_channel, running) {
            (true, false) => steps.push(UpdateStep::Start),
            (false, true) => steps.push(UpdateStep::Stop),
            _ => {}
        }
        steps
    }
}

/// One remote call made while updating a channel.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UpdateStep {
    Stop,
    UpdateClass,
    UpdateSettings,
    UpdateTags,
    Start,
}

/// Result of one poll while waiting.
pub(crate) enum Poll<T> {
    Ready(T),
    Pending(String),
}

/// Polls every `interval` until `poll` is ready, failing after `timeout`.
pub(crate) async fn wait_until<T, F, Fut>(
    what: &str,
    interval: Duration,
    timeout: Duration,
    mut poll: F,
) -> Result<T>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<Poll<T>>>,
{
    let deadline = tokio::time::Instant::now() + timeout;
    loop {
        match poll().await? {
            Poll::Ready(value) => return Ok(value),
            Poll::Pending(state) => {
                let now = tokio::time::Instant::now();
                if now >= deadline {
                    return Err(Error::Timeout {
                        what: format!("{what} (last state {state})"),
                        secs: timeout.as_secs(),
                    });
                }
                log::debug!("waiting for {what}, currently {state}");
                tokio::time::sleep(interval.min(deadline - now)).await;
            }
        }
    }
}

/// Describes a channel. A deleted channel is not found.
pub async fn find_channel(client: &AwsClient, id: &str) -> Result<DescribeChannelOutput> {
    let not_found = || Error::NotFound {
        resource_type: RESOURCE_TYPE,
        id: id.to_owned(),
    };
    match client
        .medialive()
        .describe_channel()
        .channel_id(id)
        .send()
        .await
        .map_err(ApiError::from)
    {
        Ok(out) if state_of(&out) == "DELETED" => Err(not_found()),
        Ok(out) => Ok(out),
        Err(e) if e.is_not_found() => Err(not_found()),
        Err(source) => Err(Error::Api { source }),
    }
}

/// Waits for channel `id` to move through `pending` states into one of
/// `target`. A target of `DELETED` is also reached when the channel is gone.
async fn wait_for_channel(
    client: &AwsClient,
    id: &str,
    pending: &[&str],
    target: &[&str],
) -> Result<Option<DescribeChannelOutput>> {
    let what = format!("channel {id} to reach {target:?}");
    wait_until(&what, POLL_INTERVAL, WAIT_TIMEOUT, || async move {
        match find_channel(client, id).await {
            Ok(out) => {
                let state = state_of(&out).to_owned();
                if target.contains(&state.as_str()) {
                    Ok(Poll::Ready(Some(out)))
                } else if pending.contains(&state.as_str()) {
                    Ok(Poll::Pending(state))
                } else {
                    Err(anyhow::anyhow!("channel {id} is in unexpected state {state}").into())
                }
            }
            Err(e) if e.is_not_found() && target.contains(&"DELETED") => Ok(Poll::Ready(None)),
            Err(e) => Err(e),
        }
    })
    .await
}

async fn start(client: &AwsClient, id: &str) -> Result<()> {
    log::info!("starting medialive channel {id}");
    client
        .medialive()
        .start_channel()
        .channel_id(id)
        .send()
        .await?;
    wait_for_channel(client, id, &["STARTING"], &["RUNNING"]).await?;
    Ok(())
}

async fn stop(client: &AwsClient, id: &str) -> Result<()> {
    log::info!("stopping medialive channel {id}");
    client
        .medialive()
        .stop_channel()
        .channel_id(id)
        .send()
        .await?;
    wait_for_channel(client, id, &["STOPPING"], &["IDLE"]).await?;
    Ok(())
}

/// Stops a running channel and deletes it, waiting until it is gone.
///
/// Deleting a channel that is already gone succeeds.
pub async fn delete_channel(client: &AwsClient, id: &str) -> Result<()> {
    let out = match find_channel(client, id).await {
        Ok(out) => out,
        Err(e) if e.is_not_found() => return Ok(()),
        Err(e) => return Err(e),
    };
    if state_of(&out) == "RUNNING" {
        stop(client, id).await?;
    }
    log::info!("deleting medialive channel {id}");
    match client
        .medialive()
        .delete_channel()
        .channel_id(id)
        .send()
        .await
        .map_err(ApiError::from)
    {
        Ok(_) => {}
        Err(e) if e.is_not_found() => return Ok(()),
        Err(source) => return Err(Error::Api { source }),
    }
    wait_for_channel(client, id, &["DELETING"], &["DELETED"]).await?;
    Ok(())
}

async fn update_tags(
    client: &AwsClient,
    arn: &str,
    old: &BTreeMap<String, String>,
    new: &BTreeMap<String, String>,
) -> Result<()> {
    let (set, remove) = tag_changes(old, new);
    if !remove.is_empty() {
        client
            .medialive()
            .delete_tags()
            .resource_arn(arn)
            .set_tag_keys(Some(remove))
            .send()
            .await?;
    }
    if !set.is_empty() {
        client
            .medialive()
            .create_tags()
            .resource_arn(arn)
            .set_tags(Some(set))
            .send()
            .await?;
    }
    Ok(())
}

impl Channel {
    async fn create_channel(&self, client: &AwsClient) -> anyhow::Result<ChannelOutput> {
        let out = client
            .medialive()
            .create_channel()
            .name(&self.name)
            .channel_class(self.channel_class.into())
            .set_role_arn(self.role_arn.clone())
            .set_log_level(self.log_level.map(Into::into))
            .input_specification((&self.input_specification).into())
            .set_input_attachments(Some(self.input_attachments.iter().map(Into::into).collect()))
            .set_destinations(Some(self.destinations.iter().map(Into::into).collect()))
            .encoder_settings(self.encoder_settings.expand())
            .set_tags(if self.tags.is_empty() {
                None
            } else {
                Some(self.tags.clone().into_iter().collect())
            })
            .send()
            .await
            .map_err(ApiError::from)?;
        let id = out
            .channel()
            .present()
            .and_then(|c| c.id())
            .context("created channel missing id")?
            .to_owned();
        log::info!("created medialive channel {} ({id})", self.name);

        wait_for_channel(client, &id, &["CREATING"], &["IDLE"]).await?;
        if self.start_channel {
            start(client, &id).await?;
        }
        let out = find_channel(client, &id).await?;
        ChannelOutput::from_describe(&out)
    }

    async fn update_channel(
        &self,
        client: &AwsClient,
        previous_local: &Self,
        previous_remote: &ChannelOutput,
    ) -> anyhow::Result<ChannelOutput> {
        let id = previous_remote.channel_id.as_str();
        let current = find_channel(client, id).await?;
        for step in self.plan_update(previous_local, state_of(&current)) {
            log::debug!("medialive channel {id}: {step:?}");
            match step {
                UpdateStep::Stop => stop(client, id).await?,
                UpdateStep::UpdateClass => {
                    client
                        .medialive()
                        .update_channel_class()
                        .channel_id(id)
                        .channel_class(self.channel_class.into())
                        .set_destinations(Some(self.destinations.iter().map(Into::into).collect()))
                        .send()
                        .await
                        .map_err(ApiError::from)?;
                    wait_for_channel(client, id, &["UPDATING"], &["IDLE"]).await?;
                }
                UpdateStep::UpdateSettings => {
                    client
                        .medialive()
                        .update_channel()
                        .channel_id(id)
                        .name(&self.name)
                        .set_role_arn(self.role_arn.clone())
                        .set_log_level(self.log_level.map(Into::into))
                        .input_specification((&self.input_specification).into())
                        .set_input_attachments(Some(
                            self.input_attachments.iter().map(Into::into).collect(),
                        ))
                        .set_destinations(Some(self.destinations.iter().map(Into::into).collect()))
                        .encoder_settings(self.encoder_settings.expand())
                        .send()
                        .await
                        .map_err(ApiError::from)?;
                    wait_for_channel(client, id, &["UPDATING"], &["IDLE"]).await?;
                }
                UpdateStep::UpdateTags => {
                    update_tags(client, &previous_remote.arn, &previous_local.tags, &self.tags)
                        .await?
                }
                UpdateStep::Start => start(client, id).await?,
            }
        }
        let out = find_channel(client, id).await?;
        ChannelOutput::from_describe(&out)
    }
}

impl Resource for Channel {
    type Provider = AwsClient;
    type Error = Error;
    type Output = ChannelOutput;

    async fn create(&self, client: &AwsClient) -> Result<ChannelOutput> {
        self.create_channel(client)
            .await
            .map_err(|error| Error::Create {
                name: self.name.clone(),
                error,
            })
    }

    async fn read(
        client: &AwsClient,
        previous_remote: &ChannelOutput,
    ) -> Result<(Self, ChannelOutput)> {
        Self::import(client, &previous_remote.channel_id).await
    }

    async fn update(
        &self,
        client: &AwsClient,
        previous_local: &Self,
        previous_remote: &ChannelOutput,
    ) -> Result<ChannelOutput> {
        if self == previous_local {
            log::debug!("medialive channel {} unchanged", self.name);
            return Ok(previous_remote.clone());
        }
        log_update(&self.name, previous_local, self);
        self.update_channel(client, previous_local, previous_remote)
            .await
            .map_err(|error| Error::Update {
                name: self.name.clone(),
                error,
            })
    }

    async fn delete(&self, client: &AwsClient, previous_remote: &ChannelOutput) -> Result<()> {
        delete_channel(client, &previous_remote.channel_id)
            .await
            .map_err(|e| Error::Destroy {
                name: self.name.clone(),
                error: e.into(),
            })
    }

    async fn import(client: &AwsClient, id: &str) -> Result<(Self, ChannelOutput)> {
        let out = find_channel(client, id).await?;
        Channel::flatten(&out).map_err(|error| Error::Read {
            name: id.to_owned(),
            error,
        })
    }
}

#[cfg(test)]
pub(crate) mod test {
    use std::sync::atomic::{AtomicUsize, Ordering};

    use super::*;
    use crate::aws::medialive::encoder::{
        ArchiveOutputSettings, AudioDescription, M2tsAribCaptionsPidControl,
        M2tsAudioBufferModel, M2tsBufferModel, M2tsRateMode, M2tsSettings, Output, OutputGroup,
        OutputGroupSettings, OutputSettings, TimecodeConfig, TimecodeConfigSource,
        VideoDescription,
    };

    /// The channel of the basic acceptance configuration.
    pub(crate) fn basic(name: &str, role_arn: &str, input_id: &str, bucket: &str) -> Channel {
        Channel {
            name: name.to_owned(),
            channel_class: ChannelClass::Standard,
            role_arn: Some(role_arn.to_owned()),
            log_level: None,
            input_specification: InputSpecification {
                codec: InputCodec::Avc,
                input_resolution: InputResolution::Hd,
                maximum_bitrate: InputMaximumBitrate::Max20Mbps,
            },
            input_attachments: vec![InputAttachment {
                input_attachment_name: "example-input1".to_owned(),
                input_id: input_id.to_owned(),
                input_settings: None,
            }],
            destinations: vec![Destination {
                id: name.to_owned(),
                settings: vec![
                    DestinationSettings {
                        url: Some(format!("s3://{bucket}/test1")),
                        ..Default::default()
                    },
                    DestinationSettings {
                        url: Some(format!("s3://{bucket}/test2")),
                        ..Default::default()
                    },
                ],
                media_package_channel_ids: vec![],
            }],
            encoder_settings: EncoderSettings {
                timecode_config: TimecodeConfig {
                    source: TimecodeConfigSource::Embedded,
                    sync_threshold: None,
                },
                audio_descriptions: vec![AudioDescription {
                    audio_selector_name: name.to_owned(),
                    name: name.to_owned(),
                    language_code: None,
                    stream_name: None,
                    codec_settings: None,
                }],
                video_descriptions: vec![VideoDescription {
                    name: "test-video-name".to_owned(),
                    width: None,
                    height: None,
                    respond_to_afd: None,
                    scaling_behavior: None,
                    sharpness: None,
                    codec_settings: None,
                }],
                output_groups: vec![OutputGroup {
                    name: None,
                    output_group_settings: OutputGroupSettings::Archive {
                        destination_ref_id: name.to_owned(),
                        rollover_interval: None,
                    },
                    outputs: vec![Output {
                        output_name: Some("test-output-name".to_owned()),
                        video_description_name: Some("test-video-name".to_owned()),
                        audio_description_names: vec![name.to_owned()],
                        output_settings: OutputSettings::Archive(ArchiveOutputSettings {
                            name_modifier: Some("_1".to_owned()),
                            extension: Some("m2ts".to_owned()),
                            m2ts_settings: Some(M2tsSettings {
                                audio_buffer_model: Some(M2tsAudioBufferModel::Atsc),
                                buffer_model: Some(M2tsBufferModel::Multiplex),
                                rate_mode: Some(M2tsRateMode::Cbr),
                                ..Default::default()
                            }),
                        }),
                    }],
                }],
            },
            tags: BTreeMap::new(),
            start_channel: false,
        }
    }

    fn describe(channel: &Channel, state: &str) -> DescribeChannelOutput {
        let mut builder = DescribeChannelOutput::builder()
            .id("1234567")
            .arn("arn:aws:medialive:us-west-2:123456789012:channel:1234567")
            .name(&channel.name)
            .channel_class(channel.channel_class.into())
            .set_role_arn(channel.role_arn.clone())
            .input_specification((&channel.input_specification).into())
            .set_input_attachments(Some(channel.input_attachments.iter().map(Into::into).collect()))
            .set_destinations(Some(channel.destinations.iter().map(Into::into).collect()))
            .encoder_settings(channel.encoder_settings.expand())
            .state(aws::ChannelState::from(state));
        for (key, value) in channel.tags.iter() {
            builder = builder.tags(key, value);
        }
        builder.build()
    }

    fn channel() -> Channel {
        basic("c", "role", "input", "bucket")
    }

    #[test]
    fn expand_then_flatten_has_no_drift() {
        let mut channel = basic("tf-acc-test-1", "arn:aws:iam::123456789012:role/ml", "1111", "bucket");
        channel.tags.insert("key1".to_owned(), "value1".to_owned());
        let OutputSettings::Archive(archive) =
            &mut channel.encoder_settings.output_groups[0].outputs[0].output_settings
        else {
            panic!("basic channel writes an archive");
        };
        let m2ts = archive.m2ts_settings.as_mut().unwrap();
        m2ts.audio_pids = Some("200".to_owned());
        m2ts.arib_captions_pid_control = Some(M2tsAribCaptionsPidControl::Auto);
        m2ts.program_num = Some(1);
        m2ts.fragment_time = Some(1.92);
        m2ts.segmentation_time = Some(1.92);

        let (flattened, output) = Channel::flatten(&describe(&channel, "IDLE")).unwrap();
        pretty_assertions::assert_eq!(channel, flattened);
        assert_eq!("1234567", output.channel_id);
        assert_eq!("IDLE", output.state);
    }

    #[test]
    fn media_package_destination_reads_back() {
        let mut channel = channel();
        channel.channel_class = ChannelClass::SinglePipeline;
        channel.destinations = vec![Destination {
            id: "mediapackage-output".to_owned(),
            settings: vec![],
            media_package_channel_ids: vec!["perpetual-drift-test-bbb".to_owned()],
        }];
        channel.input_attachments[0].input_settings = Some(InputSettings {
            source_end_behavior: Some(InputSourceEndBehavior::Loop),
        });
        channel.encoder_settings.output_groups = vec![OutputGroup {
            name: Some("livestream".to_owned()),
            output_group_settings: OutputGroupSettings::MediaPackage {
                destination_ref_id: "mediapackage-output".to_owned(),
            },
            outputs: vec![Output {
                output_name: Some("output-name".to_owned()),
                video_description_name: Some("test-video-name".to_owned()),
                audio_description_names: vec!["c".to_owned()],
                output_settings: OutputSettings::MediaPackage,
            }],
        }];

        let (flattened, _) = Channel::flatten(&describe(&channel, "IDLE")).unwrap();
        pretty_assertions::assert_eq!(channel, flattened);
    }

    #[test]
    fn definitions_use_wire_values() {
        let channel = channel();
        let value = serde_json::to_value(&channel).unwrap();
        assert_eq!("STANDARD", value["channel_class"]);
        assert_eq!("MAX_20_MBPS", value["input_specification"]["maximum_bitrate"]);
        assert_eq!(
            "m2ts",
            value["encoder_settings"]["output_groups"][0]["outputs"][0]["output_settings"]
                ["archive"]["extension"]
        );
        let parsed: Channel = serde_json::from_value(value).unwrap();
        assert_eq!(channel, parsed);

        let err = serde_json::from_str::<InputSpecification>(
            r#"{"codec": "AV1", "input_resolution": "HD", "maximum_bitrate": "MAX_10_MBPS"}"#,
        )
        .unwrap_err();
        assert!(err.to_string().contains("AV1"), "{err}");
    }

    #[test]
    fn running_channels_are_started() {
        let channel = channel();
        let (flattened, _) = Channel::flatten(&describe(&channel, "RUNNING")).unwrap();
        assert!(flattened.start_channel);
        assert!(!flattened.settings_differ(&channel));
        assert_ne!(flattened, channel);
    }

    #[test]
    fn unsupported_codec_is_an_error() {
        let spec = aws::InputSpecification::builder()
            .codec(aws::InputCodec::from("AV1"))
            .resolution(aws::InputResolution::from("HD"))
            .maximum_bitrate(aws::InputMaximumBitrate::from("MAX_10_MBPS"))
            .build();
        let err = InputSpecification::try_from(&spec).unwrap_err();
        assert!(err.to_string().contains("AV1"), "{err}");
    }

    #[test]
    fn unchanged_channel_needs_no_calls() {
        let channel = channel();
        assert!(channel.plan_update(&channel, "IDLE").is_empty());
        let mut running = channel.clone();
        running.start_channel = true;
        assert!(running.plan_update(&running, "RUNNING").is_empty());
    }

    #[test]
    fn tags_change_without_stopping() {
        let previous = Channel {
            start_channel: true,
            ..channel()
        };
        let mut next = previous.clone();
        next.tags.insert("key1".to_owned(), "value1".to_owned());
        assert!(!next.settings_differ(&previous));
        assert_eq!(vec![UpdateStep::UpdateTags], next.plan_update(&previous, "RUNNING"));
    }

    #[test]
    fn start_channel_alone_starts_or_stops() {
        let idle = channel();
        let running = Channel {
            start_channel: true,
            ..channel()
        };
        assert_eq!(vec![UpdateStep::Start], running.plan_update(&idle, "IDLE"));
        assert_eq!(vec![UpdateStep::Stop], idle.plan_update(&running, "RUNNING"));
        // Already in the requested state.
        assert!(idle.plan_update(&running, "IDLE").is_empty());
    }

    #[test]
    fn settings_change_stops_and_restarts_a_running_channel() {
        let previous = Channel {
            start_channel: true,
            ..channel()
        };
        let mut next = previous.clone();
        next.log_level = Some(LogLevel::Debug);
        next.tags.insert("key1".to_owned(), "value1".to_owned());
        assert_eq!(
            vec![
                UpdateStep::Stop,
                UpdateStep::UpdateSettings,
                UpdateStep::UpdateTags,
                UpdateStep::Start
            ],
            next.plan_update(&previous, "RUNNING")
        );
        // An idle channel is updated in place and stays idle.
        next.start_channel = false;
        assert_eq!(
            vec![UpdateStep::UpdateSettings, UpdateStep::UpdateTags],
            next.plan_update(&Channel { start_channel: false, ..previous }, "IDLE")
        );
    }

    #[test]
    fn class_change_uses_its_own_call() {
        let previous = channel();
        let next = Channel {
            channel_class: ChannelClass::SinglePipeline,
            ..previous.clone()
        };
        assert_eq!(vec![UpdateStep::UpdateClass], next.plan_update(&previous, "IDLE"));
        assert_eq!(
            vec![UpdateStep::Stop, UpdateStep::UpdateClass],
            next.plan_update(&previous, "RUNNING")
        );
    }

    #[tokio::test(start_paused = true)]
    async fn wait_until_polls_until_ready() {
        let polls = &AtomicUsize::new(0);
        let start = tokio::time::Instant::now();
        let value = wait_until("ready", POLL_INTERVAL, WAIT_TIMEOUT, || async move {
            if polls.fetch_add(1, Ordering::SeqCst) < 3 {
                Ok(Poll::Pending("CREATING".to_owned()))
            } else {
                Ok(Poll::Ready(42))
            }
        })
        .await
        .unwrap();
        assert_eq!(42, value);
        assert_eq!(4, polls.load(Ordering::SeqCst));
        let elapsed = start.elapsed();
        assert!(elapsed >= POLL_INTERVAL * 3 && elapsed < POLL_INTERVAL * 4, "{elapsed:?}");
    }

    #[tokio::test(start_paused = true)]
    async fn wait_until_times_out() {
        let err = wait_until::<(), _, _>("never", POLL_INTERVAL, WAIT_TIMEOUT, || async {
            Ok(Poll::Pending("STOPPING".to_owned()))
        })
        .await
        .unwrap_err();
        match err {
            Error::Timeout { what, secs } => {
                assert_eq!(300, secs);
                assert!(what.contains("STOPPING"), "{what}");
            }
            e => panic!("unexpected {e}"),
        }
    }
}
