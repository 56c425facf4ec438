//! Channel encoder settings: what is encoded and where the output groups
//! send it.
use anyhow::Context;
use aws_sdk_medialive::types as aws;

use super::codec::{AudioCodecSettings, VideoCodecSettings};
use crate::aws::{aws_enum, mirror, Present};

aws_enum! {
    TimecodeConfigSource => aws::TimecodeConfigSource {
        Embedded = "EMBEDDED",
        Systemclock = "SYSTEMCLOCK",
        Zerobased = "ZEROBASED",
    }
}

aws_enum! {
    M2tsAudioBufferModel => aws::M2tsAudioBufferModel {
        Atsc = "ATSC",
        Dvb = "DVB",
    }
}

aws_enum! {
    M2tsBufferModel => aws::M2tsBufferModel {
        Multiplex = "MULTIPLEX",
        NoBuffer = "NONE",
    }
}

aws_enum! {
    M2tsRateMode => aws::M2tsRateMode {
        Cbr = "CBR",
        Vbr = "VBR",
    }
}

aws_enum! {
    M2tsAribCaptionsPidControl => aws::M2tsAribCaptionsPidControl {
        Auto = "AUTO",
        UseConfigured = "USE_CONFIGURED",
    }
}

aws_enum! {
    VideoDescriptionRespondToAfd => aws::VideoDescriptionRespondToAfd {
        NoRespond = "NONE",
        Passthrough = "PASSTHROUGH",
        Respond = "RESPOND",
    }
}

aws_enum! {
    VideoDescriptionScalingBehavior => aws::VideoDescriptionScalingBehavior {
        Default = "DEFAULT",
        StretchToOutput = "STRETCH_TO_OUTPUT",
    }
}

aws_enum! {
    HlsH265PackagingType => aws::HlsH265PackagingType {
        Hev1 = "HEV1",
        Hvc1 = "HVC1",
    }
}

aws_enum! {
    MsSmoothH265PackagingType => aws::MsSmoothH265PackagingType {
        Hev1 = "HEV1",
        Hvc1 = "HVC1",
    }
}

aws_enum! {
    SmoothGroupAudioOnlyTimecodeControl => aws::SmoothGroupAudioOnlyTimecodeControl {
        Passthrough = "PASSTHROUGH",
        UseConfiguredClock = "USE_CONFIGURED_CLOCK",
    }
}

aws_enum! {
    InputLossActionForUdpOut => aws::InputLossActionForUdpOut {
        DropProgram = "DROP_PROGRAM",
        DropTs = "DROP_TS",
        EmitProgram = "EMIT_PROGRAM",
    }
}

aws_enum! {
    FecOutputIncludeFec => aws::FecOutputIncludeFec {
        Column = "COLUMN",
        ColumnAndRow = "COLUMN_AND_ROW",
    }
}

#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct TimecodeConfig {
    pub source: TimecodeConfigSource,
    pub sync_threshold: Option<i32>,
}

#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct AudioDescription {
    pub audio_selector_name: String,
    pub name: String,
    pub language_code: Option<String>,
    pub stream_name: Option<String>,
    pub codec_settings: Option<AudioCodecSettings>,
}

impl From<&AudioDescription> for aws::AudioDescription {
    fn from(value: &AudioDescription) -> Self {
        aws::AudioDescription::builder()
            .audio_selector_name(&value.audio_selector_name)
            .name(&value.name)
            .set_language_code(value.language_code.clone())
            .set_stream_name(value.stream_name.clone())
            .set_codec_settings(value.codec_settings.as_ref().map(Into::into))
            .build()
    }
}

impl TryFrom<&aws::AudioDescription> for AudioDescription {
    type Error = anyhow::Error;

    fn try_from(value: &aws::AudioDescription) -> anyhow::Result<Self> {
        Ok(AudioDescription {
            audio_selector_name: value
                .audio_selector_name()
                .present()
                .unwrap_or_default()
                .to_owned(),
            name: value.name().present().unwrap_or_default().to_owned(),
            language_code: value.language_code().present().map(str::to_owned),
            stream_name: value.stream_name().present().map(str::to_owned),
            codec_settings: value
                .codec_settings()
                .map(TryInto::try_into)
                .transpose()?,
        })
    }
}

#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct VideoDescription {
    pub name: String,
    pub width: Option<i32>,
    pub height: Option<i32>,
    pub respond_to_afd: Option<VideoDescriptionRespondToAfd>,
    pub scaling_behavior: Option<VideoDescriptionScalingBehavior>,
    pub sharpness: Option<i32>,
    pub codec_settings: Option<VideoCodecSettings>,
}

impl From<&VideoDescription> for aws::VideoDescription {
    fn from(value: &VideoDescription) -> Self {
        aws::VideoDescription::builder()
            .name(&value.name)
            .set_width(value.width)
            .set_height(value.height)
            .set_respond_to_afd(value.respond_to_afd.map(Into::into))
            .set_scaling_behavior(value.scaling_behavior.map(Into::into))
            .set_sharpness(value.sharpness)
            .set_codec_settings(value.codec_settings.as_ref().map(Into::into))
            .build()
    }
}

impl TryFrom<&aws::VideoDescription> for VideoDescription {
    type Error = anyhow::Error;

    fn try_from(value: &aws::VideoDescription) -> anyhow::Result<Self> {
        Ok(VideoDescription {
            name: value.name().present().unwrap_or_default().to_owned(),
            width: value.width(),
            height: value.height(),
            respond_to_afd: mirror(value.respond_to_afd())?,
            scaling_behavior: mirror(value.scaling_behavior())?,
            sharpness: value.sharpness(),
            codec_settings: value
                .codec_settings()
                .map(TryInto::try_into)
                .transpose()?,
        })
    }
}

#[derive(Debug, Default, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct M2tsSettings {
    pub audio_buffer_model: Option<M2tsAudioBufferModel>,
    pub buffer_model: Option<M2tsBufferModel>,
    pub rate_mode: Option<M2tsRateMode>,
    pub audio_pids: Option<String>,
    pub video_pid: Option<String>,
    pub dvb_sub_pids: Option<String>,
    pub arib_captions_pid: Option<String>,
    pub arib_captions_pid_control: Option<M2tsAribCaptionsPidControl>,
    pub program_num: Option<i32>,
    pub fragment_time: Option<f64>,
    pub segmentation_time: Option<f64>,
}

impl From<&M2tsSettings> for aws::M2tsSettings {
    fn from(value: &M2tsSettings) -> Self {
        aws::M2tsSettings::builder()
            .set_audio_buffer_model(value.audio_buffer_model.map(Into::into))
            .set_buffer_model(value.buffer_model.map(Into::into))
            .set_rate_mode(value.rate_mode.map(Into::into))
            .set_audio_pids(value.audio_pids.clone())
            .set_video_pid(value.video_pid.clone())
            .set_dvb_sub_pids(value.dvb_sub_pids.clone())
            .set_arib_captions_pid(value.arib_captions_pid.clone())
            .set_arib_captions_pid_control(value.arib_captions_pid_control.map(Into::into))
            .set_program_num(value.program_num)
            .set_fragment_time(value.fragment_time)
            .set_segmentation_time(value.segmentation_time)
            .build()
    }
}

impl TryFrom<&aws::M2tsSettings> for M2tsSettings {
    type Error = anyhow::Error;

    fn try_from(value: &aws::M2tsSettings) -> anyhow::Result<Self> {
        Ok(M2tsSettings {
            audio_buffer_model: mirror(value.audio_buffer_model())?,
            buffer_model: mirror(value.buffer_model())?,
            rate_mode: mirror(value.rate_mode())?,
            audio_pids: value.audio_pids().present().map(str::to_owned),
            video_pid: value.video_pid().present().map(str::to_owned),
            dvb_sub_pids: value.dvb_sub_pids().present().map(str::to_owned),
            arib_captions_pid: value.arib_captions_pid().present().map(str::to_owned),
            arib_captions_pid_control: mirror(value.arib_captions_pid_control())?,
            program_num: value.program_num(),
            fragment_time: value.fragment_time(),
            segmentation_time: value.segmentation_time(),
        })
    }
}

#[derive(Debug, Default, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct M3u8Settings {
    pub audio_frames_per_pes: Option<i32>,
    pub audio_pids: Option<String>,
    pub program_num: Option<i32>,
    pub video_pid: Option<String>,
}

#[derive(Debug, Default, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct ArchiveOutputSettings {
    pub name_modifier: Option<String>,
    pub extension: Option<String>,
    pub m2ts_settings: Option<M2tsSettings>,
}

#[derive(Debug, Default, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct HlsOutputSettings {
    pub name_modifier: Option<String>,
    pub h265_packaging_type: Option<HlsH265PackagingType>,
    /// Standard HLS settings.
    pub m3u8_settings: Option<M3u8Settings>,
}

#[derive(Debug, Default, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct MsSmoothOutputSettings {
    pub name_modifier: Option<String>,
    pub h265_packaging_type: Option<MsSmoothH265PackagingType>,
}

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct FecOutputSettings {
    pub include_fec: Option<FecOutputIncludeFec>,
    pub column_depth: Option<i32>,
    pub row_length: Option<i32>,
}

#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct UdpOutputSettings {
    pub destination_ref_id: String,
    pub buffer_msec: Option<i32>,
    pub fec_output_settings: Option<FecOutputSettings>,
    pub m2ts_settings: Option<M2tsSettings>,
}

/// How a single output is packaged. Must match the kind of its group.
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OutputSettings {
    Archive(ArchiveOutputSettings),
    Hls(HlsOutputSettings),
    MediaPackage,
    MsSmooth(MsSmoothOutputSettings),
    Udp(UdpOutputSettings),
}

fn location(destination_ref_id: &str) -> aws::OutputLocationRef {
    aws::OutputLocationRef::builder()
        .destination_ref_id(destination_ref_id)
        .build()
}

fn location_id(location: Option<&aws::OutputLocationRef>, kind: &str) -> anyhow::Result<String> {
    location
        .and_then(|l| l.destination_ref_id())
        .map(str::to_owned)
        .with_context(|| format!("{kind} missing destination"))
}

impl From<&OutputSettings> for aws::OutputSettings {
    fn from(value: &OutputSettings) -> Self {
        let builder = aws::OutputSettings::builder();
        let builder = match value {
            OutputSettings::Archive(archive) => builder.archive_output_settings(
                aws::ArchiveOutputSettings::builder()
                    .set_name_modifier(archive.name_modifier.clone())
                    .set_extension(archive.extension.clone())
                    .container_settings(
                        aws::ArchiveContainerSettings::builder()
                            .set_m2ts_settings(archive.m2ts_settings.as_ref().map(Into::into))
                            .build(),
                    )
                    .build(),
            ),
            OutputSettings::Hls(hls) => builder.hls_output_settings(
                aws::HlsOutputSettings::builder()
                    .set_name_modifier(hls.name_modifier.clone())
                    .set_h265_packaging_type(hls.h265_packaging_type.map(Into::into))
                    .set_hls_settings(hls.m3u8_settings.as_ref().map(|m3u8| {
                        aws::HlsSettings::builder()
                            .standard_hls_settings(
                                aws::StandardHlsSettings::builder()
                                    .m3u8_settings(
                                        aws::M3u8Settings::builder()
                                            .set_audio_frames_per_pes(m3u8.audio_frames_per_pes)
                                            .set_audio_pids(m3u8.audio_pids.clone())
                                            .set_program_num(m3u8.program_num)
                                            .set_video_pid(m3u8.video_pid.clone())
                                            .build(),
                                    )
                                    .build(),
                            )
                            .build()
                    }))
                    .build(),
            ),
            OutputSettings::MediaPackage => builder
                .media_package_output_settings(aws::MediaPackageOutputSettings::builder().build()),
            OutputSettings::MsSmooth(smooth) => builder.ms_smooth_output_settings(
                aws::MsSmoothOutputSettings::builder()
                    .set_name_modifier(smooth.name_modifier.clone())
                    .set_h265_packaging_type(smooth.h265_packaging_type.map(Into::into))
                    .build(),
            ),
            OutputSettings::Udp(udp) => builder.udp_output_settings(
                aws::UdpOutputSettings::builder()
                    .destination(location(&udp.destination_ref_id))
                    .set_buffer_msec(udp.buffer_msec)
                    .set_fec_output_settings(udp.fec_output_settings.map(|fec| {
                        aws::FecOutputSettings::builder()
                            .set_include_fec(fec.include_fec.map(Into::into))
                            .set_column_depth(fec.column_depth)
                            .set_row_length(fec.row_length)
                            .build()
                    }))
                    .container_settings(
                        aws::UdpContainerSettings::builder()
                            .set_m2ts_settings(udp.m2ts_settings.as_ref().map(Into::into))
                            .build(),
                    )
                    .build(),
            ),
        };
        builder.build()
    }
}

impl TryFrom<&aws::OutputSettings> for OutputSettings {
    type Error = anyhow::Error;

    fn try_from(value: &aws::OutputSettings) -> anyhow::Result<Self> {
        if let Some(archive) = value.archive_output_settings() {
            return Ok(OutputSettings::Archive(ArchiveOutputSettings {
                name_modifier: archive.name_modifier().present().map(str::to_owned),
                extension: archive.extension().present().map(str::to_owned),
                m2ts_settings: archive
                    .container_settings()
                    .and_then(|c| c.m2ts_settings())
                    .map(TryInto::try_into)
                    .transpose()?,
            }));
        }
        if let Some(hls) = value.hls_output_settings() {
            let m3u8_settings = match hls.hls_settings() {
                None => None,
                Some(settings) => {
                    let m3u8 = settings
                        .standard_hls_settings()
                        .and_then(|s| s.m3u8_settings())
                        .context("only standard hls settings are supported")?;
                    Some(M3u8Settings {
                        audio_frames_per_pes: m3u8.audio_frames_per_pes(),
                        audio_pids: m3u8.audio_pids().present().map(str::to_owned),
                        program_num: m3u8.program_num(),
                        video_pid: m3u8.video_pid().present().map(str::to_owned),
                    })
                }
            };
            return Ok(OutputSettings::Hls(HlsOutputSettings {
                name_modifier: hls.name_modifier().present().map(str::to_owned),
                h265_packaging_type: mirror(hls.h265_packaging_type())?,
                m3u8_settings,
            }));
        }
        if value.media_package_output_settings().is_some() {
            return Ok(OutputSettings::MediaPackage);
        }
        if let Some(smooth) = value.ms_smooth_output_settings() {
            return Ok(OutputSettings::MsSmooth(MsSmoothOutputSettings {
                name_modifier: smooth.name_modifier().present().map(str::to_owned),
                h265_packaging_type: mirror(smooth.h265_packaging_type())?,
            }));
        }
        if let Some(udp) = value.udp_output_settings() {
            let fec_output_settings = udp
                .fec_output_settings()
                .map(|fec| {
                    anyhow::Ok(FecOutputSettings {
                        include_fec: mirror(fec.include_fec())?,
                        column_depth: fec.column_depth(),
                        row_length: fec.row_length(),
                    })
                })
                .transpose()?;
            return Ok(OutputSettings::Udp(UdpOutputSettings {
                destination_ref_id: location_id(udp.destination(), "udp output")?,
                buffer_msec: udp.buffer_msec(),
                fec_output_settings,
                m2ts_settings: udp
                    .container_settings()
                    .and_then(|c| c.m2ts_settings())
                    .map(TryInto::try_into)
                    .transpose()?,
            }));
        }
        anyhow::bail!("unsupported output settings")
    }
}

#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct Output {
    pub output_name: Option<String>,
    pub video_description_name: Option<String>,
    pub audio_description_names: Vec<String>,
    pub output_settings: OutputSettings,
}

impl From<&Output> for aws::Output {
    fn from(value: &Output) -> Self {
        aws::Output::builder()
            .set_output_name(value.output_name.clone())
            .set_video_description_name(value.video_description_name.clone())
            .set_audio_description_names(Some(value.audio_description_names.clone()))
            .output_settings((&value.output_settings).into())
            .build()
    }
}

impl TryFrom<&aws::Output> for Output {
    type Error = anyhow::Error;

    fn try_from(value: &aws::Output) -> anyhow::Result<Self> {
        Ok(Output {
            output_name: value.output_name().present().map(str::to_owned),
            video_description_name: value.video_description_name().present().map(str::to_owned),
            audio_description_names: value
                .audio_description_names()
                .present()
                .unwrap_or_default()
                .to_vec(),
            output_settings: value
                .output_settings()
                .context("output missing settings")?
                .try_into()?,
        })
    }
}

/// Where and how a group of outputs is delivered.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OutputGroupSettings {
    Archive {
        destination_ref_id: String,
        rollover_interval: Option<i32>,
    },
    Hls {
        destination_ref_id: String,
        segment_length: Option<i32>,
    },
    MediaPackage {
        destination_ref_id: String,
    },
    MsSmooth {
        destination_ref_id: String,
        audio_only_timecode_control: Option<SmoothGroupAudioOnlyTimecodeControl>,
    },
    Udp {
        input_loss_action: Option<InputLossActionForUdpOut>,
        timed_metadata_id3_period: Option<i32>,
    },
}

impl From<&OutputGroupSettings> for aws::OutputGroupSettings {
    fn from(value: &OutputGroupSettings) -> Self {
        let builder = aws::OutputGroupSettings::builder();
        let builder = match value {
            OutputGroupSettings::Archive {
                destination_ref_id,
                rollover_interval,
            } => builder.archive_group_settings(
                aws::ArchiveGroupSettings::builder()
                    .destination(location(destination_ref_id))
                    .set_rollover_interval(*rollover_interval)
                    .build(),
            ),
            OutputGroupSettings::Hls {
                destination_ref_id,
                segment_length,
            } => builder.hls_group_settings(
                aws::HlsGroupSettings::builder()
                    .destination(location(destination_ref_id))
                    .set_segment_length(*segment_length)
                    .build(),
            ),
            OutputGroupSettings::MediaPackage { destination_ref_id } => builder
                .media_package_group_settings(
                    aws::MediaPackageGroupSettings::builder()
                        .destination(location(destination_ref_id))
                        .build(),
                ),
            OutputGroupSettings::MsSmooth {
                destination_ref_id,
                audio_only_timecode_control,
            } => builder.ms_smooth_group_settings(
                aws::MsSmoothGroupSettings::builder()
                    .destination(location(destination_ref_id))
                    .set_audio_only_timecode_control(audio_only_timecode_control.map(Into::into))
                    .build(),
            ),
            OutputGroupSettings::Udp {
                input_loss_action,
                timed_metadata_id3_period,
            } => builder.udp_group_settings(
                aws::UdpGroupSettings::builder()
                    .set_input_loss_action(input_loss_action.map(Into::into))
                    .set_timed_metadata_id3_period(*timed_metadata_id3_period)
                    .build(),
            ),
        };
        builder.build()
    }
}

impl TryFrom<&aws::OutputGroupSettings> for OutputGroupSettings {
    type Error = anyhow::Error;

    fn try_from(value: &aws::OutputGroupSettings) -> anyhow::Result<Self> {
        if let Some(archive) = value.archive_group_settings() {
            return Ok(OutputGroupSettings::Archive {
                destination_ref_id: location_id(archive.destination(), "archive group")?,
                rollover_interval: archive.rollover_interval(),
            });
        }
        if let Some(hls) = value.hls_group_settings() {
            return Ok(OutputGroupSettings::Hls {
                destination_ref_id: location_id(hls.destination(), "hls group")?,
                segment_length: hls.segment_length(),
            });
        }
        if let Some(package) = value.media_package_group_settings() {
            return Ok(OutputGroupSettings::MediaPackage {
                destination_ref_id: location_id(package.destination(), "media package group")?,
            });
        }
        if let Some(smooth) = value.ms_smooth_group_settings() {
            return Ok(OutputGroupSettings::MsSmooth {
                destination_ref_id: location_id(smooth.destination(), "ms smooth group")?,
                audio_only_timecode_control: mirror(smooth.audio_only_timecode_control())?,
            });
        }
        if let Some(udp) = value.udp_group_settings() {
            return Ok(OutputGroupSettings::Udp {
                input_loss_action: mirror(udp.input_loss_action())?,
                timed_metadata_id3_period: udp.timed_metadata_id3_period(),
            });
        }
        anyhow::bail!("unsupported output group settings")
    }
}

#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct OutputGroup {
    pub name: Option<String>,
    pub output_group_settings: OutputGroupSettings,
    pub outputs: Vec<Output>,
}

#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct EncoderSettings {
    pub timecode_config: TimecodeConfig,
    pub audio_descriptions: Vec<AudioDescription>,
    pub video_descriptions: Vec<VideoDescription>,
    pub output_groups: Vec<OutputGroup>,
}

impl EncoderSettings {
    pub fn expand(&self) -> aws::EncoderSettings {
        aws::EncoderSettings::builder()
            .timecode_config(
                aws::TimecodeConfig::builder()
                    .source(self.timecode_config.source.into())
                    .set_sync_threshold(self.timecode_config.sync_threshold)
                    .build(),
            )
            .set_audio_descriptions(Some(
                self.audio_descriptions.iter().map(Into::into).collect(),
            ))
            .set_video_descriptions(Some(
                self.video_descriptions.iter().map(Into::into).collect(),
            ))
            .set_output_groups(Some(
                self.output_groups
                    .iter()
                    .map(|group| {
                        aws::OutputGroup::builder()
                            .set_name(group.name.clone())
                            .output_group_settings((&group.output_group_settings).into())
                            .set_outputs(Some(group.outputs.iter().map(Into::into).collect()))
                            .build()
                    })
                    .collect(),
            ))
            .build()
    }

    pub fn flatten(settings: &aws::EncoderSettings) -> anyhow::Result<Self> {
        let timecode_config = settings
            .timecode_config()
            .context("missing timecode config")?;
        let output_groups = settings
            .output_groups()
            .present()
            .unwrap_or_default()
            .iter()
            .map(|group| {
                anyhow::Ok(OutputGroup {
                    name: group.name().present().map(str::to_owned),
                    output_group_settings: group
                        .output_group_settings()
                        .context("output group missing settings")?
                        .try_into()?,
                    outputs: group
                        .outputs()
                        .present()
                        .unwrap_or_default()
                        .iter()
                        .map(Output::try_from)
                        .collect::<anyhow::Result<_>>()?,
                })
            })
            .collect::<anyhow::Result<_>>()?;
        Ok(EncoderSettings {
            timecode_config: TimecodeConfig {
                source: timecode_config
                    .source()
                    .context("missing timecode source")?
                    .try_into()?,
                sync_threshold: timecode_config.sync_threshold(),
            },
            audio_descriptions: settings
                .audio_descriptions()
                .present()
                .unwrap_or_default()
                .iter()
                .map(AudioDescription::try_from)
                .collect::<anyhow::Result<_>>()?,
            video_descriptions: settings
                .video_descriptions()
                .present()
                .unwrap_or_default()
                .iter()
                .map(VideoDescription::try_from)
                .collect::<anyhow::Result<_>>()?,
            output_groups,
        })
    }
}
