//! Audio and video codec settings of channel encoders.
use aws_sdk_medialive::types as aws;

use crate::aws::{aws_enum, mirror};

aws_enum! {
    AacRateControlMode => aws::AacRateControlMode {
        Cbr = "CBR",
        Vbr = "VBR",
    }
}

#[derive(Debug, Default, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct AacSettings {
    pub bitrate: Option<f64>,
    pub rate_control_mode: Option<AacRateControlMode>,
    pub sample_rate: Option<f64>,
}

#[derive(Debug, Default, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct Ac3Settings {
    pub bitrate: Option<f64>,
}

/// Exactly one audio codec.
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AudioCodecSettings {
    Aac(AacSettings),
    Ac3(Ac3Settings),
}

impl From<&AudioCodecSettings> for aws::AudioCodecSettings {
    fn from(value: &AudioCodecSettings) -> Self {
        let builder = aws::AudioCodecSettings::builder();
        let builder = match value {
            AudioCodecSettings::Aac(aac) => builder.aac_settings(
                aws::AacSettings::builder()
                    .set_bitrate(aac.bitrate)
                    .set_rate_control_mode(aac.rate_control_mode.map(Into::into))
                    .set_sample_rate(aac.sample_rate)
                    .build(),
            ),
            AudioCodecSettings::Ac3(ac3) => {
                builder.ac3_settings(aws::Ac3Settings::builder().set_bitrate(ac3.bitrate).build())
            }
        };
        builder.build()
    }
}

impl TryFrom<&aws::AudioCodecSettings> for AudioCodecSettings {
    type Error = anyhow::Error;

    fn try_from(value: &aws::AudioCodecSettings) -> anyhow::Result<Self> {
        if let Some(aac) = value.aac_settings() {
            return Ok(AudioCodecSettings::Aac(AacSettings {
                bitrate: aac.bitrate(),
                rate_control_mode: mirror(aac.rate_control_mode())?,
                sample_rate: aac.sample_rate(),
            }));
        }
        if let Some(ac3) = value.ac3_settings() {
            return Ok(AudioCodecSettings::Ac3(Ac3Settings {
                bitrate: ac3.bitrate(),
            }));
        }
        anyhow::bail!("unsupported audio codec settings")
    }
}

aws_enum! {
    AfdSignaling => aws::AfdSignaling {
        Auto = "AUTO",
        Fixed = "FIXED",
        NoAfd = "NONE",
    }
}

aws_enum! {
    FixedAfd => aws::FixedAfd {
        Afd0000 = "AFD_0000",
        Afd0010 = "AFD_0010",
        Afd0011 = "AFD_0011",
        Afd0100 = "AFD_0100",
        Afd1000 = "AFD_1000",
        Afd1001 = "AFD_1001",
        Afd1010 = "AFD_1010",
        Afd1011 = "AFD_1011",
        Afd1101 = "AFD_1101",
        Afd1110 = "AFD_1110",
        Afd1111 = "AFD_1111",
    }
}

aws_enum! {
    H264AdaptiveQuantization => aws::H264AdaptiveQuantization {
        Auto = "AUTO",
        High = "HIGH",
        Higher = "HIGHER",
        Low = "LOW",
        Max = "MAX",
        Medium = "MEDIUM",
        Off = "OFF",
    }
}

aws_enum! {
    H264ColorMetadata => aws::H264ColorMetadata {
        Ignore = "IGNORE",
        Insert = "INSERT",
    }
}

aws_enum! {
    H264EntropyEncoding => aws::H264EntropyEncoding {
        Cabac = "CABAC",
        Cavlc = "CAVLC",
    }
}

aws_enum! {
    H264FlickerAq => aws::H264FlickerAq {
        Disabled = "DISABLED",
        Enabled = "ENABLED",
    }
}

aws_enum! {
    H264ForceFieldPictures => aws::H264ForceFieldPictures {
        Disabled = "DISABLED",
        Enabled = "ENABLED",
    }
}

aws_enum! {
    H264FramerateControl => aws::H264FramerateControl {
        InitializeFromSource = "INITIALIZE_FROM_SOURCE",
        Specified = "SPECIFIED",
    }
}

aws_enum! {
    H264GopBReference => aws::H264GopBReference {
        Disabled = "DISABLED",
        Enabled = "ENABLED",
    }
}

aws_enum! {
    H264GopSizeUnits => aws::H264GopSizeUnits {
        Frames = "FRAMES",
        Seconds = "SECONDS",
    }
}

aws_enum! {
    H264Level => aws::H264Level {
        Level1 = "H264_LEVEL_1",
        Level11 = "H264_LEVEL_1_1",
        Level12 = "H264_LEVEL_1_2",
        Level13 = "H264_LEVEL_1_3",
        Level2 = "H264_LEVEL_2",
        Level21 = "H264_LEVEL_2_1",
        Level22 = "H264_LEVEL_2_2",
        Level3 = "H264_LEVEL_3",
        Level31 = "H264_LEVEL_3_1",
        Level32 = "H264_LEVEL_3_2",
        Level4 = "H264_LEVEL_4",
        Level41 = "H264_LEVEL_4_1",
        Level42 = "H264_LEVEL_4_2",
        Level5 = "H264_LEVEL_5",
        Level51 = "H264_LEVEL_5_1",
        Level52 = "H264_LEVEL_5_2",
        Auto = "H264_LEVEL_AUTO",
    }
}

aws_enum! {
    H264LookAheadRateControl => aws::H264LookAheadRateControl {
        High = "HIGH",
        Low = "LOW",
        Medium = "MEDIUM",
    }
}

aws_enum! {
    H264ParControl => aws::H264ParControl {
        InitializeFromSource = "INITIALIZE_FROM_SOURCE",
        Specified = "SPECIFIED",
    }
}

aws_enum! {
    H264Profile => aws::H264Profile {
        Baseline = "BASELINE",
        High = "HIGH",
        High10Bit = "HIGH_10BIT",
        High422 = "HIGH_422",
        High42210Bit = "HIGH_422_10BIT",
        Main = "MAIN",
    }
}

aws_enum! {
    H264RateControlMode => aws::H264RateControlMode {
        Cbr = "CBR",
        Multiplex = "MULTIPLEX",
        Qvbr = "QVBR",
        Vbr = "VBR",
    }
}

aws_enum! {
    H264ScanType => aws::H264ScanType {
        Interlaced = "INTERLACED",
        Progressive = "PROGRESSIVE",
    }
}

aws_enum! {
    H264SceneChangeDetect => aws::H264SceneChangeDetect {
        Disabled = "DISABLED",
        Enabled = "ENABLED",
    }
}

aws_enum! {
    H264SpatialAq => aws::H264SpatialAq {
        Disabled = "DISABLED",
        Enabled = "ENABLED",
    }
}

aws_enum! {
    H264SubGopLength => aws::H264SubGopLength {
        Dynamic = "DYNAMIC",
        Fixed = "FIXED",
    }
}

aws_enum! {
    H264Syntax => aws::H264Syntax {
        Default = "DEFAULT",
        Rp2027 = "RP2027",
    }
}

aws_enum! {
    H264TemporalAq => aws::H264TemporalAq {
        Disabled = "DISABLED",
        Enabled = "ENABLED",
    }
}

aws_enum! {
    H264TimecodeInsertionBehavior => aws::H264TimecodeInsertionBehavior {
        Disabled = "DISABLED",
        PicTimingSei = "PIC_TIMING_SEI",
    }
}

#[derive(Debug, Default, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct H264Settings {
    pub adaptive_quantization: Option<H264AdaptiveQuantization>,
    pub afd_signaling: Option<AfdSignaling>,
    pub bitrate: Option<i32>,
    pub buf_fill_pct: Option<i32>,
    pub buf_size: Option<i32>,
    pub color_metadata: Option<H264ColorMetadata>,
    pub entropy_encoding: Option<H264EntropyEncoding>,
    pub fixed_afd: Option<FixedAfd>,
    pub flicker_aq: Option<H264FlickerAq>,
    pub force_field_pictures: Option<H264ForceFieldPictures>,
    pub framerate_control: Option<H264FramerateControl>,
    pub framerate_numerator: Option<i32>,
    pub framerate_denominator: Option<i32>,
    pub gop_b_reference: Option<H264GopBReference>,
    pub gop_closed_cadence: Option<i32>,
    pub gop_num_b_frames: Option<i32>,
    pub gop_size: Option<f64>,
    pub gop_size_units: Option<H264GopSizeUnits>,
    pub level: Option<H264Level>,
    pub look_ahead_rate_control: Option<H264LookAheadRateControl>,
    pub max_bitrate: Option<i32>,
    pub min_i_interval: Option<i32>,
    pub num_ref_frames: Option<i32>,
    pub par_control: Option<H264ParControl>,
    pub par_numerator: Option<i32>,
    pub par_denominator: Option<i32>,
    pub profile: Option<H264Profile>,
    pub qvbr_quality_level: Option<i32>,
    pub rate_control_mode: Option<H264RateControlMode>,
    pub scan_type: Option<H264ScanType>,
    pub scene_change_detect: Option<H264SceneChangeDetect>,
    pub slices: Option<i32>,
    pub spatial_aq: Option<H264SpatialAq>,
    pub subgop_length: Option<H264SubGopLength>,
    pub syntax: Option<H264Syntax>,
    pub temporal_aq: Option<H264TemporalAq>,
    pub timecode_insertion: Option<H264TimecodeInsertionBehavior>,
}

impl From<&H264Settings> for aws::H264Settings {
    fn from(value: &H264Settings) -> Self {
        aws::H264Settings::builder()
            .set_adaptive_quantization(value.adaptive_quantization.map(Into::into))
            .set_afd_signaling(value.afd_signaling.map(Into::into))
            .set_bitrate(value.bitrate)
            .set_buf_fill_pct(value.buf_fill_pct)
            .set_buf_size(value.buf_size)
            .set_color_metadata(value.color_metadata.map(Into::into))
            .set_entropy_encoding(value.entropy_encoding.map(Into::into))
            .set_fixed_afd(value.fixed_afd.map(Into::into))
            .set_flicker_aq(value.flicker_aq.map(Into::into))
            .set_force_field_pictures(value.force_field_pictures.map(Into::into))
            .set_framerate_control(value.framerate_control.map(Into::into))
            .set_framerate_numerator(value.framerate_numerator)
            .set_framerate_denominator(value.framerate_denominator)
            .set_gop_b_reference(value.gop_b_reference.map(Into::into))
            .set_gop_closed_cadence(value.gop_closed_cadence)
            .set_gop_num_b_frames(value.gop_num_b_frames)
            .set_gop_size(value.gop_size)
            .set_gop_size_units(value.gop_size_units.map(Into::into))
            .set_level(value.level.map(Into::into))
            .set_look_ahead_rate_control(value.look_ahead_rate_control.map(Into::into))
            .set_max_bitrate(value.max_bitrate)
            .set_min_i_interval(value.min_i_interval)
            .set_num_ref_frames(value.num_ref_frames)
            .set_par_control(value.par_control.map(Into::into))
            .set_par_numerator(value.par_numerator)
            .set_par_denominator(value.par_denominator)
            .set_profile(value.profile.map(Into::into))
            .set_qvbr_quality_level(value.qvbr_quality_level)
            .set_rate_control_mode(value.rate_control_mode.map(Into::into))
            .set_scan_type(value.scan_type.map(Into::into))
            .set_scene_change_detect(value.scene_change_detect.map(Into::into))
            .set_slices(value.slices)
            .set_spatial_aq(value.spatial_aq.map(Into::into))
            .set_subgop_length(value.subgop_length.map(Into::into))
            .set_syntax(value.syntax.map(Into::into))
            .set_temporal_aq(value.temporal_aq.map(Into::into))
            .set_timecode_insertion(value.timecode_insertion.map(Into::into))
            .build()
    }
}

impl TryFrom<&aws::H264Settings> for H264Settings {
    type Error = anyhow::Error;

    fn try_from(value: &aws::H264Settings) -> anyhow::Result<Self> {
        Ok(H264Settings {
            adaptive_quantization: mirror(value.adaptive_quantization())?,
            afd_signaling: mirror(value.afd_signaling())?,
            bitrate: value.bitrate(),
            buf_fill_pct: value.buf_fill_pct(),
            buf_size: value.buf_size(),
            color_metadata: mirror(value.color_metadata())?,
            entropy_encoding: mirror(value.entropy_encoding())?,
            fixed_afd: mirror(value.fixed_afd())?,
            flicker_aq: mirror(value.flicker_aq())?,
            force_field_pictures: mirror(value.force_field_pictures())?,
            framerate_control: mirror(value.framerate_control())?,
            framerate_numerator: value.framerate_numerator(),
            framerate_denominator: value.framerate_denominator(),
            gop_b_reference: mirror(value.gop_b_reference())?,
            gop_closed_cadence: value.gop_closed_cadence(),
            gop_num_b_frames: value.gop_num_b_frames(),
            gop_size: value.gop_size(),
            gop_size_units: mirror(value.gop_size_units())?,
            level: mirror(value.level())?,
            look_ahead_rate_control: mirror(value.look_ahead_rate_control())?,
            max_bitrate: value.max_bitrate(),
            min_i_interval: value.min_i_interval(),
            num_ref_frames: value.num_ref_frames(),
            par_control: mirror(value.par_control())?,
            par_numerator: value.par_numerator(),
            par_denominator: value.par_denominator(),
            profile: mirror(value.profile())?,
            qvbr_quality_level: value.qvbr_quality_level(),
            rate_control_mode: mirror(value.rate_control_mode())?,
            scan_type: mirror(value.scan_type())?,
            scene_change_detect: mirror(value.scene_change_detect())?,
            slices: value.slices(),
            spatial_aq: mirror(value.spatial_aq())?,
            subgop_length: mirror(value.subgop_length())?,
            syntax: mirror(value.syntax())?,
            temporal_aq: mirror(value.temporal_aq())?,
            timecode_insertion: mirror(value.timecode_insertion())?,
        })
    }
}

aws_enum! {
    H265AdaptiveQuantization => aws::H265AdaptiveQuantization {
        Auto = "AUTO",
        High = "HIGH",
        Higher = "HIGHER",
        Low = "LOW",
        Max = "MAX",
        Medium = "MEDIUM",
        Off = "OFF",
    }
}

aws_enum! {
    H265ColorMetadata => aws::H265ColorMetadata {
        Ignore = "IGNORE",
        Insert = "INSERT",
    }
}

aws_enum! {
    H265FlickerAq => aws::H265FlickerAq {
        Disabled = "DISABLED",
        Enabled = "ENABLED",
    }
}

aws_enum! {
    H265GopSizeUnits => aws::H265GopSizeUnits {
        Frames = "FRAMES",
        Seconds = "SECONDS",
    }
}

aws_enum! {
    H265Level => aws::H265Level {
        Level1 = "H265_LEVEL_1",
        Level2 = "H265_LEVEL_2",
        Level21 = "H265_LEVEL_2_1",
        Level3 = "H265_LEVEL_3",
        Level31 = "H265_LEVEL_3_1",
        Level4 = "H265_LEVEL_4",
        Level41 = "H265_LEVEL_4_1",
        Level5 = "H265_LEVEL_5",
        Level51 = "H265_LEVEL_5_1",
        Level52 = "H265_LEVEL_5_2",
        Level6 = "H265_LEVEL_6",
        Level61 = "H265_LEVEL_6_1",
        Level62 = "H265_LEVEL_6_2",
        Auto = "H265_LEVEL_AUTO",
    }
}

aws_enum! {
    H265LookAheadRateControl => aws::H265LookAheadRateControl {
        High = "HIGH",
        Low = "LOW",
        Medium = "MEDIUM",
    }
}

aws_enum! {
    H265Profile => aws::H265Profile {
        Main = "MAIN",
        Main10Bit = "MAIN_10BIT",
    }
}

aws_enum! {
    H265RateControlMode => aws::H265RateControlMode {
        Cbr = "CBR",
        Multiplex = "MULTIPLEX",
        Qvbr = "QVBR",
    }
}

aws_enum! {
    H265ScanType => aws::H265ScanType {
        Interlaced = "INTERLACED",
        Progressive = "PROGRESSIVE",
    }
}

aws_enum! {
    H265SceneChangeDetect => aws::H265SceneChangeDetect {
        Disabled = "DISABLED",
        Enabled = "ENABLED",
    }
}

aws_enum! {
    H265Tier => aws::H265Tier {
        High = "HIGH",
        Main = "MAIN",
    }
}

aws_enum! {
    H265TimecodeInsertionBehavior => aws::H265TimecodeInsertionBehavior {
        Disabled = "DISABLED",
        PicTimingSei = "PIC_TIMING_SEI",
    }
}

aws_enum! {
    TemporalFilterPostFilterSharpening => aws::TemporalFilterPostFilterSharpening {
        Auto = "AUTO",
        Disabled = "DISABLED",
        Enabled = "ENABLED",
    }
}

aws_enum! {
    TemporalFilterStrength => aws::TemporalFilterStrength {
        Auto = "AUTO",
        Strength1 = "STRENGTH_1",
        Strength2 = "STRENGTH_2",
        Strength3 = "STRENGTH_3",
        Strength4 = "STRENGTH_4",
        Strength5 = "STRENGTH_5",
        Strength6 = "STRENGTH_6",
        Strength7 = "STRENGTH_7",
        Strength8 = "STRENGTH_8",
        Strength9 = "STRENGTH_9",
        Strength10 = "STRENGTH_10",
        Strength11 = "STRENGTH_11",
        Strength12 = "STRENGTH_12",
        Strength13 = "STRENGTH_13",
        Strength14 = "STRENGTH_14",
        Strength15 = "STRENGTH_15",
        Strength16 = "STRENGTH_16",
    }
}

aws_enum! {
    TimecodeBurninFontSize => aws::TimecodeBurninFontSize {
        ExtraSmall10 = "EXTRA_SMALL_10",
        Large48 = "LARGE_48",
        Medium32 = "MEDIUM_32",
        Small16 = "SMALL_16",
    }
}

aws_enum! {
    TimecodeBurninPosition => aws::TimecodeBurninPosition {
        BottomCenter = "BOTTOM_CENTER",
        BottomLeft = "BOTTOM_LEFT",
        BottomRight = "BOTTOM_RIGHT",
        MiddleCenter = "MIDDLE_CENTER",
        MiddleLeft = "MIDDLE_LEFT",
        MiddleRight = "MIDDLE_RIGHT",
        TopCenter = "TOP_CENTER",
        TopLeft = "TOP_LEFT",
        TopRight = "TOP_RIGHT",
    }
}

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct Hdr10Settings {
    pub max_cll: Option<i32>,
    pub max_fall: Option<i32>,
}

/// Exactly one color space conversion.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum H265ColorSpaceSettings {
    ColorSpacePassthrough,
    Hdr10(Hdr10Settings),
    Rec601,
    Rec709,
}

impl From<&H265ColorSpaceSettings> for aws::H265ColorSpaceSettings {
    fn from(value: &H265ColorSpaceSettings) -> Self {
        let builder = aws::H265ColorSpaceSettings::builder();
        let builder = match value {
            H265ColorSpaceSettings::ColorSpacePassthrough => builder
                .color_space_passthrough_settings(
                    aws::ColorSpacePassthroughSettings::builder().build(),
                ),
            H265ColorSpaceSettings::Hdr10(hdr10) => builder.hdr10_settings(
                aws::Hdr10Settings::builder()
                    .set_max_cll(hdr10.max_cll)
                    .set_max_fall(hdr10.max_fall)
                    .build(),
            ),
            H265ColorSpaceSettings::Rec601 => {
                builder.rec601_settings(aws::Rec601Settings::builder().build())
            }
            H265ColorSpaceSettings::Rec709 => {
                builder.rec709_settings(aws::Rec709Settings::builder().build())
            }
        };
        builder.build()
    }
}

impl TryFrom<&aws::H265ColorSpaceSettings> for H265ColorSpaceSettings {
    type Error = anyhow::Error;

    fn try_from(value: &aws::H265ColorSpaceSettings) -> anyhow::Result<Self> {
        if value.color_space_passthrough_settings().is_some() {
            Ok(H265ColorSpaceSettings::ColorSpacePassthrough)
        } else if let Some(hdr10) = value.hdr10_settings() {
            Ok(H265ColorSpaceSettings::Hdr10(Hdr10Settings {
                max_cll: hdr10.max_cll(),
                max_fall: hdr10.max_fall(),
            }))
        } else if value.rec601_settings().is_some() {
            Ok(H265ColorSpaceSettings::Rec601)
        } else if value.rec709_settings().is_some() {
            Ok(H265ColorSpaceSettings::Rec709)
        } else {
            anyhow::bail!("unsupported H265 color space settings")
        }
    }
}

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct TemporalFilterSettings {
    pub post_filter_sharpening: Option<TemporalFilterPostFilterSharpening>,
    pub strength: Option<TemporalFilterStrength>,
}

#[derive(Debug, Default, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct TimecodeBurninSettings {
    pub font_size: Option<TimecodeBurninFontSize>,
    pub position: Option<TimecodeBurninPosition>,
    pub prefix: Option<String>,
}

#[derive(Debug, Default, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct H265Settings {
    pub adaptive_quantization: Option<H265AdaptiveQuantization>,
    pub afd_signaling: Option<AfdSignaling>,
    pub bitrate: Option<i32>,
    pub buf_size: Option<i32>,
    pub color_metadata: Option<H265ColorMetadata>,
    pub color_space_settings: Option<H265ColorSpaceSettings>,
    pub temporal_filter_settings: Option<TemporalFilterSettings>,
    pub fixed_afd: Option<FixedAfd>,
    pub flicker_aq: Option<H265FlickerAq>,
    pub framerate_numerator: i32,
    pub framerate_denominator: i32,
    pub gop_closed_cadence: Option<i32>,
    pub gop_size: Option<f64>,
    pub gop_size_units: Option<H265GopSizeUnits>,
    pub level: Option<H265Level>,
    pub look_ahead_rate_control: Option<H265LookAheadRateControl>,
    pub min_i_interval: Option<i32>,
    pub profile: Option<H265Profile>,
    pub rate_control_mode: Option<H265RateControlMode>,
    pub scan_type: Option<H265ScanType>,
    pub scene_change_detect: Option<H265SceneChangeDetect>,
    pub slices: Option<i32>,
    pub tier: Option<H265Tier>,
    pub timecode_insertion: Option<H265TimecodeInsertionBehavior>,
    pub timecode_burnin_settings: Option<TimecodeBurninSettings>,
}

impl From<&H265Settings> for aws::H265Settings {
    fn from(value: &H265Settings) -> Self {
        aws::H265Settings::builder()
            .set_adaptive_quantization(value.adaptive_quantization.map(Into::into))
            .set_afd_signaling(value.afd_signaling.map(Into::into))
            .set_bitrate(value.bitrate)
            .set_buf_size(value.buf_size)
            .set_color_metadata(value.color_metadata.map(Into::into))
            .set_color_space_settings(value.color_space_settings.as_ref().map(Into::into))
            .set_filter_settings(value.temporal_filter_settings.map(|t| {
                aws::H265FilterSettings::builder()
                    .temporal_filter_settings(
                        aws::TemporalFilterSettings::builder()
                            .set_post_filter_sharpening(t.post_filter_sharpening.map(Into::into))
                            .set_strength(t.strength.map(Into::into))
                            .build(),
                    )
                    .build()
            }))
            .set_fixed_afd(value.fixed_afd.map(Into::into))
            .set_flicker_aq(value.flicker_aq.map(Into::into))
            .framerate_numerator(value.framerate_numerator)
            .framerate_denominator(value.framerate_denominator)
            .set_gop_closed_cadence(value.gop_closed_cadence)
            .set_gop_size(value.gop_size)
            .set_gop_size_units(value.gop_size_units.map(Into::into))
            .set_level(value.level.map(Into::into))
            .set_look_ahead_rate_control(value.look_ahead_rate_control.map(Into::into))
            .set_min_i_interval(value.min_i_interval)
            .set_profile(value.profile.map(Into::into))
            .set_rate_control_mode(value.rate_control_mode.map(Into::into))
            .set_scan_type(value.scan_type.map(Into::into))
            .set_scene_change_detect(value.scene_change_detect.map(Into::into))
            .set_slices(value.slices)
            .set_tier(value.tier.map(Into::into))
            .set_timecode_insertion(value.timecode_insertion.map(Into::into))
            .set_timecode_burnin_settings(value.timecode_burnin_settings.as_ref().map(|t| {
                aws::TimecodeBurninSettings::builder()
                    .set_font_size(t.font_size.map(Into::into))
                    .set_position(t.position.map(Into::into))
                    .set_prefix(t.prefix.clone())
                    .build()
            }))
            .build()
    }
}

impl TryFrom<&aws::H265Settings> for H265Settings {
    type Error = anyhow::Error;

    fn try_from(value: &aws::H265Settings) -> anyhow::Result<Self> {
        let temporal_filter_settings = value
            .filter_settings()
            .and_then(|f| f.temporal_filter_settings())
            .map(|t| {
                anyhow::Ok(TemporalFilterSettings {
                    post_filter_sharpening: mirror(t.post_filter_sharpening())?,
                    strength: mirror(t.strength())?,
                })
            })
            .transpose()?;
        let timecode_burnin_settings = value
            .timecode_burnin_settings()
            .map(|t| {
                anyhow::Ok(TimecodeBurninSettings {
                    font_size: mirror(t.font_size())?,
                    position: mirror(t.position())?,
                    prefix: t.prefix().map(str::to_owned),
                })
            })
            .transpose()?;
        Ok(H265Settings {
            adaptive_quantization: mirror(value.adaptive_quantization())?,
            afd_signaling: mirror(value.afd_signaling())?,
            bitrate: value.bitrate(),
            buf_size: value.buf_size(),
            color_metadata: mirror(value.color_metadata())?,
            color_space_settings: value
                .color_space_settings()
                .map(TryInto::try_into)
                .transpose()?,
            temporal_filter_settings,
            fixed_afd: mirror(value.fixed_afd())?,
            flicker_aq: mirror(value.flicker_aq())?,
            framerate_numerator: value.framerate_numerator().unwrap_or_default(),
            framerate_denominator: value.framerate_denominator().unwrap_or_default(),
            gop_closed_cadence: value.gop_closed_cadence(),
            gop_size: value.gop_size(),
            gop_size_units: mirror(value.gop_size_units())?,
            level: mirror(value.level())?,
            look_ahead_rate_control: mirror(value.look_ahead_rate_control())?,
            min_i_interval: value.min_i_interval(),
            profile: mirror(value.profile())?,
            rate_control_mode: mirror(value.rate_control_mode())?,
            scan_type: mirror(value.scan_type())?,
            scene_change_detect: mirror(value.scene_change_detect())?,
            slices: value.slices(),
            tier: mirror(value.tier())?,
            timecode_insertion: mirror(value.timecode_insertion())?,
            timecode_burnin_settings,
        })
    }
}

/// Exactly one video codec.
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VideoCodecSettings {
    H264(H264Settings),
    H265(H265Settings),
}

impl From<&VideoCodecSettings> for aws::VideoCodecSettings {
    fn from(value: &VideoCodecSettings) -> Self {
        let builder = aws::VideoCodecSettings::builder();
        let builder = match value {
            VideoCodecSettings::H264(h264) => builder.h264_settings(h264.into()),
            VideoCodecSettings::H265(h265) => builder.h265_settings(h265.into()),
        };
        builder.build()
    }
}

impl TryFrom<&aws::VideoCodecSettings> for VideoCodecSettings {
    type Error = anyhow::Error;

    fn try_from(value: &aws::VideoCodecSettings) -> anyhow::Result<Self> {
        if let Some(h264) = value.h264_settings() {
            Ok(VideoCodecSettings::H264(h264.try_into()?))
        } else if let Some(h265) = value.h265_settings() {
            Ok(VideoCodecSettings::H265(h265.try_into()?))
        } else {
            anyhow::bail!("unsupported video codec settings")
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn aac_and_ac3_read_back() {
        for local in [
            AudioCodecSettings::Aac(AacSettings {
                bitrate: Some(192000.0),
                rate_control_mode: Some(AacRateControlMode::Cbr),
                sample_rate: Some(48000.0),
            }),
            AudioCodecSettings::Ac3(Ac3Settings {
                bitrate: Some(384000.0),
            }),
        ] {
            let remote = aws::AudioCodecSettings::from(&local);
            assert_eq!(local, AudioCodecSettings::try_from(&remote).unwrap());
        }
    }

    #[test]
    fn h264_reads_back() {
        let local = VideoCodecSettings::H264(H264Settings {
            adaptive_quantization: Some(H264AdaptiveQuantization::Low),
            afd_signaling: Some(AfdSignaling::NoAfd),
            bitrate: Some(5_400_000),
            buf_fill_pct: Some(90),
            buf_size: Some(10_800_000),
            color_metadata: Some(H264ColorMetadata::Ignore),
            entropy_encoding: Some(H264EntropyEncoding::Cabac),
            flicker_aq: Some(H264FlickerAq::Enabled),
            force_field_pictures: Some(H264ForceFieldPictures::Disabled),
            framerate_control: Some(H264FramerateControl::Specified),
            framerate_numerator: Some(50),
            framerate_denominator: Some(1),
            gop_b_reference: Some(H264GopBReference::Disabled),
            gop_closed_cadence: Some(1),
            gop_num_b_frames: Some(1),
            gop_size: Some(1.92),
            gop_size_units: Some(H264GopSizeUnits::Seconds),
            level: Some(H264Level::Auto),
            look_ahead_rate_control: Some(H264LookAheadRateControl::High),
            num_ref_frames: Some(3),
            par_control: Some(H264ParControl::InitializeFromSource),
            profile: Some(H264Profile::High),
            rate_control_mode: Some(H264RateControlMode::Cbr),
            scan_type: Some(H264ScanType::Progressive),
            scene_change_detect: Some(H264SceneChangeDetect::Enabled),
            slices: Some(1),
            spatial_aq: Some(H264SpatialAq::Enabled),
            subgop_length: Some(H264SubGopLength::Fixed),
            syntax: Some(H264Syntax::Default),
            temporal_aq: Some(H264TemporalAq::Enabled),
            timecode_insertion: Some(H264TimecodeInsertionBehavior::PicTimingSei),
            ..Default::default()
        });
        let remote = aws::VideoCodecSettings::from(&local);
        pretty_assertions::assert_eq!(local, VideoCodecSettings::try_from(&remote).unwrap());
    }

    #[test]
    fn h265_reads_back() {
        let local = VideoCodecSettings::H265(H265Settings {
            adaptive_quantization: Some(H265AdaptiveQuantization::Low),
            afd_signaling: Some(AfdSignaling::Fixed),
            bitrate: Some(5_400_000),
            buf_size: Some(20_000_000),
            color_metadata: Some(H265ColorMetadata::Ignore),
            color_space_settings: Some(H265ColorSpaceSettings::Hdr10(Hdr10Settings {
                max_cll: Some(16),
                max_fall: Some(16),
            })),
            temporal_filter_settings: Some(TemporalFilterSettings {
                post_filter_sharpening: Some(TemporalFilterPostFilterSharpening::Auto),
                strength: Some(TemporalFilterStrength::Strength1),
            }),
            fixed_afd: Some(FixedAfd::Afd0000),
            flicker_aq: Some(H265FlickerAq::Enabled),
            framerate_numerator: 50,
            framerate_denominator: 1,
            gop_closed_cadence: Some(1),
            gop_size: Some(1.92),
            gop_size_units: Some(H265GopSizeUnits::Seconds),
            level: Some(H265Level::Auto),
            look_ahead_rate_control: Some(H265LookAheadRateControl::High),
            min_i_interval: Some(6),
            profile: Some(H265Profile::Main10Bit),
            rate_control_mode: Some(H265RateControlMode::Cbr),
            scan_type: Some(H265ScanType::Progressive),
            scene_change_detect: Some(H265SceneChangeDetect::Enabled),
            slices: Some(2),
            tier: Some(H265Tier::High),
            timecode_insertion: Some(H265TimecodeInsertionBehavior::Disabled),
            timecode_burnin_settings: Some(TimecodeBurninSettings {
                font_size: Some(TimecodeBurninFontSize::Small16),
                position: Some(TimecodeBurninPosition::BottomCenter),
                prefix: Some("terraform-test".to_owned()),
            }),
        });
        let remote = aws::VideoCodecSettings::from(&local);
        pretty_assertions::assert_eq!(local, VideoCodecSettings::try_from(&remote).unwrap());
    }

    #[test]
    fn missing_codec_is_an_error() {
        let remote = aws::VideoCodecSettings::builder().build();
        let err = VideoCodecSettings::try_from(&remote).unwrap_err();
        assert_eq!("unsupported video codec settings", err.to_string());
    }
}
