use crate::tools::tool_runner::{ToolError, ToolRunner};
use serde::Deserialize;
use std::ffi::OsString;
use std::path::Path;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ProbeError {
    #[error(transparent)]
    Tool(#[from] ToolError),

    #[error("無法解析 ffprobe 輸出: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("找不到視訊串流")]
    NoVideoStream,

    #[error("無效的幀率: {0}")]
    InvalidFrameRate(String),
}

impl ProbeError {
    #[must_use]
    pub const fn category(&self) -> &'static str {
        match self {
            Self::Tool(e) => e.category(),
            Self::Parse(_) => "ParseError",
            Self::NoVideoStream => "NoVideoStream",
            Self::InvalidFrameRate(_) => "InvalidFrameRate",
        }
    }
}

/// ffprobe 取得的容器與串流資訊
#[derive(Debug, Clone, PartialEq)]
pub struct MediaProbeReport {
    pub format_name: Option<String>,
    pub duration_seconds: Option<f64>,
    pub bit_rate: Option<u64>,
    pub size_bytes: Option<u64>,
    pub streams: Vec<StreamDescriptor>,
    pub chapter_count: usize,
}

#[derive(Debug, Clone, PartialEq)]
pub struct StreamDescriptor {
    pub index: usize,
    pub codec_name: Option<String>,
    pub codec_tag: Option<String>,
    pub details: StreamDetails,
}

#[derive(Debug, Clone, PartialEq)]
pub enum StreamDetails {
    Video {
        width: Option<u32>,
        height: Option<u32>,
        /// 原始分數字串，例如 "30000/1001"
        frame_rate: Option<String>,
        bit_rate: Option<u64>,
    },
    Audio {
        sample_rate: Option<u32>,
        channels: Option<u32>,
    },
    Other {
        codec_type: String,
    },
}

impl StreamDetails {
    #[must_use]
    pub fn kind(&self) -> &str {
        match self {
            Self::Video { .. } => "video",
            Self::Audio { .. } => "audio",
            Self::Other { codec_type } => codec_type.as_str(),
        }
    }
}

impl StreamDescriptor {
    /// 視訊串流的幀率；非視訊串流或缺少幀率時為 `None`
    #[must_use]
    pub fn frame_rate_fps(&self) -> Option<Result<f64, ProbeError>> {
        match &self.details {
            StreamDetails::Video {
                frame_rate: Some(rate),
                ..
            } => Some(parse_frame_rate(rate)),
            _ => None,
        }
    }
}

#[derive(Deserialize)]
pub(crate) struct FfprobeOutput {
    pub format: Option<FormatInfo>,
    pub streams: Option<Vec<StreamInfo>>,
    pub chapters: Option<Vec<serde_json::Value>>,
}

#[derive(Deserialize)]
pub(crate) struct FormatInfo {
    pub format_name: Option<String>,
    pub duration: Option<String>,
    pub bit_rate: Option<String>,
    pub size: Option<String>,
}

#[derive(Deserialize)]
pub(crate) struct StreamInfo {
    pub codec_type: Option<String>,
    pub codec_name: Option<String>,
    pub codec_tag_string: Option<String>,
    pub width: Option<u32>,
    pub height: Option<u32>,
    pub r_frame_rate: Option<String>,
    pub avg_frame_rate: Option<String>,
    pub bit_rate: Option<String>,
    pub sample_rate: Option<String>,
    pub channels: Option<u32>,
    pub nb_read_packets: Option<String>,
}

impl StreamInfo {
    fn into_descriptor(self, index: usize) -> StreamDescriptor {
        let details = match self.codec_type.as_deref() {
            Some("video") => StreamDetails::Video {
                width: self.width,
                height: self.height,
                frame_rate: self.r_frame_rate,
                bit_rate: parse_number(self.bit_rate.as_deref()),
            },
            Some("audio") => StreamDetails::Audio {
                sample_rate: parse_number(self.sample_rate.as_deref()),
                channels: self.channels,
            },
            other => StreamDetails::Other {
                codec_type: other.unwrap_or("unknown").to_string(),
            },
        };

        StreamDescriptor {
            index,
            codec_name: self.codec_name,
            codec_tag: self.codec_tag_string,
            details,
        }
    }
}

fn parse_number<T: std::str::FromStr>(raw: Option<&str>) -> Option<T> {
    raw.and_then(|value| value.trim().parse().ok())
}

pub(crate) fn parse_ffprobe_json(raw: &str) -> Result<FfprobeOutput, ProbeError> {
    Ok(serde_json::from_str(raw)?)
}

/// 解析 `-show_format -show_streams -show_chapters` 的 JSON 輸出
pub fn parse_media_report(raw: &str) -> Result<MediaProbeReport, ProbeError> {
    let probe = parse_ffprobe_json(raw)?;
    let format = probe.format;

    let streams = probe
        .streams
        .unwrap_or_default()
        .into_iter()
        .enumerate()
        .map(|(index, stream)| stream.into_descriptor(index))
        .collect();

    Ok(MediaProbeReport {
        format_name: format.as_ref().and_then(|f| f.format_name.clone()),
        duration_seconds: parse_number(format.as_ref().and_then(|f| f.duration.as_deref())),
        bit_rate: parse_number(format.as_ref().and_then(|f| f.bit_rate.as_deref())),
        size_bytes: parse_number(format.as_ref().and_then(|f| f.size.as_deref())),
        streams,
        chapter_count: probe.chapters.map_or(0, |chapters| chapters.len()),
    })
}

/// 使用 ffprobe 取得完整的容器、串流與章節資訊
pub fn probe_media(ffprobe: &ToolRunner, path: &Path) -> Result<MediaProbeReport, ProbeError> {
    let args: Vec<OsString> = vec![
        "-v".into(),
        "quiet".into(),
        "-print_format".into(),
        "json".into(),
        "-show_format".into(),
        "-show_streams".into(),
        "-show_chapters".into(),
        path.into(),
    ];
    let output = ffprobe.run_checked(&args)?;
    parse_media_report(&output.stdout_text())
}

/// 只查詢第一個視訊串流的編碼名稱（小寫）
pub fn probe_video_codec(ffprobe: &ToolRunner, path: &Path) -> Result<String, ProbeError> {
    let args: Vec<OsString> = vec![
        "-v".into(),
        "error".into(),
        "-select_streams".into(),
        "v:0".into(),
        "-show_entries".into(),
        "stream=codec_name".into(),
        "-of".into(),
        "default=noprint_wrappers=1:nokey=1".into(),
        path.into(),
    ];
    let output = ffprobe.run_checked(&args)?;
    output
        .stdout_text()
        .lines()
        .map(str::trim)
        .find(|line| !line.is_empty())
        .map(str::to_lowercase)
        .ok_or(ProbeError::NoVideoStream)
}

/// 解析幀率字串（例如 "30/1" 或 "30000/1001"），分母為 0 或格式錯誤時回傳錯誤
pub fn parse_frame_rate(rate: &str) -> Result<f64, ProbeError> {
    let invalid = || ProbeError::InvalidFrameRate(rate.to_string());
    let (num_str, den_str) = rate.trim().split_once('/').unwrap_or((rate.trim(), "1"));

    let num: u64 = num_str.trim().parse().map_err(|_| invalid())?;
    let den: u64 = den_str.trim().parse().map_err(|_| invalid())?;
    if den == 0 {
        return Err(invalid());
    }

    let whole = num.checked_div(den).ok_or_else(invalid)?;
    let remainder = num % den;
    Ok(whole as f64 + remainder as f64 / den as f64)
}

/// 優先使用 avg_frame_rate；可變幀率檔案的 avg 可能是 "0/0"，此時改用 r_frame_rate
pub fn resolve_frame_rate(
    avg_frame_rate: Option<&str>,
    r_frame_rate: Option<&str>,
) -> Result<f64, ProbeError> {
    avg_frame_rate
        .and_then(|rate| parse_frame_rate(rate).ok().filter(|fps| *fps > 0.0))
        .map_or_else(|| parse_frame_rate(r_frame_rate.unwrap_or("0/0")), Ok)
}
