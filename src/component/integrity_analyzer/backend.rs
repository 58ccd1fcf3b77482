use crate::tools::{ProbeError, ToolError};
use log::warn;
use std::any::Any;
use std::fmt;
use std::panic::{self, AssertUnwindSafe};
use std::path::Path;
use thiserror::Error;

/// 可以完整載入一支影片的解碼後端
pub trait LoadBackend {
    fn name(&self) -> &str;
    fn load(&self, path: &Path) -> LoadOutcome;
}

#[derive(Debug, Error)]
pub enum LoadError {
    #[error(transparent)]
    Tool(#[from] ToolError),

    #[error(transparent)]
    Probe(#[from] ProbeError),

    #[error("影片沒有可解碼的畫面")]
    EmptyVideo,

    #[error("讀取{position}幀失敗：預期 {expected} bytes，實際 {actual} bytes")]
    IncompleteFrame {
        position: &'static str,
        expected: u64,
        actual: u64,
    },
}

impl LoadError {
    #[must_use]
    pub const fn category(&self) -> &'static str {
        match self {
            Self::Tool(e) => e.category(),
            Self::Probe(e) => e.category(),
            Self::EmptyVideo => "DecodeError",
            Self::IncompleteFrame { .. } => "RandomAccessError",
        }
    }

    const fn is_not_found(&self) -> bool {
        match self {
            Self::Tool(e) | Self::Probe(ProbeError::Tool(e)) => e.is_not_found(),
            _ => false,
        }
    }
}

/// 成功載入後的摘要
#[derive(Debug, Clone, PartialEq)]
pub enum LoadSummary {
    FrameIndex {
        frame_count: u64,
        avg_fps: f64,
        /// [H, W, C]
        frame_shape: [u64; 3],
    },
    Tensor {
        /// [T, H, W, C]
        video_shape: [u64; 4],
        /// [channels, samples]
        audio_shape: Option<[u64; 2]>,
        video_fps: Option<f64>,
        audio_fps: Option<u32>,
    },
}

#[derive(Debug, Clone, PartialEq)]
pub enum LoadOutcome {
    Loaded(LoadSummary),
    Failed { category: String, message: String },
    /// 後端所需的解碼器不存在（環境問題，非檔案損壞）
    Unavailable { reason: String },
}

impl From<Result<LoadSummary, LoadError>> for LoadOutcome {
    fn from(result: Result<LoadSummary, LoadError>) -> Self {
        match result {
            Ok(summary) => Self::Loaded(summary),
            Err(e) if e.is_not_found() => Self::Unavailable {
                reason: e.to_string(),
            },
            Err(e) => Self::Failed {
                category: e.category().to_string(),
                message: e.to_string(),
            },
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct BackendReport {
    pub backend: String,
    pub outcome: LoadOutcome,
}

/// 執行單一後端；後端 panic 時轉為失敗結果，不影響後續檢查
pub fn run_backend(backend: &dyn LoadBackend, path: &Path) -> BackendReport {
    let name = backend.name().to_string();
    let outcome = panic::catch_unwind(AssertUnwindSafe(|| backend.load(path)))
        .unwrap_or_else(|payload| LoadOutcome::Failed {
            category: "Panic".to_string(),
            message: panic_message(payload.as_ref()),
        });

    match &outcome {
        LoadOutcome::Loaded(_) => {}
        LoadOutcome::Failed { category, message } => {
            warn!("{name} 載入失敗 {}: {category}: {message}", path.display());
        }
        LoadOutcome::Unavailable { reason } => {
            warn!("{name} 無法使用: {reason}");
        }
    }

    BackendReport {
        backend: name,
        outcome,
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    payload
        .downcast_ref::<&str>()
        .map(|s| (*s).to_string())
        .or_else(|| payload.downcast_ref::<String>().cloned())
        .unwrap_or_else(|| "unknown panic".to_string())
}

fn format_shape(shape: &[u64]) -> String {
    let dims: Vec<String> = shape.iter().map(u64::to_string).collect();
    format!("[{}]", dims.join(", "))
}

impl fmt::Display for LoadSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::FrameIndex {
                frame_count,
                avg_fps,
                frame_shape,
            } => {
                writeln!(f, "載入成功。總幀數: {frame_count}, FPS: {avg_fps:.3}")?;
                write!(
                    f,
                    "成功讀取第一幀和最後一幀，單幀形狀: {}",
                    format_shape(frame_shape)
                )
            }
            Self::Tensor {
                video_shape,
                audio_shape,
                video_fps,
                audio_fps,
            } => {
                let audio = audio_shape
                    .as_ref()
                    .map_or_else(|| "None".to_string(), |shape| format_shape(shape));
                writeln!(
                    f,
                    "載入成功。視訊形狀: {}, 音訊形狀: {audio}",
                    format_shape(video_shape)
                )?;
                let video_fps = video_fps.map_or_else(|| "N/A".to_string(), |v| format!("{v:.3}"));
                let audio_fps = audio_fps.map_or_else(|| "N/A".to_string(), |v| v.to_string());
                write!(f, "資訊: video_fps={video_fps}, audio_fps={audio_fps}")
            }
        }
    }
}
