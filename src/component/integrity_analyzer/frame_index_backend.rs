use super::backend::{LoadBackend, LoadError, LoadOutcome, LoadSummary};
use crate::tools::{ProbeError, ToolRunner, parse_ffprobe_json, resolve_frame_rate};
use log::debug;
use std::ffi::OsString;
use std::path::Path;

/// 從片尾往回 seek 的秒數，用來取得最後一幀
const TAIL_SEEK_SECONDS: &str = "-1";

/// 建立幀索引後隨機讀取首尾幀的後端
///
/// 幀數來自 ffprobe 逐一計算封包，首尾幀則實際解碼為 RGB24，
/// 能暴露索引正常但尾端資料損壞的檔案。
pub struct FrameIndexBackend {
    ffprobe: ToolRunner,
    ffmpeg: ToolRunner,
}

struct FrameIndex {
    frame_count: u64,
    avg_fps: f64,
    width: u64,
    height: u64,
}

impl FrameIndexBackend {
    #[must_use]
    pub const fn new(ffprobe: ToolRunner, ffmpeg: ToolRunner) -> Self {
        Self { ffprobe, ffmpeg }
    }

    fn build_index(&self, path: &Path) -> Result<FrameIndex, LoadError> {
        let args: Vec<OsString> = vec![
            "-v".into(),
            "error".into(),
            "-select_streams".into(),
            "v:0".into(),
            "-count_packets".into(),
            "-show_entries".into(),
            "stream=width,height,avg_frame_rate,r_frame_rate,nb_read_packets".into(),
            "-of".into(),
            "json".into(),
            path.into(),
        ];
        let output = self.ffprobe.run_checked(&args)?;
        let probe = parse_ffprobe_json(&output.stdout_text())?;

        let stream = probe
            .streams
            .and_then(|streams| streams.into_iter().next())
            .ok_or(ProbeError::NoVideoStream)?;

        let (Some(width), Some(height)) = (stream.width, stream.height) else {
            return Err(ProbeError::NoVideoStream.into());
        };

        let avg_fps = resolve_frame_rate(
            stream.avg_frame_rate.as_deref(),
            stream.r_frame_rate.as_deref(),
        )?;

        let frame_count = stream
            .nb_read_packets
            .as_deref()
            .and_then(|n| n.trim().parse::<u64>().ok())
            .unwrap_or(0);

        Ok(FrameIndex {
            frame_count,
            avg_fps,
            width: u64::from(width),
            height: u64::from(height),
        })
    }

    /// 解碼一段畫面為 RGB24 並回傳輸出位元組數
    fn decode_frames(&self, path: &Path, from_tail: bool) -> Result<u64, LoadError> {
        let mut args: Vec<OsString> = ["-v", "error", "-nostdin"].map(OsString::from).to_vec();
        if from_tail {
            args.extend(["-sseof", TAIL_SEEK_SECONDS].map(OsString::from));
        }
        args.push("-i".into());
        args.push(path.into());
        args.extend(["-map", "0:v:0"].map(OsString::from));
        if !from_tail {
            args.extend(["-frames:v", "1"].map(OsString::from));
        }
        args.extend(["-f", "rawvideo", "-pix_fmt", "rgb24", "pipe:1"].map(OsString::from));

        let output = self.ffmpeg.run_counting(&args)?;
        Ok(output.stdout_len)
    }

    fn load_inner(&self, path: &Path) -> Result<LoadSummary, LoadError> {
        let index = self.build_index(path)?;
        if index.frame_count == 0 {
            return Err(LoadError::EmptyVideo);
        }
        debug!(
            "幀索引 {}: {} 幀, {:.3} fps",
            path.display(),
            index.frame_count,
            index.avg_fps
        );

        let frame_size = index.width * index.height * 3;
        for (position, from_tail) in [("第一", false), ("最後", true)] {
            let actual = self.decode_frames(path, from_tail)?;
            if actual < frame_size {
                return Err(LoadError::IncompleteFrame {
                    position,
                    expected: frame_size,
                    actual,
                });
            }
        }

        Ok(LoadSummary::FrameIndex {
            frame_count: index.frame_count,
            avg_fps: index.avg_fps,
            frame_shape: [index.height, index.width, 3],
        })
    }
}

impl LoadBackend for FrameIndexBackend {
    fn name(&self) -> &str {
        "frame-index"
    }

    fn load(&self, path: &Path) -> LoadOutcome {
        self.load_inner(path).into()
    }
}
