use super::backend::{LoadBackend, LoadError, LoadOutcome, LoadSummary};
use crate::tools::{ProbeError, StreamInfo, ToolRunner, parse_ffprobe_json, resolve_frame_rate};
use std::ffi::OsString;
use std::path::Path;

/// f32 PCM 每個樣本的位元組數
const SAMPLE_BYTES: u64 = 4;

/// 將整支影片（視訊 + 音訊）解碼為張量的後端，只回報形狀
pub struct TensorReaderBackend {
    ffprobe: ToolRunner,
    ffmpeg: ToolRunner,
}

impl TensorReaderBackend {
    #[must_use]
    pub const fn new(ffprobe: ToolRunner, ffmpeg: ToolRunner) -> Self {
        Self { ffprobe, ffmpeg }
    }

    fn probe_streams(&self, path: &Path) -> Result<(StreamInfo, Option<StreamInfo>), LoadError> {
        let args: Vec<OsString> = vec![
            "-v".into(),
            "error".into(),
            "-show_entries".into(),
            "stream=codec_type,width,height,avg_frame_rate,r_frame_rate,sample_rate,channels"
                .into(),
            "-of".into(),
            "json".into(),
            path.into(),
        ];
        let output = self.ffprobe.run_checked(&args)?;
        let streams = parse_ffprobe_json(&output.stdout_text())?
            .streams
            .unwrap_or_default();

        let mut video = None;
        let mut audio = None;
        for stream in streams {
            match stream.codec_type.as_deref() {
                Some("video") if video.is_none() => video = Some(stream),
                Some("audio") if audio.is_none() => audio = Some(stream),
                _ => {}
            }
        }

        let video = video.ok_or(ProbeError::NoVideoStream)?;
        Ok((video, audio))
    }

    fn decode_to_pipe(&self, path: &Path, map: &str, output_args: &[&str]) -> Result<u64, LoadError> {
        let mut args: Vec<OsString> = vec![
            "-v".into(),
            "error".into(),
            "-nostdin".into(),
            "-i".into(),
            path.into(),
            "-map".into(),
            map.into(),
        ];
        args.extend(output_args.iter().map(|arg| OsString::from(*arg)));
        args.push("pipe:1".into());

        let output = self.ffmpeg.run_counting(&args)?;
        Ok(output.stdout_len)
    }

    fn load_inner(&self, path: &Path) -> Result<LoadSummary, LoadError> {
        let (video, audio) = self.probe_streams(path)?;
        let (Some(width), Some(height)) = (video.width, video.height) else {
            return Err(ProbeError::NoVideoStream.into());
        };
        let (width, height) = (u64::from(width), u64::from(height));

        let frame_size = width * height * 3;
        let video_bytes =
            self.decode_to_pipe(path, "0:v:0", &["-f", "rawvideo", "-pix_fmt", "rgb24"])?;
        let frames = video_bytes / frame_size.max(1);
        if frames == 0 {
            return Err(LoadError::EmptyVideo);
        }

        let audio_shape = match &audio {
            Some(stream) => {
                let channels = u64::from(stream.channels.unwrap_or(1).max(1));
                let audio_bytes = self.decode_to_pipe(
                    path,
                    "0:a:0",
                    &["-f", "f32le", "-acodec", "pcm_f32le"],
                )?;
                Some([channels, audio_bytes / (SAMPLE_BYTES * channels)])
            }
            None => None,
        };

        let video_fps = resolve_frame_rate(
            video.avg_frame_rate.as_deref(),
            video.r_frame_rate.as_deref(),
        )
        .ok();
        let audio_fps = audio
            .as_ref()
            .and_then(|stream| stream.sample_rate.as_deref())
            .and_then(|rate| rate.trim().parse().ok());

        Ok(LoadSummary::Tensor {
            video_shape: [frames, height, width, 3],
            audio_shape,
            video_fps,
            audio_fps,
        })
    }
}

impl LoadBackend for TensorReaderBackend {
    fn name(&self) -> &str {
        "tensor-reader"
    }

    fn load(&self, path: &Path) -> LoadOutcome {
        self.load_inner(path).into()
    }
}
