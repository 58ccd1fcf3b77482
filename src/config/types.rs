use crate::tools::ToolRunner;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::Path;
use std::time::Duration;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FileTypeTable {
    #[serde(rename = "VIDEO_FILE")]
    pub video_file: Vec<String>,
}

impl Default for FileTypeTable {
    fn default() -> Self {
        Self::from_extensions(DEFAULT_VIDEO_EXTENSIONS)
    }
}

/// 預設辨識的影片副檔名
pub const DEFAULT_VIDEO_EXTENSIONS: &[&str] = &[".mp4", ".avi", ".mov", ".mkv", ".flv", ".webm"];

impl FileTypeTable {
    /// 接受 "mp4"、".MP4" 等寫法，統一為小寫並帶前置點
    pub fn from_extensions<S: AsRef<str>>(extensions: &[S]) -> Self {
        let video_file = extensions
            .iter()
            .map(|ext| normalize_extension(ext.as_ref()))
            .filter(|ext| ext.len() > 1)
            .collect();
        Self { video_file }
    }

    #[must_use]
    pub fn video_extensions_set(&self) -> HashSet<String> {
        self.video_file
            .iter()
            .map(|ext| normalize_extension(ext))
            .collect()
    }

    #[must_use]
    pub fn is_video_file(&self, path: &Path) -> bool {
        let video_extensions = self.video_extensions_set();
        path.extension()
            .and_then(|ext| ext.to_str())
            .is_some_and(|ext| video_extensions.contains(&format!(".{}", ext.to_lowercase())))
    }
}

fn normalize_extension(ext: &str) -> String {
    let trimmed = ext.trim().trim_start_matches('.').to_lowercase();
    format!(".{trimmed}")
}

#[derive(Debug, Clone)]
pub struct Config {
    pub file_type_table: FileTypeTable,
    pub settings: UserSettings,
}

impl Config {
    /// 使用者設定了副檔名清單時優先使用，否則使用內建表
    #[must_use]
    pub fn video_file_table(&self) -> FileTypeTable {
        self.settings
            .normalizer
            .video_extensions
            .as_deref()
            .map_or_else(|| self.file_type_table.clone(), FileTypeTable::from_extensions)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct UserSettings {
    pub tools: ToolSettings,
    pub normalizer: NormalizerSettings,
}

/// 外部工具路徑與逾時設定
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ToolSettings {
    pub ffprobe: String,
    pub ffmpeg: String,
    /// 單次外部工具呼叫的逾時秒數；`None` 表示不限時
    pub timeout_secs: Option<u64>,
}

impl Default for ToolSettings {
    fn default() -> Self {
        Self {
            ffprobe: "ffprobe".to_string(),
            ffmpeg: "ffmpeg".to_string(),
            timeout_secs: None,
        }
    }
}

impl ToolSettings {
    #[must_use]
    pub fn timeout(&self) -> Option<Duration> {
        self.timeout_secs.map(Duration::from_secs)
    }

    #[must_use]
    pub fn ffprobe_runner(&self) -> ToolRunner {
        ToolRunner::new(&self.ffprobe, self.timeout())
    }

    #[must_use]
    pub fn ffmpeg_runner(&self) -> ToolRunner {
        ToolRunner::new(&self.ffmpeg, self.timeout())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct NormalizerSettings {
    /// ffprobe 回報的目標編碼名稱，例如 "h264"
    pub target_codec: String,
    /// ffmpeg 編碼器；未設定時依目標編碼推導
    pub encoder: Option<String>,
    pub preset: String,
    pub crf: u8,
    pub video_extensions: Option<Vec<String>>,
}

impl Default for NormalizerSettings {
    fn default() -> Self {
        Self {
            target_codec: "h264".to_string(),
            encoder: None,
            preset: "fast".to_string(),
            crf: 23,
            video_extensions: None,
        }
    }
}

impl NormalizerSettings {
    #[must_use]
    pub fn resolved_encoder(&self) -> String {
        if let Some(encoder) = &self.encoder {
            return encoder.clone();
        }
        match self.target_codec.to_lowercase().as_str() {
            "h264" | "avc" => "libx264".to_string(),
            "hevc" | "h265" => "libx265".to_string(),
            "av1" => "libsvtav1".to_string(),
            "vp9" => "libvpx-vp9".to_string(),
            other => other.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_is_video_file_case_insensitive() {
        let table = FileTypeTable::default();
        assert!(table.is_video_file(Path::new("/videos/a.mp4")));
        assert!(table.is_video_file(Path::new("/videos/B.MKV")));
        assert!(table.is_video_file(Path::new("clip.WebM")));
        assert!(!table.is_video_file(Path::new("/videos/c.txt")));
        assert!(!table.is_video_file(Path::new("/videos/mp4")));
    }

    #[test]
    fn test_from_extensions_normalizes() {
        let table = FileTypeTable::from_extensions(&["MP4", ".Mov", " ts ", "."]);
        assert_eq!(table.video_file, vec![".mp4", ".mov", ".ts"]);
        assert!(table.is_video_file(Path::new("x.TS")));
        assert!(!table.is_video_file(Path::new("x.mkv")));
    }

    #[test]
    fn test_resolved_encoder() {
        let mut settings = NormalizerSettings::default();
        assert_eq!(settings.resolved_encoder(), "libx264");

        settings.target_codec = "HEVC".to_string();
        assert_eq!(settings.resolved_encoder(), "libx265");

        settings.target_codec = "mpeg4".to_string();
        assert_eq!(settings.resolved_encoder(), "mpeg4");

        settings.encoder = Some("h264_nvenc".to_string());
        assert_eq!(settings.resolved_encoder(), "h264_nvenc");
    }

    #[test]
    fn test_user_settings_partial_json_uses_defaults() {
        let settings: UserSettings =
            serde_json::from_str(r#"{"normalizer": {"target_codec": "hevc"}}"#).unwrap();
        assert_eq!(settings.normalizer.target_codec, "hevc");
        assert_eq!(settings.normalizer.crf, 23);
        assert_eq!(settings.tools, ToolSettings::default());
    }
}
