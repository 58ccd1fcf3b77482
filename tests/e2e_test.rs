//! 編碼統一 E2E 測試
//!
//! 以假的 ffprobe / ffmpeg 驗證掃描、判定與轉碼流程

#![cfg(unix)]

mod common;

use std::fs;
use std::path::PathBuf;
use std::sync::Arc;
use std::sync::atomic::AtomicBool;

use common::{read_calls, tool_settings, write_fake_tool};
use tempfile::TempDir;
use video_integrity_kit::component::CodecNormalizer;
use video_integrity_kit::config::Config;

struct Workspace {
    temp_dir: TempDir,
    videos: PathBuf,
    ffprobe_log: PathBuf,
    ffmpeg_log: PathBuf,
    config: Config,
}

impl Workspace {
    /// 建立影片資料夾：a.mp4 (h264)、nested/b.mkv (hevc)、c.txt（非影片）
    fn new(ffmpeg_exit: i32) -> Self {
        let temp_dir = TempDir::new().unwrap();
        let root = temp_dir.path();
        let tools = root.join("bin");
        let videos = root.join("videos");
        fs::create_dir_all(&tools).unwrap();
        fs::create_dir_all(videos.join("nested")).unwrap();

        fs::write(videos.join("a.mp4"), b"h264 video").unwrap();
        fs::write(videos.join("nested").join("b.mkv"), b"hevc video").unwrap();
        fs::write(videos.join("c.txt"), b"notes").unwrap();

        let ffprobe_log = root.join("ffprobe.log");
        let ffmpeg_log = root.join("ffmpeg.log");

        let ffprobe = write_fake_tool(
            &tools,
            "ffprobe",
            &format!(
                r#"for last; do :; done
echo "$last" >> "{log}"
case "$last" in
  *a.mp4) echo H264 ;;
  *b.mkv) echo hevc ;;
  *v.webm) echo vp9 ;;
  *) echo "Invalid data found when processing input" >&2; exit 1 ;;
esac"#,
                log = ffprobe_log.display()
            ),
        );
        let ffmpeg = write_fake_tool(
            &tools,
            "ffmpeg",
            &format!(
                r#"for last; do :; done
echo "$*" >> "{log}"
if [ {ffmpeg_exit} -ne 0 ]; then echo "Unknown encoder" >&2; exit {ffmpeg_exit}; fi
printf converted > "$last""#,
                log = ffmpeg_log.display()
            ),
        );

        let mut config = Config::load_from(&root.join("settings.json")).unwrap();
        config.settings.tools = tool_settings(&ffprobe, &ffmpeg);

        Self {
            temp_dir,
            videos,
            ffprobe_log,
            ffmpeg_log,
            config,
        }
    }

    fn normalizer(&self) -> CodecNormalizer {
        CodecNormalizer::new(&self.config, Arc::new(AtomicBool::new(false)))
    }
}

#[test]
fn test_scan_converts_only_non_compliant_videos() {
    let ws = Workspace::new(0);
    let summary = ws.normalizer().scan_and_convert(&ws.videos).unwrap();

    // c.txt 不會被判定，也不會被轉碼
    assert_eq!(summary.records.len(), 2);
    let probed = read_calls(&ws.ffprobe_log);
    assert_eq!(probed.len(), 2);
    assert!(!probed.iter().any(|p| p.ends_with("c.txt")));

    let a = summary
        .records
        .iter()
        .find(|r| r.path.ends_with("a.mp4"))
        .unwrap();
    assert!(a.compliant);
    assert_eq!(a.codec.as_deref(), Some("h264"));

    let b = summary
        .records
        .iter()
        .find(|r| r.path.ends_with("b.mkv"))
        .unwrap();
    assert!(!b.compliant);
    assert_eq!(b.codec.as_deref(), Some("hevc"));

    assert_eq!(summary.conversions.len(), 1);
    let expected_output = ws.videos.join("nested").join("b_h264.mkv");
    assert_eq!(summary.conversions[0].output.as_deref(), Some(expected_output.as_path()));
    assert_eq!(fs::read_to_string(&expected_output).unwrap(), "converted");

    // 原檔保持不變
    assert_eq!(
        fs::read_to_string(ws.videos.join("nested").join("b.mkv")).unwrap(),
        "hevc video"
    );
    assert_eq!(fs::read_to_string(ws.videos.join("c.txt")).unwrap(), "notes");

    let encodes = read_calls(&ws.ffmpeg_log);
    assert_eq!(encodes.len(), 1);
    assert!(encodes[0].contains("-c:v libx264"));
    assert!(encodes[0].contains("-preset fast"));
    assert!(encodes[0].contains("-crf 23"));
    assert!(encodes[0].contains("-c:a copy"));
    assert!(!encodes[0].contains("a.mp4"));

    assert_eq!(summary.compliant_count(), 1);
    assert_eq!(summary.converted_count(), 1);
    assert_eq!(summary.failed_count(), 0);
    assert!(!summary.interrupted);
}

#[test]
fn test_conversion_failure_is_logged_and_not_retried() {
    let ws = Workspace::new(1);
    let summary = ws.normalizer().scan_and_convert(&ws.videos).unwrap();

    assert_eq!(summary.records.len(), 2);
    assert_eq!(summary.failed_count(), 1);
    assert_eq!(summary.converted_count(), 0);
    assert_eq!(read_calls(&ws.ffmpeg_log).len(), 1);
    assert!(!ws.videos.join("nested").join("b_h264.mkv").exists());
}

#[test]
fn test_codec_lookup_failure_counts_as_non_compliant() {
    let ws = Workspace::new(0);
    fs::write(ws.videos.join("broken.MOV"), b"garbage").unwrap();
    let normalizer = ws.normalizer();

    assert!(!normalizer.is_target_codec(&ws.videos.join("broken.MOV")));

    let summary = normalizer.scan_and_convert(&ws.videos).unwrap();
    let broken = summary
        .records
        .iter()
        .find(|r| r.path.ends_with("broken.MOV"))
        .unwrap();
    assert_eq!(broken.codec, None);
    assert!(!broken.compliant);
    assert_eq!(summary.conversions.len(), 2);
}

#[test]
fn test_is_target_codec_is_case_insensitive() {
    let ws = Workspace::new(0);
    fs::write(ws.videos.join("v.webm"), b"vp9 video").unwrap();
    let normalizer = ws.normalizer();

    assert!(normalizer.is_target_codec(&ws.videos.join("a.mp4")));
    assert!(!normalizer.is_target_codec(&ws.videos.join("nested").join("b.mkv")));
    assert!(!normalizer.is_target_codec(&ws.videos.join("v.webm")));

    let mut config = ws.config.clone();
    config.settings.normalizer.target_codec = "HEVC".to_string();
    let hevc = CodecNormalizer::new(&config, Arc::new(AtomicBool::new(false)));
    assert_eq!(hevc.target_codec(), "HEVC");
    assert!(hevc.is_target_codec(&ws.videos.join("nested").join("b.mkv")));
    assert!(!hevc.is_target_codec(&ws.videos.join("a.mp4")));
}

#[test]
fn test_convert_writes_into_out_dir() {
    let ws = Workspace::new(0);
    let out_dir = ws.temp_dir.path().join("converted").join("h264");
    let source = ws.videos.join("nested").join("b.mkv");

    let output = ws.normalizer().convert(&source, Some(out_dir.as_path())).unwrap();

    assert_eq!(output, out_dir.join("b_h264.mkv"));
    assert!(output.exists());
    assert!(!source.with_file_name("b_h264.mkv").exists());
    assert_eq!(fs::read_to_string(&source).unwrap(), "hevc video");
}

#[test]
fn test_existing_file_at_destination_is_never_overwritten() {
    let ws = Workspace::new(0);
    let user_file = ws.videos.join("nested").join("b_h264.mkv");
    fs::write(&user_file, "user original b_h264").unwrap();

    let summary = ws.normalizer().scan_and_convert(&ws.videos).unwrap();

    assert_eq!(fs::read_to_string(&user_file).unwrap(), "user original b_h264");
    let b = summary
        .conversions
        .iter()
        .find(|c| c.source.ends_with("b.mkv"))
        .unwrap();
    assert_eq!(b.output, None);

    // b_h264.mkv 本身被判定一次，轉出的是新的檔名
    let records_for_user_file = summary
        .records
        .iter()
        .filter(|r| r.path == user_file)
        .count();
    assert_eq!(records_for_user_file, 1);
    assert!(ws.videos.join("nested").join("b_h264_h264.mkv").exists());

    // b.mkv 的轉碼被拒絕，ffmpeg 只為 b_h264.mkv 執行一次
    let encodes = read_calls(&ws.ffmpeg_log);
    assert_eq!(encodes.len(), 1);
    assert!(encodes[0].contains("b_h264_h264.mkv"));
}

#[test]
fn test_convert_refuses_existing_destination() {
    let ws = Workspace::new(0);
    let source = ws.videos.join("nested").join("b.mkv");
    let existing = ws.videos.join("nested").join("b_h264.mkv");
    fs::write(&existing, "keep me").unwrap();

    assert_eq!(ws.normalizer().convert(&source, None), None);
    assert_eq!(fs::read_to_string(&existing).unwrap(), "keep me");
    assert!(read_calls(&ws.ffmpeg_log).is_empty());
}

#[test]
fn test_same_name_in_out_dir_is_converted_once() {
    let ws = Workspace::new(0);
    for sub in ["x", "y"] {
        fs::create_dir_all(ws.videos.join(sub)).unwrap();
        fs::write(ws.videos.join(sub).join("clip.mkv"), sub).unwrap();
    }
    let out_dir = ws.temp_dir.path().join("out");

    let summary = ws
        .normalizer()
        .with_output_directory(Some(out_dir.clone()))
        .scan_and_convert(&ws.videos)
        .unwrap();

    let clips: Vec<_> = summary
        .conversions
        .iter()
        .filter(|c| c.source.ends_with("clip.mkv"))
        .collect();
    assert_eq!(clips.len(), 2);
    assert_eq!(
        clips.iter().filter(|c| c.output.is_some()).count(),
        1,
        "兩個同名檔案不能寫到同一個輸出"
    );
    assert!(out_dir.join("clip_h264.mkv").exists());

    let outputs: Vec<_> = summary
        .conversions
        .iter()
        .filter_map(|c| c.output.clone())
        .collect();
    let files_in_out = fs::read_dir(&out_dir).unwrap().count();
    assert_eq!(outputs.len(), files_in_out);
}

#[test]
fn test_scan_uses_configured_output_directory() {
    let ws = Workspace::new(0);
    let out_dir = ws.temp_dir.path().join("out");

    let summary = ws
        .normalizer()
        .with_output_directory(Some(out_dir.clone()))
        .scan_and_convert(&ws.videos)
        .unwrap();

    assert_eq!(summary.converted_count(), 1);
    assert!(out_dir.join("b_h264.mkv").exists());
    assert!(!ws.videos.join("nested").join("b_h264.mkv").exists());
}

#[test]
fn test_custom_extension_list() {
    let mut ws = Workspace::new(0);
    ws.config.settings.normalizer.video_extensions = Some(vec!["MKV".to_string()]);

    let summary = ws.normalizer().scan_and_convert(&ws.videos).unwrap();

    assert_eq!(summary.records.len(), 1);
    assert!(summary.records[0].path.ends_with("b.mkv"));
}

#[test]
fn test_rerun_classifies_each_file_once() {
    let ws = Workspace::new(0);
    ws.normalizer().scan_and_convert(&ws.videos).unwrap();

    // 第二次掃描會看到 b_h264.mkv；假 ffprobe 對它回報失敗，仍只判定一次
    let summary = ws.normalizer().scan_and_convert(&ws.videos).unwrap();
    assert_eq!(summary.records.len(), 3);
    assert_eq!(
        summary
            .records
            .iter()
            .filter(|r| r.path.ends_with("b_h264.mkv"))
            .count(),
        1
    );
}

#[test]
fn test_missing_directory_is_error() {
    let ws = Workspace::new(0);
    let missing = ws.videos.join("does-not-exist");

    let err = ws.normalizer().scan_and_convert(&missing).unwrap_err();
    assert!(err.to_string().contains("目錄不存在"));
    assert!(read_calls(&ws.ffprobe_log).is_empty());
    assert!(read_calls(&ws.ffmpeg_log).is_empty());
}

#[test]
fn test_shutdown_signal_stops_before_processing() {
    let ws = Workspace::new(0);
    let normalizer = CodecNormalizer::new(&ws.config, Arc::new(AtomicBool::new(true)));

    let summary = normalizer.scan_and_convert(&ws.videos).unwrap();

    assert!(summary.interrupted);
    assert!(summary.records.is_empty());
    assert!(read_calls(&ws.ffprobe_log).is_empty());
}
