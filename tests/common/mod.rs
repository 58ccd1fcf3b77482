//! 整合測試共用工具：以 shell script 模擬 ffprobe / ffmpeg

#![allow(dead_code)]

use std::fs;
use std::os::unix::fs::PermissionsExt;
use std::path::{Path, PathBuf};
use video_integrity_kit::config::ToolSettings;

/// 建立可執行的假工具，`body` 為 /bin/sh 腳本內容
pub fn write_fake_tool(dir: &Path, name: &str, body: &str) -> PathBuf {
    let path = dir.join(name);
    fs::write(&path, format!("#!/bin/sh\n{body}\n")).unwrap();
    let mut permissions = fs::metadata(&path).unwrap().permissions();
    permissions.set_mode(0o755);
    fs::set_permissions(&path, permissions).unwrap();
    path
}

pub fn tool_settings(ffprobe: &Path, ffmpeg: &Path) -> ToolSettings {
    ToolSettings {
        ffprobe: ffprobe.display().to_string(),
        ffmpeg: ffmpeg.display().to_string(),
        timeout_secs: Some(30),
    }
}

/// 讀取呼叫紀錄，每次呼叫一行；檔案不存在代表從未被呼叫
pub fn read_calls(log: &Path) -> Vec<String> {
    fs::read_to_string(log)
        .map(|content| content.lines().map(str::to_string).collect())
        .unwrap_or_default()
}
