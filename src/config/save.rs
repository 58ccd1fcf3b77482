use crate::config::Config;
use crate::config::types::UserSettings;
use anyhow::{Context, Result};
use std::fs;
use std::path::Path;

pub fn save_settings_to(settings: &UserSettings, path: &Path) -> Result<()> {
    let content = serde_json::to_string_pretty(settings).context("Failed to serialize settings")?;

    fs::write(path, content)
        .with_context(|| format!("Failed to write settings to {}", path.display()))?;

    Ok(())
}

/// 以磁碟上的設定為基礎，只改變目標編碼後寫回
///
/// 命令列覆寫的工具路徑與逾時只存在記憶體中，不會被寫入設定檔。
pub fn persist_target_codec(path: &Path, codec: &str) -> Result<UserSettings> {
    let mut settings = Config::load_from(path)?.settings;
    settings.normalizer.target_codec = codec.to_string();
    // 改變目標編碼時改回自動推導編碼器
    settings.normalizer.encoder = None;
    save_settings_to(&settings, path)?;
    Ok(settings)
}
