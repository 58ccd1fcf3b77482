use crate::component::{CodecNormalizer, IntegrityAnalyzer};
use crate::config::Config;
use crate::config::load::SETTINGS_FILE;
use crate::config::save::persist_target_codec;
use crate::pause;
use anyhow::Result;
use console::{Term, style};
use dialoguer::Input;
use dialoguer::theme::ColorfulTheme;
use log::info;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::sync::atomic::AtomicBool;

fn prompt_path(prompt: &str) -> Result<PathBuf> {
    let path: String = Input::with_theme(&ColorfulTheme::default())
        .with_prompt(prompt)
        .interact_text()?;
    Ok(PathBuf::from(path.trim()))
}

pub fn run_integrity_analyzer(term: &Term, config: &Config) -> Result<()> {
    let path = prompt_path("請輸入影片檔案路徑")?;
    let analyzer = IntegrityAnalyzer::new(&config.settings.tools);

    if let Err(e) = analyzer.run(&path) {
        eprintln!("{} {}", style("錯誤:").red().bold(), e);
    }

    pause(term)?;
    Ok(())
}

pub fn run_codec_normalizer(
    term: &Term,
    shutdown_signal: &Arc<AtomicBool>,
    config: &Config,
) -> Result<()> {
    let directory = prompt_path("請輸入影片資料夾路徑")?;
    let normalizer = CodecNormalizer::new(config, Arc::clone(shutdown_signal));

    if let Err(e) = normalizer.run(&directory) {
        eprintln!("{} {}", style("錯誤:").red().bold(), e);
    }

    pause(term)?;
    Ok(())
}

/// 修改目標編碼並寫回 settings.json
pub fn show_codec_settings(term: &Term, config: &mut Config) -> Result<()> {
    term.clear_screen()?;
    println!("{}", style("=== 目標編碼設定 ===").cyan().bold());

    let codec: String = Input::with_theme(&ColorfulTheme::default())
        .with_prompt("目標編碼（ffprobe 名稱）")
        .default(config.settings.normalizer.target_codec.clone())
        .interact_text()?;
    let codec = codec.trim().to_lowercase();

    if codec.is_empty() {
        return Ok(());
    }

    // 只寫回目標編碼；命令列覆寫的工具設定保留在記憶體中
    let saved = persist_target_codec(Path::new(SETTINGS_FILE), &codec)?;
    config.settings.normalizer.target_codec = saved.normalizer.target_codec;
    config.settings.normalizer.encoder = saved.normalizer.encoder;
    info!(
        "目標編碼已更新為 {}（編碼器: {}）",
        config.settings.normalizer.target_codec,
        config.settings.normalizer.resolved_encoder()
    );
    println!("{}", style("設定已儲存").green());

    pause(term)?;
    Ok(())
}
