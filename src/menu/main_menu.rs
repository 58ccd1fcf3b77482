use crate::config::Config;
use crate::menu::handlers::{run_codec_normalizer, run_integrity_analyzer, show_codec_settings};
use anyhow::Result;
use console::{Term, style};
use dialoguer::Select;
use dialoguer::theme::ColorfulTheme;
use std::sync::Arc;
use std::sync::atomic::AtomicBool;

/// 回傳 `false` 表示使用者選擇離開
pub fn show_main_menu(
    term: &Term,
    shutdown_signal: &Arc<AtomicBool>,
    config: &mut Config,
) -> Result<bool> {
    term.clear_screen()?;

    println!("{}", style("=== 影片完整性工具 ===").cyan().bold());
    println!("{}", style("按 ESC 離開").dim());

    let options = vec![
        "分析影片完整性".to_string(),
        "掃描並統一資料夾影片編碼".to_string(),
        format!("設定目標編碼（目前: {}）", config.settings.normalizer.target_codec),
        "離開".to_string(),
    ];

    let selection = Select::with_theme(&ColorfulTheme::default())
        .with_prompt("請選擇功能")
        .items(&options)
        .default(0)
        .interact_on_opt(term)?;

    match selection {
        Some(0) => {
            run_integrity_analyzer(term, config)?;
            Ok(true)
        }
        Some(1) => {
            run_codec_normalizer(term, shutdown_signal, config)?;
            Ok(true)
        }
        Some(2) => {
            show_codec_settings(term, config)?;
            Ok(true)
        }
        Some(3) | None => Ok(false),
        _ => unreachable!(),
    }
}
