use crate::component::{CodecNormalizer, IntegrityAnalyzer};
use crate::config::{Config, UserSettings};
use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::sync::Arc;
use std::sync::atomic::AtomicBool;

/// 影片資料集的完整性檢查與編碼統一工具；不帶子命令時進入互動選單
#[derive(Parser, Debug)]
#[command(name = "video_integrity_kit", version, about)]
pub struct Cli {
    /// ffprobe 執行檔路徑
    #[arg(long, global = true)]
    pub ffprobe: Option<String>,

    /// ffmpeg 執行檔路徑
    #[arg(long, global = true)]
    pub ffmpeg: Option<String>,

    /// 單次外部工具呼叫的逾時秒數
    #[arg(long, global = true)]
    pub timeout: Option<u64>,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// 以多個解碼後端分析單一影片
    Analyze {
        /// 影片檔案路徑
        path: PathBuf,
    },
    /// 遞迴掃描資料夾，將非目標編碼的影片轉碼
    Normalize {
        /// 影片資料夾
        dir: PathBuf,

        /// 目標編碼（ffprobe 名稱，例如 h264、hevc）
        #[arg(long)]
        codec: Option<String>,

        /// ffmpeg 編碼器，預設依目標編碼推導
        #[arg(long)]
        encoder: Option<String>,

        /// 轉碼輸出目錄，預設與來源同目錄
        #[arg(long)]
        out_dir: Option<PathBuf>,

        /// 辨識的影片副檔名，可重複或以逗號分隔
        #[arg(long = "ext", value_delimiter = ',')]
        extensions: Vec<String>,
    },
}

impl Cli {
    /// 命令列參數覆寫設定檔中的值
    pub fn apply_overrides(&self, settings: &mut UserSettings) {
        if let Some(ffprobe) = &self.ffprobe {
            settings.tools.ffprobe.clone_from(ffprobe);
        }
        if let Some(ffmpeg) = &self.ffmpeg {
            settings.tools.ffmpeg.clone_from(ffmpeg);
        }
        if self.timeout.is_some() {
            settings.tools.timeout_secs = self.timeout;
        }

        if let Some(Commands::Normalize {
            codec,
            encoder,
            extensions,
            ..
        }) = &self.command
        {
            if let Some(codec) = codec {
                settings.normalizer.target_codec = codec.to_lowercase();
            }
            if encoder.is_some() {
                settings.normalizer.encoder.clone_from(encoder);
            }
            if !extensions.is_empty() {
                settings.normalizer.video_extensions = Some(extensions.clone());
            }
        }
    }
}

pub fn run_command(command: Commands, config: &Config, shutdown_signal: &Arc<AtomicBool>) -> Result<()> {
    match command {
        Commands::Analyze { path } => IntegrityAnalyzer::new(&config.settings.tools).run(&path),
        Commands::Normalize { dir, out_dir, .. } => {
            CodecNormalizer::new(config, Arc::clone(shutdown_signal))
                .with_output_directory(out_dir)
                .run(&dir)
        }
    }
}
