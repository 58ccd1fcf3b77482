use super::ffmpeg_command::TranscodeCommand;
use crate::config::{Config, FileTypeTable, NormalizerSettings};
use crate::tools::{
    ToolError, ToolRunner, ensure_directory_exists, probe_video_codec, scan_video_files,
    validate_directory_exists,
};
use anyhow::Result;
use console::style;
use indicatif::{ProgressBar, ProgressStyle};
use log::{error, info, warn};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConvertError {
    #[error("輸出路徑與來源相同: {}", .0.display())]
    SameAsSource(PathBuf),

    #[error("輸出檔案已存在，不覆寫: {}", .0.display())]
    DestinationExists(PathBuf),

    #[error("無法建立輸出目錄 {}: {message}", .path.display())]
    OutputDirectory { path: PathBuf, message: String },

    #[error(transparent)]
    Tool(#[from] ToolError),
}

/// 單一檔案的編碼判定
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CodecComplianceRecord {
    pub path: PathBuf,
    /// 偵測到的編碼；偵測失敗時為 `None`
    pub codec: Option<String>,
    pub compliant: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConversionRecord {
    pub source: PathBuf,
    /// 轉碼成功時的輸出路徑
    pub output: Option<PathBuf>,
}

#[derive(Debug, Default)]
pub struct ScanSummary {
    pub records: Vec<CodecComplianceRecord>,
    pub conversions: Vec<ConversionRecord>,
    /// 收到中斷信號而提前結束
    pub interrupted: bool,
}

impl ScanSummary {
    #[must_use]
    pub fn compliant_count(&self) -> usize {
        self.records.iter().filter(|r| r.compliant).count()
    }

    #[must_use]
    pub fn converted_count(&self) -> usize {
        self.conversions.iter().filter(|c| c.output.is_some()).count()
    }

    #[must_use]
    pub fn failed_count(&self) -> usize {
        self.conversions.iter().filter(|c| c.output.is_none()).count()
    }
}

/// 掃描資料夾，將不是目標編碼的影片轉碼為新檔案（原檔保留）
pub struct CodecNormalizer {
    ffprobe: ToolRunner,
    ffmpeg: ToolRunner,
    settings: NormalizerSettings,
    file_type_table: FileTypeTable,
    output_directory: Option<PathBuf>,
    shutdown_signal: Arc<AtomicBool>,
}

impl CodecNormalizer {
    #[must_use]
    pub fn new(config: &Config, shutdown_signal: Arc<AtomicBool>) -> Self {
        Self {
            ffprobe: config.settings.tools.ffprobe_runner(),
            ffmpeg: config.settings.tools.ffmpeg_runner(),
            settings: config.settings.normalizer.clone(),
            file_type_table: config.video_file_table(),
            output_directory: None,
            shutdown_signal,
        }
    }

    /// 指定轉碼輸出目錄；未指定時輸出到來源檔案旁
    #[must_use]
    pub fn with_output_directory(mut self, output_directory: Option<PathBuf>) -> Self {
        self.output_directory = output_directory;
        self
    }

    #[must_use]
    pub fn target_codec(&self) -> &str {
        &self.settings.target_codec
    }

    /// 偵測失敗一律視為不符合，並記錄錯誤
    #[must_use]
    pub fn classify(&self, path: &Path) -> CodecComplianceRecord {
        let detected = probe_video_codec(&self.ffprobe, path);
        if let Err(e) = &detected {
            error!("檢查編碼失敗: {}，原因: {e}", path.display());
        }
        self.compliance_record(path, detected.ok())
    }

    fn compliance_record(&self, path: &Path, codec: Option<String>) -> CodecComplianceRecord {
        let compliant = codec
            .as_deref()
            .is_some_and(|codec| codec.eq_ignore_ascii_case(&self.settings.target_codec));
        CodecComplianceRecord {
            path: path.to_path_buf(),
            codec,
            compliant,
        }
    }

    #[must_use]
    pub fn is_target_codec(&self, path: &Path) -> bool {
        self.classify(path).compliant
    }

    /// 轉碼為 `{stem}_{codec}{ext}`；成功回傳新檔案路徑，失敗記錄錯誤並回傳 `None`
    #[must_use]
    pub fn convert(&self, path: &Path, out_dir: Option<&Path>) -> Option<PathBuf> {
        let command = TranscodeCommand::new(path, out_dir, &self.settings);
        info!(
            "轉碼: {} -> {}",
            path.display(),
            command.destination_path().display()
        );
        match self.run_conversion(&command, out_dir) {
            Ok(destination) => Some(destination),
            Err(e) => {
                error!("轉碼失敗: {}，原因: {e}", path.display());
                None
            }
        }
    }

    /// 目的檔已存在時拒絕轉碼，任何既有檔案都不會被覆寫
    fn run_conversion(
        &self,
        command: &TranscodeCommand,
        out_dir: Option<&Path>,
    ) -> Result<PathBuf, ConvertError> {
        let destination = command.destination_path();

        if destination == command.source_path() {
            return Err(ConvertError::SameAsSource(destination.to_path_buf()));
        }
        if destination.exists() {
            return Err(ConvertError::DestinationExists(destination.to_path_buf()));
        }

        if let Some(dir) = out_dir {
            ensure_directory_exists(dir).map_err(|e| ConvertError::OutputDirectory {
                path: dir.to_path_buf(),
                message: e.to_string(),
            })?;
        }

        self.ffmpeg.run_checked(command.build_args())?;
        Ok(destination.to_path_buf())
    }

    /// 遞迴掃描 `root_dir`，每個符合副檔名的檔案判定一次，不符合者轉碼一次（不重試）
    ///
    /// 進度條顯示期間的日誌都透過 `suspend` 輸出，避免與進度條交錯。
    pub fn scan_and_convert(&self, root_dir: &Path) -> Result<ScanSummary> {
        validate_directory_exists(root_dir)?;

        let video_files = scan_video_files(root_dir, &self.file_type_table)?;
        info!(
            "找到 {} 個影片檔案，目標編碼: {}",
            video_files.len(),
            self.settings.target_codec
        );

        let progress_bar = ProgressBar::new(video_files.len() as u64);
        progress_bar.set_style(
            ProgressStyle::default_bar()
                .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} {msg}")?
                .progress_chars("#>-"),
        );

        let target = &self.settings.target_codec;
        let out_dir = self.output_directory.as_deref();
        let mut summary = ScanSummary::default();
        for path in &video_files {
            if self.shutdown_signal.load(Ordering::SeqCst) {
                progress_bar.suspend(|| warn!("收到中斷信號，停止掃描"));
                summary.interrupted = true;
                break;
            }

            progress_bar.set_message(
                path.file_name()
                    .unwrap_or_default()
                    .to_string_lossy()
                    .into_owned(),
            );

            let detected = probe_video_codec(&self.ffprobe, path);
            if let Err(e) = &detected {
                progress_bar.suspend(|| error!("檢查編碼失敗: {}，原因: {e}", path.display()));
            }
            let record = self.compliance_record(path, detected.ok());

            if record.compliant {
                progress_bar.suspend(|| info!("[OK] 已是 {target} 編碼: {}", path.display()));
            } else {
                let command = TranscodeCommand::new(path, out_dir, &self.settings);
                progress_bar.suspend(|| {
                    warn!(
                        "[WARN] 非 {target} 編碼 ({})，準備轉碼: {}",
                        record.codec.as_deref().unwrap_or("unknown"),
                        path.display()
                    );
                    info!(
                        "轉碼: {} -> {}",
                        path.display(),
                        command.destination_path().display()
                    );
                });

                let output = match self.run_conversion(&command, out_dir) {
                    Ok(destination) => Some(destination),
                    Err(e) => {
                        progress_bar
                            .suspend(|| error!("轉碼失敗: {}，原因: {e}", path.display()));
                        None
                    }
                };
                summary.conversions.push(ConversionRecord {
                    source: path.clone(),
                    output,
                });
            }
            summary.records.push(record);
            progress_bar.inc(1);
        }
        progress_bar.finish_and_clear();

        info!(
            "掃描完成 - 符合: {}, 轉碼成功: {}, 轉碼失敗: {}",
            summary.compliant_count(),
            summary.converted_count(),
            summary.failed_count()
        );
        Ok(summary)
    }

    pub fn run(&self, root_dir: &Path) -> Result<()> {
        println!(
            "{}",
            style(format!("=== 影片編碼統一 ({}) ===", self.settings.target_codec))
                .cyan()
                .bold()
        );

        let summary = self.scan_and_convert(root_dir)?;
        Self::print_summary(&summary);
        Ok(())
    }

    fn print_summary(summary: &ScanSummary) {
        println!();
        println!("{}", style("=== 掃描摘要 ===").cyan().bold());
        println!("  總計: {} 個檔案", summary.records.len());
        println!("  已符合: {} 個", style(summary.compliant_count()).green());
        println!("  轉碼成功: {} 個", style(summary.converted_count()).green());

        let failed = summary.failed_count();
        if failed > 0 {
            println!("  轉碼失敗: {} 個", style(failed).red());
            for conversion in summary.conversions.iter().filter(|c| c.output.is_none()) {
                println!("    {}", conversion.source.display());
            }
        }
        if summary.interrupted {
            println!("{}", style("掃描已中斷，剩餘檔案未處理").yellow());
        }
    }
}
