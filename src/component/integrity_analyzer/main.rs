use super::backend::{LoadBackend, run_backend};
use super::decode_scanner::scan_decode_errors;
use super::frame_index_backend::FrameIndexBackend;
use super::report::{IntegrityReport, print_report};
use super::tensor_reader_backend::TensorReaderBackend;
use crate::config::ToolSettings;
use crate::tools::{ToolRunner, probe_media, validate_file_exists};
use anyhow::Result;
use log::{info, warn};
use std::path::Path;

/// 單一影片的多重檢查：中繼資料、嚴格解碼掃描、兩種後端完整載入
///
/// 每項檢查互相獨立，任一項失敗都只會記錄在報告中，不會中斷其餘檢查。
pub struct IntegrityAnalyzer {
    ffprobe: ToolRunner,
    ffmpeg: ToolRunner,
    backends: Vec<Box<dyn LoadBackend>>,
}

impl IntegrityAnalyzer {
    #[must_use]
    pub fn new(tools: &ToolSettings) -> Self {
        let backends: Vec<Box<dyn LoadBackend>> = vec![
            Box::new(FrameIndexBackend::new(
                tools.ffprobe_runner(),
                tools.ffmpeg_runner(),
            )),
            Box::new(TensorReaderBackend::new(
                tools.ffprobe_runner(),
                tools.ffmpeg_runner(),
            )),
        ];
        Self::with_backends(tools, backends)
    }

    #[must_use]
    pub fn with_backends(tools: &ToolSettings, backends: Vec<Box<dyn LoadBackend>>) -> Self {
        Self {
            ffprobe: tools.ffprobe_runner(),
            ffmpeg: tools.ffmpeg_runner(),
            backends,
        }
    }

    /// 檔案不存在時立即回傳錯誤，不執行任何外部工具
    pub fn analyze(&self, path: &Path) -> Result<IntegrityReport> {
        validate_file_exists(path)?;
        info!("開始分析影片: {}", path.display());

        let metadata = probe_media(&self.ffprobe, path);
        if let Err(e) = &metadata {
            warn!("ffprobe 分析失敗 {}: {e}", path.display());
        }

        let decode_scan = scan_decode_errors(&self.ffmpeg, path);
        match &decode_scan {
            Ok(log) if !log.is_clean() => warn!("發現解碼錯誤: {}", path.display()),
            Ok(_) => {}
            Err(e) => warn!("ffmpeg 掃描失敗 {}: {e}", path.display()),
        }

        let backends = self
            .backends
            .iter()
            .map(|backend| run_backend(backend.as_ref(), path))
            .collect();

        info!("分析完成: {}", path.display());
        Ok(IntegrityReport {
            path: path.to_path_buf(),
            metadata,
            decode_scan,
            backends,
        })
    }

    pub fn run(&self, path: &Path) -> Result<()> {
        let report = self.analyze(path)?;
        print_report(&report);
        Ok(())
    }
}
