use super::backend::{BackendReport, LoadOutcome};
use super::decode_scanner::DecodeErrorLog;
use crate::tools::{MediaProbeReport, ProbeError, StreamDescriptor, StreamDetails, ToolError};
use console::style;
use std::fmt::{self, Display, Write as _};
use std::path::PathBuf;

const SEPARATOR_WIDTH: usize = 60;

/// 單一影片的完整性分析結果，每個檢查項目各自保留成功或失敗
#[derive(Debug)]
pub struct IntegrityReport {
    pub path: PathBuf,
    pub metadata: Result<MediaProbeReport, ProbeError>,
    pub decode_scan: Result<DecodeErrorLog, ToolError>,
    pub backends: Vec<BackendReport>,
}

impl IntegrityReport {
    /// 是否所有檢查都通過（後端無法使用不算失敗）
    #[must_use]
    pub fn is_healthy(&self) -> bool {
        self.metadata.is_ok()
            && self.decode_scan.as_ref().is_ok_and(DecodeErrorLog::is_clean)
            && self
                .backends
                .iter()
                .all(|b| !matches!(b.outcome, LoadOutcome::Failed { .. }))
    }
}

fn or_na<T: Display>(value: Option<T>) -> String {
    value.map_or_else(|| "N/A".to_string(), |v| v.to_string())
}

fn write_stream(out: &mut String, stream: &StreamDescriptor) -> fmt::Result {
    writeln!(out, "   串流 #{} ({}):", stream.index, stream.details.kind())?;
    writeln!(out, "     編碼器: {}", or_na(stream.codec_name.as_deref()))?;
    writeln!(out, "     編碼標籤: {}", or_na(stream.codec_tag.as_deref()))?;

    match &stream.details {
        StreamDetails::Video {
            width,
            height,
            bit_rate,
            ..
        } => {
            writeln!(out, "     解析度: {}x{}", or_na(*width), or_na(*height))?;
            match stream.frame_rate_fps() {
                Some(Ok(fps)) => writeln!(out, "     幀率: {fps:.3} fps")?,
                Some(Err(e)) => writeln!(out, "     幀率: 無法解析 ({e})")?,
                None => writeln!(out, "     幀率: N/A")?,
            }
            writeln!(out, "     比特率: {} bps", or_na(*bit_rate))?;
        }
        StreamDetails::Audio {
            sample_rate,
            channels,
        } => {
            writeln!(out, "     取樣率: {} Hz", or_na(*sample_rate))?;
            writeln!(out, "     聲道: {}", or_na(*channels))?;
        }
        StreamDetails::Other { .. } => {}
    }
    Ok(())
}

fn write_metadata(out: &mut String, metadata: &Result<MediaProbeReport, ProbeError>) -> fmt::Result {
    writeln!(out, "1. 影片中繼資料 (ffprobe)")?;
    let probe = match metadata {
        Ok(probe) => probe,
        Err(e) => return writeln!(out, "   ffprobe 分析失敗 [{}]: {e}", e.category()),
    };

    writeln!(out, "   格式: {}", or_na(probe.format_name.as_deref()))?;
    writeln!(out, "   時長: {} 秒", or_na(probe.duration_seconds))?;
    writeln!(out, "   總比特率: {} bps", or_na(probe.bit_rate))?;
    writeln!(out, "   檔案大小: {} bytes", or_na(probe.size_bytes))?;
    writeln!(out, "   章節數: {}", probe.chapter_count)?;
    for stream in &probe.streams {
        write_stream(out, stream)?;
    }
    Ok(())
}

fn write_decode_scan(out: &mut String, scan: &Result<DecodeErrorLog, ToolError>) -> fmt::Result {
    writeln!(out, "2. 解碼錯誤掃描 (ffmpeg)")?;
    match scan {
        Ok(log) if log.is_clean() => writeln!(out, "   未發現解碼錯誤。"),
        Ok(log) => {
            writeln!(out, "   發現解碼錯誤:")?;
            for line in log.text.lines() {
                writeln!(out, "     {line}")?;
            }
            Ok(())
        }
        Err(e) => writeln!(out, "   ffmpeg 掃描失敗 [{}]: {e}", e.category()),
    }
}

fn write_backend(out: &mut String, number: usize, report: &BackendReport) -> fmt::Result {
    writeln!(out, "{number}. 嘗試以 {} 載入", report.backend)?;
    match &report.outcome {
        LoadOutcome::Loaded(summary) => {
            for line in summary.to_string().lines() {
                writeln!(out, "   {line}")?;
            }
            Ok(())
        }
        LoadOutcome::Failed { category, message } => {
            writeln!(out, "   {} 載入失敗: {category}: {message}", report.backend)
        }
        LoadOutcome::Unavailable { reason } => {
            writeln!(out, "   {} 無法使用: {reason}", report.backend)
        }
    }
}

/// 將報告轉為純文字（不含色彩）
#[must_use]
pub fn render_report(report: &IntegrityReport) -> String {
    let mut out = String::new();
    // 寫入 String 不會失敗
    let _ = write_sections(&mut out, report);
    out
}

fn write_sections(out: &mut String, report: &IntegrityReport) -> fmt::Result {
    write_metadata(out, &report.metadata)?;
    writeln!(out)?;
    write_decode_scan(out, &report.decode_scan)?;
    for (offset, backend) in report.backends.iter().enumerate() {
        writeln!(out)?;
        write_backend(out, offset + 3, backend)?;
    }
    Ok(())
}

pub fn print_report(report: &IntegrityReport) {
    let separator = "=".repeat(SEPARATOR_WIDTH);
    println!(
        "{}",
        style(format!("開始分析影片: {}", report.path.display()))
            .cyan()
            .bold()
    );
    println!("{separator}");
    print!("{}", render_report(report));
    println!("{separator}");
    if report.is_healthy() {
        println!("{}", style("分析完成，未發現問題。").green());
    } else {
        println!("{}", style("分析完成，請檢查上方的錯誤項目。").yellow());
    }
}
