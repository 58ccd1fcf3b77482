use crate::tools::{ToolError, ToolRunner};
use std::ffi::OsString;
use std::path::Path;

/// 嚴格解碼掃描所產生的錯誤訊息；空字串代表解碼正常
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DecodeErrorLog {
    pub text: String,
}

impl DecodeErrorLog {
    #[must_use]
    pub fn is_clean(&self) -> bool {
        self.text.trim().is_empty()
    }
}

/// 以 ffmpeg 完整解碼一次但不輸出檔案，只保留 error 等級的訊息
pub fn scan_decode_errors(ffmpeg: &ToolRunner, path: &Path) -> Result<DecodeErrorLog, ToolError> {
    let mut args: Vec<OsString> = ["-v", "error", "-nostdin", "-i"].map(OsString::from).to_vec();
    args.push(path.into());
    args.extend(["-f", "null", "-"].map(OsString::from));

    let output = ffmpeg.run_discarding(&args)?;
    let mut text = output.stderr.trim().to_string();

    // 結束碼異常但沒有任何訊息時，仍視為解碼錯誤
    if text.is_empty() && !output.status.success() {
        text = format!("ffmpeg 結束碼異常: {}", output.status);
    }

    Ok(DecodeErrorLog { text })
}
