//! 影片編碼統一元件
//!
//! 使用 ffprobe 偵測編碼，以 ffmpeg 將不符合目標編碼的影片轉為新檔案

mod ffmpeg_command;
mod main;

pub use ffmpeg_command::TranscodeCommand;
pub use main::{
    CodecComplianceRecord, CodecNormalizer, ConversionRecord, ConvertError, ScanSummary,
};
