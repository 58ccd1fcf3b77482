//! 影片完整性分析元件
//!
//! 以多個獨立的解碼後端檢查單一影片，找出損壞或相容性問題

mod backend;
mod decode_scanner;
mod frame_index_backend;
mod main;
mod report;
mod tensor_reader_backend;

pub use backend::{BackendReport, LoadBackend, LoadError, LoadOutcome, LoadSummary, run_backend};
pub use decode_scanner::{DecodeErrorLog, scan_decode_errors};
pub use frame_index_backend::FrameIndexBackend;
pub use main::IntegrityAnalyzer;
pub use report::{IntegrityReport, print_report, render_report};
pub use tensor_reader_backend::TensorReaderBackend;
