//! 功能元件模組
//!
//! 每個子模組實現一個獨立的工具，包含主要邏輯和專用工具

pub mod codec_normalizer;
pub mod integrity_analyzer;

pub use codec_normalizer::CodecNormalizer;
pub use integrity_analyzer::IntegrityAnalyzer;
