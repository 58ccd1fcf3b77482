pub mod load;
pub mod save;
pub mod types;

pub use types::{
    Config, DEFAULT_VIDEO_EXTENSIONS, FileTypeTable, NormalizerSettings, ToolSettings,
    UserSettings,
};
