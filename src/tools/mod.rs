mod ffprobe_info;
mod path_validator;
mod tool_runner;
mod video_scanner;

pub use ffprobe_info::{
    MediaProbeReport, ProbeError, StreamDescriptor, StreamDetails, parse_frame_rate,
    parse_media_report, probe_media, probe_video_codec, resolve_frame_rate,
};
pub(crate) use ffprobe_info::{StreamInfo, parse_ffprobe_json};
pub use path_validator::{ensure_directory_exists, validate_directory_exists, validate_file_exists};
pub use tool_runner::{ToolError, ToolOutput, ToolRunner};
pub use video_scanner::scan_video_files;
