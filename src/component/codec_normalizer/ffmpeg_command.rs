use crate::config::NormalizerSettings;
use std::ffi::{OsStr, OsString};
use std::path::{Path, PathBuf};

/// 轉碼為目標編碼的 ffmpeg 指令；視訊重新編碼，音訊直接複製
pub struct TranscodeCommand {
    source_path: PathBuf,
    destination_path: PathBuf,
    encoder: String,
    preset: String,
    crf: u8,
}

impl TranscodeCommand {
    #[must_use]
    pub fn new(source_path: &Path, out_dir: Option<&Path>, settings: &NormalizerSettings) -> Self {
        let destination_path =
            Self::generate_destination_path(source_path, out_dir, &settings.target_codec);
        Self {
            source_path: source_path.to_path_buf(),
            destination_path,
            encoder: settings.resolved_encoder(),
            preset: settings.preset.clone(),
            crf: settings.crf,
        }
    }

    /// `{stem}_{codec}{ext}`，輸出到 `out_dir`，未指定時與來源同目錄
    ///
    /// 以 `OsStr` 組合檔名，非 UTF-8 的檔名也會保留原樣。
    fn generate_destination_path(source_path: &Path, out_dir: Option<&Path>, codec: &str) -> PathBuf {
        let mut file_name = OsString::from(source_path.file_stem().unwrap_or(OsStr::new("output")));
        file_name.push("_");
        file_name.push(codec.to_lowercase());
        if let Some(extension) = source_path.extension() {
            file_name.push(".");
            file_name.push(extension);
        }
        let parent = out_dir
            .or_else(|| source_path.parent())
            .unwrap_or(Path::new("."));
        parent.join(file_name)
    }

    #[must_use]
    pub fn source_path(&self) -> &Path {
        &self.source_path
    }

    #[must_use]
    pub fn destination_path(&self) -> &Path {
        &self.destination_path
    }

    #[must_use]
    pub fn build_args(&self) -> Vec<OsString> {
        // -n：目的檔已存在時 ffmpeg 直接失敗，不覆寫任何檔案
        let mut args: Vec<OsString> = ["-hide_banner", "-nostdin", "-n", "-loglevel", "error", "-i"]
            .map(OsString::from)
            .to_vec();
        args.push(self.source_path.as_os_str().to_owned());
        args.extend(["-map", "0:v:0", "-map", "0:a?", "-c:v"].map(OsString::from));
        args.push(self.encoder.as_str().into());
        args.push("-preset".into());
        args.push(self.preset.as_str().into());
        args.push("-crf".into());
        args.push(self.crf.to_string().into());
        args.extend(["-c:a", "copy"].map(OsString::from));
        args.push(self.destination_path.as_os_str().to_owned());
        args
    }
}
