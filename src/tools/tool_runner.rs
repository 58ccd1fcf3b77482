use log::debug;
use std::ffi::{OsStr, OsString};
use std::io::{self, Read};
use std::path::PathBuf;
use std::process::{Child, Command, ExitStatus, Stdio};
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};
use thiserror::Error;

/// 等待子行程結束時的輪詢間隔
const POLL_INTERVAL: Duration = Duration::from_millis(50);

#[derive(Debug, Error)]
pub enum ToolError {
    #[error("找不到執行檔: {program}")]
    NotFound { program: String },

    #[error("無法啟動 {program}: {source}")]
    Launch {
        program: String,
        #[source]
        source: io::Error,
    },

    #[error("{program} 執行失敗 ({status}): {stderr}")]
    Exit {
        program: String,
        status: ExitStatus,
        stderr: String,
    },

    #[error("{program} 執行逾時（{secs:.2} 秒），已終止", secs = .timeout.as_secs_f64())]
    Timeout { program: String, timeout: Duration },

    #[error("讀取 {program} 輸出失敗: {source}")]
    Io {
        program: String,
        #[source]
        source: io::Error,
    },
}

impl ToolError {
    /// 錯誤分類名稱，用於報告
    #[must_use]
    pub const fn category(&self) -> &'static str {
        match self {
            Self::NotFound { .. } => "ToolNotFound",
            Self::Launch { .. } => "LaunchError",
            Self::Exit { .. } => "ExitError",
            Self::Timeout { .. } => "Timeout",
            Self::Io { .. } => "IoError",
        }
    }

    /// 執行檔不存在屬於環境問題，而非資料問題
    #[must_use]
    pub const fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }
}

/// 標準輸出的處理方式
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StdoutMode {
    /// 完整保留輸出內容
    Capture,
    /// 只計算位元組數（用於解碼管線，避免整段影像進記憶體）
    Count,
}

#[derive(Debug)]
pub struct ToolOutput {
    pub status: ExitStatus,
    pub stdout: Vec<u8>,
    pub stdout_len: u64,
    pub stderr: String,
}

impl ToolOutput {
    #[must_use]
    pub fn stdout_text(&self) -> String {
        String::from_utf8_lossy(&self.stdout).into_owned()
    }
}

/// 同步執行外部工具（ffprobe / ffmpeg），可選擇設定逾時
#[derive(Debug, Clone)]
pub struct ToolRunner {
    program: PathBuf,
    timeout: Option<Duration>,
}

impl ToolRunner {
    pub fn new(program: impl Into<PathBuf>, timeout: Option<Duration>) -> Self {
        Self {
            program: program.into(),
            timeout,
        }
    }

    fn program_name(&self) -> String {
        self.program.display().to_string()
    }

    /// 執行並保留輸出，不檢查結束碼
    pub fn run<I, S>(&self, args: I) -> Result<ToolOutput, ToolError>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<OsStr>,
    {
        self.execute(args, StdoutMode::Capture)
    }

    /// 執行並保留輸出，結束碼非零時回傳 [`ToolError::Exit`]
    pub fn run_checked<I, S>(&self, args: I) -> Result<ToolOutput, ToolError>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<OsStr>,
    {
        let output = self.execute(args, StdoutMode::Capture)?;
        self.ensure_success(output)
    }

    /// 執行並只計算標準輸出的位元組數，結束碼非零時回傳錯誤
    pub fn run_counting<I, S>(&self, args: I) -> Result<ToolOutput, ToolError>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<OsStr>,
    {
        let output = self.execute(args, StdoutMode::Count)?;
        self.ensure_success(output)
    }

    /// 執行但丟棄標準輸出，不檢查結束碼
    pub fn run_discarding<I, S>(&self, args: I) -> Result<ToolOutput, ToolError>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<OsStr>,
    {
        self.execute(args, StdoutMode::Count)
    }

    fn ensure_success(&self, output: ToolOutput) -> Result<ToolOutput, ToolError> {
        if output.status.success() {
            return Ok(output);
        }
        Err(ToolError::Exit {
            program: self.program_name(),
            status: output.status,
            stderr: output.stderr.trim().to_string(),
        })
    }

    fn execute<I, S>(&self, args: I, mode: StdoutMode) -> Result<ToolOutput, ToolError>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<OsStr>,
    {
        let args: Vec<OsString> = args.into_iter().map(|a| a.as_ref().to_owned()).collect();
        debug!("執行 {} {:?}", self.program_name(), args);

        let mut child = Command::new(&self.program)
            .args(&args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|source| {
                if source.kind() == io::ErrorKind::NotFound {
                    ToolError::NotFound {
                        program: self.program_name(),
                    }
                } else {
                    ToolError::Launch {
                        program: self.program_name(),
                        source,
                    }
                }
            })?;

        let stdout_reader = Self::spawn_stdout_reader(child.stdout.take(), mode);
        let stderr_reader = Self::spawn_stderr_reader(child.stderr.take());

        let status = self.wait(&mut child)?;

        let (stdout, stdout_len) = Self::join_reader(stdout_reader).map_err(|source| {
            ToolError::Io {
                program: self.program_name(),
                source,
            }
        })?;
        let stderr = Self::join_reader(stderr_reader).map_err(|source| ToolError::Io {
            program: self.program_name(),
            source,
        })?;

        Ok(ToolOutput {
            status,
            stdout,
            stdout_len,
            stderr: String::from_utf8_lossy(&stderr).into_owned(),
        })
    }

    fn spawn_stdout_reader<R>(pipe: Option<R>, mode: StdoutMode) -> JoinHandle<io::Result<(Vec<u8>, u64)>>
    where
        R: Read + Send + 'static,
    {
        thread::spawn(move || {
            let Some(mut pipe) = pipe else {
                return Ok((Vec::new(), 0));
            };
            match mode {
                StdoutMode::Capture => {
                    let mut buffer = Vec::new();
                    pipe.read_to_end(&mut buffer)?;
                    let len = buffer.len() as u64;
                    Ok((buffer, len))
                }
                StdoutMode::Count => {
                    let len = io::copy(&mut pipe, &mut io::sink())?;
                    Ok((Vec::new(), len))
                }
            }
        })
    }

    fn spawn_stderr_reader<R>(pipe: Option<R>) -> JoinHandle<io::Result<Vec<u8>>>
    where
        R: Read + Send + 'static,
    {
        thread::spawn(move || {
            let mut buffer = Vec::new();
            if let Some(mut pipe) = pipe {
                pipe.read_to_end(&mut buffer)?;
            }
            Ok(buffer)
        })
    }

    fn join_reader<T>(handle: JoinHandle<io::Result<T>>) -> io::Result<T> {
        handle
            .join()
            .unwrap_or_else(|_| Err(io::Error::other("輸出讀取執行緒異常結束")))
    }

    /// 未設定逾時則一直等待；否則輪詢直到逾時並終止子行程
    fn wait(&self, child: &mut Child) -> Result<ExitStatus, ToolError> {
        let Some(timeout) = self.timeout else {
            return child.wait().map_err(|source| ToolError::Io {
                program: self.program_name(),
                source,
            });
        };

        let deadline = Instant::now() + timeout;
        loop {
            match child.try_wait() {
                Ok(Some(status)) => return Ok(status),
                Ok(None) => {}
                Err(source) => {
                    return Err(ToolError::Io {
                        program: self.program_name(),
                        source,
                    });
                }
            }

            if Instant::now() >= deadline {
                let _ = child.kill();
                let _ = child.wait();
                return Err(ToolError::Timeout {
                    program: self.program_name(),
                    timeout,
                });
            }

            thread::sleep(POLL_INTERVAL);
        }
    }
}
