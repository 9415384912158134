use super::{
    backend::ExtractionBackend,
    error::BackendError,
    output::{FileName, OutputTarget},
    types::RawInfo,
};
use crate::config::BackendConfig;
use async_trait::async_trait;
use std::{path::PathBuf, process::Output, time::Duration};
use tokio::process::Command;
use tracing::{debug, info, warn};
use url::Url;

/// Messages yt-dlp prints when a source demands sign-in or bot verification.
const ACCESS_DENIED_MARKERS: &[&str] = &[
    "Sign in to confirm you\u{2019}re not a bot",
    "Sign in to confirm you're not a bot",
];

pub struct YtDlpBackend {
    binary: String,
    cookie_file: Option<PathBuf>,
    metadata_timeout: Option<Duration>,
    download_timeout: Option<Duration>,
}

impl YtDlpBackend {
    pub fn new(config: &BackendConfig) -> Self {
        let cookie_file = match &config.cookie_file {
            Some(path) if path.exists() => {
                info!("Using cookies file for yt-dlp: {}", path.display());
                Some(path.clone())
            }
            Some(path) => {
                warn!(
                    "Configured cookies file {} does not exist, continuing without it",
                    path.display()
                );
                None
            }
            None => None,
        };

        Self {
            binary: config.binary.clone(),
            cookie_file,
            metadata_timeout: config.metadata_timeout_secs.map(Duration::from_secs),
            download_timeout: config.download_timeout_secs.map(Duration::from_secs),
        }
    }

    fn command(&self) -> Command {
        let mut command = Command::new(&self.binary);
        command.arg("--no-warnings").arg("--no-playlist");

        if let Some(cookie_file) = &self.cookie_file {
            command.arg("--cookies").arg(cookie_file);
        }

        // Dropping the request future must not leave yt-dlp running.
        command.kill_on_drop(true);
        command
    }

    async fn run(
        &self,
        mut command: Command,
        limit: Option<Duration>,
    ) -> Result<RawInfo, BackendError> {
        let output = match limit {
            Some(limit) => tokio::time::timeout(limit, command.output())
                .await
                .map_err(|_| {
                    BackendError::Unavailable(format!(
                        "{} timed out after {}s",
                        self.binary,
                        limit.as_secs()
                    ))
                })?,
            None => command.output().await,
        }
        .map_err(|e| BackendError::Unavailable(format!("failed to run {}: {e}", self.binary)))?;

        parse_output(&output)
    }
}

#[async_trait]
impl ExtractionBackend for YtDlpBackend {
    fn name(&self) -> &'static str {
        "yt-dlp"
    }

    async fn resolve_metadata(&self, url: &Url) -> Result<RawInfo, BackendError> {
        debug!("Extracting metadata with yt-dlp for: {}", url);

        let mut command = self.command();
        command
            .arg("--dump-single-json")
            .arg("--skip-download")
            .arg("--")
            .arg(url.as_str());

        self.run(command, self.metadata_timeout).await
    }

    async fn materialize(
        &self,
        url: &Url,
        format_id: &str,
        target: &OutputTarget,
    ) -> Result<RawInfo, BackendError> {
        let template = output_template(target);
        info!("Downloading format {} of {} to {}", format_id, url, template);

        // --dump-single-json with --no-simulate downloads first and then
        // prints the final info, including where the file ended up.
        let mut command = self.command();
        command
            .arg("--format")
            .arg(format_id)
            .arg("--output")
            .arg(&template)
            .arg("--no-simulate")
            .arg("--dump-single-json")
            .arg("--")
            .arg(url.as_str());

        self.run(command, self.download_timeout).await
    }

    async fn test_availability(&self) -> bool {
        let yt_dlp_available = check_version(&self.binary, "--version").await;
        // ffmpeg is needed for formats that require merging or remuxing
        let ffmpeg_available = check_version("ffmpeg", "-version").await;

        if yt_dlp_available && !ffmpeg_available {
            warn!("⚠️  yt-dlp will work but formats that need merging may fail");
        }

        yt_dlp_available
    }
}

/// Runs `program flag` and logs the first line of its version output.
async fn check_version(program: &str, flag: &str) -> bool {
    match Command::new(program).arg(flag).output().await {
        Ok(output) if output.status.success() => {
            let stdout = String::from_utf8_lossy(&output.stdout);
            let version = stdout.lines().next().unwrap_or("unknown").trim();
            info!("✅ {} is available: {}", program, version);
            true
        }
        Ok(output) => {
            warn!("❌ {} {} failed with {}", program, flag, output.status);
            false
        }
        Err(e) => {
            warn!("❌ {} not found: {}", program, e);
            false
        }
    }
}

fn parse_output(output: &Output) -> Result<RawInfo, BackendError> {
    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        let detail = match stderr.trim() {
            "" => format!("yt-dlp exited with {}", output.status),
            message => message.to_string(),
        };
        return Err(classify_failure(detail));
    }

    serde_json::from_slice(&output.stdout)
        .map_err(|e| BackendError::Unavailable(format!("failed to parse yt-dlp output: {e}")))
}

fn classify_failure(detail: String) -> BackendError {
    if ACCESS_DENIED_MARKERS
        .iter()
        .any(|marker| detail.contains(marker))
    {
        BackendError::AccessDenied(detail)
    } else {
        BackendError::Failed(detail)
    }
}

/// Renders a target as a yt-dlp output template. Literal `%` must be doubled
/// so user-supplied names are never expanded as template fields.
fn output_template(target: &OutputTarget) -> String {
    let file = match target.file_name() {
        FileName::Verbatim(name) => escape(name),
        FileName::Stem(stem) => format!("{}.%(ext)s", escape(stem)),
        FileName::Title => "%(title)s.%(ext)s".to_string(),
    };

    let dir = escape(&target.directory().to_string_lossy());
    format!("{}/{}", dir.trim_end_matches('/'), file)
}

fn escape(value: &str) -> String {
    value.replace('%', "%%")
}
