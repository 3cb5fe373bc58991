use std::path::{Path, PathBuf};
use std::process::Stdio;

use async_trait::async_trait;
use tokio::process::Command;
use tracing::{error, info, warn};

#[derive(Debug, thiserror::Error)]
pub enum RetrievalError {
    #[error("failed to launch {program}: {source}")]
    Launch {
        program: String,
        #[source]
        source: std::io::Error,
    },
    #[error("extractor failed for {url} (exit code {code:?}): {stderr}")]
    Extractor {
        url: String,
        code: Option<i32>,
        stderr: String,
    },
    #[error("extractor reported no media id for {url}")]
    MissingId { url: String },
    #[error("expected output file {} is missing", .path.display())]
    MissingOutput { path: PathBuf },
}

/// Fetches the media behind a link into a local directory.
#[async_trait]
pub trait Retriever: Send + Sync {
    /// Download `url` into `downloads_dir` and return the path of the file.
    async fn download(&self, url: &str, downloads_dir: &Path) -> Result<PathBuf, RetrievalError>;
}

/// [`Retriever`] backed by the `yt-dlp` command-line tool.
///
/// Output lands at `{downloads_dir}/{id}.mp4`, where `id` is the identifier
/// yt-dlp assigns to the media. If yt-dlp fails after it has reported the id,
/// every `{id}.*` leftover in the directory is removed.
pub struct YtDlp {
    program: PathBuf,
}

impl YtDlp {
    pub fn new(program: impl Into<PathBuf>) -> Self {
        Self {
            program: program.into(),
        }
    }

    fn command(&self, url: &str, downloads_dir: &Path) -> Command {
        let mut cmd = Command::new(&self.program);
        cmd.args(["-f", "mp4", "--merge-output-format", "mp4"])
            .args(["--no-playlist", "--no-simulate"])
            .args(["--print", "before_dl:%(id)s"])
            .arg("-o")
            .arg(downloads_dir.join("%(id)s.%(ext)s"))
            .arg("--")
            .arg(url)
            .stdin(Stdio::null());
        cmd
    }

    async fn run(&self, url: &str, downloads_dir: &Path) -> Result<PathBuf, RetrievalError> {
        let output = self
            .command(url, downloads_dir)
            .output()
            .await
            .map_err(|source| RetrievalError::Launch {
                program: self.program.display().to_string(),
                source,
            })?;

        let stdout = String::from_utf8_lossy(&output.stdout);
        let id = stdout
            .lines()
            .map(str::trim)
            .find(|line| !line.is_empty())
            .map(str::to_string);

        if !output.status.success() {
            if let Some(id) = &id {
                discard_partial(downloads_dir, id).await;
            }
            return Err(RetrievalError::Extractor {
                url: url.to_string(),
                code: output.status.code(),
                stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            });
        }

        let id = id.ok_or_else(|| RetrievalError::MissingId {
            url: url.to_string(),
        })?;
        let path = downloads_dir.join(format!("{}.mp4", id));
        if !tokio::fs::try_exists(&path).await.unwrap_or(false) {
            return Err(RetrievalError::MissingOutput { path });
        }

        Ok(path)
    }
}

#[async_trait]
impl Retriever for YtDlp {
    async fn download(&self, url: &str, downloads_dir: &Path) -> Result<PathBuf, RetrievalError> {
        info!("Downloading {} into {}", url, downloads_dir.display());
        match self.run(url, downloads_dir).await {
            Ok(path) => {
                info!("Downloaded {} to {}", url, path.display());
                Ok(path)
            }
            Err(e) => {
                error!("Download error for URL {}: {}", url, e);
                Err(e)
            }
        }
    }
}

/// Remove `{id}.*` leftovers (`.part`, `.ytdl`, per-format fragments) of a
/// failed download.
async fn discard_partial(downloads_dir: &Path, id: &str) {
    let prefix = format!("{}.", id);
    let mut entries = match tokio::fs::read_dir(downloads_dir).await {
        Ok(entries) => entries,
        Err(e) => {
            warn!(
                "Cannot scan {} for partial downloads: {}",
                downloads_dir.display(),
                e
            );
            return;
        }
    };

    while let Ok(Some(entry)) = entries.next_entry().await {
        let name = entry.file_name();
        if !name.to_string_lossy().starts_with(&prefix) {
            continue;
        }
        let path = entry.path();
        match tokio::fs::remove_file(&path).await {
            Ok(()) => warn!("Removed partial download {}", path.display()),
            Err(e) => error!("Failed to remove partial download {}: {}", path.display(), e),
        }
    }
}
