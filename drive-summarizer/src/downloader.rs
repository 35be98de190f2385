use crate::types::{DownloadConfig, Result, SummarizerError};
use crate::utils::url::{extract_domain, is_valid_folder_url};
use std::path::PathBuf;
use tokio::process::Command;
use tracing::{debug, info};
use url::Url;

/// Fetches a public drive folder with an external bulk-download utility.
pub struct Downloader {
    config: DownloadConfig,
}

impl Downloader {
    pub fn new(config: DownloadConfig) -> Self {
        Self { config }
    }

    pub fn destination(&self) -> &PathBuf {
        &self.config.download_dir
    }

    pub async fn download_folder(&self, folder_url: &str) -> Result<PathBuf> {
        Url::parse(folder_url)?;
        if !is_valid_folder_url(folder_url) {
            return Err(SummarizerError::InvalidInput(format!(
                "folder URL must be http(s) with a host: {}",
                folder_url
            )));
        }

        let dest = &self.config.download_dir;
        tokio::fs::create_dir_all(dest).await?;
        info!(
            "Downloading folder from {} -> {}",
            extract_domain(folder_url).unwrap_or_default(),
            dest.display()
        );

        let mut command = Command::new(&self.config.program);
        command.arg("--folder").arg(folder_url).arg("-O").arg(dest);
        debug!("Running {:?}", command);

        let output = command.output().await.map_err(|e| {
            SummarizerError::Download(format!(
                "could not run '{}' ({}); install it with `pip install gdown`",
                self.config.program, e
            ))
        })?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            let tail: String = stderr
                .lines()
                .rev()
                .take(5)
                .collect::<Vec<_>>()
                .into_iter()
                .rev()
                .collect::<Vec<_>>()
                .join("\n");
            return Err(SummarizerError::Download(format!(
                "'{}' exited with {}: {}",
                self.config.program, output.status, tail
            )));
        }

        info!("Download finished into {}", dest.display());
        Ok(dest.clone())
    }
}
