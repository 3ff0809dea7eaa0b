use std::path::Path;
use std::sync::Arc;

use adskip_engine::control::{
    ControlAction, ControlResponse, ControlService, JsonFileStore, PacFileProxy,
};
use adskip_engine::hls::rewriter::PlaylistSummary;
use adskip_engine::hls::{AdSegmentStripper, CleanPipeline, HttpPlaylistFetcher};
use adskip_engine::AdClassifier;
use tokio::io::AsyncWriteExt;
use tracing::{debug, info};
use url::Url;

use crate::config::AppConfig;
use crate::error::{AppError, Result};

pub struct CommandExecutor {
    config: AppConfig,
}

impl CommandExecutor {
    pub fn new(config: AppConfig) -> Self {
        Self { config }
    }

    /// Clean a playlist from a file or an http(s) URL.
    pub async fn clean(&self, input: &str, output: Option<&Path>) -> Result<()> {
        let body = if is_remote(input) {
            self.clean_remote(input).await?
        } else {
            self.clean_file(Path::new(input)).await?
        };

        match PlaylistSummary::parse(&body) {
            Some(summary) => debug!(?summary, "Cleaned playlist"),
            None => debug!("Cleaned playlist did not parse as HLS"),
        }
        write_output(output, body.as_bytes()).await
    }

    async fn clean_remote(&self, url: &str) -> Result<String> {
        let engine = &self.config.engine;
        let pipeline = CleanPipeline::new(
            Arc::new(HttpPlaylistFetcher::from_config(engine)?),
            AdSegmentStripper::from_config(engine),
        );
        let handle = pipeline
            .fetch_and_clean(url)
            .await
            .ok_or_else(|| AppError::CleanFailed(url.to_owned()))?;
        let body = pipeline
            .resolve(handle.url())
            .ok_or_else(|| AppError::CleanFailed(url.to_owned()))?;
        Ok(String::from_utf8_lossy(&body).into_owned())
    }

    async fn clean_file(&self, path: &Path) -> Result<String> {
        let text = tokio::fs::read_to_string(path).await?;
        let stripped = AdSegmentStripper::from_config(&self.config.engine).strip(&text);
        let report = stripped.report;
        if report.is_unchanged() {
            info!(path = %path.display(), "No ad segments found");
        } else {
            info!(
                path = %path.display(),
                segments = report.dropped_uris,
                segment_infos = report.dropped_segment_infos,
                dateranges = report.dropped_dateranges,
                "Stripped ad segments"
            );
        }
        Ok(stripped.body)
    }

    /// One line per URL: `ad` or `ok`, then the URL.
    pub fn classify(&self, urls: &[String]) -> String {
        let classifier = AdClassifier::from_config(&self.config.engine);
        urls.iter()
            .map(|url| {
                let verdict = if classifier.is_ad_likely(url.as_str()) {
                    "ad"
                } else {
                    "ok"
                };
                format!("{verdict}\t{url}\n")
            })
            .collect()
    }

    pub async fn pac(&self, output: Option<&Path>) -> Result<()> {
        let script = self.config.engine.pac.render();
        write_output(output, script.as_bytes()).await
    }

    /// Run a control action against the file-backed store and PAC file.
    pub async fn control(&self, action: ControlAction) -> ControlResponse {
        self.control_service().dispatch(action).await
    }

    fn control_service(&self) -> ControlService {
        let store = JsonFileStore::new(self.config.state_file());
        let proxy = PacFileProxy::new(self.config.pac_file());
        debug!(
            state = %store.path().display(),
            pac = %proxy.path().display(),
            "Using file-backed control plane"
        );
        ControlService::new(Arc::new(store), Arc::new(proxy), &self.config.engine.pac)
    }
}

fn is_remote(input: &str) -> bool {
    Url::parse(input).is_ok_and(|url| matches!(url.scheme(), "http" | "https"))
}

async fn write_output(output: Option<&Path>, bytes: &[u8]) -> Result<()> {
    match output {
        Some(path) => {
            tokio::fs::write(path, bytes).await?;
            info!(path = %path.display(), "Wrote output");
        }
        None => {
            let mut stdout = tokio::io::stdout();
            stdout.write_all(bytes).await?;
            if !bytes.ends_with(b"\n") {
                stdout.write_all(b"\n").await?;
            }
            stdout.flush().await?;
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use adskip_engine::control::Status;
    use std::path::PathBuf;
    use tempfile::tempdir;

    fn executor(state_dir: PathBuf) -> CommandExecutor {
        CommandExecutor::new(AppConfig {
            state_dir: Some(state_dir),
            ..AppConfig::default()
        })
    }

    #[test]
    fn recognizes_remote_inputs() {
        assert!(is_remote("https://cdn/live/index.m3u8"));
        assert!(is_remote("http://cdn/live/index.m3u8"));
        assert!(!is_remote("playlists/index.m3u8"));
        assert!(!is_remote("C:\\playlists\\index.m3u8"));
    }

    #[test]
    fn classifies_urls() {
        let dir = tempdir().unwrap();
        let out = executor(dir.path().to_path_buf()).classify(&[
            "https://cdn/stitched/a.m3u8".to_string(),
            "https://cdn/live/b.m3u8".to_string(),
        ]);
        assert_eq!(
            out,
            "ad\thttps://cdn/stitched/a.m3u8\nok\thttps://cdn/live/b.m3u8\n"
        );
    }

    #[tokio::test]
    async fn cleans_playlist_file() {
        let dir = tempdir().unwrap();
        let input = dir.path().join("in.m3u8");
        let output = dir.path().join("out.m3u8");
        std::fs::write(
            &input,
            "#EXTM3U\n#EXTINF:10,\nseg1.ts\n#EXTINF:6,\nmidroll_ad.ts\n#EXTINF:10,\nseg2.ts",
        )
        .unwrap();

        executor(dir.path().to_path_buf())
            .clean(input.to_str().unwrap(), Some(output.as_path()))
            .await
            .unwrap();
        assert_eq!(
            std::fs::read_to_string(&output).unwrap(),
            "#EXTM3U\n#EXTINF:10,\nseg1.ts\n#EXTINF:10,\nseg2.ts"
        );
    }

    #[tokio::test]
    async fn control_round_trip_uses_state_dir() {
        let dir = tempdir().unwrap();
        let executor = executor(dir.path().join("state"));

        let status = executor.control(ControlAction::GetStatus).await;
        assert_eq!(status.to_value()["status"], "active");

        let toggled = executor.control(ControlAction::ToggleRules).await;
        assert_eq!(toggled, ControlResponse::ok(Status::Inactive));
        assert!(!executor.config.pac_file().exists());

        let enabled = executor.control(ControlAction::Enable).await;
        assert_eq!(enabled.status, Some(Status::Active));
        let script = std::fs::read_to_string(executor.config.pac_file()).unwrap();
        assert!(script.contains("FindProxyForURL"));
    }
}
