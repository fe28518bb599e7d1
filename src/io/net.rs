use crate::error::{MixError, Result};
use reqwest::{Client, Response};
use std::{
    path::{Path, PathBuf},
    time::Duration,
};
use tokio::{fs, fs::File, io::AsyncWriteExt};

pub fn http_client() -> Client {
    Client::builder()
        .connect_timeout(Duration::from_secs(10))
        .timeout(Duration::from_secs(10 * 60))
        .build()
        .unwrap_or_else(|_| Client::new())
}

/// Sibling path a download streams into before being renamed over `dest`.
pub fn part_path(dest: &Path) -> PathBuf {
    let mut name = dest.file_name().unwrap_or_default().to_os_string();
    name.push(".part");
    dest.with_file_name(name)
}

pub fn check_scheme(url: &str) -> Result<()> {
    if url.starts_with("https://") || url.starts_with("http://") {
        Ok(())
    } else {
        Err(MixError::invalid(format!(
            "unsupported URL scheme (expected http or https): {url}"
        )))
    }
}

/// GET `url` and stream the body to `dest`.
///
/// Any 2xx is success. Other statuses fail with [`MixError::Download`]. A
/// transport failure fails with [`MixError::Network`] after the partial file
/// is removed. `dest` itself only appears once the body is complete.
pub async fn fetch(client: &Client, url: &str, dest: &Path) -> Result<PathBuf> {
    check_scheme(url)?;

    let resp = client.get(url).send().await.map_err(|e| network(url, e))?;

    let status = resp.status();
    if !status.is_success() {
        return Err(MixError::Download {
            status: status.as_u16(),
            url: url.to_string(),
        });
    }

    let tmp = part_path(dest);
    let written = match stream_to(resp, url, &tmp).await {
        Ok(n) => n,
        Err(e) => {
            fs::remove_file(&tmp).await.ok();
            return Err(e);
        }
    };

    if fs::try_exists(dest).await.unwrap_or(false) {
        fs::remove_file(dest).await.ok();
    }
    fs::rename(&tmp, dest).await?;

    tracing::debug!(url, bytes = written, dest = %dest.display(), "download complete");
    Ok(dest.to_path_buf())
}

async fn stream_to(mut resp: Response, url: &str, tmp: &Path) -> Result<u64> {
    let mut file = File::create(tmp).await?;
    let mut written: u64 = 0;
    while let Some(chunk) = resp.chunk().await.map_err(|e| network(url, e))? {
        file.write_all(&chunk).await?;
        written += chunk.len() as u64;
    }
    file.flush().await?;
    Ok(written)
}

fn network(url: &str, e: reqwest::Error) -> MixError {
    MixError::Network {
        url: url.to_string(),
        message: e.to_string(),
    }
}
