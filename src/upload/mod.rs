// src/upload/mod.rs

use std::path::Path;
use std::time::Duration;

use anyhow::{ensure, Context, Result};
use reqwest::multipart::{Form, Part};
use reqwest::Client;
use tokio::fs;
use tracing::{info, warn};

static CATBOX_API: &str = "https://catbox.moe/user/api.php";
static VIM_CN_API: &str = "https://img.vim-cn.com/";

const UPLOAD_TIMEOUT: Duration = Duration::from_secs(30);

/// Upload the rendered image to a public host, catbox first and vim-cn
/// as fallback. Returns `None` when both fail; the caller then degrades
/// the notification to text-only.
pub async fn upload_image(client: &Client, path: &Path) -> Option<String> {
    let bytes = match fs::read(path).await {
        Ok(bytes) => bytes,
        Err(err) => {
            warn!(path = %path.display(), "reading image failed: {err}");
            return None;
        }
    };
    let name = path
        .file_name()
        .and_then(|s| s.to_str())
        .unwrap_or("report.png")
        .to_string();

    match upload_catbox(client, bytes.clone(), name.clone()).await {
        Ok(url) => {
            info!(%url, "uploaded via catbox");
            return Some(url);
        }
        Err(err) => warn!("catbox upload failed: {err:#}"),
    }
    match upload_vim_cn(client, bytes, name).await {
        Ok(url) => {
            info!(%url, "uploaded via vim-cn");
            Some(url)
        }
        Err(err) => {
            warn!("vim-cn upload failed: {err:#}");
            None
        }
    }
}

async fn upload_catbox(client: &Client, bytes: Vec<u8>, name: String) -> Result<String> {
    let part = png_part(bytes, name)?;
    let form = Form::new()
        .text("reqtype", "fileupload")
        .text("userhash", "")
        .part("fileToUpload", part);
    let body = client
        .post(CATBOX_API)
        .multipart(form)
        .timeout(UPLOAD_TIMEOUT)
        .send()
        .await
        .context("posting to catbox")?
        .error_for_status()?
        .text()
        .await
        .context("reading catbox response")?;
    let url = body.trim().to_string();
    ensure!(url.starts_with("http"), "unexpected catbox response: {url}");
    Ok(url)
}

async fn upload_vim_cn(client: &Client, bytes: Vec<u8>, name: String) -> Result<String> {
    let form = Form::new().part("file", png_part(bytes, name)?);
    let body = client
        .post(VIM_CN_API)
        .multipart(form)
        .timeout(UPLOAD_TIMEOUT)
        .send()
        .await
        .context("posting to vim-cn")?
        .error_for_status()?
        .text()
        .await
        .context("reading vim-cn response")?;
    let url = force_https(body.trim());
    ensure!(url.starts_with("https://"), "unexpected vim-cn response: {url}");
    Ok(url)
}

fn png_part(bytes: Vec<u8>, name: String) -> Result<Part> {
    Part::bytes(bytes)
        .file_name(name)
        .mime_str("image/png")
        .context("building multipart image part")
}

/// vim-cn answers with a plain-http URL; DingTalk only renders https images.
pub fn force_https(url: &str) -> String {
    match url.strip_prefix("http://") {
        Some(rest) => format!("https://{rest}"),
        None => url.to_string(),
    }
}
