// src/bin/gopher-upload.rs
// DOCUMENTATION: Bulk uploader for a running gopher-rating service
// PURPOSE: POST every image found in the given paths to /upload

use anyhow::{bail, Context, Result};
use dotenv::dotenv;
use reqwest::multipart::{Form, Part};
use reqwest::Client;
use std::env;
use std::path::{Path, PathBuf};
use std::process;
use std::time::{Duration, Instant};

// --- ANSI colours for the terminal ---
const RESET: &str = "\x1b[0m";
const BOLD: &str = "\x1b[1m";
const RED: &str = "\x1b[31m";
const GREEN: &str = "\x1b[32m";
const YELLOW: &str = "\x1b[33m";
const CYAN: &str = "\x1b[36m";

/// Multipart field the server reads the picture from
const UPLOAD_FIELD: &str = "gopher";

#[derive(Debug)]
struct UploadResult {
    path: PathBuf,
    success: bool,
    bytes: usize,
    duration_secs: f64,
    error: Option<String>,
}

/// MIME type for the file extensions we are willing to upload
fn image_mime(path: &Path) -> Option<&'static str> {
    let ext = path.extension()?.to_str()?.to_ascii_lowercase();
    match ext.as_str() {
        "png" => Some("image/png"),
        "jpg" | "jpeg" => Some("image/jpeg"),
        "gif" => Some("image/gif"),
        "webp" => Some("image/webp"),
        "bmp" => Some("image/bmp"),
        "svg" => Some("image/svg+xml"),
        _ => None,
    }
}

/// Expand arguments into image files; directories are scanned one level deep
fn collect_images(args: &[String]) -> Result<Vec<PathBuf>> {
    let mut files = Vec::new();
    for arg in args {
        let path = PathBuf::from(arg);
        if path.is_dir() {
            let mut entries: Vec<PathBuf> = std::fs::read_dir(&path)
                .with_context(|| format!("reading directory {}", path.display()))?
                .filter_map(|entry| entry.ok().map(|e| e.path()))
                .filter(|p| p.is_file() && image_mime(p).is_some())
                .collect();
            entries.sort();
            files.extend(entries);
        } else if image_mime(&path).is_some() {
            files.push(path);
        } else {
            println!(
                "{}⚠️  Skipping {}: not an image file{}",
                YELLOW,
                path.display(),
                RESET
            );
        }
    }
    Ok(files)
}

struct GopherUploader {
    base_url: String,
    client: Client,
    results: Vec<UploadResult>,
}

impl GopherUploader {
    fn new(base_url: String) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(120))
            .build()
            .context("Failed to create HTTP client")?;

        Ok(Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            client,
            results: Vec::new(),
        })
    }

    async fn check_service_health(&self) -> bool {
        match self.client.get(format!("{}/health", self.base_url)).send().await {
            Ok(resp) => resp.status().is_success(),
            Err(_) => false,
        }
    }

    async fn upload_file(&self, path: &Path) -> Result<usize> {
        let mime = image_mime(path).context("not an image file")?;
        let data = tokio::fs::read(path)
            .await
            .with_context(|| format!("reading {}", path.display()))?;
        let size = data.len();

        let file_name = path
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or("gopher")
            .to_string();
        let part = Part::bytes(data).file_name(file_name).mime_str(mime)?;
        let form = Form::new().part(UPLOAD_FIELD, part);

        let response = self
            .client
            .post(format!("{}/upload", self.base_url))
            .multipart(form)
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            bail!("HTTP {} - {}", status, strip_html(&body));
        }

        Ok(size)
    }

    async fn run(&mut self, files: &[PathBuf]) {
        println!("\n{}🔍 Checking service status...{}", CYAN, RESET);
        if !self.check_service_health().await {
            println!("{}❌ Service unavailable at {}.{}", RED, self.base_url, RESET);
            println!(
                "{}Please ensure gopher-rating is running (cargo run){}",
                YELLOW, RESET
            );
            process::exit(1);
        }
        println!("{}✅ Service available{}\n", GREEN, RESET);

        println!("{}🚀 Uploading {} gophers...{}\n", BOLD, files.len(), RESET);

        for (i, path) in files.iter().enumerate() {
            let start_time = Instant::now();
            let outcome = self.upload_file(path).await;
            let duration = start_time.elapsed().as_secs_f64();

            let result = match outcome {
                Ok(bytes) => {
                    println!(
                        "{}[{}/{}] ✅ {} ({} bytes, {:.1}s){}",
                        GREEN,
                        i + 1,
                        files.len(),
                        path.display(),
                        bytes,
                        duration,
                        RESET
                    );
                    UploadResult {
                        path: path.clone(),
                        success: true,
                        bytes,
                        duration_secs: duration,
                        error: None,
                    }
                }
                Err(e) => {
                    println!(
                        "{}[{}/{}] ❌ {}: {:#}{}",
                        RED,
                        i + 1,
                        files.len(),
                        path.display(),
                        e,
                        RESET
                    );
                    UploadResult {
                        path: path.clone(),
                        success: false,
                        bytes: 0,
                        duration_secs: duration,
                        error: Some(format!("{:#}", e)),
                    }
                }
            };
            self.results.push(result);
        }

        self.print_summary();
    }

    fn failures(&self) -> usize {
        self.results.iter().filter(|r| !r.success).count()
    }

    fn print_summary(&self) {
        println!("\n{}📋 Upload Summary{}", BOLD, RESET);
        println!("────────────────────────────────────────────────────────────");

        let uploaded: Vec<&UploadResult> = self.results.iter().filter(|r| r.success).collect();
        let total_bytes: usize = uploaded.iter().map(|r| r.bytes).sum();
        let total_duration: f64 = self.results.iter().map(|r| r.duration_secs).sum();

        println!("  • Uploaded: {}{}{}", GREEN, uploaded.len(), RESET);
        println!("  • Failed: {}{}{}", RED, self.failures(), RESET);
        println!("  • Bytes sent: {}", total_bytes);
        println!("  • Total Duration: {:.1}s", total_duration);

        for failed in self.results.iter().filter(|r| !r.success) {
            println!(
                "{}  ✗ {}: {}{}",
                RED,
                failed.path.display(),
                failed.error.as_deref().unwrap_or("unknown error"),
                RESET
            );
        }
    }
}

/// Error pages are HTML; keep the message readable on a terminal
fn strip_html(body: &str) -> String {
    let mut text = String::new();
    let mut in_tag = false;
    for c in body.chars() {
        match c {
            '<' => in_tag = true,
            '>' => {
                in_tag = false;
                text.push(' ');
            }
            _ if !in_tag => text.push(c),
            _ => {}
        }
    }
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenv().ok();

    let args: Vec<String> = env::args().skip(1).collect();
    if args.is_empty() {
        eprintln!("usage: gopher-upload <image or directory>...");
        process::exit(2);
    }

    let base_url =
        env::var("GOPHER_SERVER_URL").unwrap_or_else(|_| "http://localhost:8080".to_string());

    let files = collect_images(&args)?;
    if files.is_empty() {
        println!("{}⚠️  No images to upload.{}", YELLOW, RESET);
        return Ok(());
    }

    let mut uploader = GopherUploader::new(base_url)?;
    uploader.run(&files).await;

    if uploader.failures() > 0 {
        process::exit(1);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_image_mime() {
        assert_eq!(image_mime(Path::new("a.PNG")), Some("image/png"));
        assert_eq!(image_mime(Path::new("dir/b.jpeg")), Some("image/jpeg"));
        assert_eq!(image_mime(Path::new("notes.txt")), None);
        assert_eq!(image_mime(Path::new("no_extension")), None);
    }

    #[test]
    fn test_strip_html_strips_tags() {
        let body = "<html><body><h1>400 Bad Request</h1><pre>Validation error: no image</pre></body></html>";
        assert_eq!(
            strip_html(body),
            "400 Bad Request Validation error: no image"
        );
    }
}
