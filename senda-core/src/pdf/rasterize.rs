// File: senda-core/src/pdf/rasterize.rs

use std::path::{Path, PathBuf};
use std::time::Duration;

use async_trait::async_trait;
use tempfile::TempDir;
use tokio::process::Command;
use tokio::time::timeout;
use tracing::{debug, info, warn};

use senda_common::Error;

use crate::config::PdfPolicy;

/// One rasterization backend: converts a PDF into page images inside
/// `out_dir`, or fails. Failures are logged by the chain and do not abort it.
#[async_trait]
pub trait RasterBackend: Send + Sync {
    fn name(&self) -> &'static str;

    async fn rasterize(
        &self,
        pdf_path: &Path,
        out_dir: &Path,
        dpi: u32,
        timeout: Duration,
    ) -> Result<Vec<PathBuf>, Error>;
}

/// Page images produced for one document. The backing temp directory is
/// removed when this value drops, so intermediate files are cleaned up on
/// every exit path.
pub struct RasterizedPages {
    pub backend: &'static str,
    pub pages: Vec<PathBuf>,
    _dir: TempDir,
}

/// Tries the configured backends in a fixed preference order; the first
/// producing at least one valid, non-empty image wins and the remaining
/// backends are not tried.
pub struct PdfPageRasterizer {
    backends: Vec<Box<dyn RasterBackend>>,
    policy: PdfPolicy,
}

impl PdfPageRasterizer {
    pub fn new(backends: Vec<Box<dyn RasterBackend>>, policy: PdfPolicy) -> Self {
        Self { backends, policy }
    }

    /// The default chain: pdftoppm, then ImageMagick, then Ghostscript.
    pub fn with_default_backends(policy: PdfPolicy) -> Self {
        Self::new(
            vec![
                Box::new(PdftoppmBackend),
                Box::new(ImageMagickBackend),
                Box::new(GhostscriptBackend),
            ],
            policy,
        )
    }

    pub async fn rasterize(&self, pdf_path: &Path) -> Result<RasterizedPages, Error> {
        let run_timeout = Duration::from_secs(self.policy.raster_timeout_secs);

        for backend in &self.backends {
            let dir = TempDir::new()?;
            match backend
                .rasterize(pdf_path, dir.path(), self.policy.raster_dpi, run_timeout)
                .await
            {
                Ok(pages) if !pages.is_empty() => {
                    let mut pages = pages;
                    pages.truncate(self.policy.max_pages_rasterized);
                    info!(
                        backend = backend.name(),
                        pages = pages.len(),
                        "PDF rasterized"
                    );
                    return Ok(RasterizedPages {
                        backend: backend.name(),
                        pages,
                        _dir: dir,
                    });
                }
                Ok(_) => {
                    debug!(backend = backend.name(), "backend produced no images");
                }
                Err(e) => {
                    warn!(backend = backend.name(), "raster backend failed: {}", e);
                }
            }
            // dir drops here, removing any partial output
        }

        Err(Error::CapabilityError {
            capability: "pdf-rasterizer".to_string(),
            message: "every rasterization backend failed".to_string(),
        })
    }
}

async fn run_backend_command(
    backend: &'static str,
    mut command: Command,
    run_timeout: Duration,
) -> Result<(), Error> {
    command.kill_on_drop(true);
    let output = timeout(run_timeout, command.output())
        .await
        .map_err(|_| Error::CapabilityTimeout {
            capability: backend.to_string(),
            timeout_secs: run_timeout.as_secs(),
        })?
        .map_err(|e| Error::CapabilityError {
            capability: backend.to_string(),
            message: format!("spawn failed: {}", e),
        })?;

    if !output.status.success() {
        return Err(Error::CapabilityError {
            capability: backend.to_string(),
            message: format!(
                "exited with {:?}: {}",
                output.status.code(),
                String::from_utf8_lossy(&output.stderr).trim()
            ),
        });
    }
    Ok(())
}

/// Existing, non-empty page images under `out_dir` with the given prefix,
/// sorted by page number.
fn collect_page_images(out_dir: &Path, prefix: &str) -> Vec<PathBuf> {
    let mut pages: Vec<(u32, PathBuf)> = Vec::new();
    let entries = match std::fs::read_dir(out_dir) {
        Ok(entries) => entries,
        Err(_) => return Vec::new(),
    };
    for entry in entries.flatten() {
        let path = entry.path();
        let name = match path.file_name().and_then(|n| n.to_str()) {
            Some(name) => name,
            None => continue,
        };
        if !name.starts_with(prefix) {
            continue;
        }
        let is_image = name.ends_with(".png") || name.ends_with(".jpg") || name.ends_with(".jpeg");
        if !is_image {
            continue;
        }
        let non_empty = entry.metadata().map(|m| m.len() > 0).unwrap_or(false);
        if !non_empty {
            continue;
        }
        pages.push((extract_page_number(name, prefix), path));
    }
    pages.sort_by_key(|(number, _)| *number);
    pages.into_iter().map(|(_, path)| path).collect()
}

fn extract_page_number(file_name: &str, prefix: &str) -> u32 {
    let rest = file_name.strip_prefix(prefix).unwrap_or(file_name);
    let digits: String = rest.chars().filter(|c| c.is_ascii_digit()).collect();
    digits.parse().unwrap_or(0)
}

/// poppler-utils: `pdftoppm -png -r <dpi> <pdf> <prefix>`
pub struct PdftoppmBackend;

#[async_trait]
impl RasterBackend for PdftoppmBackend {
    fn name(&self) -> &'static str {
        "pdftoppm"
    }

    async fn rasterize(
        &self,
        pdf_path: &Path,
        out_dir: &Path,
        dpi: u32,
        run_timeout: Duration,
    ) -> Result<Vec<PathBuf>, Error> {
        let mut command = Command::new("pdftoppm");
        command
            .arg("-png")
            .arg("-r")
            .arg(dpi.to_string())
            .arg(pdf_path)
            .arg(out_dir.join("page"));
        run_backend_command(self.name(), command, run_timeout).await?;
        Ok(collect_page_images(out_dir, "page"))
    }
}

/// ImageMagick: `magick -density <dpi> <pdf> page_%d.png`, falling back to
/// the legacy `convert` binary when `magick` is unavailable.
pub struct ImageMagickBackend;

#[async_trait]
impl RasterBackend for ImageMagickBackend {
    fn name(&self) -> &'static str {
        "imagemagick"
    }

    async fn rasterize(
        &self,
        pdf_path: &Path,
        out_dir: &Path,
        dpi: u32,
        run_timeout: Duration,
    ) -> Result<Vec<PathBuf>, Error> {
        let output_pattern = out_dir.join("page_%d.png");
        let mut last_error = None;

        for program in ["magick", "convert"] {
            let mut command = Command::new(program);
            command
                .arg("-density")
                .arg(dpi.to_string())
                .arg(pdf_path)
                .arg(&output_pattern);
            match run_backend_command(self.name(), command, run_timeout).await {
                Ok(()) => {
                    let pages = collect_page_images(out_dir, "page_");
                    if !pages.is_empty() {
                        return Ok(pages);
                    }
                }
                Err(e) => last_error = Some(e),
            }
        }

        Err(last_error.unwrap_or_else(|| Error::CapabilityError {
            capability: self.name().to_string(),
            message: "no output produced".to_string(),
        }))
    }
}

/// Ghostscript: `gs -dNOPAUSE -dBATCH -dQUIET -sDEVICE=png16m -r<dpi> ...`
pub struct GhostscriptBackend;

#[async_trait]
impl RasterBackend for GhostscriptBackend {
    fn name(&self) -> &'static str {
        "ghostscript"
    }

    async fn rasterize(
        &self,
        pdf_path: &Path,
        out_dir: &Path,
        dpi: u32,
        run_timeout: Duration,
    ) -> Result<Vec<PathBuf>, Error> {
        let output_pattern = out_dir.join("page_%d.png");
        let mut command = Command::new("gs");
        command
            .arg("-dNOPAUSE")
            .arg("-dBATCH")
            .arg("-dQUIET")
            .arg("-sDEVICE=png16m")
            .arg(format!("-r{}", dpi))
            .arg(format!("-sOutputFile={}", output_pattern.display()))
            .arg(pdf_path);
        run_backend_command(self.name(), command, run_timeout).await?;
        Ok(collect_page_images(out_dir, "page_"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    struct FakeBackend {
        name: &'static str,
        pages: usize,
        calls: Arc<AtomicUsize>,
        fail: bool,
    }

    #[async_trait]
    impl RasterBackend for FakeBackend {
        fn name(&self) -> &'static str {
            self.name
        }

        async fn rasterize(
            &self,
            _pdf_path: &Path,
            out_dir: &Path,
            _dpi: u32,
            _timeout: Duration,
        ) -> Result<Vec<PathBuf>, Error> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if self.fail {
                return Err(Error::CapabilityError {
                    capability: self.name.to_string(),
                    message: "not installed".to_string(),
                });
            }
            let mut pages = Vec::new();
            for i in 1..=self.pages {
                let path = out_dir.join(format!("page-{}.png", i));
                std::fs::write(&path, b"png")?;
                pages.push(path);
            }
            Ok(pages)
        }
    }

    #[tokio::test]
    async fn first_successful_backend_short_circuits() {
        let first_calls = Arc::new(AtomicUsize::new(0));
        let second_calls = Arc::new(AtomicUsize::new(0));
        let rasterizer = PdfPageRasterizer::new(
            vec![
                Box::new(FakeBackend {
                    name: "first",
                    pages: 2,
                    calls: first_calls.clone(),
                    fail: false,
                }),
                Box::new(FakeBackend {
                    name: "second",
                    pages: 2,
                    calls: second_calls.clone(),
                    fail: false,
                }),
            ],
            PdfPolicy::default(),
        );

        let result = rasterizer.rasterize(Path::new("/tmp/doc.pdf")).await.unwrap();
        assert_eq!(result.backend, "first");
        assert_eq!(result.pages.len(), 2);
        assert_eq!(first_calls.load(Ordering::SeqCst), 1);
        assert_eq!(second_calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn failing_backend_falls_through() {
        let rasterizer = PdfPageRasterizer::new(
            vec![
                Box::new(FakeBackend {
                    name: "broken",
                    pages: 0,
                    calls: Arc::new(AtomicUsize::new(0)),
                    fail: true,
                }),
                Box::new(FakeBackend {
                    name: "working",
                    pages: 1,
                    calls: Arc::new(AtomicUsize::new(0)),
                    fail: false,
                }),
            ],
            PdfPolicy::default(),
        );

        let result = rasterizer.rasterize(Path::new("/tmp/doc.pdf")).await.unwrap();
        assert_eq!(result.backend, "working");
    }

    #[tokio::test]
    async fn all_backends_failing_is_an_error_and_temp_files_are_gone() {
        let rasterizer = PdfPageRasterizer::new(
            vec![Box::new(FakeBackend {
                name: "broken",
                pages: 0,
                calls: Arc::new(AtomicUsize::new(0)),
                fail: true,
            })],
            PdfPolicy::default(),
        );
        assert!(rasterizer.rasterize(Path::new("/tmp/doc.pdf")).await.is_err());
    }

    #[tokio::test]
    async fn page_cap_bounds_the_result() {
        let policy = PdfPolicy {
            max_pages_rasterized: 3,
            ..PdfPolicy::default()
        };
        let rasterizer = PdfPageRasterizer::new(
            vec![Box::new(FakeBackend {
                name: "many",
                pages: 9,
                calls: Arc::new(AtomicUsize::new(0)),
                fail: false,
            })],
            policy,
        );
        let result = rasterizer.rasterize(Path::new("/tmp/doc.pdf")).await.unwrap();
        assert_eq!(result.pages.len(), 3);
    }

    #[test]
    fn page_numbers_sort_numerically() {
        let dir = TempDir::new().unwrap();
        for name in ["page-10.png", "page-2.png", "page-1.png"] {
            std::fs::write(dir.path().join(name), b"png").unwrap();
        }
        let pages = collect_page_images(dir.path(), "page");
        let names: Vec<_> = pages
            .iter()
            .map(|p| p.file_name().unwrap().to_str().unwrap().to_string())
            .collect();
        assert_eq!(names, vec!["page-1.png", "page-2.png", "page-10.png"]);
    }

    #[test]
    fn empty_files_are_not_valid_pages() {
        let dir = TempDir::new().unwrap();
        std::fs::write(dir.path().join("page-1.png"), b"").unwrap();
        std::fs::write(dir.path().join("page-2.png"), b"png").unwrap();
        let pages = collect_page_images(dir.path(), "page");
        assert_eq!(pages.len(), 1);
    }
}
