use std::io::{ErrorKind, Write};
use std::path::PathBuf;
use std::process::{Child, Command, Stdio};

use tracing::debug;

use crate::config::OcrConfig;
use crate::error::{KtpOcrError, Result};

use super::engine::OcrEngine;

const DEFAULT_BINARY: &str = "tesseract";

/// The `tesseract` executable, driven over stdin/stdout.
#[derive(Debug, Clone)]
pub struct TesseractCliEngine {
    binary: PathBuf,
    tessdata_path: Option<PathBuf>,
    page_seg_mode: u8,
}

impl TesseractCliEngine {
    /// Build the engine and check that every `+`-joined part of
    /// `config.language` is installed.
    pub fn new(config: &OcrConfig) -> Result<Self> {
        let engine = Self {
            binary: config
                .engine_path
                .clone()
                .unwrap_or_else(|| PathBuf::from(DEFAULT_BINARY)),
            tessdata_path: config.tessdata_path.clone(),
            page_seg_mode: config.page_seg_mode,
        };

        let installed = engine.list_languages()?;
        let missing: Vec<&str> = config
            .language
            .split('+')
            .map(str::trim)
            .filter(|lang| !lang.is_empty() && !installed.iter().any(|l| l == lang))
            .collect();
        if !missing.is_empty() {
            return Err(KtpOcrError::Engine(format!(
                "language data not installed for {} (available: {})",
                missing.join(", "),
                installed.join(", ")
            )));
        }

        Ok(engine)
    }

    fn command(&self) -> Command {
        let mut cmd = Command::new(&self.binary);
        if let Some(dir) = &self.tessdata_path {
            cmd.arg("--tessdata-dir").arg(dir);
        }
        cmd
    }

    /// Languages reported by `tesseract --list-langs`.
    pub fn list_languages(&self) -> Result<Vec<String>> {
        let output = self
            .command()
            .arg("--list-langs")
            .stdin(Stdio::null())
            .output()
            .map_err(|e| {
                KtpOcrError::Engine(format!(
                    "Failed to run {}: {e}",
                    self.binary.display()
                ))
            })?;

        if !output.status.success() {
            return Err(KtpOcrError::Engine(format!(
                "{} --list-langs exited with {}: {}",
                self.binary.display(),
                output.status,
                String::from_utf8_lossy(&output.stderr).trim()
            )));
        }

        Ok(String::from_utf8_lossy(&output.stdout)
            .lines()
            .skip_while(|line| line.starts_with("List of available languages"))
            .map(str::trim)
            .filter(|line| !line.is_empty())
            .map(String::from)
            .collect())
    }
}

impl OcrEngine for TesseractCliEngine {
    fn name(&self) -> &'static str {
        "tesseract-cli"
    }

    fn recognize(&self, image: &[u8], language: &str) -> Result<String> {
        let mut child = self
            .command()
            .args(["stdin", "stdout", "-l", language, "--psm"])
            .arg(self.page_seg_mode.to_string())
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|e| {
                KtpOcrError::Engine(format!(
                    "Failed to run {}: {e}",
                    self.binary.display()
                ))
            })?;

        if let Some(mut stdin) = child.stdin.take() {
            send_image(&mut child, &mut stdin, image)?;
        }

        let output = child.wait_with_output()?;
        if !output.status.success() {
            return Err(KtpOcrError::Engine(format!(
                "tesseract exited with {}: {}",
                output.status,
                String::from_utf8_lossy(&output.stderr).trim()
            )));
        }

        String::from_utf8(output.stdout)
            .map_err(|e| KtpOcrError::Engine(format!("tesseract produced invalid UTF-8: {e}")))
    }
}

/// Write the image to the child's stdin. An early exit closes the pipe and is
/// left for the exit status to explain; any other write failure kills and
/// reaps the child before returning.
fn send_image(child: &mut Child, stdin: &mut impl Write, image: &[u8]) -> Result<()> {
    match stdin.write_all(image) {
        Ok(()) => Ok(()),
        Err(e) if e.kind() == ErrorKind::BrokenPipe => {
            debug!("tesseract closed stdin before reading the whole image");
            Ok(())
        }
        Err(e) => {
            let _ = child.kill();
            let _ = child.wait();
            Err(KtpOcrError::Engine(format!(
                "Failed to send image to tesseract: {e}"
            )))
        }
    }
}
