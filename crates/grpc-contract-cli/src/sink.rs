//! Filesystem emission

use grpc_contract_core::{EmissionSink, GenerateError, GenerateResult, GeneratedFile};
use std::path::{Component, Path, PathBuf};

/// Writes each file under `root`, creating directories as needed.
#[derive(Debug)]
pub struct FsSink {
    root: PathBuf,
    written: Vec<PathBuf>,
}

impl FsSink {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            written: Vec::new(),
        }
    }

    /// `root` joined with `dir`, ignoring `.` components. `create_dir_all`
    /// fails on a missing path that ends in `.`.
    fn target_dir(&self, dir: &Path) -> PathBuf {
        dir.components()
            .filter(|component| *component != Component::CurDir)
            .fold(self.root.clone(), |acc, component| acc.join(component))
    }

    /// Paths written so far, in emission order.
    pub fn written(&self) -> &[PathBuf] {
        &self.written
    }

    fn stage(&self, file: &GeneratedFile) -> GenerateResult<Staged> {
        let dir = self.target_dir(&file.dir);
        std::fs::create_dir_all(&dir).map_err(|e| emit_error(&dir, e))?;

        let path = dir.join(&file.file_name);
        let temp = dir.join(format!(".{}.tmp", file.file_name));
        std::fs::write(&temp, &file.contents).map_err(|e| emit_error(&path, e))?;

        Ok(Staged {
            temp,
            path,
            bytes: file.contents.len(),
        })
    }
}

/// A file written next to its destination, waiting to be renamed into place.
#[derive(Debug)]
struct Staged {
    temp: PathBuf,
    path: PathBuf,
    bytes: usize,
}

fn emit_error(path: &Path, err: std::io::Error) -> GenerateError {
    GenerateError::Emit {
        path: path.display().to_string(),
        message: err.to_string(),
    }
}

fn discard(staged: &[Staged]) {
    for file in staged {
        let _ = std::fs::remove_file(&file.temp);
    }
}

impl EmissionSink for FsSink {
    fn emit(&mut self, file: GeneratedFile) -> GenerateResult<()> {
        self.emit_all(vec![file])
    }

    /// Stage every file first, then rename them into place. A failed write
    /// removes whatever was staged, so no destination is touched.
    fn emit_all(&mut self, files: Vec<GeneratedFile>) -> GenerateResult<()> {
        let mut staged = Vec::with_capacity(files.len());
        for file in &files {
            match self.stage(file) {
                Ok(entry) => staged.push(entry),
                Err(err) => {
                    discard(&staged);
                    return Err(err);
                }
            }
        }

        for (index, file) in staged.iter().enumerate() {
            if let Err(err) = std::fs::rename(&file.temp, &file.path) {
                discard(&staged[index..]);
                return Err(emit_error(&file.path, err));
            }
            tracing::info!(path = %file.path.display(), bytes = file.bytes, "wrote file");
            self.written.push(file.path.clone());
        }
        Ok(())
    }
}
