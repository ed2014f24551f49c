//! Emission sinks for generated files.

use crate::error::GenerateResult;
use std::path::{Path, PathBuf};

/// One finished artifact: where it goes and what it contains.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GeneratedFile {
    pub dir: PathBuf,
    pub file_name: String,
    pub contents: Vec<u8>,
}

impl GeneratedFile {
    pub fn new(dir: impl Into<PathBuf>, file_name: impl Into<String>, contents: Vec<u8>) -> Self {
        Self {
            dir: dir.into(),
            file_name: file_name.into(),
            contents,
        }
    }

    /// Full destination path, `dir/file_name`.
    pub fn path(&self) -> PathBuf {
        self.dir.join(&self.file_name)
    }
}

/// Receives finished files. Implementations decide where bytes end up.
pub trait EmissionSink {
    fn emit(&mut self, file: GeneratedFile) -> GenerateResult<()>;

    /// Emit the files of one contract together.
    ///
    /// The default emits in order and stops at the first failure. Sinks that
    /// can fail part way through override this to leave nothing behind.
    fn emit_all(&mut self, files: Vec<GeneratedFile>) -> GenerateResult<()> {
        files.into_iter().try_for_each(|file| self.emit(file))
    }
}

impl<S: EmissionSink + ?Sized> EmissionSink for &mut S {
    fn emit(&mut self, file: GeneratedFile) -> GenerateResult<()> {
        (**self).emit(file)
    }

    fn emit_all(&mut self, files: Vec<GeneratedFile>) -> GenerateResult<()> {
        (**self).emit_all(files)
    }
}

/// Keeps emitted files in memory, in emission order.
#[derive(Debug, Default)]
pub struct MemorySink {
    files: Vec<GeneratedFile>,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn files(&self) -> &[GeneratedFile] {
        &self.files
    }

    pub fn into_files(self) -> Vec<GeneratedFile> {
        self.files
    }

    /// Most recently emitted file at `path`.
    pub fn get(&self, path: impl AsRef<Path>) -> Option<&GeneratedFile> {
        let path = path.as_ref();
        self.files.iter().rev().find(|file| file.path() == path)
    }
}

impl EmissionSink for MemorySink {
    fn emit(&mut self, file: GeneratedFile) -> GenerateResult<()> {
        tracing::trace!(path = %file.path().display(), bytes = file.contents.len(), "captured file");
        self.files.push(file);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    #![allow(non_snake_case)]

    use super::*;

    #[test]
    fn GeneratedFile___path___joins_dir_and_name() {
        let file = GeneratedFile::new("out/server", "token.go", Vec::new());

        assert_eq!(file.path(), PathBuf::from("out/server").join("token.go"));
    }

    #[test]
    fn MemorySink___emit___keeps_order() {
        let mut sink = MemorySink::new();

        sink.emit(GeneratedFile::new("out", "b.go", b"b".to_vec())).unwrap();
        sink.emit(GeneratedFile::new("out", "a.go", b"a".to_vec())).unwrap();

        let names: Vec<&str> = sink.files().iter().map(|f| f.file_name.as_str()).collect();
        assert_eq!(names, ["b.go", "a.go"]);
    }

    #[test]
    fn MemorySink___get___returns_latest_emission() {
        let mut sink = MemorySink::new();
        sink.emit(GeneratedFile::new("out", "a.go", b"old".to_vec())).unwrap();
        sink.emit(GeneratedFile::new("out", "a.go", b"new".to_vec())).unwrap();

        let file = sink.get(Path::new("out").join("a.go")).unwrap();

        assert_eq!(file.contents, b"new");
        assert!(sink.get("missing.go").is_none());
    }

    #[test]
    fn EmissionSink___mut_reference___forwards() {
        fn emit_one<S: EmissionSink>(mut sink: S) {
            sink.emit(GeneratedFile::new(".", "x.proto", Vec::new())).unwrap();
        }
        let mut sink = MemorySink::new();

        emit_one(&mut sink);

        assert_eq!(sink.into_files().len(), 1);
    }

    #[test]
    fn EmissionSink___emit_all___emits_in_order() {
        let mut sink = MemorySink::new();

        sink.emit_all(vec![
            GeneratedFile::new(".", "token.go", Vec::new()),
            GeneratedFile::new(".", "token.proto", Vec::new()),
        ])
        .unwrap();

        let names: Vec<&str> = sink.files().iter().map(|f| f.file_name.as_str()).collect();
        assert_eq!(names, ["token.go", "token.proto"]);
    }
}
