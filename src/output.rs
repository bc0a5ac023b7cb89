//! Output files: the destination is only ever replaced by complete content
use std::{
    io::{BufWriter, Write},
    path::{Path, PathBuf},
};

use log::debug;
use tempfile::NamedTempFile;

use crate::prelude::Error;

/// [OutputFile] owns an output file being produced.
/// Content is staged in a sibling temporary file, which only replaces
/// the destination once [OutputFile::commit] succeeds. Whatever the exit path,
/// dropping an uncommitted [OutputFile] leaves the destination untouched.
pub(crate) struct OutputFile {
    path: PathBuf,
    writer: BufWriter<NamedTempFile>,
}

impl OutputFile {
    /// Prepares this file. Its destination is not modified until [OutputFile::commit].
    pub fn create<P: AsRef<Path>>(path: P) -> Result<Self, Error> {
        let path = path.as_ref().to_path_buf();
        let parent = match path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
            _ => PathBuf::from("."),
        };
        let staged = NamedTempFile::new_in(&parent).map_err(|source| Error::WriteFailure {
            path: path.clone(),
            source,
        })?;
        debug!("{}: staged in {}", path.display(), staged.path().display());
        Ok(Self {
            path,
            writer: BufWriter::new(staged),
        })
    }

    pub fn writer(&mut self) -> &mut BufWriter<NamedTempFile> {
        &mut self.writer
    }

    /// Attaches this file to an I/O error raised while producing it
    pub fn failure(&self, e: Error) -> Error {
        match e {
            Error::Io(source) => Error::WriteFailure {
                path: self.path.clone(),
                source,
            },
            e => e,
        }
    }

    /// Flushes and syncs the staged content, which then replaces the destination.
    pub fn commit(self) -> Result<(), Error> {
        let Self { path, writer } = self;
        let failure = |source| Error::WriteFailure {
            path: path.clone(),
            source,
        };

        let staged = writer.into_inner().map_err(|e| failure(e.into_error()))?;
        staged.as_file().sync_all().map_err(failure)?;
        staged.persist(&path).map_err(|e| failure(e.error))?;

        debug!("{}: written", path.display());
        Ok(())
    }
}

#[cfg(test)]
mod test {
    use super::*;
    fn staged_files(dir: &Path) -> usize {
        std::fs::read_dir(dir).unwrap().count()
    }
    #[test]
    fn rollback_on_drop() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("partial.txt");
        {
            let mut output = OutputFile::create(&path).unwrap();
            writeln!(output.writer(), "partial content").unwrap();
            output.writer().flush().unwrap();
            assert!(!path.exists(), "partial content is visible");
        }
        assert!(!path.exists());
        assert_eq!(staged_files(dir.path()), 0, "staged file left behind");
    }
    #[test]
    fn rollback_preserves_destination() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("previous.txt");
        std::fs::write(&path, "previous content\n").unwrap();
        {
            let mut output = OutputFile::create(&path).unwrap();
            writeln!(output.writer(), "new content").unwrap();
            output.writer().flush().unwrap();
            assert_eq!(
                std::fs::read_to_string(&path).unwrap(),
                "previous content\n"
            );
        }
        assert_eq!(
            std::fs::read_to_string(&path).unwrap(),
            "previous content\n"
        );
        assert_eq!(staged_files(dir.path()), 1);
    }
    #[test]
    fn commit_keeps_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("complete.txt");
        std::fs::write(&path, "previous content\n").unwrap();
        let mut output = OutputFile::create(&path).unwrap();
        writeln!(output.writer(), "complete content").unwrap();
        output.commit().unwrap();
        let content = std::fs::read_to_string(&path).unwrap();
        assert_eq!(content, "complete content\n");
        assert_eq!(staged_files(dir.path()), 1);
    }
    #[test]
    fn creation_failure() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("missing").join("file.txt");
        match OutputFile::create(&path) {
            Err(Error::WriteFailure { path: failed, .. }) => assert_eq!(failed, path),
            Err(e) => panic!("unexpected error {}", e),
            Ok(_) => panic!("should have failed"),
        }
    }
}
