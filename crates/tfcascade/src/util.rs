use std::io::Write;
use std::path::Path;

/// Read a fragment, `None` when there is nothing at `path`
///
/// Only "not found" counts as absent. A directory or an unreadable file is an error.
/// Contents are returned as they are on disk, no encoding is assumed.
pub(crate) fn read_fragment(path: &Path) -> std::io::Result<Option<Vec<u8>>> {
    match std::fs::read(path) {
        Ok(contents) => Ok(Some(contents)),
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(None),
        Err(err) => Err(err),
    }
}

/// Content staged next to its destination, visible only after [StagedFile::commit]
///
/// Dropping an uncommitted file removes it.
pub(crate) struct StagedFile<'p> {
    destination: &'p Path,
    file: tempfile::NamedTempFile,
}

impl<'p> StagedFile<'p> {
    /// Create a temporary file in the same directory as `destination`
    pub fn create(destination: &'p Path) -> std::io::Result<Self> {
        let dir = match destination.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent,
            _ => Path::new("."),
        };

        let file_name = destination
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_default();

        let file = tempfile::Builder::new()
            .prefix(&format!(".{file_name}."))
            .suffix(".tmp")
            .tempfile_in(dir)?;

        tracing::trace!(path=%file.path().display(), "staging file");
        Ok(Self { destination, file })
    }

    pub fn write_all(&mut self, buf: &[u8]) -> std::io::Result<()> {
        self.file.write_all(buf)
    }

    /// Atomically replace the destination
    pub fn commit(mut self) -> std::io::Result<()> {
        self.file.flush()?;
        self.file.as_file().sync_all()?;
        self.file
            .persist(self.destination)
            .map_err(|err| err.error)?;
        Ok(())
    }
}
