//! Output destinations.
//!
//! A [`Sink`] opens named destinations relative to its root. Bytes written
//! to a [`Destination`] become visible only on [`Destination::commit`];
//! dropping an uncommitted destination discards them.

use std::cell::RefCell;
use std::collections::BTreeMap;
use std::io::{self, Write};
use std::path::{Component, Path, PathBuf};
use tempfile::NamedTempFile;

/// A write destination that must be committed to take effect.
pub trait Destination: Write {
    fn commit(self: Box<Self>) -> io::Result<()>;
}

/// Capability to open destinations by relative path.
pub trait Sink {
    fn create(&self, relative: &Path) -> io::Result<Box<dyn Destination + '_>>;
}

fn check_relative(relative: &Path) -> io::Result<()> {
    let plain = relative
        .components()
        .any(|c| matches!(c, Component::Normal(_)))
        && relative
            .components()
            .all(|c| matches!(c, Component::Normal(_) | Component::CurDir));
    if plain {
        Ok(())
    } else {
        Err(io::Error::new(
            io::ErrorKind::InvalidInput,
            format!("not a plain relative path: {}", relative.display()),
        ))
    }
}

/// Writes files under a root directory.
///
/// Each destination is a temporary file in the target's directory, renamed
/// over the target on commit.
#[derive(Debug, Clone)]
pub struct DirSink {
    root: PathBuf,
}

impl DirSink {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }
}

impl Sink for DirSink {
    fn create(&self, relative: &Path) -> io::Result<Box<dyn Destination + '_>> {
        check_relative(relative)?;
        let target = self.root.join(relative);
        let dir = target.parent().unwrap_or(self.root.as_path());
        std::fs::create_dir_all(dir)?;
        let file = NamedTempFile::new_in(dir)?;
        Ok(Box::new(DirDestination { file, target }))
    }
}

struct DirDestination {
    file: NamedTempFile,
    target: PathBuf,
}

impl Write for DirDestination {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.file.write(buf)
    }

    fn flush(&mut self) -> io::Result<()> {
        self.file.flush()
    }
}

impl Destination for DirDestination {
    fn commit(mut self: Box<Self>) -> io::Result<()> {
        self.file.flush()?;
        let DirDestination { file, target } = *self;
        file.persist(&target).map(|_| ()).map_err(|e| e.error)
    }
}

/// Keeps committed files in memory.
#[derive(Debug, Default)]
pub struct MemorySink {
    files: RefCell<BTreeMap<PathBuf, Vec<u8>>>,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Committed content of `path`, if any.
    pub fn get(&self, path: impl AsRef<Path>) -> Option<String> {
        self.files
            .borrow()
            .get(path.as_ref())
            .map(|bytes| String::from_utf8_lossy(bytes).into_owned())
    }

    /// Committed paths in order.
    pub fn paths(&self) -> Vec<PathBuf> {
        self.files.borrow().keys().cloned().collect()
    }

    pub fn len(&self) -> usize {
        self.files.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.files.borrow().is_empty()
    }
}

impl Sink for MemorySink {
    fn create(&self, relative: &Path) -> io::Result<Box<dyn Destination + '_>> {
        check_relative(relative)?;
        Ok(Box::new(MemoryDestination {
            sink: self,
            path: relative.to_path_buf(),
            buf: Vec::new(),
        }))
    }
}

struct MemoryDestination<'a> {
    sink: &'a MemorySink,
    path: PathBuf,
    buf: Vec<u8>,
}

impl Write for MemoryDestination<'_> {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.buf.extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

impl Destination for MemoryDestination<'_> {
    fn commit(self: Box<Self>) -> io::Result<()> {
        self.sink.files.borrow_mut().insert(self.path, self.buf);
        Ok(())
    }
}
