use parking_lot::Mutex;
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

/// Destination for exported text files. Writes are synchronous and may block, so the sensor's
/// auto-save calls them from tokio's blocking pool rather than the scan task.
pub trait FileSink: Send + Sync {
    /// Writes `payload` to `path`, replacing any existing content. Creating missing parent
    /// directories is the sink's job.
    fn write(&self, path: &Path, payload: &str) -> std::io::Result<()>;
}

/// Writes to the local filesystem
#[derive(Debug, Clone, Copy, Default)]
pub struct FsSink;

impl FileSink for FsSink {
    fn write(&self, path: &Path, payload: &str) -> std::io::Result<()> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }
        fs::write(path, payload)
    }
}

/// Keeps written files in memory, keyed by path
#[derive(Debug, Default)]
pub struct MemorySink {
    files: Mutex<BTreeMap<PathBuf, String>>,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, path: &Path) -> Option<String> {
        self.files.lock().get(path).cloned()
    }

    /// All written paths, in sorted order
    pub fn paths(&self) -> Vec<PathBuf> {
        self.files.lock().keys().cloned().collect()
    }

    pub fn len(&self) -> usize {
        self.files.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.files.lock().is_empty()
    }
}

impl FileSink for MemorySink {
    fn write(&self, path: &Path, payload: &str) -> std::io::Result<()> {
        self.files
            .lock()
            .insert(path.to_path_buf(), payload.to_string());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fs_sink_creates_parent_directories() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("deeper").join("out.txt");
        FsSink.write(&path, "hello\n").unwrap();
        assert_eq!(fs::read_to_string(&path).unwrap(), "hello\n");
    }

    #[test]
    fn memory_sink_overwrites() {
        let sink = MemorySink::new();
        let path = Path::new("a/b.ply");
        sink.write(path, "one").unwrap();
        sink.write(path, "two").unwrap();
        assert_eq!(sink.len(), 1);
        assert_eq!(sink.get(path).as_deref(), Some("two"));
    }
}
