use crate::Result;
use std::fs;
use std::path::PathBuf;
use std::sync::Mutex;

#[derive(Debug, Default)]
struct ChunkBuffer {
    data: String,
    next_index: usize,
    written: Vec<PathBuf>,
}

/// Streams artifacts into size-bounded `combined_<n>.<ext>` files
///
/// A chunk never exceeds the byte ceiling unless a single artifact is
/// larger than the ceiling, in which case that artifact gets a chunk of its
/// own. Appends and flushes are serialized by one mutex.
#[derive(Debug)]
pub struct ChunkWriter {
    directory: PathBuf,
    extension: String,
    ceiling: usize,
    buffer: Mutex<ChunkBuffer>,
}

impl ChunkWriter {
    pub const PREFIX: &'static str = "combined_";

    pub fn new(directory: impl Into<PathBuf>, extension: &str, ceiling: usize) -> Self {
        Self {
            directory: directory.into(),
            extension: extension.trim_start_matches('.').to_string(),
            ceiling,
            buffer: Mutex::new(ChunkBuffer::default()),
        }
    }

    /// Appends one artifact, flushing the current chunk first if it would
    /// overflow
    pub fn append(&self, artifact: &str) -> Result<()> {
        let mut buffer = self.lock();

        if !buffer.data.is_empty() && buffer.data.len() + artifact.len() > self.ceiling {
            self.flush_locked(&mut buffer)?;
        }

        buffer.data.push_str(artifact);

        if buffer.data.len() >= self.ceiling {
            self.flush_locked(&mut buffer)?;
        }
        Ok(())
    }

    /// Flushes the remainder and returns every chunk written
    pub fn finish(&self) -> Result<Vec<PathBuf>> {
        let mut buffer = self.lock();
        if !buffer.data.is_empty() {
            self.flush_locked(&mut buffer)?;
        }
        Ok(buffer.written.clone())
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, ChunkBuffer> {
        self.buffer.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn flush_locked(&self, buffer: &mut ChunkBuffer) -> Result<()> {
        let path = self.directory.join(format!(
            "{}{}.{}",
            Self::PREFIX,
            buffer.next_index,
            self.extension
        ));
        fs::write(&path, buffer.data.as_bytes())?;
        tracing::debug!("Flushed {} bytes to {}", buffer.data.len(), path.display());

        buffer.data.clear();
        buffer.next_index += 1;
        buffer.written.push(path);
        Ok(())
    }
}

/// Formats a page's text as one text chunk unit
pub fn text_artifact(url: &str, text: &str) -> String {
    format!("URL: {}\n\n{}\n\n{}\n", url, text, "-".repeat(80))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::Path;

    fn read(path: &Path) -> String {
        fs::read_to_string(path).unwrap()
    }

    #[test]
    fn test_text_artifact_format() {
        let unit = text_artifact("https://site.test/a", "Hello world");
        assert!(unit.starts_with("URL: https://site.test/a\n\nHello world\n\n"));
        assert!(unit.ends_with(&format!("{}\n", "-".repeat(80))));
    }

    #[test]
    fn test_small_artifacts_share_chunk() {
        let dir = tempfile::tempdir().unwrap();
        let writer = ChunkWriter::new(dir.path(), "txt", 100);

        writer.append("first\n").unwrap();
        writer.append("second\n").unwrap();
        let chunks = writer.finish().unwrap();

        assert_eq!(chunks.len(), 1);
        assert_eq!(chunks[0], dir.path().join("combined_0.txt"));
        assert_eq!(read(&chunks[0]), "first\nsecond\n");
    }

    #[test]
    fn test_overflow_starts_new_chunk() {
        let dir = tempfile::tempdir().unwrap();
        let writer = ChunkWriter::new(dir.path(), "txt", 10);

        writer.append("aaaaaa").unwrap();
        writer.append("bbbbbb").unwrap();
        let chunks = writer.finish().unwrap();

        assert_eq!(chunks.len(), 2);
        assert_eq!(read(&chunks[0]), "aaaaaa");
        assert_eq!(read(&chunks[1]), "bbbbbb");
    }

    #[test]
    fn test_chunks_respect_ceiling() {
        let dir = tempfile::tempdir().unwrap();
        let writer = ChunkWriter::new(dir.path(), "txt", 64);

        for i in 0..50 {
            writer.append(&format!("unit {:02} ........\n", i)).unwrap();
        }
        let chunks = writer.finish().unwrap();

        assert!(chunks.len() > 1);
        let mut combined = String::new();
        for chunk in &chunks {
            let content = read(chunk);
            assert!(content.len() <= 64, "chunk {} too large", chunk.display());
            combined.push_str(&content);
        }
        assert_eq!(combined.lines().count(), 50);
    }

    #[test]
    fn test_oversized_artifact_gets_own_chunk() {
        let dir = tempfile::tempdir().unwrap();
        let writer = ChunkWriter::new(dir.path(), "csv", 8);

        writer.append("ab").unwrap();
        writer.append("0123456789abcdef").unwrap();
        writer.append("cd").unwrap();
        let chunks = writer.finish().unwrap();

        assert_eq!(chunks.len(), 3);
        assert_eq!(read(&chunks[0]), "ab");
        assert_eq!(read(&chunks[1]), "0123456789abcdef");
        assert_eq!(read(&chunks[2]), "cd");
        assert_eq!(chunks[2], dir.path().join("combined_2.csv"));
    }

    #[test]
    fn test_finish_without_data_writes_nothing() {
        let dir = tempfile::tempdir().unwrap();
        let writer = ChunkWriter::new(dir.path(), ".txt", 1024);
        assert!(writer.finish().unwrap().is_empty());
        assert_eq!(fs::read_dir(dir.path()).unwrap().count(), 0);
    }
}
