//! Loading and saving the buffer content.

use std::io;
use std::path::{Path, PathBuf};

use thiserror::Error;
use tokio::io::AsyncWriteExt;

use crate::buffer::{BufferError, MessageBuffer, BUFFER_CAPACITY};

#[derive(Debug, Error)]
pub enum FileError {
    #[error("The filepath {} doesn't exist.", .0.display())]
    NotFound(PathBuf),

    #[error("The filepath {} already exists.", .0.display())]
    AlreadyExists(PathBuf),

    #[error("{} is {len} bytes, the buffer holds at most {capacity}.", .path.display())]
    TooLarge {
        path: PathBuf,
        len: u64,
        capacity: usize,
    },

    #[error("Cannot access {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

impl FileError {
    fn from_io(path: &Path, source: io::Error) -> Self {
        match source.kind() {
            io::ErrorKind::NotFound => FileError::NotFound(path.to_path_buf()),
            io::ErrorKind::AlreadyExists => FileError::AlreadyExists(path.to_path_buf()),
            _ => FileError::Io {
                path: path.to_path_buf(),
                source,
            },
        }
    }

    fn too_large(path: &Path, len: u64) -> Self {
        FileError::TooLarge {
            path: path.to_path_buf(),
            len,
            capacity: BUFFER_CAPACITY,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SaveMode {
    /// Replace the file if it exists.
    #[default]
    Overwrite,
    /// Fail with `AlreadyExists` if the file exists.
    CreateNew,
}

/// Read a whole file, refusing anything larger than the buffer.
pub async fn load_file(path: &Path) -> Result<Vec<u8>, FileError> {
    let metadata = tokio::fs::metadata(path)
        .await
        .map_err(|e| FileError::from_io(path, e))?;
    if metadata.len() > BUFFER_CAPACITY as u64 {
        return Err(FileError::too_large(path, metadata.len()));
    }

    let bytes = tokio::fs::read(path)
        .await
        .map_err(|e| FileError::from_io(path, e))?;
    // The file may have grown between the two calls.
    if bytes.len() > BUFFER_CAPACITY {
        return Err(FileError::too_large(path, bytes.len() as u64));
    }
    Ok(bytes)
}

/// Write `bytes` to `path`, returning the number of bytes written.
pub async fn save_file(path: &Path, bytes: &[u8], mode: SaveMode) -> Result<usize, FileError> {
    let mut options = tokio::fs::OpenOptions::new();
    options.write(true);
    match mode {
        SaveMode::Overwrite => options.create(true).truncate(true),
        SaveMode::CreateNew => options.create_new(true),
    };

    let mut file = options
        .open(path)
        .await
        .map_err(|e| FileError::from_io(path, e))?;
    file.write_all(bytes)
        .await
        .map_err(|e| FileError::from_io(path, e))?;
    file.flush().await.map_err(|e| FileError::from_io(path, e))?;
    Ok(bytes.len())
}

/// Replace the buffer content with the file at `path`. The mode is kept.
pub async fn load_into(buffer: &MessageBuffer, path: &Path) -> Result<usize, FileError> {
    let bytes = load_file(path).await?;
    buffer.set(&bytes).map_err(|err| match err {
        BufferError::CapacityExceeded { len, .. } => FileError::too_large(path, len as u64),
    })?;
    Ok(bytes.len())
}

/// Write the current buffer content to `path`.
pub async fn save_from(
    buffer: &MessageBuffer,
    path: &Path,
    mode: SaveMode,
) -> Result<usize, FileError> {
    let snapshot = buffer.snapshot();
    save_file(path, &snapshot.content, mode).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[tokio::test]
    async fn load_missing_file_is_not_found() {
        let dir = TempDir::new().expect("temp dir");
        let err = load_file(&dir.path().join("missing.txt")).await.unwrap_err();
        assert!(matches!(err, FileError::NotFound(_)));
    }

    #[tokio::test]
    async fn load_rejects_oversized_file() {
        let dir = TempDir::new().expect("temp dir");
        let path = dir.path().join("big.txt");
        std::fs::write(&path, vec![b'x'; BUFFER_CAPACITY + 1]).expect("write");

        let buffer = MessageBuffer::default();
        let err = load_into(&buffer, &path).await.unwrap_err();
        assert!(matches!(err, FileError::TooLarge { len, .. } if len == BUFFER_CAPACITY as u64 + 1));
        assert_eq!(buffer.snapshot().content, b"[placeholder]");
    }

    #[tokio::test]
    async fn save_then_load_keeps_bytes_and_mode() {
        let dir = TempDir::new().expect("temp dir");
        let path = dir.path().join("message.txt");

        let buffer = MessageBuffer::default();
        buffer.replace(b"line one\nline two\n", 1).expect("replace");
        let written = save_from(&buffer, &path, SaveMode::Overwrite).await.expect("save");
        assert_eq!(written, 18);

        let other = MessageBuffer::default();
        other.set_mode(1);
        let read = load_into(&other, &path).await.expect("load");
        assert_eq!(read, 18);
        assert_eq!(other.snapshot(), buffer.snapshot());
    }

    #[tokio::test]
    async fn create_new_refuses_existing_file() {
        let dir = TempDir::new().expect("temp dir");
        let path = dir.path().join("taken.txt");
        std::fs::write(&path, b"old").expect("write");

        let err = save_file(&path, b"new", SaveMode::CreateNew).await.unwrap_err();
        assert!(matches!(err, FileError::AlreadyExists(_)));
        assert_eq!(std::fs::read(&path).expect("read"), b"old");

        save_file(&path, b"new", SaveMode::Overwrite).await.expect("overwrite");
        assert_eq!(std::fs::read(&path).expect("read"), b"new");
    }
}
