use bytes::Bytes;
use std::io;
use std::path::Path;

#[derive(Debug, thiserror::Error)]
pub enum FileError {
    #[error("file not found")]
    NotFound,
    #[error("io error: {0}")]
    Io(io::Error),
}

impl From<io::Error> for FileError {
    fn from(err: io::Error) -> Self {
        match err.kind() {
            io::ErrorKind::NotFound => Self::NotFound,
            _ => Self::Io(err),
        }
    }
}

pub async fn read_file(path: &Path) -> Result<Bytes, FileError> {
    Ok(tokio::fs::read(path).await?.into())
}

pub async fn write_file(path: &Path, bytes: &[u8]) -> Result<(), FileError> {
    tokio::fs::write(path, bytes).await?;
    Ok(())
}

#[cfg(test)]
mod test {
    use super::*;

    #[tokio::test]
    async fn test_read_write() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("a.txt");

        assert!(matches!(read_file(&path).await, Err(FileError::NotFound)));

        write_file(&path, b"content").await.unwrap();
        assert_eq!(read_file(&path).await.unwrap(), &b"content"[..]);

        assert!(matches!(read_file(dir.path()).await, Err(FileError::Io(_))));
    }
}
