use std::fs::{self, File};
use std::io::{BufWriter, Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};

use sha2::{Digest, Sha256};

use crate::models::error::SessionError;
use crate::processing::wav_format;

/// Streaming 16-bit PCM WAV writer.
///
/// ## File Format
/// ```text
/// [44-byte WAV header, sizes patched on close]
/// [raw 16-bit little-endian PCM data...]
/// ```
pub struct WavFileWriter {
    file_path: PathBuf,
    file: Option<BufWriter<File>>,
    sample_rate: u32,
    channels: u16,
    data_bytes: u64,
}

impl WavFileWriter {
    pub fn new(file_path: PathBuf, sample_rate: u32, channels: u16) -> Self {
        Self {
            file_path,
            file: None,
            sample_rate,
            channels,
            data_bytes: 0,
        }
    }

    pub fn path(&self) -> &Path {
        &self.file_path
    }

    pub fn is_open(&self) -> bool {
        self.file.is_some()
    }

    /// Bytes of sample data written so far.
    pub fn data_bytes(&self) -> u64 {
        self.data_bytes
    }

    /// Create the file (and its directory) and write a placeholder header.
    pub fn open(&mut self) -> Result<(), SessionError> {
        if self.is_open() {
            return Ok(());
        }

        if let Some(parent) = self.file_path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)
                    .map_err(|e| SessionError::StorageUnavailable(format!("failed to create directory: {}", e)))?;
            }
        }

        let file = File::create(&self.file_path)
            .map_err(|e| SessionError::StorageUnavailable(format!("failed to create file: {}", e)))?;
        let mut file = BufWriter::new(file);

        let header = wav_format::generate_wav_header(self.sample_rate, 16, self.channels, 0);
        file.write_all(&header)
            .map_err(|e| SessionError::StorageUnavailable(format!("failed to write header: {}", e)))?;

        self.file = Some(file);
        self.data_bytes = 0;
        Ok(())
    }

    /// Append PCM bytes.
    pub fn write(&mut self, pcm: &[u8]) -> Result<(), SessionError> {
        let file = self
            .file
            .as_mut()
            .ok_or_else(|| SessionError::StorageUnavailable("file not open".into()))?;
        file.write_all(pcm)
            .map_err(|e| SessionError::StorageUnavailable(format!("write failed: {}", e)))?;
        self.data_bytes += pcm.len() as u64;
        Ok(())
    }

    /// Patch the header sizes, flush, and return the SHA-256 of the file.
    pub fn close(&mut self) -> Result<String, SessionError> {
        let mut writer = self
            .file
            .take()
            .ok_or_else(|| SessionError::StorageUnavailable("file not open".into()))?;

        let mut header = wav_format::generate_wav_header(self.sample_rate, 16, self.channels, 0);
        wav_format::patch_sizes(&mut header, self.data_bytes);

        writer
            .seek(SeekFrom::Start(0))
            .and_then(|_| writer.write_all(&header))
            .and_then(|_| writer.flush())
            .map_err(|e| SessionError::StorageUnavailable(format!("failed to finalize header: {}", e)))?;
        drop(writer);

        checksum_file(&self.file_path)
    }
}

/// Hex-encoded SHA-256 of the file at `path`.
pub fn checksum_file(path: &Path) -> Result<String, SessionError> {
    let data = fs::read(path)
        .map_err(|e| SessionError::StorageUnavailable(format!("failed to read for checksum: {}", e)))?;
    let digest = Sha256::digest(&data);
    Ok(digest.iter().map(|b| format!("{:02x}", b)).collect())
}
