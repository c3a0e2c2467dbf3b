//! Request-scoped media payloads.

use crate::Result;
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;

pub const FALLBACK_MEDIA_TYPE: &str = "application/octet-stream";

/// Media type for an uploaded file, inferred from its extension.
///
/// Anything that is not recognizably `audio/*` falls back to
/// `application/octet-stream`.
pub fn infer_audio_mime(file_name: &str) -> String {
    match mime_guess::from_path(file_name).first() {
        Some(mime) if mime.type_() == mime_guess::mime::AUDIO => mime.essence_str().to_string(),
        guessed => {
            tracing::warn!(
                "Could not reliably determine audio MIME type for '{}' (guessed {:?}), using {}",
                file_name,
                guessed.map(|m| m.essence_str().to_string()),
                FALLBACK_MEDIA_TYPE
            );
            FALLBACK_MEDIA_TYPE.to_string()
        }
    }
}

/// Uploaded bytes staged in a temporary local file for one request.
///
/// The file is removed when the payload is dropped, whichever way the request
/// ends.
#[derive(Debug)]
pub struct Payload {
    file: NamedTempFile,
    file_name: String,
    media_type: String,
    len: usize,
}

impl Payload {
    pub async fn stage_locally(
        bytes: &[u8],
        file_name: &str,
        media_type: String,
        dir: Option<&Path>,
    ) -> Result<Self> {
        let suffix = Path::new(file_name)
            .extension()
            .and_then(|ext| ext.to_str())
            .map(|ext| format!(".{}", ext))
            .unwrap_or_default();

        let mut builder = tempfile::Builder::new();
        builder.prefix("relay-upload-").suffix(&suffix);
        let file = match dir {
            Some(dir) => builder.tempfile_in(dir)?,
            None => builder.tempfile()?,
        };

        tokio::fs::write(file.path(), bytes).await?;
        tracing::debug!(
            "Staged '{}' ({} bytes) at {}",
            file_name,
            bytes.len(),
            file.path().display()
        );

        Ok(Self {
            file,
            file_name: base_name(file_name),
            media_type,
            len: bytes.len(),
        })
    }

    pub fn path(&self) -> &Path {
        self.file.path()
    }

    /// Client-supplied file name with any directory components removed.
    pub fn file_name(&self) -> &str {
        &self.file_name
    }

    pub fn media_type(&self) -> &str {
        &self.media_type
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub async fn read(&self) -> Result<Vec<u8>> {
        Ok(tokio::fs::read(self.path()).await?)
    }

    /// Removes the staged file now, reporting any failure.
    pub fn close(self) -> Result<PathBuf> {
        let path = self.file.path().to_path_buf();
        self.file.close()?;
        Ok(path)
    }
}

fn base_name(file_name: &str) -> String {
    file_name
        .rsplit(['/', '\\'])
        .next()
        .filter(|name| !name.is_empty())
        .unwrap_or("upload")
        .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_infers_common_audio_types() {
        assert!(infer_audio_mime("meeting.wav").starts_with("audio/"));
        assert_eq!(infer_audio_mime("voice.mp3"), "audio/mpeg");
        assert_eq!(infer_audio_mime("notes.ogg"), "audio/ogg");
    }

    #[test]
    fn test_non_audio_falls_back_to_octet_stream() {
        assert_eq!(infer_audio_mime("photo.png"), FALLBACK_MEDIA_TYPE);
    }

    #[test]
    fn test_unknown_extension_falls_back_to_octet_stream() {
        assert_eq!(infer_audio_mime("recording.zzz"), FALLBACK_MEDIA_TYPE);
        assert_eq!(infer_audio_mime("recording"), FALLBACK_MEDIA_TYPE);
    }

    #[test]
    fn test_base_name_strips_directories() {
        assert_eq!(base_name("../../etc/passwd"), "passwd");
        assert_eq!(base_name("C:\\audio\\clip.wav"), "clip.wav");
        assert_eq!(base_name("dir/"), "upload");
    }

    #[tokio::test]
    async fn test_payload_file_removed_on_drop() {
        let dir = tempfile::tempdir().unwrap();
        let payload = Payload::stage_locally(
            b"RIFF0000WAVE",
            "clip.wav",
            "audio/wav".to_string(),
            Some(dir.path()),
        )
        .await
        .unwrap();

        let path = payload.path().to_path_buf();
        assert!(path.exists());
        assert!(path.to_string_lossy().ends_with(".wav"));
        assert_eq!(payload.read().await.unwrap(), b"RIFF0000WAVE");
        assert_eq!(payload.len(), 12);

        drop(payload);
        assert!(!path.exists());
    }

    #[tokio::test]
    async fn test_payload_close_removes_file() {
        let dir = tempfile::tempdir().unwrap();
        let payload = Payload::stage_locally(
            b"abc",
            "a.mp3",
            "audio/mpeg".to_string(),
            Some(dir.path()),
        )
        .await
        .unwrap();

        let path = payload.close().unwrap();
        assert!(!path.exists());
    }
}
