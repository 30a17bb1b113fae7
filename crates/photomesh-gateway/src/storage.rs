use photomesh_core::{PhotomeshError, PhotomeshResult, SessionId};
use std::path::{Component, Path, PathBuf};
use tracing::debug;

/// Directory under the static root holding uploaded images.
pub const IMAGES_DIR: &str = "images";
/// Directory under the static root holding generated models.
pub const MODELS_DIR: &str = "models";

/// Longest accepted upload file name, after sanitization.
const MAX_FILE_NAME_LEN: usize = 255;

/// Uploaded and generated artifacts on disk, addressed by references
/// relative to the static root (e.g. `images/s1_a.jpg`).
pub struct ArtifactStorage {
    root: PathBuf,
}

impl ArtifactStorage {
    /// Create the static root and its `images/` and `models/` directories.
    pub async fn new(root: impl Into<PathBuf>) -> PhotomeshResult<Self> {
        let root = root.into();
        tokio::fs::create_dir_all(root.join(IMAGES_DIR)).await?;
        tokio::fs::create_dir_all(root.join(MODELS_DIR)).await?;
        Ok(Self { root })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Write an uploaded image and return its reference.
    ///
    /// Files are named `<session_id>_<file name>`; a re-upload with the same
    /// name replaces the bytes.
    pub async fn save_image(
        &self,
        session_id: &SessionId,
        file_name: &str,
        bytes: &[u8],
    ) -> PhotomeshResult<String> {
        let name = sanitize_file_name(file_name)?;
        let reference = format!("{IMAGES_DIR}/{session_id}_{name}");
        let path = self.root.join(&reference);

        tokio::fs::write(&path, bytes).await?;
        debug!(path = %path.display(), size = bytes.len(), "Image stored");
        Ok(reference)
    }

    /// Map a reference to a path inside the static root, refusing anything
    /// that could step outside it.
    pub fn resolve(&self, reference: &str) -> Option<PathBuf> {
        if reference.is_empty() || reference.contains('\\') {
            return None;
        }
        let relative = Path::new(reference);
        if !relative
            .components()
            .all(|c| matches!(c, Component::Normal(_)))
        {
            return None;
        }
        Some(self.root.join(relative))
    }

    /// Read a stored artifact. `None` if the reference is unsafe or missing.
    pub async fn read(&self, reference: &str) -> PhotomeshResult<Option<Vec<u8>>> {
        let Some(path) = self.resolve(reference) else {
            return Ok(None);
        };
        match tokio::fs::metadata(&path).await {
            Ok(meta) if meta.is_file() => Ok(Some(tokio::fs::read(&path).await?)),
            Ok(_) => Ok(None),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }
}

/// Keep the final path component of a client-supplied name and replace
/// anything outside `[A-Za-z0-9._-]` with `_`.
pub fn sanitize_file_name(raw: &str) -> PhotomeshResult<String> {
    let last = raw.rsplit(['/', '\\']).next().unwrap_or_default();

    let cleaned: String = last
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || matches!(c, '.' | '_' | '-') {
                c
            } else {
                '_'
            }
        })
        .take(MAX_FILE_NAME_LEN)
        .collect();

    if cleaned.is_empty() || cleaned.chars().all(|c| c == '.') {
        return Err(PhotomeshError::InvalidRequest(format!(
            "invalid file name '{raw}'"
        )));
    }
    Ok(cleaned)
}

/// Content type for a stored artifact, by extension.
pub fn content_type_for(reference: &str) -> &'static str {
    let ext = Path::new(reference)
        .extension()
        .and_then(|e| e.to_str())
        .map(str::to_ascii_lowercase);
    match ext.as_deref() {
        Some("jpg" | "jpeg") => "image/jpeg",
        Some("png") => "image/png",
        Some("webp") => "image/webp",
        Some("glb") => "model/gltf-binary",
        Some("gltf") => "model/gltf+json",
        Some("obj") => "model/obj",
        _ => "application/octet-stream",
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn file_names_are_flattened() {
        assert_eq!(sanitize_file_name("cam_1.jpg").unwrap(), "cam_1.jpg");
        assert_eq!(sanitize_file_name("../../etc/passwd").unwrap(), "passwd");
        assert_eq!(sanitize_file_name("C:\\shots\\front.JPG").unwrap(), "front.JPG");
        assert_eq!(sanitize_file_name("my photo (1).jpg").unwrap(), "my_photo__1_.jpg");
    }

    #[test]
    fn degenerate_file_names_are_rejected() {
        for bad in ["", "..", ".", "dir/", "a/.."] {
            assert!(sanitize_file_name(bad).is_err(), "{bad:?}");
        }
    }

    #[test]
    fn resolve_stays_inside_root() {
        let storage = ArtifactStorage {
            root: PathBuf::from("/srv/static"),
        };
        assert_eq!(
            storage.resolve("models/result_initial.glb"),
            Some(PathBuf::from("/srv/static/models/result_initial.glb"))
        );
        assert!(storage.resolve("../secret").is_none());
        assert!(storage.resolve("images/../../secret").is_none());
        assert!(storage.resolve("/etc/passwd").is_none());
        assert!(storage.resolve("images\\..\\x").is_none());
        assert!(storage.resolve("./images/a.jpg").is_none());
        assert!(storage.resolve("").is_none());
    }

    #[test]
    fn content_types() {
        assert_eq!(content_type_for("images/a.JPG"), "image/jpeg");
        assert_eq!(content_type_for("models/m.glb"), "model/gltf-binary");
        assert_eq!(content_type_for("notes"), "application/octet-stream");
    }

    #[tokio::test]
    async fn save_and_read_image() {
        let tmp = tempfile::tempdir().unwrap();
        let storage = ArtifactStorage::new(tmp.path()).await.unwrap();
        let sid = SessionId::parse("s1").unwrap();

        let reference = storage.save_image(&sid, "a.jpg", b"jpeg bytes").await.unwrap();
        assert_eq!(reference, "images/s1_a.jpg");
        assert_eq!(storage.read(&reference).await.unwrap().unwrap(), b"jpeg bytes");
        assert!(storage.read("images/missing.jpg").await.unwrap().is_none());
        assert!(storage.read("images").await.unwrap().is_none());
    }
}
