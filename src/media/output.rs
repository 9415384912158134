use super::error::MediaError;
use crate::utils::strip_separators;
use std::path::{Path, PathBuf};
use tracing::debug;

/// How the final file name is chosen.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FileName {
    /// User-supplied name that already carries an extension.
    Verbatim(String),
    /// User-supplied stem; the backend appends the real extension.
    Stem(String),
    /// Backend names the file after the media title and extension.
    Title,
}

/// Resolved destination for one download, always inside the storage root.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutputTarget {
    root: PathBuf,
    subfolder: Option<String>,
    file_name: FileName,
}

impl OutputTarget {
    /// Sanitizes the hints and plans the target without touching the filesystem.
    pub fn plan(
        root: &Path,
        subfolder: Option<&str>,
        filename: Option<&str>,
    ) -> Result<Self, MediaError> {
        let subfolder = sanitize_component(subfolder)?;

        let file_name = match sanitize_component(filename)? {
            Some(name) if name.contains('.') => FileName::Verbatim(name),
            Some(name) => FileName::Stem(name),
            None => FileName::Title,
        };

        Ok(Self {
            root: root.to_path_buf(),
            subfolder,
            file_name,
        })
    }

    /// Plans the target and makes sure its directory exists.
    pub async fn resolve(
        root: &Path,
        subfolder: Option<&str>,
        filename: Option<&str>,
    ) -> Result<Self, MediaError> {
        let target = Self::plan(root, subfolder, filename)?;
        let dir = target.directory();

        // create_dir_all already succeeds when the directory exists, including
        // when a concurrent request created it first.
        tokio::fs::create_dir_all(&dir).await?;
        debug!("Output directory ready: {}", dir.display());

        Ok(target)
    }

    pub fn file_name(&self) -> &FileName {
        &self.file_name
    }

    /// Directory the file will be written into.
    pub fn directory(&self) -> PathBuf {
        match &self.subfolder {
            Some(sub) => self.root.join(sub),
            None => self.root.clone(),
        }
    }

    /// Key shared by every download that may write the same file. The final
    /// extension is only known to the backend, so names are keyed by stem, and
    /// title-driven names by directory alone.
    pub fn lock_key(&self) -> String {
        let dir = self.directory();
        match &self.file_name {
            FileName::Verbatim(name) => {
                let stem = name.rsplit_once('.').map_or(name.as_str(), |(stem, _)| stem);
                format!("{}/{}.*", dir.display(), stem)
            }
            FileName::Stem(stem) => format!("{}/{}.*", dir.display(), stem),
            FileName::Title => format!("{}/*", dir.display()),
        }
    }
}

/// Strips separators, maps empty results to `None` and refuses names that
/// would refer to the directory itself or its parent.
fn sanitize_component(value: Option<&str>) -> Result<Option<String>, MediaError> {
    let Some(value) = value else {
        return Ok(None);
    };

    let clean = strip_separators(value);
    match clean.as_str() {
        "" => Ok(None),
        "." | ".." => Err(MediaError::InvalidPath(format!(
            "{value:?} does not name a file or folder"
        ))),
        _ => Ok(Some(clean)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::Component;

    fn assert_confined(root: &Path, target: &OutputTarget) {
        let dir = target.directory();
        assert!(dir.starts_with(root), "{} escapes {}", dir.display(), root.display());
        assert!(
            !dir.components().any(|c| matches!(c, Component::ParentDir | Component::CurDir)),
            "{} has relative components",
            dir.display()
        );
        if let Some(sub) = &target.subfolder {
            assert!(!sub.contains('/') && !sub.contains('\\'));
        }
        match target.file_name() {
            FileName::Verbatim(name) | FileName::Stem(name) => {
                assert!(!name.contains('/') && !name.contains('\\'));
                assert!(name != "." && name != "..");
            }
            FileName::Title => {}
        }
    }

    #[test]
    fn test_traversal_is_neutralized() {
        let root = Path::new("/srv/videos");
        let target = OutputTarget::plan(root, Some("../../etc"), Some("../../passwd")).unwrap();

        assert_eq!(target.subfolder.as_deref(), Some("....etc"));
        assert_eq!(target.file_name(), &FileName::Stem("....passwd".to_string()));
        assert_eq!(target.directory(), PathBuf::from("/srv/videos/....etc"));
        assert_confined(root, &target);
    }

    #[test]
    fn test_arbitrary_inputs_stay_under_root() {
        let root = Path::new("/srv/videos");
        let inputs = [
            None,
            Some(""),
            Some("/"),
            Some("\\"),
            Some("//\\\\//"),
            Some("..."),
            Some("/../"),
            Some("\\..\\..\\"),
            Some("..//..//..//x"),
            Some("music"),
            Some("clip.mp4"),
            Some("/etc/passwd"),
            Some("C:\\Windows\\system32"),
        ];

        for subfolder in inputs {
            for filename in inputs {
                match OutputTarget::plan(root, subfolder, filename) {
                    Ok(target) => assert_confined(root, &target),
                    Err(MediaError::InvalidPath(_)) => {}
                    Err(other) => panic!("unexpected error: {other}"),
                }
            }
        }
    }

    #[test]
    fn test_dot_names_are_rejected() {
        let root = Path::new("/srv/videos");
        for bad in ["..", ".", "/..", "\\.\\", "/./"] {
            assert!(matches!(
                OutputTarget::plan(root, Some(bad), None),
                Err(MediaError::InvalidPath(_))
            ));
            assert!(matches!(
                OutputTarget::plan(root, None, Some(bad)),
                Err(MediaError::InvalidPath(_))
            ));
        }
    }

    #[test]
    fn test_file_name_selection() {
        let root = Path::new("/srv/videos");

        let target = OutputTarget::plan(root, None, Some("my_video.mp4")).unwrap();
        assert_eq!(target.file_name(), &FileName::Verbatim("my_video.mp4".to_string()));

        let target = OutputTarget::plan(root, None, Some("my_video")).unwrap();
        assert_eq!(target.file_name(), &FileName::Stem("my_video".to_string()));

        let target = OutputTarget::plan(root, None, None).unwrap();
        assert_eq!(target.file_name(), &FileName::Title);

        // separators only: treated as if no name was given
        let target = OutputTarget::plan(root, Some("//"), Some("\\\\")).unwrap();
        assert_eq!(target.file_name(), &FileName::Title);
        assert_eq!(target.subfolder, None);
        assert_eq!(target.directory(), root);
    }

    #[test]
    fn test_lock_key() {
        let root = Path::new("/srv/videos");
        let key = |subfolder: Option<&str>, filename: Option<&str>| {
            OutputTarget::plan(root, subfolder, filename)
                .unwrap()
                .lock_key()
        };

        assert_eq!(
            key(Some("music"), Some("song.mp3")),
            key(Some("mus/ic"), Some("so/ng.mp3"))
        );

        // "clip" becomes clip.<ext>, which may well be clip.mp4
        assert_eq!(key(None, Some("clip")), key(None, Some("clip.mp4")));
        assert_eq!(key(None, Some("clip.webm")), key(None, Some("clip.mp4")));
        assert_ne!(key(None, Some("clip")), key(None, Some("other")));
        assert_ne!(key(Some("a"), Some("clip")), key(Some("b"), Some("clip")));

        // two sources with the same title land on the same file
        assert_eq!(key(None, None), key(None, None));
        assert_ne!(key(Some("a"), None), key(Some("b"), None));
    }

    #[tokio::test]
    async fn test_resolve_creates_directory_idempotently() {
        let dir = tempfile::tempdir().unwrap();

        let first = OutputTarget::resolve(dir.path(), Some("music"), None)
            .await
            .unwrap();
        assert!(first.directory().is_dir());

        let second = OutputTarget::resolve(dir.path(), Some("music"), Some("x"))
            .await
            .unwrap();
        assert_eq!(first.directory(), second.directory());
    }

    #[tokio::test]
    async fn test_concurrent_resolve_same_subfolder() {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path().to_path_buf();

        let tasks: Vec<_> = (0..8)
            .map(|_| {
                let root = root.clone();
                tokio::spawn(async move { OutputTarget::resolve(&root, Some("shared"), None).await })
            })
            .collect();

        for task in tasks {
            assert!(task.await.unwrap().is_ok());
        }
        assert!(root.join("shared").is_dir());
    }
}
