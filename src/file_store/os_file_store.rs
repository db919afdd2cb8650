use std::fs;
use std::path::Path;

use snafu::{ResultExt, ensure};
use tracing::debug;

use crate::file_store::file_store::{
    AlreadyExistsSnafu, DirectoryAttributes, DirectoryEntry, DirectoryListingOptions, EntryKind,
    FileStore, FileStoreError, IoSnafu,
};

/// [`FileStore`] backed by the host file system through `std::fs`.
///
/// Listings are sorted by name so callers see a reproducible order, and
/// move/copy refuse an existing destination explicitly instead of relying on
/// the platform's silent-overwrite rename semantics.
#[derive(Debug, Clone, Copy, Default)]
pub struct OsFileStore;

impl FileStore for OsFileStore {
    fn exists(&self, path: &Path) -> bool {
        path.exists()
    }

    fn is_directory(&self, path: &Path) -> bool {
        path.is_dir()
    }

    fn list_directory(
        &self,
        path: &Path,
        options: &DirectoryListingOptions,
    ) -> Result<Vec<DirectoryEntry>, FileStoreError> {
        let mut entries = Vec::new();

        for entry in fs::read_dir(path).context(IoSnafu { path })? {
            let entry = entry.context(IoSnafu { path })?;
            let name = entry.file_name();
            if !options.would_list(&name) {
                continue;
            }

            let file_type = entry.file_type().context(IoSnafu { path })?;
            let kind = if file_type.is_dir() {
                EntryKind::Directory
            } else if file_type.is_file() {
                EntryKind::File
            } else {
                EntryKind::Other
            };

            entries.push(DirectoryEntry { name, kind });
        }

        entries.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(entries)
    }

    fn move_item(&self, source: &Path, destination: &Path) -> Result<(), FileStoreError> {
        ensure!(
            !destination.exists(),
            AlreadyExistsSnafu { path: destination }
        );

        debug!("Moving {:?} to {:?}", source, destination);
        fs::rename(source, destination).context(IoSnafu { path: destination })
    }

    fn copy_item(&self, source: &Path, destination: &Path) -> Result<(), FileStoreError> {
        ensure!(
            !destination.exists(),
            AlreadyExistsSnafu { path: destination }
        );

        debug!("Copying {:?} to {:?}", source, destination);
        if source.is_dir() {
            copy_directory(source, destination).context(IoSnafu { path: destination })
        } else {
            fs::copy(source, destination)
                .map(|_| ())
                .context(IoSnafu { path: destination })
        }
    }

    fn remove_item(&self, path: &Path) -> Result<(), FileStoreError> {
        debug!("Removing {:?}", path);
        if path.is_dir() {
            fs::remove_dir_all(path).context(IoSnafu { path })
        } else {
            fs::remove_file(path).context(IoSnafu { path })
        }
    }

    fn create_directory(
        &self,
        path: &Path,
        recursive: bool,
        attributes: &DirectoryAttributes,
    ) -> Result<(), FileStoreError> {
        let mut builder = fs::DirBuilder::new();
        builder.recursive(recursive);

        #[cfg(unix)]
        if let Some(mode) = attributes.unix_mode {
            use std::os::unix::fs::DirBuilderExt;
            builder.mode(mode);
        }
        #[cfg(not(unix))]
        let _ = attributes;

        debug!("Creating directory {:?} (recursive: {})", path, recursive);
        builder.create(path).context(IoSnafu { path })
    }
}

fn copy_directory(source: &Path, destination: &Path) -> std::io::Result<()> {
    fs::create_dir(destination)?;

    for entry in fs::read_dir(source)? {
        let entry = entry?;
        let target = destination.join(entry.file_name());
        if entry.file_type()?.is_dir() {
            copy_directory(&entry.path(), &target)?;
        } else {
            fs::copy(entry.path(), target)?;
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::ffi::OsString;
    use tempfile::TempDir;

    fn touch(path: &Path) {
        fs::write(path, b"content").expect("Failed to write file");
    }

    #[test]
    fn test_listing_is_sorted_by_name() {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        for name in ["zeta.txt", "alpha.txt", "mid"] {
            touch(&temp_dir.path().join(name));
        }

        let entries = OsFileStore
            .list_directory(temp_dir.path(), &DirectoryListingOptions::default())
            .expect("Listing should succeed");

        let names: Vec<OsString> = entries.iter().map(|e| e.name.clone()).collect();
        assert_eq!(names, vec!["alpha.txt", "mid", "zeta.txt"]);
    }

    #[test]
    fn test_listing_can_exclude_hidden_entries() {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        touch(&temp_dir.path().join(".hidden"));
        touch(&temp_dir.path().join("visible"));

        let options = DirectoryListingOptions {
            include_hidden: false,
        };
        let entries = OsFileStore
            .list_directory(temp_dir.path(), &options)
            .expect("Listing should succeed");

        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].name, "visible");
    }

    #[test]
    fn test_listing_reports_entry_kinds() {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        touch(&temp_dir.path().join("file"));
        fs::create_dir(temp_dir.path().join("dir")).expect("Failed to create dir");

        let entries = OsFileStore
            .list_directory(temp_dir.path(), &DirectoryListingOptions::default())
            .expect("Listing should succeed");

        assert_eq!(entries[0].kind, EntryKind::Directory);
        assert_eq!(entries[1].kind, EntryKind::File);
    }

    #[test]
    fn test_listing_unreadable_directory_fails() {
        let result = OsFileStore.list_directory(
            Path::new("/this/path/does/not/exist"),
            &DirectoryListingOptions::default(),
        );

        assert!(matches!(result, Err(FileStoreError::IoError { .. })));
    }

    #[test]
    fn test_move_refuses_existing_destination() {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        let source = temp_dir.path().join("a");
        let destination = temp_dir.path().join("b");
        touch(&source);
        touch(&destination);

        let result = OsFileStore.move_item(&source, &destination);

        assert!(matches!(
            result,
            Err(FileStoreError::AlreadyExistsError { .. })
        ));
        assert!(source.exists());
    }

    #[test]
    fn test_move_relocates_the_entry() {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        let source = temp_dir.path().join("a");
        let destination = temp_dir.path().join("b");
        touch(&source);

        OsFileStore
            .move_item(&source, &destination)
            .expect("Move should succeed");

        assert!(!source.exists());
        assert!(destination.exists());
    }

    #[test]
    fn test_copy_directory_is_recursive() {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        let source = temp_dir.path().join("src");
        fs::create_dir_all(source.join("nested")).expect("Failed to create source tree");
        touch(&source.join("nested/file.txt"));
        let destination = temp_dir.path().join("dst");

        OsFileStore
            .copy_item(&source, &destination)
            .expect("Copy should succeed");

        assert!(destination.join("nested/file.txt").exists());
        assert!(source.join("nested/file.txt").exists());
    }

    #[test]
    fn test_remove_handles_files_and_directories() {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        let file = temp_dir.path().join("file");
        let dir = temp_dir.path().join("dir");
        touch(&file);
        fs::create_dir(&dir).expect("Failed to create dir");
        touch(&dir.join("inner"));

        OsFileStore.remove_item(&file).expect("Remove should succeed");
        OsFileStore.remove_item(&dir).expect("Remove should succeed");

        assert!(!file.exists());
        assert!(!dir.exists());
    }

    #[test]
    fn test_create_directory_without_recursion_needs_intermediates() {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        let nested = temp_dir.path().join("a/b");

        let result =
            OsFileStore.create_directory(&nested, false, &DirectoryAttributes::default());
        assert!(matches!(result, Err(FileStoreError::IoError { .. })));

        OsFileStore
            .create_directory(&nested, true, &DirectoryAttributes::default())
            .expect("Recursive creation should succeed");
        assert!(nested.is_dir());
    }

    #[cfg(unix)]
    #[test]
    fn test_create_directory_applies_unix_mode() {
        use std::os::unix::fs::PermissionsExt;

        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        let path = temp_dir.path().join("locked");
        let attributes = DirectoryAttributes {
            unix_mode: Some(0o700),
        };

        OsFileStore
            .create_directory(&path, false, &attributes)
            .expect("Creation should succeed");

        let mode = fs::metadata(&path)
            .expect("Failed to stat created directory")
            .permissions()
            .mode();
        assert_eq!(mode & 0o777, 0o700);
    }
}
