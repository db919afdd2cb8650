use std::path::{Component, Path, PathBuf};

/// Renders a path for human consumption even when it no longer exists.
///
/// Canonicalization gives the nicest output but fails for paths that have
/// been moved or removed, which is exactly when error messages need them.
/// The fallback absolutizes against the current directory and resolves
/// `.`/`..` components lexically.
pub trait BestEffortPathExt {
    fn best_effort_path_display(&self) -> String;
}

impl<T: AsRef<Path>> BestEffortPathExt for T {
    fn best_effort_path_display(&self) -> String {
        let path = self.as_ref();

        if let Ok(canonical) = path.canonicalize() {
            return canonical.display().to_string();
        }

        let absolute = if path.is_absolute() {
            path.to_path_buf()
        } else {
            std::env::current_dir()
                .map(|current| current.join(path))
                .unwrap_or_else(|_| path.to_path_buf())
        };

        normalize(&absolute).display().to_string()
    }
}

fn normalize(path: &Path) -> PathBuf {
    let mut parts: Vec<Component> = Vec::new();

    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                if !matches!(parts.last(), None | Some(Component::RootDir)) {
                    parts.pop();
                }
            }
            other => parts.push(other),
        }
    }

    parts.iter().collect()
}
