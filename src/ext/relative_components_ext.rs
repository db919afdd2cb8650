use std::ffi::OsString;
use std::path::{Component, Path};

/// Splits a path into the component names that lead to it from a root.
pub trait RelativeComponentsExt {
    /// Returns the ordered component names of `self` relative to `root`,
    /// or `None` when `self` does not lie under `root`.
    ///
    /// The root itself maps to an empty component list. `.` components are
    /// skipped; a `..` component makes the relation non-literal, so it is
    /// treated as "not under the root" rather than resolved.
    fn components_relative_to(&self, root: &Path) -> Option<Vec<OsString>>;
}

impl RelativeComponentsExt for Path {
    fn components_relative_to(&self, root: &Path) -> Option<Vec<OsString>> {
        let relative = self.strip_prefix(root).ok()?;

        let mut names = Vec::new();
        for component in relative.components() {
            match component {
                Component::Normal(name) => names.push(name.to_os_string()),
                Component::CurDir => {}
                Component::ParentDir | Component::RootDir | Component::Prefix(_) => return None,
            }
        }

        Some(names)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::*;

    #[rstest]
    #[case("/root/a/b.txt", Some(vec!["a", "b.txt"]))]
    #[case("/root/a", Some(vec!["a"]))]
    #[case("/root", Some(vec![]))]
    #[case("/root/./a", Some(vec!["a"]))]
    #[case("/other/a", None)]
    #[case("/", None)]
    fn test_components_relative_to_root(
        #[case] path: &str,
        #[case] expected: Option<Vec<&str>>,
    ) {
        let components = Path::new(path).components_relative_to(Path::new("/root"));

        let expected = expected
            .map(|names| names.into_iter().map(OsString::from).collect::<Vec<_>>());
        assert_eq!(components, expected);
    }

    #[test]
    fn test_parent_components_are_rejected() {
        let components = Path::new("/root/a/../b").components_relative_to(Path::new("/root"));

        assert_eq!(components, None);
    }
}
