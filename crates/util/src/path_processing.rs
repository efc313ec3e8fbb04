use std::path::{Path, PathBuf};

use dirs_next::home_dir;

/// Expands a leading `~` to the current user's home directory.
///
/// Both `~/` and the Windows-style `~\` prefixes are recognised. Inputs are
/// trimmed first; anything else is returned unchanged as a `PathBuf`.
pub fn expand_tilde(path: &str) -> PathBuf {
    let trimmed = path.trim();
    if trimmed == "~" {
        return home_or_literal();
    }
    if let Some(rest) = trimmed.strip_prefix("~/").or_else(|| trimmed.strip_prefix("~\\")) {
        return home_or_literal().join(rest);
    }
    PathBuf::from(trimmed)
}

/// Resolves `relative` against `base_directory` unless it is already absolute.
pub fn resolve_relative(base_directory: &Path, relative: &str) -> PathBuf {
    let candidate = expand_tilde(relative);
    if candidate.is_absolute() {
        candidate
    } else {
        base_directory.join(candidate)
    }
}

fn home_or_literal() -> PathBuf {
    home_dir().unwrap_or_else(|| PathBuf::from("~"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn plain_paths_are_trimmed_and_kept() {
        assert_eq!(expand_tilde("  /srv/mappings "), PathBuf::from("/srv/mappings"));
        assert_eq!(expand_tilde("relative/dir"), PathBuf::from("relative/dir"));
    }

    #[test]
    fn tilde_prefix_is_expanded() {
        let Some(home) = home_dir() else {
            return;
        };
        assert_eq!(expand_tilde("~"), home);
        assert_eq!(expand_tilde("~/mappings/jet"), home.join("mappings/jet"));
    }

    #[test]
    fn relative_files_resolve_against_base() {
        let base = Path::new("/srv/mappings/jet/3.39.0");
        assert_eq!(
            resolve_relative(base, "magnetics/mappings.json"),
            PathBuf::from("/srv/mappings/jet/3.39.0/magnetics/mappings.json")
        );
        assert_eq!(resolve_relative(base, "/abs/globals.json"), PathBuf::from("/abs/globals.json"));
    }
}
