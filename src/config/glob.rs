//! Glob resolution for namespace files.

use std::path::{Component, Path, PathBuf};

use globset::{GlobBuilder, GlobMatcher};
use walkdir::WalkDir;

use super::ConfigError;

const GLOB_META: &[char] = &['*', '?', '[', ']', '{', '}'];

/// Returns every file matching `pattern`, which must already be absolute.
///
/// Files are ordered by name within each directory. A pattern whose
/// literal prefix does not exist matches nothing. Entries whose name starts
/// with `.` are only matched by a pattern component that starts with `.`.
pub fn resolve_glob(pattern: &Path) -> Result<Vec<PathBuf>, ConfigError> {
    let pattern_str = pattern.to_string_lossy();
    let (base, rest) = split_literal_prefix(pattern);

    if rest.is_empty() {
        return Ok(if base.is_file() { vec![base] } else { Vec::new() });
    }
    if !base.is_dir() {
        return Ok(Vec::new());
    }

    let matcher = compile(&pattern_str)?;
    let recursive = rest.iter().any(|c| c.contains("**"));
    let mut walker = WalkDir::new(&base).min_depth(1).sort_by_file_name();
    if !recursive {
        walker = walker.max_depth(rest.len());
    }

    let mut matches = Vec::new();
    let entries = walker
        .into_iter()
        .filter_entry(|entry| {
            !is_hidden(entry) || allows_hidden(&rest, recursive, entry.depth())
        });
    for entry in entries {
        let entry = entry?;
        if entry.file_type().is_file() && matcher.is_match(entry.path()) {
            matches.push(entry.into_path());
        }
    }
    Ok(matches)
}

pub async fn resolve_glob_async(pattern: PathBuf) -> Result<Vec<PathBuf>, ConfigError> {
    tokio::task::spawn_blocking(move || resolve_glob(&pattern)).await?
}

fn is_hidden(entry: &walkdir::DirEntry) -> bool {
    entry.file_name().to_string_lossy().starts_with('.')
}

/// Whether the pattern component matching walk depth `depth` names a dotfile.
fn allows_hidden(rest: &[String], recursive: bool, depth: usize) -> bool {
    // `**` breaks the depth-to-component mapping
    if recursive {
        return rest.iter().any(|c| c.starts_with('.'));
    }
    depth
        .checked_sub(1)
        .and_then(|i| rest.get(i))
        .is_some_and(|c| c.starts_with('.'))
}

fn compile(pattern: &str) -> Result<GlobMatcher, ConfigError> {
    GlobBuilder::new(pattern)
        .literal_separator(true)
        .build()
        .map(|glob| glob.compile_matcher())
        .map_err(|source| ConfigError::InvalidGlob {
            pattern: pattern.to_string(),
            source,
        })
}

/// Splits a pattern into the directory that holds no glob syntax and the
/// remaining components.
fn split_literal_prefix(pattern: &Path) -> (PathBuf, Vec<String>) {
    let mut base = PathBuf::new();
    let mut rest = Vec::new();

    for component in pattern.components() {
        let text = component.as_os_str().to_string_lossy();
        let is_literal = matches!(component, Component::RootDir | Component::Prefix(_))
            || !text.contains(GLOB_META);
        if rest.is_empty() && is_literal {
            base.push(component);
        } else {
            rest.push(text.into_owned());
        }
    }
    (base, rest)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn touch(dir: &Path, rel: &str) {
        let path = dir.join(rel);
        std::fs::create_dir_all(path.parent().unwrap()).unwrap();
        std::fs::write(path, "{}").unwrap();
    }

    fn names(dir: &Path, paths: Vec<PathBuf>) -> Vec<String> {
        paths
            .into_iter()
            .map(|p| p.strip_prefix(dir).unwrap().to_string_lossy().replace('\\', "/"))
            .collect()
    }

    #[test]
    fn test_split_literal_prefix() {
        let (base, rest) = split_literal_prefix(Path::new("/srv/app/config/*.json"));
        assert_eq!(base, PathBuf::from("/srv/app/config"));
        assert_eq!(rest, vec!["*.json".to_string()]);

        let (base, rest) = split_literal_prefix(Path::new("/srv/**/config/app.json"));
        assert_eq!(base, PathBuf::from("/srv"));
        assert_eq!(rest.len(), 3);
    }

    #[test]
    fn test_star_does_not_cross_directories() {
        let dir = TempDir::new().unwrap();
        touch(dir.path(), "app.json");
        touch(dir.path(), "database.yaml");
        touch(dir.path(), "nested/deep.json");

        let found = resolve_glob(&dir.path().join("*.json")).unwrap();
        assert_eq!(names(dir.path(), found), vec!["app.json"]);
    }

    #[test]
    fn test_recursive_and_alternation() {
        let dir = TempDir::new().unwrap();
        touch(dir.path(), "app.json");
        touch(dir.path(), "database.yaml");
        touch(dir.path(), "nested/deep.toml");
        touch(dir.path(), "nested/skip.txt");

        let found = resolve_glob(&dir.path().join("**/*.{json,yaml,toml}")).unwrap();
        assert_eq!(
            names(dir.path(), found),
            vec!["app.json", "database.yaml", "nested/deep.toml"]
        );
    }

    #[test]
    fn test_star_skips_dotfiles() {
        let dir = TempDir::new().unwrap();
        touch(dir.path(), "app.json");
        touch(dir.path(), ".gitkeep");
        touch(dir.path(), ".hidden/inner.json");
        touch(dir.path(), "nested/.env.json");

        let found = resolve_glob(&dir.path().join("*")).unwrap();
        assert_eq!(names(dir.path(), found), vec!["app.json"]);

        let found = resolve_glob(&dir.path().join("**/*.json")).unwrap();
        assert_eq!(names(dir.path(), found), vec!["app.json"]);
    }

    #[test]
    fn test_dot_component_matches_dotfiles() {
        let dir = TempDir::new().unwrap();
        touch(dir.path(), "app.json");
        touch(dir.path(), ".local.json");

        let found = resolve_glob(&dir.path().join(".*.json")).unwrap();
        assert_eq!(names(dir.path(), found), vec![".local.json"]);
    }

    #[test]
    fn test_recursive_inside_braces() {
        let dir = TempDir::new().unwrap();
        touch(dir.path(), "a/b/c/deep.json");
        touch(dir.path(), "a/b/c/other.json");

        let found = resolve_glob(&dir.path().join("{**/deep.json,none}")).unwrap();
        assert_eq!(names(dir.path(), found), vec!["a/b/c/deep.json"]);
    }

    #[test]
    fn test_literal_path() {
        let dir = TempDir::new().unwrap();
        touch(dir.path(), "demo.json");

        assert_eq!(resolve_glob(&dir.path().join("demo.json")).unwrap().len(), 1);
        assert!(resolve_glob(&dir.path().join("demo2.json")).unwrap().is_empty());
    }

    #[test]
    fn test_missing_base_is_empty() {
        let dir = TempDir::new().unwrap();
        let found = resolve_glob(&dir.path().join("missing/*.json")).unwrap();
        assert!(found.is_empty());
    }

    #[test]
    fn test_invalid_pattern() {
        let dir = TempDir::new().unwrap();
        let result = resolve_glob(&dir.path().join("{a,b.json"));
        assert!(matches!(result, Err(ConfigError::InvalidGlob { .. })));
    }

    #[tokio::test]
    async fn test_async_matches_sync() {
        let dir = TempDir::new().unwrap();
        touch(dir.path(), "a.stub.json");
        touch(dir.path(), "b.stub.json");

        let pattern = dir.path().join("*.stub.json");
        let sync = resolve_glob(&pattern).unwrap();
        let async_found = resolve_glob_async(pattern).await.unwrap();
        assert_eq!(sync, async_found);
        assert_eq!(sync.len(), 2);
    }
}
