// Local glob strategy: deterministic recursive directory walk

use std::collections::BTreeSet;
use std::path::Path;

use walkdir::WalkDir;

use super::pattern;

/// Expand include patterns under `search_root`, returning the sorted,
/// de-duplicated relative paths of matching regular files that survive the
/// exclude filters. Dot-prefixed file names are skipped unless
/// `include_dotfiles` is set.
pub fn glob_local(
    includes: &[String],
    excludes: &[String],
    include_dotfiles: bool,
    search_root: &Path,
) -> Vec<String> {
    let mut literal_excludes = BTreeSet::new();
    let mut wildcard_excludes = Vec::new();
    for exclude in excludes {
        if pattern::is_wildcarded(exclude) {
            wildcard_excludes.push(exclude.as_str());
        } else {
            literal_excludes.insert(exclude.as_str());
        }
    }

    let mut results = BTreeSet::new();
    for entry in WalkDir::new(search_root)
        .follow_links(true)
        .into_iter()
        .filter_map(Result::ok)
    {
        if !entry.file_type().is_file() {
            continue;
        }
        let name = entry.file_name().to_string_lossy();
        if !include_dotfiles && name.starts_with('.') {
            continue;
        }
        let Ok(relative) = entry.path().strip_prefix(search_root) else {
            continue;
        };
        let relative = relative.to_string_lossy().replace('\\', "/");
        if !includes.iter().any(|p| pattern::matches(&relative, p)) {
            continue;
        }
        if literal_excludes.contains(relative.as_str()) {
            continue;
        }
        if wildcard_excludes.iter().any(|p| pattern::matches(&relative, p)) {
            continue;
        }
        results.insert(relative);
    }
    results.into_iter().collect()
}
