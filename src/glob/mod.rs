// Dual-strategy glob engine: remote file-index fast path with a
// deterministic local fallback

pub mod local;
pub mod pattern;

use std::path::Path;

use indexmap::IndexMap;
use itertools::Itertools;
use tracing::warn;

use crate::index::{build_query_params, IndexError, IndexState, QueryKey};
use crate::runtime::error::{RuntimeError, RuntimeResult};

/// Arguments of one glob operation, as supplied by build-file code.
pub struct GlobRequest<'a> {
    pub includes: &'a [String],
    pub excludes: &'a [String],
    pub include_dotfiles: bool,
}

/// Run one glob operation for a file context: remote query when a
/// connection is live, local walk otherwise. A failed remote query tears
/// the connection down for the remainder of the process and falls back to
/// the local strategy.
pub fn resolve(
    request: &GlobRequest,
    base_path: &str,
    search_root: &Path,
    allow_empty: bool,
    index: &mut IndexState,
) -> RuntimeResult<Vec<String>> {
    if request.includes.is_empty() {
        return Ok(Vec::new());
    }

    let mut results = None;
    if index.client.is_some() {
        match glob_index(request, base_path, index) {
            Ok(files) => results = Some(files),
            Err(e) => {
                warn!("file index error, falling back to local glob: {e}");
                if let Some(mut client) = index.client.take() {
                    client.close();
                }
            }
        }
    }
    let results = match results {
        Some(files) => files,
        None => local::glob_local(
            request.includes,
            request.excludes,
            request.include_dotfiles,
            search_root,
        ),
    };

    if results.is_empty() && !allow_empty {
        return Err(RuntimeError::EmptyGlob {
            includes: request.includes.to_vec(),
            excludes: request.excludes.to_vec(),
            include_dotfiles: request.include_dotfiles,
        });
    }
    Ok(results)
}

fn glob_index(
    request: &GlobRequest,
    base_path: &str,
    index: &mut IndexState,
) -> Result<Vec<String>, IndexError> {
    let relative_root = match index.project_prefix.as_deref() {
        Some(prefix) if !prefix.is_empty() => {
            if base_path.is_empty() {
                prefix.to_string()
            } else {
                format!("{}/{}", prefix, base_path)
            }
        }
        _ => base_path.to_string(),
    };

    let key = QueryKey {
        includes: request.includes.to_vec(),
        excludes: request.excludes.to_vec(),
        include_dotfiles: request.include_dotfiles,
        relative_root: relative_root.clone(),
    };
    if let Some(cached) = index.query_cache.get(&key) {
        return Ok(cached.clone());
    }

    let mut params = build_query_params(
        request.includes,
        request.excludes,
        request.include_dotfiles,
        &relative_root,
    );
    // Sync cookies cost real latency at query volume; only the very first
    // query of the process leaves them enabled.
    if !index.sync_cookies.take() {
        params.sync_timeout = Some(0);
    }

    let watch_root = index.watch_root.clone().unwrap_or_default();
    let client = match index.client.as_mut() {
        Some(client) => client,
        None => return Err(IndexError::Protocol("no active connection".to_string())),
    };
    let response = client.query(&watch_root, &params)?;
    if let Some(warning) = &response.warning {
        warn!("file index warning: {warning}");
    }
    let files: Vec<String> = response.files.unwrap_or_default().into_iter().sorted().collect();
    index.query_cache.insert(key, files.clone());
    Ok(files)
}

/// Glob each `(subdirectory, pattern)` pair and re-key the matches relative
/// to their subdirectory. It is an error for one key to name two different
/// source files across pairs.
pub fn subdir_glob(
    spec: &[(String, String)],
    excludes: &[String],
    prefix: Option<&str>,
    base_path: &str,
    search_root: &Path,
    allow_empty: bool,
    index: &mut IndexState,
) -> RuntimeResult<IndexMap<String, String>> {
    let mut merged: IndexMap<String, String> = IndexMap::new();
    for (subdirectory, glob_pattern) in spec {
        let include = if subdirectory.is_empty() {
            glob_pattern.clone()
        } else {
            format!("{}/{}", subdirectory, glob_pattern)
        };
        let includes = [include];
        let files = resolve(
            &GlobRequest { includes: &includes, excludes, include_dotfiles: false },
            base_path,
            search_root,
            allow_empty,
            index,
        )?;
        for file in files {
            let key = if subdirectory.is_empty() {
                file.clone()
            } else {
                file[subdirectory.len() + 1..].to_string()
            };
            let key = match prefix {
                Some(prefix) => Path::new(prefix).join(&key).to_string_lossy().into_owned(),
                None => key,
            };
            match merged.get(&key) {
                Some(existing) if existing != &file => {
                    return Err(RuntimeError::ConflictingGlobKeys {
                        key,
                        first: existing.clone(),
                        second: file,
                    });
                }
                Some(_) => {}
                None => {
                    merged.insert(key, file);
                }
            }
        }
    }
    Ok(merged)
}
