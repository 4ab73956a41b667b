use crate::config::CollectConfig;
use crate::error::{AppError, Result};
use globset::{Glob, GlobSet, GlobSetBuilder};
use ignore::WalkBuilder;
use log;
use rayon::prelude::*;
use std::fs;
use std::path::{Path, PathBuf};

/// One collected source file. `path` is relative to the project root.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileRecord {
    pub path: String,
    pub content: String,
}

/// Decides which walked files are collected.
#[derive(Debug, Clone)]
pub struct FileFilter {
    extensions: Vec<String>,
    exclude: GlobSet,
    use_gitignore: bool,
}

impl FileFilter {
    pub fn new(
        extensions: Vec<String>,
        exclude_patterns: &[String],
        use_gitignore: bool,
    ) -> Result<Self> {
        Ok(Self {
            extensions,
            exclude: build_glob_set_from_vec(exclude_patterns)?,
            use_gitignore,
        })
    }

    pub fn from_config(config: &CollectConfig) -> Result<Self> {
        Self::new(
            config.extensions.clone(),
            &config.exclude,
            config.use_gitignore,
        )
    }

    /// Case-sensitive suffix match on the file name, e.g. ".py".
    pub fn matches_name(&self, file_name: &str) -> bool {
        self.extensions
            .iter()
            .any(|ext| file_name.ends_with(ext.as_str()))
    }

    fn is_excluded(&self, relative_path: &Path, is_dir: bool) -> bool {
        self.exclude.is_match(relative_path)
            || (is_dir && self.exclude.is_match(relative_path.join("dummy_file_for_dir_match")))
    }
}

/// Walks `project_root` and reads every file accepted by `filter`.
///
/// Directory entries are visited sorted by file name, so the returned order is
/// stable for an unchanged tree. Content is decoded with replacement of invalid
/// UTF-8 sequences; this is lossy but never fails a file. Files that cannot be
/// read are logged, skipped and handed back in the second vector.
pub fn collect_files(
    project_root: &Path,
    filter: &FileFilter,
) -> Result<(Vec<FileRecord>, Vec<AppError>)> {
    if !project_root.is_dir() {
        return Err(AppError::ProjectNotFound(project_root.to_path_buf()));
    }
    log::debug!(
        "Collecting files under {} (extensions: {:?}, gitignore: {})",
        project_root.display(),
        filter.extensions,
        filter.use_gitignore
    );

    let mut builder = WalkBuilder::new(project_root);
    builder.standard_filters(false);
    builder.hidden(false);
    builder.follow_links(false);
    if filter.use_gitignore {
        builder.ignore(true);
        builder.git_ignore(true);
        builder.git_exclude(true);
        builder.require_git(false);
    }
    builder.sort_by_file_name(|a, b| a.cmp(b));

    let prune_root = project_root.to_path_buf();
    let prune_filter = filter.clone();
    builder.filter_entry(move |entry| {
        if entry.depth() == 0 {
            return true;
        }
        let is_dir = entry.file_type().is_some_and(|ft| ft.is_dir());
        match entry.path().strip_prefix(&prune_root) {
            Ok(rel) if prune_filter.is_excluded(rel, is_dir) => {
                log::trace!("Excluded by pattern: {}", rel.display());
                false
            }
            _ => true,
        }
    });

    let mut candidate_paths = Vec::<PathBuf>::new();
    let mut problems = Vec::<AppError>::new();

    for entry_result in builder.build() {
        let entry = match entry_result {
            Ok(entry) => entry,
            Err(e) => {
                log::warn!("Error walking directory: {}", e);
                problems.push(AppError::Walk(e));
                continue;
            }
        };
        if !entry.file_type().is_some_and(|ft| ft.is_file()) {
            continue;
        }
        let name = entry.file_name().to_string_lossy();
        if filter.matches_name(&name) {
            log::trace!("Matched file: {}", entry.path().display());
            candidate_paths.push(entry.into_path());
        }
    }
    log::info!(
        "Directory walk complete. {} files match the configured extensions.",
        candidate_paths.len()
    );

    let results: Vec<Result<FileRecord>> = candidate_paths
        .into_par_iter()
        .map(|path| read_file_record(project_root, path))
        .collect();

    let mut files = Vec::with_capacity(results.len());
    for result in results {
        match result {
            Ok(record) => files.push(record),
            Err(e) => {
                log::warn!("Skipping unreadable file: {}", e);
                problems.push(e);
            }
        }
    }
    log::info!("File reading complete. {} files collected.", files.len());

    Ok((files, problems))
}

fn read_file_record(project_root: &Path, path: PathBuf) -> Result<FileRecord> {
    let bytes = fs::read(&path).map_err(|e| AppError::FileRead {
        path: path.clone(),
        source: e,
    })?;
    let content = match String::from_utf8(bytes) {
        Ok(text) => text,
        Err(e) => {
            log::debug!("Replacing invalid UTF-8 in {}", path.display());
            String::from_utf8_lossy(e.as_bytes()).into_owned()
        }
    };
    let relative = pathdiff::diff_paths(&path, project_root).unwrap_or_else(|| path.clone());
    Ok(FileRecord {
        path: relative.to_string_lossy().into_owned(),
        content,
    })
}

fn build_glob_set_from_vec(patterns: &[String]) -> Result<GlobSet> {
    let mut builder = GlobSetBuilder::new();
    for pattern_str in patterns {
        let mut processed_pattern = pattern_str.trim().to_string();
        if processed_pattern.ends_with('/') && processed_pattern.len() > 1 {
            processed_pattern.push_str("**");
        }
        let glob = Glob::new(&processed_pattern).map_err(|e| {
            log::error!("Invalid glob pattern \"{}\": {}", pattern_str, e);
            AppError::Glob(format!(
                "Invalid glob pattern \"{}\" (processed as \"{}\"): {}",
                pattern_str, processed_pattern, e
            ))
        })?;
        log::trace!(
            "Adding exclude pattern: {} (processed as {})",
            pattern_str,
            processed_pattern
        );
        builder.add(glob);
    }
    Ok(builder.build()?)
}
