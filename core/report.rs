use crate::analyzer::{FileAnalysis, analyze_file};
use crate::config::Config;
use crate::error::{AppError, Result};
use crate::gather::{FileFilter, FileRecord, collect_files};
use crate::invoker::ModelInvoker;
use crate::prompt::PromptTemplate;
use log;
use rayon::prelude::*;
use std::fs;
use std::path::{Path, PathBuf};

/// Hooks for reporting progress while a review runs. All methods default to
/// doing nothing. Called from worker threads when more than one job is used.
pub trait ReviewProgress: Sync {
    fn reading(&self, _project_root: &Path) {}
    fn analyzing(&self, _file_path: &str) {}
    fn skipped(&self, _problem: &AppError) {}
}

pub struct NoProgress;

impl ReviewProgress for NoProgress {}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Report {
    pub text: String,
    pub files: usize,
    pub chunks: usize,
    pub fallbacks: usize,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReviewSummary {
    pub report_path: PathBuf,
    pub files_analyzed: usize,
    pub chunks_analyzed: usize,
    pub fallback_responses: usize,
    pub skipped_files: usize,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReviewOutcome {
    /// Nothing matched the configured extensions; no report was written.
    NoFiles,
    Written(ReviewSummary),
}

/// Collects, analyzes and writes the report in one pass.
///
/// The report is assembled completely in memory and written once at the end,
/// replacing any existing file.
pub fn run_review(
    config: &Config,
    project_root: &Path,
    invoker: &dyn ModelInvoker,
    progress: &dyn ReviewProgress,
) -> Result<ReviewOutcome> {
    config.validate()?;
    let filter = FileFilter::from_config(&config.collect)?;

    progress.reading(project_root);
    let (files, problems) = collect_files(project_root, &filter)?;
    for problem in &problems {
        progress.skipped(problem);
    }

    if files.is_empty() {
        log::info!("No files matched {:?}", config.collect.extensions);
        return Ok(ReviewOutcome::NoFiles);
    }

    let prompt = PromptTemplate::new(config.prompt.template.as_str());
    let report = build_report(
        &files,
        invoker,
        &prompt,
        config.chunking.size,
        config.run.jobs,
        progress,
    )?;
    write_report(&config.report.path, &report.text)?;

    Ok(ReviewOutcome::Written(ReviewSummary {
        report_path: config.report.path.clone(),
        files_analyzed: report.files,
        chunks_analyzed: report.chunks,
        fallback_responses: report.fallbacks,
        skipped_files: problems.len(),
    }))
}

/// Analyzes `files` and concatenates their sections in input order.
///
/// With `jobs > 1` files are spread over a dedicated pool of that many
/// threads; chunks inside one file are still sent sequentially and the
/// resulting text is identical to a single-threaded run.
pub fn build_report(
    files: &[FileRecord],
    invoker: &dyn ModelInvoker,
    prompt: &PromptTemplate,
    max_chars: usize,
    jobs: usize,
    progress: &dyn ReviewProgress,
) -> Result<Report> {
    let analyze = |file: &FileRecord| -> Result<FileAnalysis> {
        progress.analyzing(&file.path);
        analyze_file(file, invoker, prompt, max_chars)
    };

    let analyses: Vec<FileAnalysis> = if jobs <= 1 {
        files.iter().map(analyze).collect::<Result<_>>()?
    } else {
        log::debug!("Analyzing {} files with {} workers", files.len(), jobs);
        let pool = rayon::ThreadPoolBuilder::new().num_threads(jobs).build()?;
        pool.install(|| files.par_iter().map(analyze).collect::<Result<_>>())?
    };

    let mut report = Report {
        text: String::new(),
        files: analyses.len(),
        chunks: 0,
        fallbacks: 0,
    };
    for analysis in analyses {
        report.text.push_str(&analysis.section);
        report.chunks += analysis.chunks;
        report.fallbacks += analysis.fallbacks;
    }
    Ok(report)
}

pub fn write_report(path: &Path, content: &str) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent).map_err(|e| AppError::DirCreation {
            path: parent.to_path_buf(),
            source: e,
        })?;
    }
    fs::write(path, content).map_err(|e| AppError::FileWrite {
        path: path.to_path_buf(),
        source: e,
    })?;
    log::info!("Report written to {}", path.display());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::invoker::{CommandInvoker, ModelResponse};
    use std::sync::Mutex;
    use tempfile::TempDir;

    /// Answers with the chunk length so output depends only on the input.
    struct LengthInvoker;

    impl ModelInvoker for LengthInvoker {
        fn invoke(&self, prompt: &str, file_path: &str) -> ModelResponse {
            ModelResponse::Answer(format!("{}: {} chars\n", file_path, prompt.chars().count()))
        }
    }

    #[derive(Default)]
    struct Recorder {
        analyzed: Mutex<Vec<String>>,
    }

    impl ReviewProgress for Recorder {
        fn analyzing(&self, file_path: &str) {
            self.analyzed.lock().unwrap().push(file_path.to_string());
        }
    }

    fn project(files: &[(&str, &str)]) -> TempDir {
        let tmp = TempDir::new().unwrap();
        for (rel, content) in files {
            let path = tmp.path().join("project").join(rel);
            fs::create_dir_all(path.parent().unwrap()).unwrap();
            fs::write(path, content).unwrap();
        }
        fs::create_dir_all(tmp.path().join("project")).unwrap();
        tmp
    }

    fn config_for(tmp: &TempDir, extensions: &[&str], chunk_size: usize) -> Config {
        let mut config = Config::default();
        config.collect.extensions = extensions.iter().map(|s| s.to_string()).collect();
        config.chunking.size = chunk_size;
        config.prompt.template = "{content}".to_string();
        config.report.path = tmp.path().join("out").join("report.txt");
        config
    }

    #[test]
    fn single_file_produces_one_section() {
        let tmp = project(&[("a.py", "print(1)")]);
        let config = config_for(&tmp, &[".py"], 100);
        let outcome =
            run_review(&config, &tmp.path().join("project"), &LengthInvoker, &NoProgress).unwrap();

        let ReviewOutcome::Written(summary) = outcome else {
            panic!("expected a written report");
        };
        assert_eq!(summary.files_analyzed, 1);
        assert_eq!(summary.chunks_analyzed, 1);
        let text = fs::read_to_string(&config.report.path).unwrap();
        assert_eq!(text, "==== Analyzing a.py ====\na.py: 8 chars\n\n");
    }

    #[test]
    fn no_matching_files_writes_nothing() {
        let tmp = project(&[("notes.txt", "hello")]);
        let config = config_for(&tmp, &[".py"], 100);
        let outcome =
            run_review(&config, &tmp.path().join("project"), &LengthInvoker, &NoProgress).unwrap();
        assert_eq!(outcome, ReviewOutcome::NoFiles);
        assert!(!config.report.path.exists());
    }

    #[test]
    fn missing_folder_is_an_error() {
        let tmp = TempDir::new().unwrap();
        let config = config_for(&tmp, &[".py"], 100);
        let result = run_review(&config, &tmp.path().join("absent"), &LengthInvoker, &NoProgress);
        assert!(matches!(result, Err(AppError::ProjectNotFound(_))));
        assert!(!config.report.path.exists());
    }

    #[test]
    fn missing_runner_still_writes_report() {
        let tmp = project(&[("a.py", "abcdef"), ("b.py", "")]);
        let config = config_for(&tmp, &[".py"], 4);
        let invoker = CommandInvoker::new("xreview-no-such-runner", Vec::new(), "m");
        let outcome =
            run_review(&config, &tmp.path().join("project"), &invoker, &NoProgress).unwrap();

        let ReviewOutcome::Written(summary) = outcome else {
            panic!("expected a written report");
        };
        assert_eq!(summary.chunks_analyzed, 2);
        assert_eq!(summary.fallback_responses, 2);
        let text = fs::read_to_string(&config.report.path).unwrap();
        let sentinel = "xreview-no-such-runner is not installed or not found in PATH.\n";
        assert_eq!(
            text,
            format!(
                "==== Analyzing a.py ====\n{s}{s}\n==== Analyzing b.py ====\n\n",
                s = sentinel
            )
        );
    }

    #[test]
    fn parallel_run_matches_sequential() {
        let files: Vec<FileRecord> = (0..12)
            .map(|i| FileRecord {
                path: format!("f{:02}.js", i),
                content: "z".repeat(i * 7),
            })
            .collect();
        let prompt = PromptTemplate::new("{content}");

        let sequential = build_report(&files, &LengthInvoker, &prompt, 10, 1, &NoProgress).unwrap();
        let recorder = Recorder::default();
        let parallel = build_report(&files, &LengthInvoker, &prompt, 10, 4, &recorder).unwrap();

        assert_eq!(sequential, parallel);
        assert_eq!(recorder.analyzed.lock().unwrap().len(), files.len());
        assert!(sequential.text.starts_with("==== Analyzing f00.js ====\n\n"));
    }

    #[test]
    fn existing_report_is_overwritten() {
        let tmp = project(&[("a.py", "x")]);
        let config = config_for(&tmp, &[".py"], 100);
        fs::create_dir_all(config.report.path.parent().unwrap()).unwrap();
        fs::write(&config.report.path, "stale content that is much longer").unwrap();

        run_review(&config, &tmp.path().join("project"), &LengthInvoker, &NoProgress).unwrap();
        let text = fs::read_to_string(&config.report.path).unwrap();
        assert_eq!(text, "==== Analyzing a.py ====\na.py: 1 chars\n\n");
    }

    #[test]
    fn unwritable_report_path_is_fatal() {
        let tmp = project(&[("a.py", "x")]);
        let mut config = config_for(&tmp, &[".py"], 100);
        // A directory cannot be overwritten by a file.
        config.report.path = tmp.path().join("project");
        let result = run_review(&config, &tmp.path().join("project"), &LengthInvoker, &NoProgress);
        assert!(matches!(result, Err(AppError::FileWrite { .. })));
    }

    #[test]
    fn invalid_config_fails_before_collection() {
        let tmp = project(&[("a.py", "x")]);
        let mut config = config_for(&tmp, &[".py"], 0);
        config.report.path = tmp.path().join("r.txt");
        let result = run_review(&config, &tmp.path().join("project"), &LengthInvoker, &NoProgress);
        assert!(matches!(result, Err(AppError::Chunking(_))));
        assert!(!config.report.path.exists());
    }
}
