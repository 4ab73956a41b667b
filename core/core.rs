//! Chunked model review of a project tree.
//!
//! Files are collected by extension ([`gather`]), split into fixed-size
//! character chunks ([`chunking`]), sent one by one to an external model
//! runner ([`invoker`]) and the answers are joined into a plain text report
//! ([`analyzer`], [`report`]).

pub mod analyzer;
pub mod chunking;
pub mod config;
pub mod error;
pub mod gather;
pub mod invoker;
pub mod prompt;
pub mod report;

pub use analyzer::{FileAnalysis, analyze_file};
pub use chunking::{TextChunks, chunk_text};
pub use config::Config;
pub use error::{AppError, Result};
pub use gather::{FileFilter, FileRecord, collect_files};
pub use invoker::{CommandInvoker, ModelInvoker, ModelResponse};
pub use prompt::PromptTemplate;
pub use report::{
    NoProgress, Report, ReviewOutcome, ReviewProgress, ReviewSummary, build_report, run_review,
    write_report,
};
