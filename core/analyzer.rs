use crate::chunking::chunk_text;
use crate::error::Result;
use crate::gather::FileRecord;
use crate::invoker::ModelInvoker;
use crate::prompt::PromptTemplate;
use log;

/// Report section for one file plus counters for the run summary.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileAnalysis {
    pub section: String,
    pub chunks: usize,
    pub fallbacks: usize,
}

pub fn section_header(file_path: &str) -> String {
    format!("==== Analyzing {} ====\n", file_path)
}

/// Sends every chunk of `file` to the model in order and joins the answers
/// under a header line. Empty files produce the header and blank line only.
pub fn analyze_file(
    file: &FileRecord,
    invoker: &dyn ModelInvoker,
    prompt: &PromptTemplate,
    max_chars: usize,
) -> Result<FileAnalysis> {
    let mut section = section_header(&file.path);
    let mut chunks = 0;
    let mut fallbacks = 0;

    for (index, chunk) in chunk_text(&file.content, max_chars)?.enumerate() {
        log::debug!(
            "Sending chunk {} of {} ({} chars)",
            index + 1,
            file.path,
            chunk.chars().count()
        );
        let response = invoker.invoke(&prompt.render(&file.path, chunk), &file.path);
        if response.is_fallback() {
            fallbacks += 1;
        }
        section.push_str(response.text());
        chunks += 1;
    }
    section.push('\n');

    log::trace!("Finished {} after {} chunks", file.path, chunks);
    Ok(FileAnalysis {
        section,
        chunks,
        fallbacks,
    })
}
