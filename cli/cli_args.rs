use clap::{Args, Parser};
use clap_complete::Shell;
use std::path::PathBuf;

#[derive(Args, Debug, Clone, Default)]
pub struct CollectOpts {
    #[arg(
        long,
        num_args = 1..,
        value_name = "EXT",
        help = "File extensions to include (default: .js .ts .json .py).",
        help_heading = "File Selection"
    )]
    pub extensions: Option<Vec<String>>,

    #[arg(
        long,
        num_args = 1..,
        value_name = "GLOB",
        help = "Glob patterns (relative to the project) to skip, e.g. 'node_modules/'.",
        help_heading = "File Selection"
    )]
    pub exclude: Option<Vec<String>>,

    #[arg(
        long,
        help = "Honour .gitignore, .ignore and git exclude files while walking.",
        help_heading = "File Selection"
    )]
    pub gitignore: bool,
}

#[derive(Args, Debug, Clone, Default)]
pub struct ModelOpts {
    #[arg(
        long,
        value_name = "NAME",
        help = "LLM model to use (default: mistral).",
        help_heading = "Model"
    )]
    pub model: Option<String>,

    #[arg(
        long,
        value_name = "PROGRAM",
        help = "Model runner executable (default: ollama).",
        help_heading = "Model"
    )]
    pub runner: Option<String>,

    #[arg(
        long,
        value_name = "DURATION",
        help = "Give up on a chunk after this long, e.g. '90s' or '5m' (default: wait forever).",
        help_heading = "Model"
    )]
    pub timeout: Option<String>,

    #[arg(
        long,
        value_name = "PATH",
        help = "Read the prompt template from a file ({file_path} and {content} are substituted).",
        help_heading = "Model"
    )]
    pub prompt_file: Option<PathBuf>,
}

#[derive(Args, Debug, Clone, Default)]
pub struct RunOpts {
    #[arg(
        long,
        value_name = "PATH",
        help = "Output report file (default: project_analysis.txt).",
        help_heading = "Run"
    )]
    pub report: Option<PathBuf>,

    #[arg(
        long,
        value_name = "CHARS",
        help = "Max characters per chunk (default: 5000).",
        help_heading = "Run"
    )]
    pub chunk_size: Option<usize>,

    #[arg(
        short,
        long,
        value_name = "N",
        help = "Analyze up to N files at once (default: 1).",
        help_heading = "Run"
    )]
    pub jobs: Option<usize>,
}

#[derive(Args, Debug, Clone, Default)]
pub struct ConfigFileOpts {
    #[arg(
        long,
        value_name = "FILE",
        help = "TOML config file (default: <project>/.xtools/xreview/xreview.toml).",
        conflicts_with = "no_config",
        help_heading = "Configuration"
    )]
    pub config: Option<PathBuf>,

    #[arg(
        long,
        help = "Disable loading any TOML config file.",
        conflicts_with = "config",
        help_heading = "Configuration"
    )]
    pub no_config: bool,

    #[arg(
        long,
        help = "Print the effective configuration as TOML and exit.",
        help_heading = "Configuration"
    )]
    pub print_config: bool,
}

#[derive(Parser, Debug)]
#[command(
    name = "xreview",
    author,
    version,
    about = "Analyze a project with an LLM via Ollama.",
    long_about = "xreview collects project files by extension, splits them into chunks, \nsends each chunk to a local model runner for critique and writes all answers \nto a single plain text report.",
    help_template = "{about-section}\nUsage: {usage}\n\n{all-args}{after-help}",
    after_help = "EXAMPLES:\n  xreview ./my-app\n  xreview ./my-app --extensions .rs .toml --model llama3 --report review.txt\n  xreview ./my-app --exclude node_modules/ dist/ --timeout 5m --jobs 2",
    arg_required_else_help = true
)]
pub struct Cli {
    #[arg(
        value_name = "PROJECT_FOLDER",
        required_unless_present = "completions",
        help = "Path to the project folder."
    )]
    pub project_folder: Option<PathBuf>,

    #[command(flatten)]
    pub collect: CollectOpts,

    #[command(flatten)]
    pub model: ModelOpts,

    #[command(flatten)]
    pub run: RunOpts,

    #[command(flatten)]
    pub config_file: ConfigFileOpts,

    #[arg(
        long,
        value_enum,
        value_name = "SHELL",
        help = "Print a shell completion script and exit."
    )]
    pub completions: Option<Shell>,

    #[arg(short, long, action = clap::ArgAction::Count, global = true, help = "Increase message verbosity (-v, -vv).")]
    pub verbose: u8,

    #[arg(
        short,
        long,
        global = true,
        help = "Silence progress messages and warnings."
    )]
    pub quiet: bool,
}
