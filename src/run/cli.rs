use clap::{Parser, ValueEnum};
use derive_builder::Builder;
use std::fmt::{Display, Formatter};

/// How the input text should be interpreted.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash, ValueEnum)]
pub enum InputFormat {
    /// Markdown-dialect text.
    #[default]
    Markdown,
    /// `ApiFormattedText` JSON (`{"text": …, "entities": […]}`).
    Json,
}

/// What to emit.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash, ValueEnum)]
pub enum OutputFormat {
    /// Rendered HTML.
    #[default]
    Html,
    /// Canonical markdown-dialect text.
    Markdown,
    /// `ApiFormattedText` JSON.
    Json,
}

impl Display for InputFormat {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            InputFormat::Markdown => "markdown",
            InputFormat::Json => "json",
        };
        f.write_str(name)
    }
}

impl Display for OutputFormat {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            OutputFormat::Html => "html",
            OutputFormat::Markdown => "markdown",
            OutputFormat::Json => "json",
        };
        f.write_str(name)
    }
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Parser)]
#[command(version, about, long_about = None)]
#[doc(hidden)]
pub struct CliOptions {
    /// The input format.
    #[arg(long, short = 'f', value_enum, default_value_t = InputFormat::Markdown)]
    pub(crate) from: InputFormat,

    /// The output format.
    #[arg(long, short = 't', value_enum, default_value_t = OutputFormat::Html)]
    pub(crate) to: OutputFormat,

    /// A caret offset (UTF-16 units into the markdown text). The node at this
    /// offset renders with its markdown syntax visible as decorated spans.
    ///
    /// Only meaningful with `--to html`.
    #[arg(long)]
    pub(crate) preview_offset: Option<usize>,

    /// An optional list of input files, by path. If not provided, standard
    /// input will be used.
    ///
    /// A path of "-" represents standard input; all but the first "-" are
    /// ignored. Multiple files are treated as one document, joined by a
    /// newline.
    #[arg()]
    pub(crate) input_file_paths: Vec<String>,
}

/// Options analogous to the CLI's switches, for running in-process.
#[derive(Clone, Debug, Default, PartialEq, Eq, Builder)]
#[builder(default)]
pub struct RunOptions {
    pub from: InputFormat,
    pub to: OutputFormat,
    pub preview_offset: Option<usize>,
    pub input_file_paths: Vec<String>,
}

impl From<CliOptions> for RunOptions {
    fn from(value: CliOptions) -> Self {
        RunOptions {
            from: value.from,
            to: value.to,
            preview_offset: value.preview_offset,
            input_file_paths: value.input_file_paths,
        }
    }
}
