use crate::api::ApiFormattedText;
use crate::editor::MarkdownEditor;
use crate::output::{RenderError, RenderOptionsBuilder};
use crate::run::cli::{InputFormat, OutputFormat, RunOptions};
use std::fmt::{Display, Formatter};
use std::io;
use std::io::Write;

/// The run's overall possible error.
#[derive(Debug)]
pub enum Error {
    /// Couldn't read an input file.
    FileReadError(Input, io::Error),

    /// The input (with `--from json`) wasn't valid `ApiFormattedText` JSON.
    JsonParse(serde_json::Error),

    /// The document failed to render.
    ///
    /// This only happens for structurally broken trees; trees built by
    /// [`MarkdownEditor::parse`] or from entities always render.
    Render(RenderError),

    /// Couldn't write the output.
    Output(io::Error),
}

impl std::error::Error for Error {}

impl Display for Error {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Error::FileReadError(input, err) => writeln!(f, "{err} while reading {input}"),
            Error::JsonParse(err) => {
                writeln!(f, "Input is not valid formatted-text JSON:")?;
                writeln!(f, "{err}")
            }
            Error::Render(err) => writeln!(f, "Render error: {err}"),
            Error::Output(err) => writeln!(f, "{err} while writing output"),
        }
    }
}

/// Stdin or an input file by path.
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Input {
    Stdin,
    FilePath(String),
}

impl Display for Input {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Input::Stdin => f.write_str("stdin"),
            Input::FilePath(file) => write!(f, "file {file:?}"),
        }
    }
}

/// A simple facade for handling I/O.
///
/// This trait lets you do "I/O-y stuff" like mocking out stdin or reading
/// files. The [`run`] method uses it.
pub trait OsFacade {
    /// Read stdin (or your mock of it) to a `String`.
    fn read_stdin(&self) -> io::Result<String>;

    /// Read a file path (or your mock of one) to a `String`.
    fn read_file(&self, path: &str) -> io::Result<String>;

    /// Get a writer for stdout (or your mock of it).
    fn stdout(&mut self) -> impl Write;

    /// Handle an error.
    fn write_error(&mut self, err: Error);

    /// Read a slice of file paths into a single `String`, joined by newlines.
    ///
    /// The default implementation (which you should feel free to use) treats
    /// the file path `"-"` as stdin. The first `"-"` reads all of stdin (via
    /// [`Self::read_stdin`]), and subsequent `"-"`s get silently ignored.
    fn read_all(&self, input_file_paths: &[String]) -> Result<String, Error> {
        if input_file_paths.is_empty() {
            return self
                .read_stdin()
                .map_err(|err| Error::FileReadError(Input::Stdin, err));
        }
        let mut pieces = Vec::with_capacity(input_file_paths.len());
        let mut have_read_stdin = false;
        for path in input_file_paths {
            if path == "-" {
                if !have_read_stdin {
                    pieces.push(
                        self.read_stdin()
                            .map_err(|err| Error::FileReadError(Input::Stdin, err))?,
                    );
                    have_read_stdin = true;
                }
            } else {
                pieces.push(self.read_file(path).map_err(|err| {
                    Error::FileReadError(Input::FilePath(path.to_string()), err)
                })?);
            }
        }
        Ok(pieces.join("\n"))
    }
}

/// Runs the converter end to end: reads input per [`RunOptions::from`],
/// builds the document, and writes it out per [`RunOptions::to`]. Returns
/// whether the run succeeded; failures go to [`OsFacade::write_error`].
pub fn run(options: &RunOptions, os: &mut impl OsFacade) -> bool {
    match run_or_error(options, os) {
        Ok(()) => true,
        Err(err) => {
            os.write_error(err);
            false
        }
    }
}

fn run_or_error(options: &RunOptions, os: &mut impl OsFacade) -> Result<(), Error> {
    let input = os.read_all(&options.input_file_paths)?;
    let mut editor = MarkdownEditor::new();
    match options.from {
        InputFormat::Markdown => {
            editor.parse(&input);
        }
        InputFormat::Json => {
            let api: ApiFormattedText = serde_json::from_str(&input).map_err(Error::JsonParse)?;
            editor.from_api_formatted(&api);
        }
    }

    let mut stdout = os.stdout();
    match options.to {
        OutputFormat::Html => {
            let render_options = RenderOptionsBuilder::default()
                .is_preview(options.preview_offset.is_some())
                .preview_node_offset(options.preview_offset)
                .build()
                .unwrap_or_default();
            let html = editor.render(&render_options).map_err(Error::Render)?;
            writeln!(stdout, "{html}").map_err(Error::Output)?;
        }
        OutputFormat::Markdown => {
            let markdown = editor.to_markdown().map_err(Error::Render)?;
            writeln!(stdout, "{markdown}").map_err(Error::Output)?;
        }
        OutputFormat::Json => {
            // a failure here is a write failure, not a parse failure
            serde_json::to_writer(&mut stdout, &editor.to_api_formatted())
                .map_err(|err| Error::Output(err.into()))?;
            writeln!(stdout).map_err(Error::Output)?;
        }
    }
    Ok(())
}
