use indoc::indoc;
use mdedit::run::{Error, OsFacade, RunOptions, RunOptionsBuilder};
use mdedit::run::{InputFormat, OutputFormat};
use pretty_assertions::assert_eq;
use std::io;

#[derive(Default)]
struct MockOs {
    stdin: String,
    stdout: Vec<u8>,
    errors: Vec<String>,
}

impl OsFacade for MockOs {
    fn read_stdin(&self) -> io::Result<String> {
        Ok(self.stdin.clone())
    }

    fn read_file(&self, path: &str) -> io::Result<String> {
        Err(io::Error::new(io::ErrorKind::NotFound, path.to_string()))
    }

    fn stdout(&mut self) -> impl io::Write {
        &mut self.stdout
    }

    fn write_error(&mut self, err: Error) {
        self.errors.push(err.to_string());
    }
}

struct RunResult {
    ok: bool,
    stdout: String,
    errors: Vec<String>,
}

fn run_with_stdin(options: &RunOptions, stdin: &str) -> RunResult {
    let mut os = MockOs {
        stdin: stdin.to_string(),
        ..MockOs::default()
    };
    let ok = mdedit::run::run(options, &mut os);
    RunResult {
        ok,
        stdout: String::from_utf8(os.stdout).expect("stdout is utf-8"),
        errors: os.errors,
    }
}

#[test]
fn markdown_to_html() {
    let result = run_with_stdin(&RunOptions::default(), "Hello **bold** world");
    assert!(result.ok);
    assert_eq!(
        result.stdout,
        "<div class=\"paragraph\">Hello <strong>bold</strong> world</div>\n"
    );
}

#[test]
fn markdown_to_html_multiblock() {
    let input = indoc! {r"
        >quoted line
        ```rust
        let x = 1;
        ```"};
    let result = run_with_stdin(&RunOptions::default(), input);
    assert!(result.ok);
    assert_eq!(
        result.stdout,
        "<blockquote class=\"quote\">quoted line</blockquote>\
         <pre><code class=\"language-rust\">let x = 1;</code></pre>\n"
    );
}

#[test]
fn markdown_to_json() {
    let options = RunOptionsBuilder::default()
        .to(OutputFormat::Json)
        .build()
        .unwrap();
    let result = run_with_stdin(&options, "Hello **bold** world");
    assert!(result.ok);
    assert_eq!(
        result.stdout,
        concat!(
            r#"{"text":"Hello bold world","#,
            r#""entities":[{"type":"MessageEntityBold","offset":6,"length":4}]}"#,
            "\n"
        )
    );
}

#[test]
fn json_to_markdown() {
    let options = RunOptionsBuilder::default()
        .from(InputFormat::Json)
        .to(OutputFormat::Markdown)
        .build()
        .unwrap();
    let input = indoc! {r#"
        {
          "text": "Hello bold world",
          "entities": [
            {"type": "MessageEntityBold", "offset": 6, "length": 4}
          ]
        }"#};
    let result = run_with_stdin(&options, input);
    assert!(result.ok);
    assert_eq!(result.stdout, "Hello **bold** world\n");
}

#[test]
fn json_to_html_with_mention() {
    let options = RunOptionsBuilder::default()
        .from(InputFormat::Json)
        .build()
        .unwrap();
    let input = concat!(
        r#"{"text":"Hello @user!","entities":"#,
        r#"[{"type":"MessageEntityMentionName","offset":6,"length":5,"userId":"123"}]}"#
    );
    let result = run_with_stdin(&options, input);
    assert!(result.ok);
    assert_eq!(
        result.stdout,
        "<div class=\"paragraph\">Hello \
         <a class=\"mention\" data-user-id=\"123\">@user</a>!</div>\n"
    );
}

#[test]
fn preview_offset_decorates_focused_node() {
    let options = RunOptionsBuilder::default()
        .preview_offset(Some(9))
        .build()
        .unwrap();
    let result = run_with_stdin(&options, "Hello **bold** world");
    assert!(result.ok);
    assert_eq!(
        result.stdout,
        "<div class=\"paragraph\">Hello <span class=\"md-syntax\">**</span>\
         <strong>bold</strong><span class=\"md-syntax\">**</span> world</div>\n"
    );
}

#[test]
fn markdown_round_trips_through_both_formats() {
    let to_json = RunOptionsBuilder::default()
        .to(OutputFormat::Json)
        .build()
        .unwrap();
    let back_to_markdown = RunOptionsBuilder::default()
        .from(InputFormat::Json)
        .to(OutputFormat::Markdown)
        .build()
        .unwrap();
    let input = "a **b**\n>q\nlast";
    let json = run_with_stdin(&to_json, input);
    assert!(json.ok);
    let markdown = run_with_stdin(&back_to_markdown, json.stdout.trim_end());
    assert!(markdown.ok);
    assert_eq!(markdown.stdout, format!("{input}\n"));
}

struct BrokenPipeOs {
    errors: Vec<String>,
}

struct BrokenPipeWriter;

impl io::Write for BrokenPipeWriter {
    fn write(&mut self, _buf: &[u8]) -> io::Result<usize> {
        Err(io::Error::new(io::ErrorKind::BrokenPipe, "broken pipe"))
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

impl OsFacade for BrokenPipeOs {
    fn read_stdin(&self) -> io::Result<String> {
        Ok("hi".to_string())
    }

    fn read_file(&self, path: &str) -> io::Result<String> {
        Err(io::Error::new(io::ErrorKind::NotFound, path.to_string()))
    }

    fn stdout(&mut self) -> impl io::Write {
        BrokenPipeWriter
    }

    fn write_error(&mut self, err: Error) {
        self.errors.push(err.to_string());
    }
}

#[test]
fn failed_write_reports_an_output_error() {
    let options = RunOptionsBuilder::default()
        .to(OutputFormat::Json)
        .build()
        .unwrap();
    let mut os = BrokenPipeOs { errors: Vec::new() };
    assert!(!mdedit::run::run(&options, &mut os));
    assert_eq!(os.errors.len(), 1);
    assert!(
        os.errors[0].contains("while writing output"),
        "unexpected error: {}",
        os.errors[0]
    );
}

#[test]
fn invalid_json_input_fails_with_error() {
    let options = RunOptionsBuilder::default()
        .from(InputFormat::Json)
        .build()
        .unwrap();
    let result = run_with_stdin(&options, "not json at all");
    assert!(!result.ok);
    assert!(result.stdout.is_empty());
    assert_eq!(result.errors.len(), 1);
    assert!(
        result.errors[0].contains("not valid formatted-text JSON"),
        "unexpected error: {}",
        result.errors[0]
    );
}

#[test]
fn missing_file_fails_with_error() {
    let options = RunOptionsBuilder::default()
        .input_file_paths(vec!["nope.md".to_string()])
        .build()
        .unwrap();
    let result = run_with_stdin(&options, "");
    assert!(!result.ok);
    assert!(result.errors[0].contains("nope.md"));
}
