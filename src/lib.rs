//! A bidirectional rich-text editor core.
//!
//! It converts between three representations of the same message:
//!
//! - a markdown dialect (`**bold**`, `*italic*`, `<u>underline</u>`,
//!   `~~strikethrough~~`, `||spoiler||`, `` `code` ``, fenced `pre` blocks,
//!   `>` quotes, `[label](url)` links, `[@name](id:…)` mentions and
//!   `[emoji](doc:…)` custom emoji),
//! - the flat wire format (plain text plus offset/length entities), and
//! - HTML for an editing surface.
//!
//! The pipeline is [`md_ast`] (tokenizers, parser, the tree model),
//! [`api`] (entity converter), and [`output`] (the two renderers plus the
//! offset-mapping table tying rendered offsets back to markdown offsets).
//! [`focus`] locates the node at a caret offset, and
//! [`editor::MarkdownEditor`] wraps it all around one owned document.
//! [`run`] is the CLI workflow, also usable in-process.
//!
//! All offsets everywhere are UTF-16 code units, matching the wire format's
//! entity ranges and the browser's caret coordinates.

pub mod api;
pub mod editor;
pub mod focus;
pub mod md_ast;
pub mod output;
pub mod run;
pub(crate) mod util;
