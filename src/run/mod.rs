//! End-to-end runs.
//!
//! This module ties the [`crate::md_ast`], [`crate::api`], and
//! [`crate::output`] mods into a single workflow. It's useful for building
//! functionality like the CLI's, but running it within-process.
//!
//! ## Example
//!
//! ```
//! # use mdedit::run;
//!
//! // First, let's define a mocked I/O. Replace this with whatever you need.
//! #[derive(Default)]
//! struct MockIo {
//!     stdout: Vec<u8>,
//! }
//!
//! impl run::OsFacade for MockIo {
//!     fn read_stdin(&self) -> std::io::Result<String> {
//!         Ok("Hello **bold** world".to_string())
//!     }
//!
//!     fn read_file(&self, path: &str) -> std::io::Result<String> {
//!         Err(std::io::Error::new(std::io::ErrorKind::NotFound, path))
//!     }
//!
//!     fn stdout(&mut self) -> impl std::io::Write {
//!         &mut self.stdout
//!     }
//!
//!     fn write_error(&mut self, err: run::Error) {
//!         eprintln!("{err}")
//!     }
//! }
//!
//! // Now, use it:
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let options = run::RunOptions::default(); // markdown in, html out
//! let mut os_facade = MockIo::default();
//!
//! let ok = run::run(&options, &mut os_facade);
//! let stdout_text = String::from_utf8(os_facade.stdout)?;
//!
//! assert_eq!(ok, true);
//! assert_eq!(
//!     stdout_text,
//!     "<div class=\"paragraph\">Hello <strong>bold</strong> world</div>\n"
//! );
//! #
//! #     Ok(())
//! # }
//! ```

mod cli;
mod run_main;

pub use cli::*;
pub use run_main::*;
