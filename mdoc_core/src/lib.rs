//! `mdoc_core` is the library behind the `mdoc` markdown preprocessor. It
//! resolves directives embedded in a markdown document (comments, file
//! includes, a table of contents and executable code blocks) and returns the
//! rewritten document.
//!
//! ## Processing Pipeline
//!
//! ```text
//! source document
//!   → Comment filter    (drops <!-- ... -->)
//!   → Include filter    (@[ini=a,end=b](path) → file content)
//!   → TOC filter        ([TOC] → nested list of heading links)
//!   → Execute filter    (```sh exec → source + captured output)
//!   → Blank-line filter (optional, \n\n → \n)
//!   → output document
//! ```
//!
//! ## Modules
//!
//! - [`config`]: options for one run and the `mdoc.toml` file with shell and
//!   interpreter profiles.
//! - [`Pipeline`]: the ordered filter chain.
//! - [`scan`]: splits a document into literal text and executable
//!   [`CodeBlock`]s.
//! - [`ShellExecutor`]: one shell process per block, commands chained with
//!   `&&`.
//! - [`InterpreterExecutor`]: one long-lived interpreter per language,
//!   synchronized by echoing a sentinel after every request.
//!
//! ## Quick Start
//!
//! ```rust
//! use std::path::Path;
//!
//! use mdoc_core::MdocConfig;
//! use mdoc_core::Pipeline;
//! use mdoc_core::PipelineOptions;
//!
//! let options = PipelineOptions {
//! 	no_exec: true,
//! 	..PipelineOptions::default()
//! };
//! let mut pipeline = Pipeline::standard(&options, &MdocConfig::default(), Path::new("."));
//!
//! let output = pipeline
//! 	.run("# Title\n<!-- draft -->\n```sh exec\necho hi\n```\n")
//! 	.unwrap();
//! assert_eq!(output, "# Title\n\n```sh\necho hi\n```\n\n");
//! ```

pub use blank_lines::*;
pub use comment::*;
pub use config::*;
pub use error::*;
pub use execute::*;
pub use filter::*;
pub use include::*;
pub use interpreter::*;
pub use language::*;
pub use pipeline::*;
pub use scanner::*;
pub use shell::*;
pub use toc::*;

mod blank_lines;
mod comment;
pub mod config;
#[allow(unused_assignments)]
mod error;
mod execute;
mod filter;
mod include;
mod interpreter;
mod language;
mod pipeline;
mod scanner;
mod shell;
mod toc;

#[cfg(test)]
mod __fixtures;
