use std::path::PathBuf;

use clap::Args;
use clap::Parser;
use clap::Subcommand;

#[derive(Parser)]
#[command(
	author,
	version,
	about = "Preprocess markdown documents with comments, includes, tables of contents and executable code.",
	long_about = "mdoc rewrites markdown documents by resolving the directives they contain.\n\nThe \
	              full pipeline runs these filters in order:\n  1. comment  Remove <!-- ... --> \
	              comments\n  2. include  Replace @[ini=a,end=b](file) with file content\n  3. toc     \
	              Replace [TOC] with links to the headings\n  4. exec     Run ```sh exec and \
	              ```matlab exec blocks and insert their output\n\nQuick start:\n  mdoc parse \
	              README.mdoc --md   Write README.md\n  mdoc make docs -r             Build every \
	              .mdoc file under docs/"
)]
pub struct MdocCli {
	#[command(subcommand)]
	pub command: Option<Commands>,

	/// Log each filter as it runs, and interpreter activity.
	#[arg(long, short, global = true, default_value_t = false)]
	pub verbose: bool,

	/// Disable colored output.
	#[arg(long, global = true, default_value_t = false)]
	pub no_color: bool,

	/// Read interpreter and shell settings from this file instead of
	/// discovering `mdoc.toml` next to the input.
	#[arg(long, global = true)]
	pub config: Option<PathBuf>,
}

#[derive(Subcommand)]
pub enum Commands {
	/// Run a document through the full pipeline.
	///
	/// Comments are removed, includes resolved, the table of contents built
	/// and code blocks executed. The result is printed to stdout unless
	/// `--output` or `--md` is given. Include paths and code blocks are
	/// resolved relative to the directory of INPUT.
	Parse {
		/// Document to process.
		input: PathBuf,

		/// Write the result to this file.
		#[arg(long, short)]
		output: Option<PathBuf>,

		/// Write the result next to INPUT with an `.md` extension.
		#[arg(long, short, default_value_t = false)]
		md: bool,

		/// Echo code blocks without running them.
		#[arg(long, default_value_t = false)]
		no_exec: bool,

		/// Collapse doubled line breaks after the pipeline.
		#[arg(long, default_value_t = false)]
		intro: bool,
	},
	/// Build every `.mdoc` file in PATH into a sibling `.md` file.
	///
	/// Each document is processed with its own directory as the working
	/// directory.
	Make {
		/// Directory to search.
		#[arg(default_value = ".")]
		path: PathBuf,

		/// Search subdirectories too.
		#[arg(long, short, default_value_t = false)]
		recursive: bool,

		/// Echo code blocks without running them.
		#[arg(long, default_value_t = false)]
		no_exec: bool,

		/// Collapse doubled line breaks after the pipeline.
		#[arg(long, default_value_t = false)]
		intro: bool,

		/// Skip files whose name matches this glob. May be repeated.
		#[arg(long, short)]
		exclude: Vec<String>,
	},
	/// Remove `<!-- ... -->` comments.
	Comment(FilterArgs),
	/// Replace `@[options](path)` directives with file content.
	///
	/// `@[ini=<marker>,end=<marker>](path)` keeps only the lines between the
	/// first line containing the `ini` marker and the next line containing
	/// the `end` marker.
	Include(FilterArgs),
	/// Replace the first `[TOC]` with a nested list of heading links.
	Toc(FilterArgs),
	/// Execute fenced code blocks marked with `exec`.
	///
	/// Fence options: `--path <dir>` runs the block in another directory,
	/// `--no-code` hides the source, `--no-echo` hides the result and
	/// `--raw` prints the result without a fence.
	Exec {
		#[command(flatten)]
		files: FilterArgs,

		/// Echo code blocks without running them.
		#[arg(long, default_value_t = false)]
		no_exec: bool,
	},
	/// Collapse doubled line breaks.
	RemoveIntro(FilterArgs),
}

/// Input and output of a single-filter command.
#[derive(Args)]
pub struct FilterArgs {
	/// Document to process.
	pub input: PathBuf,

	/// Where to write the result. Standard output when absent or `-`.
	pub output: Option<PathBuf>,
}
