use std::io::Write;
use std::path::Path;
use std::path::PathBuf;
use std::process;

use clap::Parser;
use globset::Glob;
use globset::GlobSet;
use globset::GlobSetBuilder;
use ignore::WalkBuilder;
use mdoc_cli::Commands;
use mdoc_cli::FilterArgs;
use mdoc_cli::MdocCli;
use mdoc_core::BlankLineFilter;
use mdoc_core::CommentFilter;
use mdoc_core::ExecuteCodeFilter;
use mdoc_core::Filter;
use mdoc_core::IncludeFilter;
use mdoc_core::MdocConfig;
use mdoc_core::MdocError;
use mdoc_core::MdocResult;
use mdoc_core::Pipeline;
use mdoc_core::PipelineOptions;
use mdoc_core::TocFilter;
use owo_colors::OwoColorize;
use tracing_subscriber::EnvFilter;

const SOURCE_EXTENSION: &str = "mdoc";
const OUTPUT_EXTENSION: &str = "md";
const STDOUT_MARKER: &str = "-";

static USE_COLOR: std::sync::atomic::AtomicBool = std::sync::atomic::AtomicBool::new(true);

fn color_enabled() -> bool {
	USE_COLOR.load(std::sync::atomic::Ordering::Relaxed)
}

/// Apply ANSI color codes only when color is enabled.
macro_rules! colored {
	($text:expr,red) => {
		if color_enabled() {
			format!("{}", $text.red())
		} else {
			format!("{}", $text)
		}
	};
	($text:expr,green) => {
		if color_enabled() {
			format!("{}", $text.green())
		} else {
			format!("{}", $text)
		}
	};
}

fn main() {
	let args = MdocCli::parse();

	// Respect NO_COLOR env var and --no-color flag.
	let use_color = !args.no_color && std::env::var_os("NO_COLOR").is_none();
	if !use_color {
		USE_COLOR.store(false, std::sync::atomic::Ordering::Relaxed);
	}

	// Install miette's fancy handler for rich error diagnostics.
	miette::set_hook(Box::new(move |_| {
		Box::new(
			miette::MietteHandlerOpts::new()
				.color(use_color)
				.unicode(use_color)
				.build(),
		)
	}))
	.ok();

	init_tracing(args.verbose, use_color);

	// Code blocks in `parse` and `exec` run in the directory mdoc was started
	// from; `make` runs each document in its own directory.
	let invocation_dir = std::env::current_dir().unwrap_or_else(|_| PathBuf::from("."));

	let result = match &args.command {
		Some(Commands::Parse {
			input,
			output,
			md,
			no_exec,
			intro,
		}) => {
			run_parse(
				&args,
				input,
				output.as_deref(),
				&invocation_dir,
				*md,
				*no_exec,
				*intro,
			)
		}
		Some(Commands::Make {
			path,
			recursive,
			no_exec,
			intro,
			exclude,
		}) => run_make(&args, path, *recursive, *no_exec, *intro, exclude),
		Some(Commands::Comment(files)) => run_filter(&args, files, CommentFilter),
		Some(Commands::Include(files)) => {
			run_filter(&args, files, IncludeFilter::new(document_dir(&files.input)))
		}
		Some(Commands::Toc(files)) => run_filter(&args, files, TocFilter),
		Some(Commands::Exec { files, no_exec }) => run_exec(&args, files, &invocation_dir, *no_exec),
		Some(Commands::RemoveIntro(files)) => run_filter(&args, files, BlankLineFilter),
		None => {
			eprintln!("No subcommand specified. Run `mdoc --help` for usage.");
			process::exit(1);
		}
	};

	if let Err(e) = result {
		// Try to render through miette for rich diagnostics with help text
		// and error codes.
		match e.downcast::<MdocError>() {
			Ok(mdoc_err) => {
				let report: miette::Report = (*mdoc_err).into();
				eprintln!("{report:?}");
			}
			Err(e) => {
				eprintln!("{} {e}", colored!("error:", red));
			}
		}
		process::exit(2);
	}
}

/// Logs go to stderr so they never mix with a document written to stdout.
/// `RUST_LOG` takes precedence over `--verbose`.
fn init_tracing(verbose: bool, use_color: bool) {
	let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
		if verbose {
			EnvFilter::new("mdoc_core=info,mdoc=info")
		} else {
			EnvFilter::new("warn")
		}
	});

	tracing_subscriber::fmt()
		.with_env_filter(filter)
		.with_writer(std::io::stderr)
		.with_ansi(use_color)
		.with_target(false)
		.init();
}

fn pipeline_options(args: &MdocCli, no_exec: bool, intro: bool) -> PipelineOptions {
	PipelineOptions {
		no_exec,
		verbose: args.verbose,
		collapse_blank_lines: intro,
	}
}

/// Directory a document's includes and code blocks are resolved against.
fn document_dir(input: &Path) -> PathBuf {
	let dir = match input.parent() {
		Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
		_ => PathBuf::from("."),
	};

	dir.canonicalize().unwrap_or(dir)
}

/// Use `--config` when given, otherwise discover `mdoc.toml` in `dir`.
fn load_config(args: &MdocCli, dir: &Path) -> MdocResult<MdocConfig> {
	match &args.config {
		Some(path) => MdocConfig::load_file(path),
		None => Ok(MdocConfig::load(dir)?.unwrap_or_default()),
	}
}

fn read_input(path: &Path) -> MdocResult<String> {
	std::fs::read_to_string(path).map_err(|e| {
		MdocError::ReadInput {
			path: path.display().to_string(),
			reason: e.to_string(),
		}
	})
}

fn write_output(output: Option<&Path>, content: &str) -> Result<(), Box<dyn std::error::Error>> {
	match output {
		Some(path) if path.as_os_str() != STDOUT_MARKER => {
			std::fs::write(path, content)?;
			tracing::info!(path = %path.display(), "wrote output");
		}
		_ => {
			let mut stdout = std::io::stdout().lock();
			stdout.write_all(content.as_bytes())?;
			stdout.flush()?;
		}
	}

	Ok(())
}

fn run_parse(
	args: &MdocCli,
	input: &Path,
	output: Option<&Path>,
	workspace: &Path,
	md: bool,
	no_exec: bool,
	intro: bool,
) -> Result<(), Box<dyn std::error::Error>> {
	let options = pipeline_options(args, no_exec, intro);
	let rendered = render_document(args, input, workspace, &options)?;

	let markdown_path = md.then(|| input.with_extension(OUTPUT_EXTENSION));
	write_output(markdown_path.as_deref().or(output), &rendered)
}

/// Run the standard pipeline over `input`. Includes resolve against the
/// document's directory, code runs in `workspace`.
fn render_document(
	args: &MdocCli,
	input: &Path,
	workspace: &Path,
	options: &PipelineOptions,
) -> MdocResult<String> {
	let content = read_input(input)?;
	let dir = document_dir(input);
	let config = load_config(args, &dir)?;

	let mut pipeline = Pipeline::with_workspace(options, &config, &dir, workspace);
	pipeline.run(&content)
}

fn run_make(
	args: &MdocCli,
	path: &Path,
	recursive: bool,
	no_exec: bool,
	intro: bool,
	exclude: &[String],
) -> Result<(), Box<dyn std::error::Error>> {
	if !path.is_dir() {
		return Err(MdocError::ReadInput {
			path: path.display().to_string(),
			reason: "not a directory".to_string(),
		}
		.into());
	}

	let excludes = build_excludes(exclude)?;
	let sources = find_sources(path, recursive, &excludes);

	if sources.is_empty() {
		println!("No .{SOURCE_EXTENSION} files found.");
		return Ok(());
	}

	let options = pipeline_options(args, no_exec, intro);
	for source in &sources {
		tracing::info!(file = %source.display(), "building document");
		let rendered = render_document(args, source, &document_dir(source), &options)?;
		std::fs::write(source.with_extension(OUTPUT_EXTENSION), rendered)?;

		if args.verbose {
			println!("  {}", make_relative(source, path));
		}
	}

	println!(
		"{}",
		colored!(format!("Built {} document(s).", sources.len()), green)
	);

	Ok(())
}

fn build_excludes(patterns: &[String]) -> MdocResult<GlobSet> {
	let mut builder = GlobSetBuilder::new();
	for pattern in patterns {
		let glob =
			Glob::new(pattern).map_err(|e| MdocError::InvalidExcludePattern(format!("{pattern}: {e}")))?;
		builder.add(glob);
	}

	builder
		.build()
		.map_err(|e| MdocError::InvalidExcludePattern(e.to_string()))
}

/// Collect `.mdoc` files under `root` in sorted order, skipping excluded
/// file names.
fn find_sources(root: &Path, recursive: bool, excludes: &GlobSet) -> Vec<PathBuf> {
	let mut walker = WalkBuilder::new(root);
	if !recursive {
		walker.max_depth(Some(1));
	}

	let mut sources = Vec::new();
	for entry in walker.build() {
		let entry = match entry {
			Ok(entry) => entry,
			Err(e) => {
				tracing::warn!(error = %e, "skipping unreadable path");
				continue;
			}
		};

		if !entry.file_type().is_some_and(|kind| kind.is_file()) {
			continue;
		}

		let path = entry.path();
		if path.extension().is_none_or(|ext| ext != SOURCE_EXTENSION) {
			continue;
		}

		if path
			.file_name()
			.is_some_and(|name| excludes.is_match(Path::new(name)))
		{
			tracing::debug!(file = %path.display(), "excluded");
			continue;
		}

		sources.push(path.to_path_buf());
	}

	sources.sort();
	sources
}

fn run_exec(
	args: &MdocCli,
	files: &FilterArgs,
	workspace: &Path,
	no_exec: bool,
) -> Result<(), Box<dyn std::error::Error>> {
	let options = pipeline_options(args, no_exec, false);
	let config = load_config(args, &document_dir(&files.input))?;

	run_filter(args, files, ExecuteCodeFilter::new(&options, &config, workspace))
}

/// Run a single filter from INPUT to OUTPUT.
fn run_filter(
	args: &MdocCli,
	files: &FilterArgs,
	filter: impl Filter + 'static,
) -> Result<(), Box<dyn std::error::Error>> {
	let content = read_input(&files.input)?;

	let mut pipeline = Pipeline::new(&pipeline_options(args, false, false));
	pipeline.add_filter(filter);
	let rendered = pipeline.run(&content)?;

	write_output(files.output.as_deref(), &rendered)
}

fn make_relative(path: &Path, root: &Path) -> String {
	path.strip_prefix(root)
		.unwrap_or(path)
		.display()
		.to_string()
}
