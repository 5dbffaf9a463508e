use std::path::PathBuf;
use std::sync::LazyLock;

use regex::Regex;

/// Opening fence of an executable block: three backticks, the language
/// token, the `exec` keyword and optional option tokens. The language token
/// may be glued to the keyword (`shexec`) or separated by whitespace.
static OPENING_FENCE: LazyLock<Regex> = LazyLock::new(|| {
	Regex::new(r"^```[ \t]*(\S+?)[ \t]*exec(?:[ \t]+(.*?))?[ \t]*$")
		.expect("opening fence pattern is valid")
});

const CLOSING_FENCE: &str = "```";

/// A fenced region marked for execution.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CodeBlock {
	/// The language token before `exec`.
	pub language: String,
	/// Whitespace separated tokens after `exec`.
	pub options: Vec<String>,
	/// Text between the fence lines, line breaks included.
	pub body: String,
}

impl CodeBlock {
	pub fn exec_options(&self) -> ExecOptions {
		ExecOptions::parse(&self.options)
	}
}

/// Recognized fence options.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExecOptions {
	/// `--path <dir>`: directory to run the code in.
	pub path: Option<PathBuf>,
	/// `--no-code`: do not echo the source.
	pub no_code: bool,
	/// `--no-echo`: do not echo the result.
	pub no_echo: bool,
	/// `--raw`: emit the result without a surrounding fence.
	pub raw: bool,
}

impl ExecOptions {
	pub fn parse(tokens: &[String]) -> Self {
		let mut options = Self::default();
		let mut tokens = tokens.iter();

		while let Some(token) = tokens.next() {
			match token.as_str() {
				"--path" => {
					match tokens.next() {
						Some(dir) => options.path = Some(PathBuf::from(dir)),
						None => tracing::warn!("`--path` is missing its directory, ignoring it"),
					}
				}
				"--no-code" => options.no_code = true,
				"--no-echo" => options.no_echo = true,
				"--raw" => options.raw = true,
				other => tracing::debug!(option = other, "ignoring unknown fence option"),
			}
		}

		options
	}
}

/// A piece of the scanned document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Segment<'a> {
	/// Text outside any executable block, passed through unchanged.
	Literal(&'a str),
	/// A complete executable block.
	Code(CodeBlock),
}

/// Lazily split `document` into literal text and executable blocks, in
/// document order.
///
/// A block whose closing fence never appears is returned as literal text,
/// from its opening line to the end of the document, and nothing after it is
/// scanned.
pub fn scan(document: &str) -> Scanner<'_> {
	Scanner {
		source: document,
		offset: 0,
	}
}

/// Iterator returned by [`scan`].
#[derive(Debug, Clone)]
pub struct Scanner<'a> {
	source: &'a str,
	offset: usize,
}

impl<'a> Iterator for Scanner<'a> {
	type Item = Segment<'a>;

	fn next(&mut self) -> Option<Self::Item> {
		if self.offset >= self.source.len() {
			return None;
		}

		let rest = &self.source[self.offset..];
		let mut cursor = 0;

		for line in rest.split_inclusive('\n') {
			let Some((language, options)) = parse_opening_fence(line) else {
				cursor += line.len();
				continue;
			};

			// Emit the text before the fence first; the fence is picked up
			// again on the next call.
			if cursor > 0 {
				self.offset += cursor;
				return Some(Segment::Literal(&rest[..cursor]));
			}

			let body_start = line.len();
			let mut body_end = body_start;
			for body_line in rest[body_start..].split_inclusive('\n') {
				if is_closing_fence(body_line) {
					self.offset += body_end + body_line.len();
					return Some(Segment::Code(CodeBlock {
						language,
						options,
						body: rest[body_start..body_end].to_string(),
					}));
				}
				body_end += body_line.len();
			}

			tracing::warn!(
				language = %language,
				"execution fence is never closed, passing the rest of the document through"
			);
			self.offset = self.source.len();
			return Some(Segment::Literal(rest));
		}

		self.offset = self.source.len();
		Some(Segment::Literal(rest))
	}
}

/// Parse an opening fence line into its language token and option tokens.
pub fn parse_opening_fence(line: &str) -> Option<(String, Vec<String>)> {
	let line = line.trim_end_matches(['\n', '\r']);
	let caps = OPENING_FENCE.captures(line)?;
	let language = caps.get(1)?.as_str().to_string();
	let options = caps
		.get(2)
		.map(|m| m.as_str().split_whitespace().map(str::to_string).collect())
		.unwrap_or_default();

	Some((language, options))
}

/// Whether `line` is a bare closing fence.
pub fn is_closing_fence(line: &str) -> bool {
	line.trim_end() == CLOSING_FENCE
}
