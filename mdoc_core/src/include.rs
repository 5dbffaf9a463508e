use std::path::Path;
use std::path::PathBuf;
use std::sync::LazyLock;

use regex::Regex;

use crate::Filter;
use crate::MdocError;
use crate::MdocResult;

static INCLUDE_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
	Regex::new(r"@\[([^\]\n]*)\]\(([^)\n]*)\)").expect("include pattern is valid")
});

/// Replaces `@[<options>](<path>)` directives with the content of the
/// referenced file.
#[derive(Debug, Clone)]
pub struct IncludeFilter {
	base_dir: PathBuf,
}

impl IncludeFilter {
	/// Relative include paths are resolved against `base_dir`.
	pub fn new(base_dir: impl Into<PathBuf>) -> Self {
		Self {
			base_dir: base_dir.into(),
		}
	}
}

impl Filter for IncludeFilter {
	fn name(&self) -> &'static str {
		"include"
	}

	fn run(&mut self, document: &str) -> MdocResult<String> {
		resolve_includes(document, &self.base_dir)
	}
}

/// Which part of an included file to keep.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct IncludeOptions {
	/// Start marker. Text begins on the line after the first line that
	/// contains it.
	pub ini: Option<String>,
	/// End marker. Text stops before the next line that contains it.
	pub end: Option<String>,
}

impl IncludeOptions {
	/// Parse the bracketed option list, e.g. `ini=%% 1,end=%%`. Keys may be
	/// separated from values by `=` or `:`.
	pub fn parse(raw: &str) -> MdocResult<Self> {
		let mut options = Self::default();

		for part in raw.split(',') {
			if part.trim().is_empty() {
				continue;
			}

			let Some((key, value)) = part.split_once(['=', ':']) else {
				return Err(MdocError::InvalidIncludeOptions(raw.to_string()));
			};

			match key.trim() {
				"ini" => options.ini = Some(value.to_string()),
				"end" => options.end = Some(value.to_string()),
				_ => return Err(MdocError::InvalidIncludeOptions(raw.to_string())),
			}
		}

		Ok(options)
	}
}

/// Replace every include directive in `document`. Included text is inserted
/// verbatim and is not scanned for further directives.
pub fn resolve_includes(document: &str, base_dir: &Path) -> MdocResult<String> {
	let mut result = String::with_capacity(document.len());
	let mut last_end = 0;

	for caps in INCLUDE_PATTERN.captures_iter(document) {
		let Some(whole) = caps.get(0) else {
			continue;
		};

		let options = IncludeOptions::parse(&caps[1])?;
		let target = caps[2].trim();
		let path = base_dir.join(target);
		tracing::debug!(path = %path.display(), "including file");

		let content = std::fs::read_to_string(&path).map_err(|e| {
			MdocError::IncludeNotFound {
				path: target.to_string(),
				reason: e.to_string(),
			}
		})?;

		result.push_str(&document[last_end..whole.start()]);
		result.push_str(&extract_section(&content, &options));
		last_end = whole.end();
	}

	result.push_str(&document[last_end..]);
	Ok(result)
}

/// Select the part of `content` described by `options` and drop one trailing
/// newline.
pub fn extract_section(content: &str, options: &IncludeOptions) -> String {
	let mut text = String::new();

	match (&options.ini, &options.end) {
		(None, None) => text.push_str(content),
		(Some(ini), end) => {
			let mut inside = false;
			for line in content.split_inclusive('\n') {
				if inside {
					if end.as_ref().is_some_and(|end| line.contains(end.as_str())) {
						break;
					}
					text.push_str(line);
				} else if line.contains(ini.as_str()) {
					inside = true;
				}
			}
		}
		(None, Some(end)) => {
			for line in content.split_inclusive('\n') {
				if line.contains(end.as_str()) {
					break;
				}
				text.push_str(line);
			}
		}
	}

	if text.ends_with('\n') {
		text.pop();
	}

	text
}
