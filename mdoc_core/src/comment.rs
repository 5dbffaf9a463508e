use crate::Filter;
use crate::MdocResult;

const OPEN_MARKER: &str = "<!--";
const CLOSE_MARKER: &str = "-->";

/// Removes `<!-- ... -->` comments, markers included, so their content never
/// reaches later filters.
#[derive(Debug, Clone, Copy, Default)]
pub struct CommentFilter;

impl Filter for CommentFilter {
	fn name(&self) -> &'static str {
		"comment"
	}

	fn run(&mut self, document: &str) -> MdocResult<String> {
		Ok(strip_comments(document))
	}
}

/// Delete every comment from `content`. A comment that is opened but never
/// closed is left in place together with everything after it.
pub fn strip_comments(content: &str) -> String {
	let mut result = String::with_capacity(content.len());
	let mut rest = content;

	while let Some(open_offset) = rest.find(OPEN_MARKER) {
		let after_open = open_offset + OPEN_MARKER.len();
		let Some(close_offset) = rest[after_open..].find(CLOSE_MARKER) else {
			tracing::warn!("comment opened without a closing `-->`, keeping the remaining text");
			break;
		};

		result.push_str(&rest[..open_offset]);
		rest = &rest[after_open + close_offset + CLOSE_MARKER.len()..];
	}

	result.push_str(rest);
	result
}
