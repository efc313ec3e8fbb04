//! Helpers for `/`-separated mapping paths.
//!
//! Mapping keys and request paths share one shape: segments joined by `/`,
//! where a `#` segment stands for a positional array index. Empty segments
//! (leading, trailing or doubled separators) carry no meaning and are
//! dropped by [`split_segments`].

/// Literal segment marking a positional index in a path template.
pub const PLACEHOLDER: &str = "#";

/// Splits a path on `/`, dropping empty segments and surrounding whitespace.
pub fn split_segments(path: &str) -> Vec<&str> {
    path.split('/').map(str::trim).filter(|segment| !segment.is_empty()).collect()
}

/// Joins segments back into a `/`-separated path.
pub fn join_segments<S: AsRef<str>>(segments: &[S]) -> String {
    let mut joined = String::new();
    for (position, segment) in segments.iter().enumerate() {
        if position > 0 {
            joined.push('/');
        }
        joined.push_str(segment.as_ref());
    }
    joined
}

/// Returns `true` when the segment is the `#` placeholder.
pub fn is_placeholder(segment: &str) -> bool {
    segment == PLACEHOLDER
}

/// Returns `true` when the segment is a literal, non-negative array index.
pub fn is_index_segment(segment: &str) -> bool {
    !segment.is_empty() && segment.bytes().all(|byte| byte.is_ascii_digit())
}
