//! Group tags and comment blocks stored on a source record.
//!
//! Tags are kept as one delimited string (`a,b,c`); comments are blocks
//! separated by a blank line, and blocks written by the checker start with
//! [`ERROR_PREFIX`]. Both encodings are shared with other tools that read the
//! same records, so they are parsed and rewritten here rather than patched in
//! place.

/// Marker that starts a machine-written error block in a comment.
pub const ERROR_PREFIX: &str = "Error: ";

const BLOCK_SEPARATOR: &str = "\n\n";

fn split_groups(group: Option<&str>) -> Vec<&str> {
    group
        .unwrap_or("")
        .split([',', ';', '，'])
        .map(str::trim)
        .filter(|g| !g.is_empty())
        .collect()
}

fn join_groups(groups: Vec<&str>) -> Option<String> {
    if groups.is_empty() {
        None
    } else {
        Some(groups.join(","))
    }
}

/// True if `tag` is one of the tags in `group`.
pub fn has_group(group: Option<&str>, tag: &str) -> bool {
    split_groups(group).contains(&tag.trim())
}

/// Adds `tag` unless already present. Other tags keep their order.
pub fn add_group(group: Option<&str>, tag: &str) -> Option<String> {
    let mut groups = split_groups(group);
    let tag = tag.trim();
    if !tag.is_empty() && !groups.contains(&tag) {
        groups.push(tag);
    }
    join_groups(groups)
}

/// Removes every occurrence of `tag`; a no-op when absent.
pub fn remove_group(group: Option<&str>, tag: &str) -> Option<String> {
    let tag = tag.trim();
    let groups = split_groups(group)
        .into_iter()
        .filter(|g| *g != tag)
        .collect();
    join_groups(groups)
}

/// True if any block of `comment` is an error block.
pub fn has_error_block(comment: Option<&str>) -> bool {
    comment
        .map(|c| c.split(BLOCK_SEPARATOR).any(|b| b.starts_with(ERROR_PREFIX)))
        .unwrap_or(false)
}

/// Folds `message` into one block: blank lines would split it and leave
/// the tail behind as an unmarked block.
fn single_block(message: &str) -> String {
    message
        .lines()
        .map(str::trim_end)
        .filter(|l| !l.trim().is_empty())
        .collect::<Vec<_>>()
        .join("\n")
}

/// Prepends `Error: <message>` as its own block, unless the comment already
/// carries an error block from an earlier check.
pub fn prepend_error(comment: Option<&str>, message: &str) -> Option<String> {
    if has_error_block(comment) {
        return comment.map(str::to_string);
    }
    let block = format!("{}{}", ERROR_PREFIX, single_block(message));
    match comment {
        Some(existing) if !existing.is_empty() => {
            Some(format!("{}{}{}", block, BLOCK_SEPARATOR, existing))
        }
        _ => Some(block),
    }
}

/// Drops every error block, keeping the remaining blocks intact.
pub fn strip_errors(comment: Option<&str>) -> Option<String> {
    let kept: Vec<&str> = comment?
        .split(BLOCK_SEPARATOR)
        .filter(|b| !b.starts_with(ERROR_PREFIX))
        .collect();
    let joined = kept.join(BLOCK_SEPARATOR);
    if joined.trim().is_empty() {
        None
    } else {
        Some(joined)
    }
}
