//! Splitting of `.sql` asset files into individual statements.

/// One `;`-terminated statement and the comment lines directly above it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct ScriptStatement {
    /// Leading `--` comment lines with the marker and padding removed.
    pub comments: Vec<String>,
    pub sql: String,
}

/// Split `text` on `;` into statements.
///
/// Splitting is purely lexical: a semicolon inside a string literal or a
/// comment also ends a statement. Chunks holding only comments or whitespace
/// are dropped.
pub(crate) fn split_script(text: &str) -> Vec<ScriptStatement> {
    text.split(';').filter_map(parse_chunk).collect()
}

fn parse_chunk(chunk: &str) -> Option<ScriptStatement> {
    let mut comments = Vec::new();
    let mut lines = chunk.lines().peekable();

    while let Some(line) = lines.peek() {
        let trimmed = line.trim();
        if trimmed.is_empty() {
            lines.next();
        } else if let Some(comment) = trimmed.strip_prefix("--") {
            comments.push(comment.trim().to_string());
            lines.next();
        } else {
            break;
        }
    }

    let sql = lines.collect::<Vec<_>>().join("\n").trim().to_string();
    if sql.is_empty() {
        None
    } else {
        Some(ScriptStatement { comments, sql })
    }
}
