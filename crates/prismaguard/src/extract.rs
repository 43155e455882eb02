//! Marker-based SQL query extraction from Python source files.
//!
//! Two scanners behind one trait: [`CommentMarkerExtractor`] picks up queries
//! announced by a `#` comment on a preceding line; [`SqlCommentMarkerExtractor`]
//! picks up queries carrying the marker inside the SQL text itself.
//!
//! Both are heuristic text scans, not a Python grammar. Nested quotes, escaped
//! delimiters, and queries assembled by concatenation can fool them; that is
//! an accepted limitation of the marker convention.

use regex::Regex;

/// Comment-line markers that arm extraction for the next statement.
pub const COMMENT_MARKERS: &[&str] = &["# prismaguard", "# validate-sql"];

/// Markers recognized inside the SQL text itself (stripped before validation).
pub const SQL_MARKERS: &[&str] = &["-- prismaguard", "/* prismaguard */"];

const SQL_KEYWORDS: &[&str] = &["SELECT", "UPDATE", "INSERT", "DELETE", "WITH"];

/// A query pulled out of a source file, with its originating line number.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExtractedQuery {
    pub sql: String,
    pub line: usize,
}

/// Extraction strategy over raw source text.
pub trait QueryExtractor {
    fn extract(&self, source: &str) -> Vec<ExtractedQuery>;
}

fn starts_with_sql_keyword(candidate: &str) -> bool {
    let upper = candidate.trim_start().to_uppercase();
    SQL_KEYWORDS.iter().any(|kw| upper.starts_with(kw))
}

/// Extracts queries preceded by a marker comment line.
///
/// ```text
/// # prismaguard
/// cursor.execute("SELECT id FROM jobs WHERE id = %s", (job_id,))
/// ```
///
/// Also handles bare triple-quoted SQL blocks following a marker, with a
/// heuristic to tell a query literal apart from a docstring.
pub struct CommentMarkerExtractor {
    execute_pattern: Regex,
}

impl Default for CommentMarkerExtractor {
    fn default() -> Self {
        Self::new()
    }
}

impl CommentMarkerExtractor {
    pub fn new() -> Self {
        Self {
            execute_pattern: Regex::new(r#"(?i)cursor\.execute\s*\(\s*["'](.+?)["']"#)
                .expect("execute regex"),
        }
    }
}

impl QueryExtractor for CommentMarkerExtractor {
    fn extract(&self, source: &str) -> Vec<ExtractedQuery> {
        let lines: Vec<&str> = source.lines().collect();
        let mut queries = Vec::new();

        let mut validate_next = false;
        let mut in_triple_quote = false;
        let mut quote_char = "\"\"\"";
        let mut block_lines: Vec<String> = Vec::new();
        let mut block_start_line = 0usize;

        for (idx, line) in lines.iter().enumerate() {
            let line_no = idx + 1;
            let stripped = line.trim();

            if COMMENT_MARKERS.iter().any(|m| stripped.starts_with(m)) {
                validate_next = true;
                continue;
            }

            // Only lines following a marker are candidates.
            if !validate_next {
                continue;
            }

            if !in_triple_quote {
                if let Some(caps) = self.execute_pattern.captures(line) {
                    let query = caps[1].trim().to_string();
                    if starts_with_sql_keyword(&query) {
                        queries.push(ExtractedQuery {
                            sql: query,
                            line: line_no,
                        });
                        validate_next = false;
                        continue;
                    }
                }

                if stripped.contains("\"\"\"") || stripped.contains("'''") {
                    quote_char = if stripped.contains("\"\"\"") { "\"\"\"" } else { "'''" };
                    let is_docstring = looks_like_docstring(&lines, idx);

                    if stripped.matches(quote_char).count() == 2 {
                        // Opens and closes on the same line.
                        if !is_docstring
                            && let Some(content) = between_quotes(stripped, quote_char)
                        {
                            let sql = content.trim();
                            if starts_with_sql_keyword(sql) {
                                queries.push(ExtractedQuery {
                                    sql: sql.to_string(),
                                    line: line_no,
                                });
                                validate_next = false;
                            }
                        }
                    } else if !is_docstring {
                        in_triple_quote = true;
                        block_start_line = line_no;
                        let after = stripped.splitn(2, quote_char).nth(1).unwrap_or("");
                        if !after.is_empty() {
                            block_lines.push(after.to_string());
                        }
                    }
                }
            } else if line.contains(quote_char) {
                let before = line.split(quote_char).next().unwrap_or("");
                if !before.is_empty() {
                    block_lines.push(before.to_string());
                }

                let full_query = block_lines.join("\n").trim().to_string();
                if starts_with_sql_keyword(&full_query) {
                    queries.push(ExtractedQuery {
                        sql: full_query,
                        line: block_start_line,
                    });
                    validate_next = false;
                }

                in_triple_quote = false;
                block_lines.clear();
                block_start_line = 0;
            } else {
                block_lines.push((*line).to_string());
            }
        }

        queries
    }
}

/// Heuristic: does the triple-quoted string opening at `lines[idx]` look like
/// a docstring rather than a SQL literal?
fn looks_like_docstring(lines: &[&str], idx: usize) -> bool {
    // Module docstrings sit at the top of the file.
    if idx + 1 <= 5 {
        return true;
    }

    // Walk back a few lines; a definition header right above means docstring.
    let stop = (idx + 1).saturating_sub(10);
    for j in ((stop + 1)..idx).rev() {
        let prev = lines[j].trim();
        if prev.is_empty() {
            continue;
        }
        if prev.ends_with("):") || prev.ends_with("->") || prev.starts_with("class ") {
            return true;
        }
        // Plain code that is not a continuation line ends the search.
        if !prev.ends_with(',') && !prev.ends_with('(') {
            break;
        }
    }

    false
}

/// Content between the first pair of `quote` delimiters, if non-empty.
fn between_quotes<'a>(s: &'a str, quote: &str) -> Option<&'a str> {
    let start = s.find(quote)? + quote.len();
    let rest = &s[start..];
    let end = rest.find(quote)?;
    if end == 0 { None } else { Some(&rest[..end]) }
}

/// Extracts queries whose SQL text carries the marker itself.
///
/// ```text
/// cursor.execute("""
///     -- prismaguard
///     SELECT id FROM jobs WHERE id = %s
/// """, (job_id,))
/// ```
///
/// The marker is stripped from the returned query text.
pub struct SqlCommentMarkerExtractor {
    triple_double_pattern: Regex,
    triple_single_pattern: Regex,
    single_pattern: Regex,
}

impl Default for SqlCommentMarkerExtractor {
    fn default() -> Self {
        Self::new()
    }
}

impl SqlCommentMarkerExtractor {
    pub fn new() -> Self {
        Self {
            triple_double_pattern: Regex::new(r#"(?s)cursor\.execute\s*\(\s*"""(.*?)"""\s*[,)]"#)
                .expect("triple double quote regex"),
            triple_single_pattern: Regex::new(r"(?s)cursor\.execute\s*\(\s*'''(.*?)'''\s*[,)]")
                .expect("triple single quote regex"),
            single_pattern: Regex::new(r#"cursor\.execute\s*\(\s*["']([^"']+)["']\s*[,)]"#)
                .expect("single quote regex"),
        }
    }

    fn collect(&self, pattern: &Regex, source: &str, queries: &mut Vec<ExtractedQuery>) {
        for caps in pattern.captures_iter(source) {
            let (Some(whole), Some(body)) = (caps.get(0), caps.get(1)) else {
                continue;
            };

            let query = body.as_str().trim();
            if !SQL_MARKERS.iter().any(|m| query.contains(m)) {
                continue;
            }

            let mut clean = query.to_string();
            for marker in SQL_MARKERS {
                clean = clean.replace(marker, "");
            }
            let clean = clean.trim().to_string();

            if !starts_with_sql_keyword(&clean) {
                continue;
            }

            let line = source[..whole.start()].matches('\n').count() + 1;
            queries.push(ExtractedQuery { sql: clean, line });
        }
    }
}

impl QueryExtractor for SqlCommentMarkerExtractor {
    fn extract(&self, source: &str) -> Vec<ExtractedQuery> {
        let mut queries = Vec::new();
        self.collect(&self.triple_double_pattern, source, &mut queries);
        self.collect(&self.triple_single_pattern, source, &mut queries);
        self.collect(&self.single_pattern, source, &mut queries);
        queries.sort_by_key(|q| q.line);
        queries
    }
}
