/// How much of the decoded input the delimiter sniffer inspects.
pub const SNIFF_LIMIT: usize = 64 * 1024;

const DELIMITER_CANDIDATES: [char; 3] = [',', '\t', ';'];

#[derive(Debug, Clone, PartialEq)]
pub struct TableRow {
    pub line: usize, // 1-based line number of the row's first line
    pub fields: Vec<String>,
}

impl TableRow {
    pub fn is_blank(&self) -> bool {
        self.fields.iter().all(|f| f.trim().is_empty())
    }
}

/// Count delimiter candidates on the first non-blank line and pick the most
/// frequent one. Ties and all-zero counts fall back to comma.
pub fn detect_delimiter(sample: &str) -> char {
    let sample = clamp_to_char_boundary(sample, SNIFF_LIMIT);
    let Some(line) = sample.lines().find(|l| !l.trim().is_empty()) else {
        return ',';
    };

    let mut best = ',';
    let mut best_count = line.matches(',').count();
    for candidate in &DELIMITER_CANDIDATES[1..] {
        let count = line.matches(*candidate).count();
        if count > best_count {
            best = *candidate;
            best_count = count;
        }
    }
    best
}

fn clamp_to_char_boundary(text: &str, limit: usize) -> &str {
    if text.len() <= limit {
        return text;
    }
    let mut end = limit;
    while end > 0 && !text.is_char_boundary(end) {
        end -= 1;
    }
    &text[..end]
}

/// Tolerant delimited-row parser. Quotes only open a field when they appear
/// at the start of the field (after nothing but whitespace); a quote in the
/// middle of an unquoted field is literal text. Inside quotes, doubled
/// quotes escape and newlines are part of the field. CR, CRLF and LF all
/// terminate rows. This is deliberately looser than RFC 4180 so malformed
/// exports still parse.
pub fn parse_rows(text: &str, delimiter: char) -> Vec<TableRow> {
    let mut rows = Vec::new();
    let mut fields: Vec<String> = Vec::new();
    let mut field = String::new();
    let mut in_quotes = false;
    let mut line = 1usize;
    let mut row_line = 1usize;

    let mut chars = text.chars().peekable();
    while let Some(ch) = chars.next() {
        if in_quotes {
            match ch {
                '"' => {
                    if chars.peek() == Some(&'"') {
                        chars.next();
                        field.push('"');
                    } else {
                        in_quotes = false;
                    }
                }
                '\r' => {
                    if chars.peek() == Some(&'\n') {
                        chars.next();
                    }
                    field.push('\n');
                    line += 1;
                }
                '\n' => {
                    field.push('\n');
                    line += 1;
                }
                _ => field.push(ch),
            }
            continue;
        }

        match ch {
            '"' if field.trim().is_empty() => {
                field.clear();
                in_quotes = true;
            }
            c if c == delimiter => {
                fields.push(std::mem::take(&mut field));
            }
            '\r' | '\n' => {
                if ch == '\r' && chars.peek() == Some(&'\n') {
                    chars.next();
                }
                fields.push(std::mem::take(&mut field));
                rows.push(TableRow { line: row_line, fields: std::mem::take(&mut fields) });
                line += 1;
                row_line = line;
            }
            _ => field.push(ch),
        }
    }

    if !field.is_empty() || !fields.is_empty() {
        fields.push(field);
        rows.push(TableRow { line: row_line, fields });
    }

    rows
}
