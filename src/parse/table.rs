/// A markdown table lifted out of a report
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TableSection {
    /// Header cells, trimmed and with bold markers removed
    pub headers: Vec<String>,
    /// Data rows, each with at least one non-empty cell
    pub rows: Vec<Vec<String>>,
    /// Line index of the header row
    pub header_line: usize,
    /// Line index where scanning stopped (first line not part of the table)
    pub end_line: usize,
}

impl TableSection {
    /// Index of the first header containing `needle` (case-insensitive)
    pub fn column(&self, needle: &str) -> Option<usize> {
        let needle = needle.to_lowercase();
        self.headers
            .iter()
            .position(|h| h.to_lowercase().contains(&needle))
    }

    /// Index of the first header equal to `name` (case-insensitive)
    pub fn column_exact(&self, name: &str) -> Option<usize> {
        self.headers.iter().position(|h| h.eq_ignore_ascii_case(name))
    }

    /// Cell text for a row, empty when the column is absent or the row is short
    pub fn cell<'a>(&self, row: &'a [String], column: Option<usize>) -> &'a str {
        column
            .and_then(|idx| row.get(idx))
            .map(|s| s.as_str())
            .unwrap_or("")
    }
}

/// Extract the first table at or after `start_idx`.
///
/// The header is the first `|` row that is not a separator. Data rows begin
/// two lines below it (the separator is skipped). The table ends at a `###`
/// heading, a "Ready for the next prompt" or `*Note:` line, or the first
/// line that does not start with `|`. Returns `None` if no header or no
/// non-empty rows were found.
pub fn parse_table_from_lines(lines: &[&str], start_idx: usize) -> Option<TableSection> {
    let header_line = (start_idx..lines.len()).find(|&idx| {
        let line = lines[idx].trim_start();
        line.starts_with('|') && !line.contains("---")
    })?;
    let headers = split_row(lines[header_line]);

    let mut rows = Vec::new();
    let mut idx = header_line + 2;
    while idx < lines.len() {
        let line = lines[idx].trim_start();
        if is_table_terminator(line) || !line.starts_with('|') {
            break;
        }
        let cells = split_row(line);
        if cells.iter().any(|c| !c.is_empty()) {
            rows.push(cells);
        }
        idx += 1;
    }

    if rows.is_empty() {
        return None;
    }

    Some(TableSection {
        headers,
        rows,
        header_line,
        end_line: idx.min(lines.len()),
    })
}

/// Extract every table from `start_idx` onward, in order
pub fn parse_all_tables(lines: &[&str], start_idx: usize) -> Vec<TableSection> {
    let mut tables = Vec::new();
    let mut idx = start_idx;
    while idx < lines.len() {
        match parse_table_from_lines(lines, idx) {
            Some(table) => {
                idx = table.end_line.max(table.header_line + 1);
                tables.push(table);
            }
            None => {
                // A header without rows: move past it and keep looking
                match next_header_line(lines, idx) {
                    Some(header) => idx = header + 1,
                    None => break,
                }
            }
        }
    }
    tables
}

fn next_header_line(lines: &[&str], start_idx: usize) -> Option<usize> {
    (start_idx..lines.len()).find(|&idx| {
        let line = lines[idx].trim_start();
        line.starts_with('|') && !line.contains("---")
    })
}

fn is_table_terminator(line: &str) -> bool {
    line.starts_with("###") || line.starts_with("Ready for the next prompt") || line.starts_with("*Note:")
}

/// Split a `| a | b |` row into trimmed cells with `**` removed.
/// Only the empty cells produced by the outer pipes are dropped.
pub fn split_row(line: &str) -> Vec<String> {
    let mut cells: Vec<String> = line
        .trim()
        .split('|')
        .map(|cell| strip_bold(cell.trim()))
        .collect();
    if cells.first().is_some_and(|c| c.is_empty()) {
        cells.remove(0);
    }
    if cells.last().is_some_and(|c| c.is_empty()) {
        cells.pop();
    }
    cells
}

/// Remove every `**` bold marker
pub fn strip_bold(s: &str) -> String {
    s.replace("**", "").trim().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn lines(s: &str) -> Vec<&str> {
        s.lines().collect()
    }

    #[test]
    fn test_split_row() {
        assert_eq!(split_row("| **Phase** | Task | 5 |"), vec!["Phase", "Task", "5"]);
        // interior empty cells survive
        assert_eq!(split_row("|  | B |  |"), vec!["", "B", ""]);
        assert_eq!(split_row("| a | | c |"), vec!["a", "", "c"]);
    }

    #[test]
    fn test_basic_table() {
        let input = lines(
            "Intro text\n\
             | Phase | Task |\n\
             |-------|------|\n\
             | Foundation | Dig |\n\
             | | Pour |\n\
             \n\
             After",
        );
        let table = parse_table_from_lines(&input, 0).unwrap();
        assert_eq!(table.headers, vec!["Phase", "Task"]);
        assert_eq!(table.rows, vec![vec!["Foundation", "Dig"], vec!["", "Pour"]]);
        assert_eq!(table.header_line, 1);
        assert_eq!(table.end_line, 5);
    }

    #[test]
    fn test_skips_leading_separator_when_finding_header() {
        let input = lines("|---|---|\n| A | B |\n|---|---|\n| 1 | 2 |");
        let table = parse_table_from_lines(&input, 0).unwrap();
        assert_eq!(table.headers, vec!["A", "B"]);
        assert_eq!(table.rows, vec![vec!["1", "2"]]);
    }

    #[test]
    fn test_stops_at_terminators() {
        for stop in ["### Next section", "Ready for the next prompt 20", "*Note: costs vary"] {
            let text = format!("| A |\n|---|\n| 1 |\n{}\n| 2 |", stop);
            let input = lines(&text);
            let table = parse_table_from_lines(&input, 0).unwrap();
            assert_eq!(table.rows.len(), 1, "terminator {:?}", stop);
            assert_eq!(table.end_line, 3);
        }
    }

    #[test]
    fn test_drops_all_empty_rows() {
        let input = lines("| A | B |\n|---|---|\n| | |\n| x | |");
        let table = parse_table_from_lines(&input, 0).unwrap();
        assert_eq!(table.rows, vec![vec!["x", ""]]);
    }

    #[test]
    fn test_none_without_header_or_rows() {
        assert_eq!(parse_table_from_lines(&lines("no tables here"), 0), None);
        assert_eq!(parse_table_from_lines(&lines("| A |\n|---|\n\ntext"), 0), None);
        assert_eq!(parse_table_from_lines(&[], 0), None);
    }

    #[test]
    fn test_parse_all_tables() {
        let input = lines(
            "| A |\n|---|\n| 1 |\n\n## Two\n\n| B |\n|---|\n\n| C |\n|---|\n| 3 |",
        );
        let tables = parse_all_tables(&input, 0);
        assert_eq!(tables.len(), 2);
        assert_eq!(tables[0].headers, vec!["A"]);
        assert_eq!(tables[1].headers, vec!["C"]);
        assert_eq!(tables[1].rows, vec![vec!["3"]]);
    }

    #[test]
    fn test_column_lookup() {
        let input = lines("| Phase | Task | Duration (Workdays) |\n|---|---|---|\n| P | T | 4 |");
        let table = parse_table_from_lines(&input, 0).unwrap();
        assert_eq!(table.column("duration"), Some(2));
        assert_eq!(table.column_exact("task"), Some(1));
        assert_eq!(table.column("cost"), None);
        assert_eq!(table.cell(&table.rows[0], table.column("cost")), "");
        assert_eq!(table.cell(&table.rows[0], Some(2)), "4");
    }
}
