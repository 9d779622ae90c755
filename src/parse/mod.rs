pub mod budget;
pub mod date;
pub mod report;
pub mod table;

pub use budget::{BudgetLine, budget_total, extract_budget, parse_amount};
pub use date::{add_days, format_iso_date, format_optional_date, parse_flexible_date, span_days};
pub use report::{DialectRow, ParsedReport, ReportDialect, detect_dialect, fill_phases, parse_report};
pub use table::{TableSection, parse_all_tables, parse_table_from_lines};
