use std::str::FromStr;
use std::sync::LazyLock;

use regex::Regex;
use rust_decimal::Decimal;
use serde::Serialize;

use crate::parse::table::{TableSection, parse_all_tables, strip_bold};

static AMOUNT: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"-?\d+(?:\.\d+)?").expect("valid amount regex"));

/// One priced row from a budget or bill-of-materials table
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BudgetLine {
    /// Nearest markdown heading above the table, empty if none
    pub section: String,
    pub item: String,
    #[serde(with = "rust_decimal::serde::float_option")]
    pub quantity: Option<Decimal>,
    #[serde(with = "rust_decimal::serde::float_option")]
    pub unit_cost: Option<Decimal>,
    #[serde(with = "rust_decimal::serde::float_option")]
    pub total: Option<Decimal>,
}

impl BudgetLine {
    /// The stated total, else quantity × unit cost, else the unit cost alone
    pub fn amount(&self) -> Option<Decimal> {
        self.total.or_else(|| match (self.quantity, self.unit_cost) {
            (Some(q), Some(u)) => q.checked_mul(u),
            (None, Some(u)) => Some(u),
            _ => None,
        })
    }
}

/// Money-ish cell to a decimal: `$1,250.50` → `1250.50`. `None` when no number.
pub fn parse_amount(cell: &str) -> Option<Decimal> {
    let cleaned: String = cell
        .chars()
        .filter(|c| !matches!(c, '$' | ',' | '*') && !c.is_whitespace())
        .collect();
    let number = AMOUNT.find(&cleaned)?;
    Decimal::from_str(number.as_str()).ok()
}

struct BudgetColumns {
    item: usize,
    quantity: Option<usize>,
    unit_cost: Option<usize>,
    total: Option<usize>,
}

impl BudgetColumns {
    /// `None` when the table has no cost-like column
    fn locate(table: &TableSection) -> Option<Self> {
        let lower: Vec<String> = table.headers.iter().map(|h| h.to_lowercase()).collect();
        let find = |pred: &dyn Fn(&str) -> bool| lower.iter().position(|h| pred(h.as_str()));

        let unit_cost = find(&|h| {
            (h.contains("unit") || h.contains("rate"))
                && (h.contains("cost") || h.contains("price") || h.contains("rate"))
        });
        let total = find(&|h| h.contains("total"))
            .or_else(|| find(&|h| h.contains("amount")))
            .or_else(|| {
                lower.iter().enumerate().position(|(idx, h)| {
                    Some(idx) != unit_cost && (h.contains("cost") || h.contains("price"))
                })
            });
        if unit_cost.is_none() && total.is_none() {
            return None;
        }

        let item = find(&|h| {
            ["item", "description", "category", "material", "task", "line"]
                .iter()
                .any(|word| h.contains(word))
        })
        .unwrap_or(0);
        let quantity = find(&|h| h.contains("qty") || h.contains("quantity"));

        Some(BudgetColumns {
            item,
            quantity,
            unit_cost,
            total,
        })
    }
}

/// True for summary rows such as "Total", "Subtotal" or "Grand Total"
fn is_summary_item(item: &str) -> bool {
    let lower = item.trim().trim_end_matches(':').trim().to_lowercase();
    lower.ends_with("total")
}

/// Nearest `#` heading at or above `line`
fn section_for(lines: &[&str], line: usize) -> String {
    lines[..line.min(lines.len())]
        .iter()
        .rev()
        .find(|l| l.trim_start().starts_with('#'))
        .map(|l| strip_bold(l.trim_start().trim_start_matches('#')))
        .unwrap_or_default()
}

/// Pull every priced row out of a report.
pub fn extract_budget(report: &str) -> Vec<BudgetLine> {
    let lines: Vec<&str> = report.lines().collect();
    let mut out = Vec::new();

    for table in parse_all_tables(&lines, 0) {
        let Some(columns) = BudgetColumns::locate(&table) else {
            tracing::trace!(line = table.header_line, "table has no cost column");
            continue;
        };
        let section = section_for(&lines, table.header_line);

        for row in &table.rows {
            let item = table.cell(row, Some(columns.item)).to_string();
            if item.is_empty() || is_summary_item(&item) {
                continue;
            }
            let line = BudgetLine {
                section: section.clone(),
                item,
                quantity: parse_amount(table.cell(row, columns.quantity)),
                unit_cost: parse_amount(table.cell(row, columns.unit_cost)),
                total: parse_amount(table.cell(row, columns.total)),
            };
            if line.amount().is_some() {
                out.push(line);
            }
        }
    }

    tracing::debug!(lines = out.len(), "extracted budget lines");
    out
}

/// Sum of every line's amount
pub fn budget_total(lines: &[BudgetLine]) -> Decimal {
    lines.iter().filter_map(BudgetLine::amount).sum()
}
