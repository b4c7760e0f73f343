use chrono::NaiveDateTime;
use serde::Serialize;
use std::fmt;
use tabled::Tabled;

pub const INVOICE_NO: &str = "Invoice_No";
pub const PROJECT_ID: &str = "Project_ID";
pub const DAYS_OVERDUE: &str = "Days_Overdue";
pub const OUTSTANDING_AMOUNT: &str = "Outstanding_Amount";
pub const INVOICE_AMOUNT: &str = "Invoice_Amount";
pub const BUDGETED_COST: &str = "Budgeted_Cost";
pub const CONTRACT_VALUE: &str = "Contract_Value";
pub const COMPLEXITY_SCORE: &str = "Complexity_Score";
pub const RISK_LEVEL: &str = "Risk_Level";
pub const RISK_REASONS: &str = "Risk_Reasons";

/// A single decoded spreadsheet value.
#[derive(Debug, Clone, PartialEq)]
pub enum Cell {
    Empty,
    Number(f64),
    Text(String),
    Bool(bool),
    DateTime(NaiveDateTime),
}

impl Cell {
    pub fn text(s: impl Into<String>) -> Self {
        Cell::Text(s.into())
    }

    pub fn is_empty(&self) -> bool {
        match self {
            Cell::Empty => true,
            Cell::Text(s) => s.trim().is_empty(),
            _ => false,
        }
    }
}

impl fmt::Display for Cell {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Cell::Empty => Ok(()),
            // Integral values print without a trailing ".0", the way a sheet shows them.
            Cell::Number(n) if n.fract() == 0.0 && n.abs() < 1e15 => write!(f, "{}", *n as i64),
            Cell::Number(n) => write!(f, "{}", n),
            Cell::Text(s) => f.write_str(s),
            Cell::Bool(b) => write!(f, "{}", if *b { "TRUE" } else { "FALSE" }),
            Cell::DateTime(dt) => write!(f, "{}", dt.format("%Y-%m-%d %H:%M:%S")),
        }
    }
}

/// One sheet's worth of data: a header row plus data rows of equal width.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Table {
    pub name: String,
    pub headers: Vec<String>,
    pub rows: Vec<Vec<Cell>>,
}

impl Table {
    pub fn new(name: impl Into<String>, headers: Vec<String>) -> Self {
        Table {
            name: name.into(),
            headers,
            rows: Vec::new(),
        }
    }

    /// Append a row, padding with `Empty` or truncating to the header width.
    pub fn push_row(&mut self, mut row: Vec<Cell>) {
        row.resize(self.headers.len(), Cell::Empty);
        self.rows.push(row);
    }

    pub fn column_index(&self, column: &str) -> Option<usize> {
        self.headers.iter().position(|h| h == column)
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn cell(&self, row: usize, column: &str) -> Option<&Cell> {
        let idx = self.column_index(column)?;
        self.rows.get(row).and_then(|r| r.get(idx))
    }

    /// Set every row's value in `column`, adding the column at the end if absent.
    pub fn set_column(&mut self, column: &str, values: Vec<Cell>) {
        let idx = match self.column_index(column) {
            Some(i) => i,
            None => {
                self.headers.push(column.to_string());
                for r in &mut self.rows {
                    r.push(Cell::Empty);
                }
                self.headers.len() - 1
            }
        };
        for (r, v) in self.rows.iter_mut().zip(values) {
            r[idx] = v;
        }
    }
}

/// Which of the three uploads a table came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputKind {
    ArAging,
    Billing,
    Contract,
}

impl InputKind {
    pub fn label(&self) -> &'static str {
        match self {
            InputKind::ArAging => "AR Aging file",
            InputKind::Billing => "Billing file",
            InputKind::Contract => "Contract file",
        }
    }

    /// Columns the scorer and the joins read from this source.
    pub fn required_columns(&self) -> &'static [&'static str] {
        match self {
            InputKind::ArAging => &[INVOICE_NO, DAYS_OVERDUE, OUTSTANDING_AMOUNT, INVOICE_AMOUNT],
            InputKind::Billing => &[INVOICE_NO, PROJECT_ID, BUDGETED_COST],
            InputKind::Contract => &[PROJECT_ID, CONTRACT_VALUE, COMPLEXITY_SCORE],
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum RiskLevel {
    Low,
    Medium,
    High,
}

impl RiskLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            RiskLevel::Low => "Low",
            RiskLevel::Medium => "Medium",
            RiskLevel::High => "High",
        }
    }

    /// Bucket a summed rule score, checked high to low.
    pub fn from_score(score: u32) -> Self {
        if score >= 5 {
            RiskLevel::High
        } else if score >= 3 {
            RiskLevel::Medium
        } else {
            RiskLevel::Low
        }
    }
}

impl fmt::Display for RiskLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The scorer's verdict for one row. `score` never reaches the output table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RiskAssessment {
    pub score: u32,
    pub level: RiskLevel,
    pub reasons: Vec<&'static str>,
}

impl RiskAssessment {
    pub fn reasons_text(&self) -> String {
        self.reasons.join(", ")
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Tabled)]
pub struct RiskSummary {
    #[serde(rename = "TotalInvoices")]
    #[tabled(rename = "Total Invoices")]
    pub total: usize,
    #[serde(rename = "HighRisk")]
    #[tabled(rename = "High Risk")]
    pub high: usize,
    #[serde(rename = "MediumRisk")]
    #[tabled(rename = "Medium Risk")]
    pub medium: usize,
    #[serde(rename = "LowRisk")]
    #[tabled(rename = "Low Risk")]
    pub low: usize,
}
