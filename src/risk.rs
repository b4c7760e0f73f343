// Revenue-leakage risk scoring.
//
// Four fixed rules are checked against every invoice row. Each fired rule adds
// to the row's score and contributes a reason; the summed score is bucketed
// into Low/Medium/High. Scoring a row depends on nothing but that row.

use crate::error::RiskError;
use crate::types::{
    Cell, RiskAssessment, RiskLevel, Table, BUDGETED_COST, COMPLEXITY_SCORE, CONTRACT_VALUE,
    DAYS_OVERDUE, INVOICE_AMOUNT, OUTSTANDING_AMOUNT, RISK_LEVEL, RISK_REASONS,
};
use crate::util::parse_f64_safe;

pub const OVERDUE_DAYS_LIMIT: f64 = 90.0;
pub const OUTSTANDING_SHARE_LIMIT: f64 = 0.8;

pub const REASON_OVERDUE: &str = "Invoice overdue > 90 days";
pub const REASON_COST_OVERRUN: &str = "Cost overrun risk";
pub const REASON_OUTSTANDING: &str = "High outstanding exposure";
pub const REASON_COMPLEXITY: &str = "High project complexity";

/// The five fields the rules read. A `NaN` amount stands for a blank cell and
/// makes every comparison it takes part in false.
#[derive(Debug, Clone, PartialEq)]
pub struct RiskInputs {
    pub days_overdue: f64,
    pub budgeted_cost: f64,
    pub contract_value: f64,
    pub outstanding_amount: f64,
    pub invoice_amount: f64,
    pub complexity: Option<String>,
}

impl RiskInputs {
    /// Pull the scoring fields out of row `row` of `table`.
    pub fn from_row(table: &Table, row: usize) -> Result<Self, RiskError> {
        let number = |column: &str| numeric_field(table, row, column);
        let complexity = match field(table, row, COMPLEXITY_SCORE)? {
            Cell::Text(s) => Some(s.clone()),
            _ => None,
        };
        Ok(RiskInputs {
            days_overdue: number(DAYS_OVERDUE)?,
            budgeted_cost: number(BUDGETED_COST)?,
            contract_value: number(CONTRACT_VALUE)?,
            outstanding_amount: number(OUTSTANDING_AMOUNT)?,
            invoice_amount: number(INVOICE_AMOUNT)?,
            complexity,
        })
    }
}

/// Score one invoice. All rules are evaluated; reasons keep rule order.
pub fn calculate_risk(inputs: &RiskInputs) -> RiskAssessment {
    let mut score = 0u32;
    let mut reasons = Vec::new();

    if inputs.days_overdue > OVERDUE_DAYS_LIMIT {
        score += 3;
        reasons.push(REASON_OVERDUE);
    }
    if inputs.budgeted_cost > inputs.contract_value {
        score += 2;
        reasons.push(REASON_COST_OVERRUN);
    }
    if inputs.outstanding_amount > OUTSTANDING_SHARE_LIMIT * inputs.invoice_amount {
        score += 2;
        reasons.push(REASON_OUTSTANDING);
    }
    if inputs.complexity.as_deref() == Some("High") {
        score += 1;
        reasons.push(REASON_COMPLEXITY);
    }

    RiskAssessment {
        score,
        level: RiskLevel::from_score(score),
        reasons,
    }
}

#[derive(Debug, Clone)]
pub struct ScoredTable {
    pub table: Table,
    pub assessments: Vec<RiskAssessment>,
}

/// Score every row and write `Risk_Level` / `Risk_Reasons` onto the table.
///
/// The first row that cannot be read fails the whole table; nothing is
/// written in that case.
pub fn score_table(mut table: Table) -> Result<ScoredTable, RiskError> {
    for column in [
        DAYS_OVERDUE,
        BUDGETED_COST,
        CONTRACT_VALUE,
        OUTSTANDING_AMOUNT,
        INVOICE_AMOUNT,
        COMPLEXITY_SCORE,
    ] {
        if table.column_index(column).is_none() {
            return Err(RiskError::missing_column(column, "merged data"));
        }
    }

    let assessments = (0..table.len())
        .map(|row| RiskInputs::from_row(&table, row).map(|inputs| calculate_risk(&inputs)))
        .collect::<Result<Vec<_>, _>>()?;

    let levels = assessments
        .iter()
        .map(|a| Cell::text(a.level.as_str()))
        .collect();
    let reasons = assessments
        .iter()
        .map(|a| Cell::Text(a.reasons_text()))
        .collect();
    table.set_column(RISK_LEVEL, levels);
    table.set_column(RISK_REASONS, reasons);

    Ok(ScoredTable { table, assessments })
}

fn field<'a>(table: &'a Table, row: usize, column: &str) -> Result<&'a Cell, RiskError> {
    table
        .cell(row, column)
        .ok_or_else(|| RiskError::missing_column(column, &table.name))
}

fn numeric_field(table: &Table, row: usize, column: &str) -> Result<f64, RiskError> {
    match field(table, row, column)? {
        Cell::Number(n) => Ok(*n),
        Cell::Empty => Ok(f64::NAN),
        Cell::Bool(b) => Ok(if *b { 1.0 } else { 0.0 }),
        Cell::Text(s) if s.trim().is_empty() => Ok(f64::NAN),
        Cell::Text(s) => parse_f64_safe(Some(s)).ok_or_else(|| RiskError::NonNumeric {
            column: column.to_string(),
            row: row + 1,
            value: s.clone(),
        }),
        other => Err(RiskError::NonNumeric {
            column: column.to_string(),
            row: row + 1,
            value: other.to_string(),
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn inputs(
        days_overdue: f64,
        budgeted_cost: f64,
        contract_value: f64,
        outstanding_amount: f64,
        invoice_amount: f64,
        complexity: &str,
    ) -> RiskInputs {
        RiskInputs {
            days_overdue,
            budgeted_cost,
            contract_value,
            outstanding_amount,
            invoice_amount,
            complexity: Some(complexity.to_string()),
        }
    }

    #[test]
    fn overdue_and_exposure_is_high() {
        let a = calculate_risk(&inputs(120.0, 100.0, 150.0, 900.0, 1000.0, "Low"));
        assert_eq!(a.score, 5);
        assert_eq!(a.level, RiskLevel::High);
        assert_eq!(a.reasons_text(), "Invoice overdue > 90 days, High outstanding exposure");
    }

    #[test]
    fn clean_invoice_is_low_with_no_reasons() {
        let a = calculate_risk(&inputs(10.0, 50.0, 200.0, 10.0, 1000.0, "Low"));
        assert_eq!(a.score, 0);
        assert_eq!(a.level, RiskLevel::Low);
        assert_eq!(a.reasons_text(), "");
    }

    #[test]
    fn overrun_and_complexity_is_medium() {
        let a = calculate_risk(&inputs(0.0, 500.0, 400.0, 0.0, 100.0, "High"));
        assert_eq!(a.score, 3);
        assert_eq!(a.level, RiskLevel::Medium);
        assert_eq!(a.reasons_text(), "Cost overrun risk, High project complexity");
    }

    #[test]
    fn overdue_threshold_is_strict() {
        let at = calculate_risk(&inputs(90.0, 0.0, 0.0, 0.0, 0.0, "Low"));
        let over = calculate_risk(&inputs(91.0, 0.0, 0.0, 0.0, 0.0, "Low"));
        assert!(at.reasons.is_empty());
        assert_eq!(over.reasons, vec![REASON_OVERDUE]);
        assert_eq!(over.level, RiskLevel::Medium);
    }

    #[test]
    fn exposure_threshold_is_strict() {
        let at = calculate_risk(&inputs(0.0, 0.0, 0.0, 800.0, 1000.0, "Low"));
        let over = calculate_risk(&inputs(0.0, 0.0, 0.0, 801.0, 1000.0, "Low"));
        assert!(at.reasons.is_empty());
        assert_eq!(over.reasons, vec![REASON_OUTSTANDING]);
    }

    #[test]
    fn reasons_follow_rule_order() {
        let a = calculate_risk(&inputs(200.0, 0.0, 10.0, 0.0, 10.0, "High"));
        assert_eq!(a.reasons_text(), "Invoice overdue > 90 days, High project complexity");
        assert_eq!(a.level, RiskLevel::Medium);
    }

    #[test]
    fn every_rule_fired() {
        let a = calculate_risk(&inputs(91.0, 2.0, 1.0, 1000.0, 1000.0, "High"));
        assert_eq!(a.score, 8);
        assert_eq!(a.level, RiskLevel::High);
        assert_eq!(a.reasons.len(), 4);
    }

    #[test]
    fn complexity_match_is_exact() {
        let a = calculate_risk(&inputs(0.0, 0.0, 0.0, 0.0, 0.0, "high"));
        assert!(a.reasons.is_empty());
    }

    #[test]
    fn blank_amounts_never_fire() {
        let a = calculate_risk(&inputs(f64::NAN, f64::NAN, 1.0, 5.0, f64::NAN, "Low"));
        assert_eq!(a.score, 0);
    }

    fn merged(rows: Vec<Vec<Cell>>) -> Table {
        let mut t = Table::new(
            "merged",
            [
                "Invoice_No",
                "Days_Overdue",
                "Outstanding_Amount",
                "Invoice_Amount",
                "Project_ID",
                "Budgeted_Cost",
                "Contract_Value",
                "Complexity_Score",
            ]
            .iter()
            .map(|s| s.to_string())
            .collect(),
        );
        for r in rows {
            t.push_row(r);
        }
        t
    }

    fn row(inv: &str, days: f64, outstanding: f64, amount: f64, budget: f64, value: f64, cx: &str) -> Vec<Cell> {
        vec![
            Cell::text(inv),
            Cell::Number(days),
            Cell::Number(outstanding),
            Cell::Number(amount),
            Cell::text("P1"),
            Cell::Number(budget),
            Cell::Number(value),
            Cell::text(cx),
        ]
    }

    #[test]
    fn table_gets_level_and_reason_columns() {
        let t = merged(vec![
            row("A", 120.0, 900.0, 1000.0, 100.0, 150.0, "Low"),
            row("B", 10.0, 10.0, 1000.0, 50.0, 200.0, "Low"),
        ]);
        let scored = score_table(t).unwrap();
        let h = &scored.table.headers;
        assert_eq!(&h[h.len() - 2..], ["Risk_Level", "Risk_Reasons"]);
        assert_eq!(scored.table.cell(0, RISK_LEVEL), Some(&Cell::text("High")));
        assert_eq!(scored.table.cell(1, RISK_REASONS), Some(&Cell::text("")));
        assert!(!h.iter().any(|c| c == "Risk_Score"));
    }

    #[test]
    fn rescoring_is_idempotent() {
        let t = merged(vec![row("A", 100.0, 0.0, 10.0, 500.0, 400.0, "High")]);
        let once = score_table(t).unwrap();
        let twice = score_table(once.table.clone()).unwrap();
        assert_eq!(once.table, twice.table);
        assert_eq!(once.assessments, twice.assessments);
    }

    #[test]
    fn numeric_text_is_accepted() {
        let mut t = merged(vec![row("A", 0.0, 0.0, 0.0, 0.0, 0.0, "Low")]);
        t.rows[0][1] = Cell::text("120");
        let scored = score_table(t).unwrap();
        assert_eq!(scored.assessments[0].reasons, vec![REASON_OVERDUE]);
    }

    #[test]
    fn non_numeric_value_fails_the_batch() {
        let mut t = merged(vec![
            row("A", 0.0, 0.0, 0.0, 0.0, 0.0, "Low"),
            row("B", 0.0, 0.0, 0.0, 0.0, 0.0, "Low"),
        ]);
        t.rows[1][5] = Cell::text("n/a");
        let err = score_table(t).unwrap_err();
        assert_eq!(
            err.to_string(),
            "Column 'Budgeted_Cost' row 2: expected a number, found 'n/a'"
        );
    }

    #[test]
    fn blank_cells_and_numeric_complexity_do_not_fire() {
        let mut t = merged(vec![row("A", 120.0, 0.0, 0.0, 0.0, 0.0, "Low")]);
        t.rows[0][3] = Cell::Empty;
        t.rows[0][5] = Cell::Empty;
        t.rows[0][6] = Cell::text("  ");
        t.rows[0][7] = Cell::Number(3.0);
        let scored = score_table(t).unwrap();
        let a = &scored.assessments[0];
        assert_eq!(a.score, 3);
        assert_eq!(a.reasons, vec![REASON_OVERDUE]);
        assert_eq!(a.level, RiskLevel::Medium);
        assert_eq!(scored.table.cell(0, RISK_LEVEL), Some(&Cell::text("Medium")));
    }

    #[test]
    fn boolean_cells_read_as_zero_or_one() {
        let mut t = merged(vec![row("A", 0.0, 0.0, 10.0, 0.0, 0.0, "Low")]);
        t.rows[0][1] = Cell::Bool(true);
        t.rows[0][5] = Cell::Bool(true);
        t.rows[0][6] = Cell::Bool(false);
        let scored = score_table(t).unwrap();
        assert_eq!(scored.assessments[0].reasons, vec![REASON_COST_OVERRUN]);
        assert_eq!(scored.assessments[0].score, 2);
    }

    #[test]
    fn missing_column_fails_the_batch() {
        let mut t = merged(vec![]);
        t.headers[7] = "Complexity".to_string();
        let err = score_table(t).unwrap_err();
        assert!(matches!(err, RiskError::MissingColumn { ref column, .. } if column == COMPLEXITY_SCORE));
    }
}
