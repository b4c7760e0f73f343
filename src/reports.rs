use crate::error::RiskError;
use crate::loader::load_table;
use crate::merge::inner_join;
use crate::risk::score_table;
use crate::types::{
    InputKind, RiskAssessment, RiskLevel, RiskSummary, Table, INVOICE_NO, PROJECT_ID,
};
use chrono::{DateTime, Local};
use tracing::info;

/// One uploaded file: its original name and raw bytes.
#[derive(Debug, Clone)]
pub struct Upload {
    pub name: String,
    pub bytes: Vec<u8>,
}

#[derive(Debug, Clone)]
pub struct AnalysisInput {
    pub ar_aging: Upload,
    pub billing: Upload,
    pub contract: Upload,
}

#[derive(Debug, Clone)]
pub struct AnalysisResult {
    pub table: Table,
    pub assessments: Vec<RiskAssessment>,
    pub summary: RiskSummary,
    pub completed_at: DateTime<Local>,
}

pub fn summarize(assessments: &[RiskAssessment]) -> RiskSummary {
    let mut summary = RiskSummary {
        total: assessments.len(),
        ..RiskSummary::default()
    };
    for a in assessments {
        match a.level {
            RiskLevel::High => summary.high += 1,
            RiskLevel::Medium => summary.medium += 1,
            RiskLevel::Low => summary.low += 1,
        }
    }
    summary
}

/// Load, join, score and count. Any failure abandons the whole run.
pub fn run_analysis(input: &AnalysisInput) -> Result<AnalysisResult, RiskError> {
    let ar = load_source(InputKind::ArAging, &input.ar_aging)?;
    let billing = load_source(InputKind::Billing, &input.billing)?;
    let contract = load_source(InputKind::Contract, &input.contract)?;

    let (merged, first) = inner_join(&ar, &billing, INVOICE_NO)?;
    let (merged, second) = inner_join(&merged, &contract, PROJECT_ID)?;
    if merged.is_empty() {
        return Err(RiskError::EmptyJoin);
    }
    info!(
        ar_rows = first.left_rows,
        dropped_by_billing = first.unmatched_left,
        dropped_by_contract = second.unmatched_left,
        rows = merged.len(),
        "merged input files"
    );

    let scored = score_table(merged)?;
    let summary = summarize(&scored.assessments);
    info!(
        total = summary.total,
        high = summary.high,
        medium = summary.medium,
        low = summary.low,
        "risk analysis completed"
    );

    Ok(AnalysisResult {
        table: scored.table,
        assessments: scored.assessments,
        summary,
        completed_at: Local::now(),
    })
}

/// Decode one upload and check it carries the columns its role needs. The
/// table is named after its role so error messages say which file is at fault.
fn load_source(kind: InputKind, upload: &Upload) -> Result<Table, RiskError> {
    let mut table = load_table(&upload.name, &upload.bytes)?;
    table.name = format!("{} ({})", kind.label(), upload.name);
    for column in kind.required_columns() {
        if table.column_index(column).is_none() {
            return Err(RiskError::missing_column(column, &table.name));
        }
    }
    Ok(table)
}
