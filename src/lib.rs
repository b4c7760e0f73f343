// Revenue-leakage risk analysis for invoice data.
//
// Three spreadsheets (AR aging, billing, contracts) are joined per invoice and
// every invoice is scored against a fixed set of leakage rules. The result can
// be browsed in a small web UI or produced in one shot from the command line.

pub mod error;
pub mod html;
pub mod loader;
pub mod merge;
pub mod output;
pub mod reports;
pub mod risk;
pub mod types;
pub mod util;
pub mod web;

pub use error::RiskError;
pub use reports::{run_analysis, summarize, AnalysisInput, AnalysisResult, Upload};
pub use risk::{calculate_risk, score_table, RiskInputs, ScoredTable};
pub use types::{Cell, RiskAssessment, RiskLevel, RiskSummary, Table};
