//! Keyword heuristics over rendered text: promotional-risk scoring and writing advice.
//!
//! Both entry points are total; any string, including an empty one, yields a result.

pub mod advice;
pub mod risk;

pub use advice::{advise, AdviceItem, WritingAdvice};
pub use risk::{assess_risk, RiskAssessment, RiskFactor, RiskTier, Severity};

use serde::Serialize;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Analysis {
    pub risk: RiskAssessment,
    pub advice: WritingAdvice,
}

pub fn analyze(text: &str) -> Analysis {
    Analysis {
        risk: assess_risk(text),
        advice: advise(text),
    }
}
