//! Fixed-layout text templates for each content type.
//!
//! Rendering is pure: glyphs are picked from the field values alone and the only
//! date formatting is the explicit `validUntil` format, so equal inputs always give
//! byte-identical output.

use crate::domain::content::{
    Confidence, ContentType, Direction, EducationLevel, RenderedContent, RiskLevel,
};
use crate::domain::fields::{
    AnalysisFields, ContentFields, EducationFields, SignalFields, ValidAnalysis, ValidEducation,
    ValidSignal, ValidationError,
};

const RULE: &str = "═══════════════════";

pub const SIGNAL_DISCLAIMER: &str = "⚠️ Educational purposes only. Not financial advice.";
pub const ANALYSIS_FOOTER: &str = "📚 Educational content";
pub const EDUCATION_FOOTER: &str = "📖 Learning material";

pub fn render(fields: &ContentFields) -> Result<RenderedContent, ValidationError> {
    match fields {
        ContentFields::Signal(f) => render_signal(f),
        ContentFields::Analysis(f) => render_analysis(f),
        ContentFields::Education(f) => render_education(f),
    }
}

pub fn render_signal(fields: &SignalFields) -> Result<RenderedContent, ValidationError> {
    let s = fields.validate()?;
    Ok(RenderedContent::new(ContentType::Signal, signal_text(&s)))
}

pub fn render_analysis(fields: &AnalysisFields) -> Result<RenderedContent, ValidationError> {
    let a = fields.validate()?;
    Ok(RenderedContent::new(ContentType::Analysis, analysis_text(&a)))
}

pub fn render_education(fields: &EducationFields) -> Result<RenderedContent, ValidationError> {
    let e = fields.validate()?;
    Ok(RenderedContent::new(ContentType::Education, education_text(&e)))
}

fn direction_line(direction: Direction) -> &'static str {
    match direction {
        Direction::Buy => "🟢 LONG / BUY",
        Direction::Sell => "🔴 SHORT / SELL",
        Direction::Neutral => "🟡 NEUTRAL / WAIT",
    }
}

fn confidence_glyph(confidence: Confidence) -> &'static str {
    match confidence {
        Confidence::High => "🟢",
        Confidence::Medium => "🟡",
        Confidence::Low => "🔴",
    }
}

fn risk_glyph(risk: RiskLevel) -> &'static str {
    match risk {
        RiskLevel::Conservative => "🟢",
        RiskLevel::Moderate => "🟡",
        RiskLevel::Aggressive => "🔴",
    }
}

fn level_glyph(level: EducationLevel) -> &'static str {
    match level {
        EducationLevel::Beginner => "🟢",
        EducationLevel::Intermediate => "🟡",
        EducationLevel::Advanced => "🔴",
    }
}

/// Appends the shared closing block: author line, rule, footer.
fn push_footer(out: &mut Vec<String>, author: &str, footer: &str) {
    out.push(format!("👤 {author}"));
    out.push(RULE.to_string());
    out.push(footer.to_string());
}

fn signal_text(s: &ValidSignal) -> String {
    let mut out = vec![
        "📊 FOREX SIGNAL".to_string(),
        RULE.to_string(),
        String::new(),
        format!("🎯 {} ({})", s.symbol, s.timeframe),
        direction_line(s.direction).to_string(),
        format!(
            "{} {} Confidence",
            confidence_glyph(s.confidence),
            s.confidence.label()
        ),
        format!("{} {} Risk", risk_glyph(s.risk_level), s.risk_level.label()),
        String::new(),
        "📈 ENTRY & EXIT:".to_string(),
        format!("Entry: {}", s.entry),
        format!("Stop Loss: {}", s.stop_loss),
    ];
    if let Some(tp) = &s.take_profit1 {
        out.push(format!("Take Profit 1: {tp}"));
    }
    if let Some(tp) = &s.take_profit2 {
        out.push(format!("Take Profit 2: {tp}"));
    }
    out.push(String::new());

    out.push("📋 MARKET ANALYSIS:".to_string());
    out.push(s.analysis_text.clone());
    out.push(String::new());

    if let Some(valid_until) = &s.valid_until {
        out.push(format!("⏰ Valid until: {}", valid_until.display()));
        out.push(String::new());
    }

    push_footer(&mut out, &s.author, SIGNAL_DISCLAIMER);
    out.join("\n")
}

fn analysis_text(a: &ValidAnalysis) -> String {
    let mut out = vec![
        "📊 MARKET ANALYSIS".to_string(),
        RULE.to_string(),
        String::new(),
        format!("🎯 {} ({})", a.symbol, a.timeframe),
        format!("📋 {}", a.analysis_type),
        String::new(),
        format!("📝 {}", a.title),
        RULE.to_string(),
        String::new(),
        a.body.clone(),
        String::new(),
        "🔍 CONCLUSION:".to_string(),
        a.conclusion.clone(),
        String::new(),
    ];
    push_footer(&mut out, &a.author, ANALYSIS_FOOTER);
    out.join("\n")
}

fn education_text(e: &ValidEducation) -> String {
    let mut out = vec![
        "📚 EDUCATIONAL CONTENT".to_string(),
        RULE.to_string(),
        String::new(),
        format!("🎓 {}", e.topic),
        format!("{} {} Level", level_glyph(e.level), e.level.label()),
        String::new(),
        format!("📝 {}", e.title),
        RULE.to_string(),
        String::new(),
        e.body.clone(),
        String::new(),
        "🔑 KEY POINTS:".to_string(),
        e.key_points.clone(),
        String::new(),
    ];
    push_footer(&mut out, &e.author, EDUCATION_FOOTER);
    out.join("\n")
}
