use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    /// Language that lowers the risk score.
    Mitigating,
    Low,
    Medium,
    High,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum RiskTier {
    Low,
    Medium,
    High,
}

impl RiskTier {
    pub fn from_score(score: u8) -> Self {
        match score {
            0..=30 => Self::Low,
            31..=60 => Self::Medium,
            _ => Self::High,
        }
    }
}

#[derive(Debug)]
pub struct RiskRule {
    pub label: &'static str,
    /// Lowercase phrases; any one of them triggers the rule.
    pub phrases: &'static [&'static str],
    pub delta: i32,
    pub severity: Severity,
    pub explanation: &'static str,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RiskFactor {
    pub label: &'static str,
    pub severity: Severity,
    pub delta: i32,
    pub explanation: &'static str,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RiskAssessment {
    pub score: u8,
    /// Sum of matched deltas before clamping to 0..=100.
    pub raw_score: i32,
    pub level: RiskTier,
    pub factors: Vec<RiskFactor>,
}

pub static RISK_RULES: &[RiskRule] = &[
    RiskRule {
        label: "Guaranteed outcome",
        phrases: &["guaranteed", "guarantee", "risk-free", "risk free", "no risk"],
        delta: 30,
        severity: Severity::High,
        explanation: "Promising a guaranteed or risk-free result is misleading; no trade is certain.",
    },
    RiskRule {
        label: "Certainty claim",
        phrases: &["100%", "sure thing", "can't lose", "cannot lose", "zero loss"],
        delta: 25,
        severity: Severity::High,
        explanation: "Absolute certainty overstates what any analysis can know.",
    },
    RiskRule {
        label: "Get-rich-quick framing",
        phrases: &["quick money", "easy money", "get rich", "double your", "overnight profit"],
        delta: 25,
        severity: Severity::High,
        explanation: "Fast-wealth language is typical of promotional schemes.",
    },
    RiskRule {
        label: "Insider claim",
        phrases: &["insider", "secret strategy", "they don't want you to know"],
        delta: 20,
        severity: Severity::High,
        explanation: "Claims of hidden or privileged information invite regulatory trouble.",
    },
    RiskRule {
        label: "Urgency pressure",
        phrases: &["act now", "don't miss", "limited time", "last chance", "hurry"],
        delta: 15,
        severity: Severity::Medium,
        explanation: "Pressure to act immediately discourages readers from assessing risk.",
    },
    RiskRule {
        label: "Exaggerated upside",
        phrases: &["to the moon", "huge profit", "massive gains", "explosive move", "life-changing"],
        delta: 15,
        severity: Severity::Medium,
        explanation: "Inflated return language sets unrealistic expectations.",
    },
    RiskRule {
        label: "Reckless leverage",
        phrases: &["go all-in", "max leverage", "bet everything", "100x leverage"],
        delta: 10,
        severity: Severity::Medium,
        explanation: "Encouraging oversized positions exposes readers to outsized losses.",
    },
    RiskRule {
        label: "Disclaimer present",
        phrases: &["not financial advice", "educational purposes", "do your own research"],
        delta: -10,
        severity: Severity::Mitigating,
        explanation: "A disclaimer frames the content as information rather than advice.",
    },
    RiskRule {
        label: "Risk management language",
        phrases: &["risk management", "stop loss", "position sizing", "manage your risk"],
        delta: -10,
        severity: Severity::Mitigating,
        explanation: "Talking about protecting capital signals a responsible approach.",
    },
];

/// Scores promotional-risk language. Each rule counts at most once; factors are
/// reported in rule order.
pub fn assess_risk(text: &str) -> RiskAssessment {
    let lower = text.to_lowercase();
    let mut raw_score = 0i32;
    let mut factors = Vec::new();

    for rule in RISK_RULES {
        if rule.phrases.iter().any(|p| lower.contains(p)) {
            raw_score += rule.delta;
            factors.push(RiskFactor {
                label: rule.label,
                severity: rule.severity,
                delta: rule.delta,
                explanation: rule.explanation,
            });
        }
    }

    let score = raw_score.clamp(0, 100) as u8;
    RiskAssessment {
        score,
        raw_score,
        level: RiskTier::from_score(score),
        factors,
    }
}
