use serde::Serialize;
use std::collections::HashSet;

const MAX_CHARS: usize = 1500;
const MIN_POST_WORDS: usize = 50;
const MAX_GLYPHS: usize = 15;

const DISCLAIMER_PHRASES: &[&str] = &[
    "not financial advice",
    "educational",
    "learning material",
    "do your own research",
];
const TRADE_WORDS: &[&str] = &["buy", "sell", "long", "short", "entry"];
const INFORMAL_WORDS: &[&str] = &["lol", "lmao", "gonna", "wanna", "bro", "omg", "yolo", "dude"];
const TECHNICAL_WORDS: &[&str] = &[
    "support",
    "resistance",
    "trend",
    "trendline",
    "rsi",
    "macd",
    "fibonacci",
    "breakout",
    "momentum",
    "volume",
    "ema",
    "sma",
    "candle",
    "pattern",
];
const STOP_PHRASES: &[&str] = &["stop loss", "stop-loss", "stoploss"];

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AdviceItem {
    pub title: &'static str,
    pub explanation: &'static str,
}

/// Ordered writing suggestions. Never empty.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct WritingAdvice(Vec<AdviceItem>);

impl WritingAdvice {
    pub fn items(&self) -> &[AdviceItem] {
        &self.0
    }

    pub fn titles(&self) -> Vec<&'static str> {
        self.0.iter().map(|i| i.title).collect()
    }

    pub fn is_all_clear(&self) -> bool {
        self.0.len() == 1 && self.0[0] == ALL_CLEAR
    }
}

pub const ALL_CLEAR: AdviceItem = AdviceItem {
    title: "Looks good",
    explanation: "No writing issues found. The post is ready to share.",
};

/// Lowercased text plus its alphanumeric word tokens.
struct Scan<'a> {
    raw: &'a str,
    lower: String,
    words: HashSet<String>,
    word_count: usize,
}

impl<'a> Scan<'a> {
    fn new(raw: &'a str) -> Self {
        let lower = raw.to_lowercase();
        let tokens: Vec<String> = lower
            .split(|c: char| !c.is_alphanumeric())
            .filter(|w| !w.is_empty())
            .map(str::to_string)
            .collect();
        Self {
            raw,
            word_count: raw.split_whitespace().count(),
            words: tokens.into_iter().collect(),
            lower,
        }
    }

    fn any_word(&self, words: &[&str]) -> bool {
        words.iter().any(|w| self.words.contains(*w))
    }

    fn any_phrase(&self, phrases: &[&str]) -> bool {
        phrases.iter().any(|p| self.lower.contains(p))
    }

    fn is_rendered_post(&self) -> bool {
        self.raw.contains("═══")
    }

    fn is_trade_call(&self) -> bool {
        self.any_word(TRADE_WORDS) || self.lower.contains("take profit")
    }

    fn glyph_count(&self) -> usize {
        self.raw.chars().filter(|c| is_pictograph(*c)).count()
    }
}

fn is_pictograph(c: char) -> bool {
    matches!(c as u32, 0x1F300..=0x1FAFF | 0x2600..=0x27BF)
}

struct Check {
    fires: fn(&Scan<'_>) -> bool,
    item: AdviceItem,
}

static CHECKS: &[Check] = &[
    Check {
        fires: |s| s.raw.chars().count() > MAX_CHARS,
        item: AdviceItem {
            title: "Tighten the message",
            explanation: "Long posts lose readers; keep the key levels and reasoning, cut the rest.",
        },
    },
    Check {
        fires: |s| s.is_rendered_post() && s.word_count < MIN_POST_WORDS,
        item: AdviceItem {
            title: "Add more substance",
            explanation: "The post is very brief; a few sentences of context help readers follow the idea.",
        },
    },
    Check {
        fires: |s| s.glyph_count() > MAX_GLYPHS,
        item: AdviceItem {
            title: "Fewer emojis",
            explanation: "Too many symbols make the post harder to scan; keep them for section markers.",
        },
    },
    Check {
        fires: |s| s.is_trade_call() && !s.any_phrase(DISCLAIMER_PHRASES),
        item: AdviceItem {
            title: "Add a disclaimer",
            explanation: "Trade ideas should state that they are not financial advice.",
        },
    },
    Check {
        fires: |s| s.any_word(INFORMAL_WORDS) || s.raw.contains("!!!"),
        item: AdviceItem {
            title: "Keep the tone professional",
            explanation: "Slang and stacked exclamation marks undermine credibility.",
        },
    },
    Check {
        fires: |s| {
            s.is_trade_call()
                && !s.any_word(TECHNICAL_WORDS)
                && !s.lower.contains("moving average")
        },
        item: AdviceItem {
            title: "Back the call with analysis",
            explanation: "Mention the technical picture (trend, support/resistance, indicators) behind the idea.",
        },
    },
    Check {
        fires: |s| s.words.contains("entry") && !s.any_phrase(STOP_PHRASES),
        item: AdviceItem {
            title: "Include a stop loss",
            explanation: "An entry without a stop loss leaves readers without a defined risk.",
        },
    },
];

/// Runs every writing check in order; falls back to [`ALL_CLEAR`] when none fire.
pub fn advise(text: &str) -> WritingAdvice {
    let scan = Scan::new(text);
    let mut items: Vec<AdviceItem> = CHECKS
        .iter()
        .filter(|check| (check.fires)(&scan))
        .map(|check| check.item.clone())
        .collect();
    if items.is_empty() {
        items.push(ALL_CLEAR);
    }
    WritingAdvice(items)
}
