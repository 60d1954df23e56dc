//! The message scoring cascade.
//!
//! A message is matched against a prioritized rule list (universal bank
//! first, then the sniffed language's bank). The first matching rule
//! consumes its span; the text on either side is classified recursively, so
//! one message can accumulate several categories. The statistical gibberish
//! score is folded in afterwards.

use std::collections::BTreeMap;

use crate::chat::gibberish::gibberish_score;
use crate::chat::rules::{self, Category, Lang, Rule};
use crate::core::{config, metrics};
use crate::render;

/// One matched region of the message, in byte offsets.
#[derive(Debug, Clone)]
pub struct Span {
    pub start: usize,
    pub end: usize,
    pub category: Category,
    /// Rule identifier, e.g. "en.insult.mild"
    pub rule: &'static str,
    pub weight: f64,
}

/// Classifier output for one chat line.
#[derive(Debug, Clone)]
pub struct Classified {
    pub text: String,
    pub lang: Lang,
    /// Accumulated score per category
    pub scores: BTreeMap<Category, f64>,
    /// Matched spans, sorted by start offset
    pub spans: Vec<Span>,
    /// Sum over all categories
    pub total: f64,
    /// A critical rule matched; actionable regardless of total
    pub critical: bool,
    /// Raw gibberish score, when the detector ran
    pub gibberish: Option<f64>,
}

impl Classified {
    /// Worth showing to a moderator.
    pub fn is_reportable(&self) -> bool {
        self.critical || self.total >= config::chat::REPORT_THRESHOLD
    }

    /// Crosses the auto-timeout bar.
    pub fn is_actionable(&self) -> bool {
        self.critical || self.total >= config::chat::ACTION_THRESHOLD
    }

    /// Highest-scoring category, if anything matched.
    pub fn top_category(&self) -> Option<Category> {
        self.scores
            .iter()
            .max_by(|a, b| a.1.partial_cmp(b.1).unwrap_or(std::cmp::Ordering::Equal))
            .map(|(cat, _)| *cat)
    }

    /// Render the message as an HTML fragment with matches highlighted.
    pub fn render_html(&self) -> String {
        render::highlight_spans(&self.text, &self.spans)
    }
}

/// Classify one chat line.
pub fn classify(text: &str) -> Classified {
    let lang = rules::sniff_lang(text);

    // Priority order: universal bank first, then the language bank
    let prioritized: Vec<&Rule> = rules::UNIVERSAL.iter().chain(rules::bank_for(lang).iter()).collect();

    let mut spans = Vec::new();
    cascade(text, 0, &prioritized, &mut spans, 0);
    spans.sort_by_key(|s| s.start);

    let mut scores: BTreeMap<Category, f64> = BTreeMap::new();
    let mut critical = false;
    for span in &spans {
        *scores.entry(span.category).or_insert(0.0) += span.weight;
        if is_critical(span.rule, &prioritized) {
            critical = true;
        }
    }

    let gibberish = gibberish_score(text);
    if let Some(g) = gibberish {
        if g >= config::chat::GIBBERISH_THRESHOLD {
            *scores.entry(Category::Gibberish).or_insert(0.0) += config::chat::GIBBERISH_WEIGHT * g;
        }
    }

    let total = scores.values().sum();

    let classified = Classified {
        text: text.to_string(),
        lang,
        scores,
        spans,
        total,
        critical,
        gibberish,
    };

    let verdict = if classified.is_actionable() {
        "actionable"
    } else if classified.is_reportable() {
        "reported"
    } else {
        "clean"
    };
    metrics::CHAT_CLASSIFIED_TOTAL.with_label_values(&[verdict]).inc();

    classified
}

/// Recursively split `segment` by the highest-priority matching rule.
///
/// `offset` is the segment's byte position in the original message so spans
/// come out in absolute coordinates. Depth is bounded as each level consumes
/// at least one matched byte, but cap it anyway against pathological inputs.
fn cascade(segment: &str, offset: usize, prioritized: &[&Rule], spans: &mut Vec<Span>, depth: u32) {
    if segment.is_empty() || depth > 32 {
        return;
    }

    for rule in prioritized {
        if let Some(m) = rule.re.find(segment) {
            if m.range().is_empty() {
                continue;
            }
            spans.push(Span {
                start: offset + m.start(),
                end: offset + m.end(),
                category: rule.category,
                rule: rule.name,
                weight: rule.weight,
            });
            cascade(&segment[..m.start()], offset, prioritized, spans, depth + 1);
            cascade(&segment[m.end()..], offset + m.end(), prioritized, spans, depth + 1);
            return;
        }
    }
}

fn is_critical(rule_name: &str, prioritized: &[&Rule]) -> bool {
    prioritized.iter().any(|r| r.name == rule_name && r.critical)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_clean_message() {
        let c = classify("good game, well played");
        assert!(c.spans.is_empty());
        assert_eq!(c.total, 0.0);
        assert!(!c.is_reportable());
    }

    #[test]
    fn test_single_insult_scores_its_category() {
        let c = classify("you are an idiot");
        assert_eq!(c.spans.len(), 1);
        assert_eq!(c.spans[0].category, Category::Insult);
        assert_eq!(c.top_category(), Some(Category::Insult));
        assert!(c.total >= 1.0);
    }

    #[test]
    fn test_cascade_accumulates_multiple_categories() {
        let c = classify("idiot cheater visit www.spam.ru now");
        let cats: Vec<Category> = c.spans.iter().map(|s| s.category).collect();
        assert!(cats.contains(&Category::Insult));
        assert!(cats.contains(&Category::Shaming));
        assert!(cats.contains(&Category::Spam));
        assert!(c.total > 3.0);
    }

    #[test]
    fn test_spans_are_sorted_and_disjoint() {
        let c = classify("stupid noob cheater stupid");
        let mut last_end = 0;
        for span in &c.spans {
            assert!(span.start >= last_end);
            assert!(span.end > span.start);
            last_end = span.end;
        }
    }

    #[test]
    fn test_critical_rule_is_actionable_alone() {
        let c = classify("kys");
        assert!(c.critical);
        assert!(c.is_actionable());
    }

    #[test]
    fn test_universal_bank_outranks_language_bank() {
        // "kill yourself" must land on the universal critical rule even
        // though the en bank also has violence patterns
        let c = classify("kill yourself loser");
        assert!(c.spans.iter().any(|s| s.rule == "threat.kys"));
        assert!(c.critical);
    }

    #[test]
    fn test_language_bank_selection() {
        let c = classify("eres muy tonto pero que idiota");
        assert_eq!(c.lang, Lang::Es);
        assert!(c.spans.iter().any(|s| s.rule.starts_with("es.")));
    }

    #[test]
    fn test_gibberish_feeds_category() {
        let c = classify("zxqjkv wqzxjv pkfjzz qwjxzk");
        assert!(c.gibberish.unwrap() > config::chat::GIBBERISH_THRESHOLD);
        assert!(c.scores.contains_key(&Category::Gibberish));
    }

    #[test]
    fn test_render_html_escapes_and_highlights() {
        let c = classify("<b>idiot</b>");
        let html = c.render_html();
        assert!(html.contains("&lt;b&gt;"));
        assert!(html.contains("class=\"hl hl-insult\""));
        assert!(html.contains(">idiot<"));
    }
}
