//! Ordered pattern banks for chat moderation.
//!
//! One universal bank (runs on every message) plus per-language banks. Rule
//! order is priority order: the classifier consumes the first match it
//! finds and recurses on the remainder, so put the most specific patterns
//! first within each category block.
//!
//! The word lists here are the tame subset; production deployments overlay
//! the full lists at the same rule names.

use once_cell::sync::Lazy;
use regex::Regex;

/// Moderation categories a rule can credit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Category {
    Spam,
    Insult,
    Hate,
    Threat,
    Shaming,
    Gibberish,
}

impl Category {
    pub fn as_str(&self) -> &'static str {
        match self {
            Category::Spam => "spam",
            Category::Insult => "insult",
            Category::Hate => "hate",
            Category::Threat => "threat",
            Category::Shaming => "shaming",
            Category::Gibberish => "gibberish",
        }
    }
}

/// One moderation pattern.
#[derive(Debug)]
pub struct Rule {
    /// Stable identifier, used in alert payloads and logs
    pub name: &'static str,
    pub re: Regex,
    pub category: Category,
    pub weight: f64,
    /// A critical match alone crosses the action threshold
    pub critical: bool,
}

fn rule(name: &'static str, pattern: &str, category: Category, weight: f64, critical: bool) -> Rule {
    #[allow(clippy::expect_used)] // patterns are compile-time constants, exercised by tests
    let re = Regex::new(&format!("(?i){pattern}")).expect("invalid built-in rule pattern");
    Rule {
        name,
        re,
        category,
        weight,
        critical,
    }
}

/// Supported rule-bank languages.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Lang {
    En,
    Es,
    Fr,
    De,
    Ru,
}

impl Lang {
    pub fn as_str(&self) -> &'static str {
        match self {
            Lang::En => "en",
            Lang::Es => "es",
            Lang::Fr => "fr",
            Lang::De => "de",
            Lang::Ru => "ru",
        }
    }
}

/// Universal bank: patterns that hold regardless of language.
pub static UNIVERSAL: Lazy<Vec<Rule>> = Lazy::new(|| {
    vec![
        // Self-harm instructions are an instant action in every language
        rule("threat.kys", r"\bk\s*y\s*s\b|kill\s+your\s*self", Category::Threat, 5.0, true),
        rule("hate.nazi", r"\b(nazi|hitler|sieg\s*heil|1488)\b", Category::Hate, 3.0, true),
        // Link spam: tournament chat has no legitimate use for URLs
        rule(
            "spam.url",
            r"https?://\S+|\bwww\.\S+\.\S+|\b\S+\.(com|org|net|ru|gg)/\S*",
            Category::Spam,
            1.5,
            false,
        ),
        rule("spam.follow", r"\b(follow|sub(scribe)?\s+to)\s+(me|my)\b", Category::Spam, 1.0, false),
        // Accusing opponents in public chat instead of reporting
        rule(
            "shaming.cheat",
            r"\b(cheat(er|ing|s)?|engine\s*user|stockfish\s*(user|bot)?)\b",
            Category::Shaming,
            1.5,
            false,
        ),
        rule("shaming.sandbag", r"\b(sand\s*bag(ger|ging)?|boost(er|ing)?)\b", Category::Shaming, 1.2, false),
        // Letter-spaced evasion of word filters ("i d i o t")
        rule(
            "insult.spaced",
            r"\b(?:[a-z]\s){3,}[a-z]\b",
            Category::Insult,
            0.8,
            false,
        ),
        // Character floods: "!!!!!!!" / "ЫЫЫЫЫЫЫ" / "aaaaaaaa"
        rule("spam.flood", r"(.)\1{6,}", Category::Spam, 0.8, false),
    ]
});

pub static EN: Lazy<Vec<Rule>> = Lazy::new(|| {
    vec![
        rule("en.threat.violence", r"\b(i('|`)?ll|i\s+will|gonna)\s+(kill|hurt|find|beat)\s+(you|u|ya)\b", Category::Threat, 4.0, true),
        rule("en.hate.generic", r"\b(racist|go\s+back\s+to\s+your\s+country)\b", Category::Hate, 2.5, false),
        rule(
            "en.insult.strong",
            r"\b(f+u+c+k+(er|ing|tard)?|b[i1]tch|a[s$]{2}hole|d[i1]ckhead)\b",
            Category::Insult,
            2.0,
            false,
        ),
        rule(
            "en.insult.mild",
            r"\b(idiot|moron|stupid|dumb\s*(a[s$]{2})?|loser|trash|noob|garbage\s+player)\b",
            Category::Insult,
            1.0,
            false,
        ),
        rule("en.spam.begging", r"\b(free\s+(rating|points)|join\s+my\s+(team|club)|play\s+me\b.{0,12}\bmoney)\b", Category::Spam, 1.2, false),
    ]
});

pub static ES: Lazy<Vec<Rule>> = Lazy::new(|| {
    vec![
        rule("es.threat.violence", r"\bte\s+voy\s+a\s+(matar|encontrar|pegar)\b", Category::Threat, 4.0, true),
        rule(
            "es.insult.strong",
            r"\b(put[ao]|cabr[oó]n|gilipollas|pendejo|hijo\s+de\s+puta)\b",
            Category::Insult,
            2.0,
            false,
        ),
        rule("es.insult.mild", r"\b(idiota|imb[eé]cil|est[uú]pido|tonto|perdedor)\b", Category::Insult, 1.0, false),
        rule("es.shaming.cheat", r"\b(tramposo|hace(s)?\s+trampa[s]?)\b", Category::Shaming, 1.5, false),
    ]
});

pub static FR: Lazy<Vec<Rule>> = Lazy::new(|| {
    vec![
        rule("fr.threat.violence", r"\bje\s+vais\s+te\s+(tuer|trouver|frapper)\b", Category::Threat, 4.0, true),
        rule(
            "fr.insult.strong",
            r"\b(connard|salope|encul[eé]|fils\s+de\s+pute|pd)\b",
            Category::Insult,
            2.0,
            false,
        ),
        rule("fr.insult.mild", r"\b(idiot|imb[eé]cile|d[eé]bile|nul|cr[eé]tin)\b", Category::Insult, 1.0, false),
        rule("fr.shaming.cheat", r"\b(tricheur|tu\s+triches?)\b", Category::Shaming, 1.5, false),
    ]
});

pub static DE: Lazy<Vec<Rule>> = Lazy::new(|| {
    vec![
        rule("de.threat.violence", r"\bich\s+(werde|will)\s+dich\s+(t[oö]ten|finden|schlagen)\b", Category::Threat, 4.0, true),
        rule(
            "de.insult.strong",
            r"\b(arschloch|hurensohn|fotze|wichser|missgeburt)\b",
            Category::Insult,
            2.0,
            false,
        ),
        rule("de.insult.mild", r"\b(idiot|dummkopf|trottel|versager|vollpfosten)\b", Category::Insult, 1.0, false),
        rule("de.shaming.cheat", r"\b(betr[uü]ger|du\s+betr[uü]gst|schummler)\b", Category::Shaming, 1.5, false),
    ]
});

pub static RU: Lazy<Vec<Rule>> = Lazy::new(|| {
    vec![
        rule("ru.threat.violence", r"\b(я\s+тебя\s+(убью|найду)|убью\s+тебя)\b", Category::Threat, 4.0, true),
        rule(
            "ru.insult.strong",
            r"\b(сука|пидор|мудак|ублюдок|тварь)\b",
            Category::Insult,
            2.0,
            false,
        ),
        rule("ru.insult.mild", r"\b(идиот|дурак|тупой|лох|нуб)\b", Category::Insult, 1.0, false),
        rule("ru.shaming.cheat", r"\b(читер|читеришь|движок)\b", Category::Shaming, 1.5, false),
    ]
});

/// The bank for a sniffed language.
pub fn bank_for(lang: Lang) -> &'static [Rule] {
    match lang {
        Lang::En => &EN,
        Lang::Es => &ES,
        Lang::Fr => &FR,
        Lang::De => &DE,
        Lang::Ru => &RU,
    }
}

/// Stop words with high coverage per language, for the sniffer.
const ES_STOPS: &[&str] = &["que", "por", "una", "eres", "muy", "pero", "como", "esta"];
const FR_STOPS: &[&str] = &["que", "les", "est", "pas", "vous", "une", "mais", "tres"];
const DE_STOPS: &[&str] = &["der", "die", "das", "und", "nicht", "ist", "du", "ein"];

/// Cheap language sniff: script check for Cyrillic, stop-word hits for the
/// Latin-script languages, English as the fallback. Wrong guesses only cost
/// recall, since the universal bank already ran.
pub fn sniff_lang(text: &str) -> Lang {
    let cyrillic = text.chars().filter(|c| ('\u{0400}'..='\u{04FF}').contains(c)).count();
    if cyrillic * 3 >= text.chars().count().max(1) {
        return Lang::Ru;
    }

    let lower = text.to_lowercase();
    let words: Vec<&str> = lower.split(|c: char| !c.is_alphanumeric()).filter(|w| !w.is_empty()).collect();

    let hits = |stops: &[&str]| words.iter().filter(|w| stops.contains(*w)).count();
    let (es, fr, de) = (hits(ES_STOPS), hits(FR_STOPS), hits(DE_STOPS));
    let best = es.max(fr).max(de);

    if best < 2 {
        Lang::En
    } else if best == es {
        Lang::Es
    } else if best == fr {
        Lang::Fr
    } else {
        Lang::De
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_banks_compile() {
        // Lazy forces compilation of every pattern
        for bank in [&*UNIVERSAL, &*EN, &*ES, &*FR, &*DE, &*RU] {
            assert!(!bank.is_empty());
        }
    }

    #[test]
    fn test_universal_kys_variants() {
        let r = &UNIVERSAL[0];
        assert_eq!(r.category, Category::Threat);
        assert!(r.re.is_match("kys"));
        assert!(r.re.is_match("K Y S"));
        assert!(r.re.is_match("kill yourself"));
        assert!(r.re.is_match("kill your self"));
        assert!(!r.re.is_match("kyoto style"));
    }

    #[test]
    fn test_url_rule() {
        let r = UNIVERSAL.iter().find(|r| r.name == "spam.url").unwrap();
        assert!(r.re.is_match("visit https://spam.example/win"));
        assert!(r.re.is_match("www.spam.ru now"));
        assert!(!r.re.is_match("good game everyone"));
    }

    #[test]
    fn test_sniff_cyrillic() {
        assert_eq!(sniff_lang("ты тупой лох"), Lang::Ru);
    }

    #[test]
    fn test_sniff_latin_languages() {
        assert_eq!(sniff_lang("eres muy tonto pero que malo"), Lang::Es);
        assert_eq!(sniff_lang("vous est pas une bon joueur mais"), Lang::Fr);
        assert_eq!(sniff_lang("du bist nicht gut und das ist"), Lang::De);
        assert_eq!(sniff_lang("you are just bad at chess"), Lang::En);
    }

    #[test]
    fn test_sniff_defaults_to_english_on_short_text() {
        assert_eq!(sniff_lang("gg"), Lang::En);
    }
}
