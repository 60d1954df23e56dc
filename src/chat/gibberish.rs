//! Statistical gibberish detection.
//!
//! Keyboard mash ("asdjkh skjdhf") floods tournament chat and never matches
//! a word rule, so it gets its own detector: letter-pair plausibility
//! against a table of frequent bigrams, corrected by vowel ratio and
//! consonant run length. The output is a 0..1 score; the classifier maps it
//! into the `Gibberish` category above the configured threshold.
//!
//! Latin script only. Messages that are too short or mostly non-letters are
//! exempt (emoji, move lists, "gg").

use once_cell::sync::Lazy;

use crate::core::config;

/// Frequent English-ish bigrams. Coverage matters more than precision:
/// normal chat in any Latin-script language hits this table on most
/// adjacent letter pairs, mash hits it on few.
const COMMON_BIGRAMS: &str = "th he in er an re nd on en at ou ed ha to or it is hi es ng ar nt ti \
    se me de sa ne wa le ve co no ll li be ma do st lo ld el ro ad we ri io of ho as ra ur ca ta \
    ce ic ea ch ily om ke us so ut ow ge et pe ol da di si al un am mo na ni wh you sh yo thi wi \
    ay ir id by ry ba em ac ab ep tr fo fa ig ex ev ot po ot up pl gh gr gl tu mi bi bl br cl cr \
    dr fl fr pr sc sk sl sm sn sp sw tw qu ck ct ft ld lf lk lm ln lp lt mp nk ns nc rd rg rk rl \
    rm rn rt sp ss tt ff ee oo mm nn pp rr dd gg ue ui oa oe ie ei au aw oy oi ew ay \
    te su os od pa la pu va vi ga go gu cu lu ec im eu ut uc ja je jo ka ko ku za zu";

/// Bigram lookup matrix, built once from the table above.
static BIGRAM_OK: Lazy<[[bool; 26]; 26]> = Lazy::new(|| {
    let mut table = [[false; 26]; 26];
    for chunk in COMMON_BIGRAMS.split_ascii_whitespace() {
        // Entries longer than 2 contribute each adjacent pair
        let bytes = chunk.as_bytes();
        for pair in bytes.windows(2) {
            let (a, b) = (pair[0], pair[1]);
            if a.is_ascii_lowercase() && b.is_ascii_lowercase() {
                table[(a - b'a') as usize][(b - b'a') as usize] = true;
            }
        }
    }
    table
});

const VOWELS: &str = "aeiouy";

/// Score how gibberish-like a message is.
///
/// Returns `None` when the message is exempt: fewer letters than the
/// configured minimum, or letters are less than half of the visible
/// characters (smileys, chess moves, scoreboards).
pub fn gibberish_score(text: &str) -> Option<f64> {
    let visible: Vec<char> = text.chars().filter(|c| !c.is_whitespace()).collect();
    let letters: Vec<u8> = text
        .chars()
        .filter(|c| c.is_ascii_alphabetic())
        .map(|c| c.to_ascii_lowercase() as u8)
        .collect();

    if letters.len() < config::chat::GIBBERISH_MIN_LETTERS || letters.len() * 2 < visible.len() {
        return None;
    }

    // Pair plausibility over letters within words (word breaks reset pairs)
    let mut pairs = 0usize;
    let mut hits = 0usize;
    for word in text.split(|c: char| !c.is_ascii_alphabetic()) {
        let w: Vec<u8> = word.bytes().map(|b| b.to_ascii_lowercase()).collect();
        for pair in w.windows(2) {
            pairs += 1;
            if BIGRAM_OK[(pair[0] - b'a') as usize][(pair[1] - b'a') as usize] {
                hits += 1;
            }
        }
    }
    let pair_frac = if pairs == 0 { 1.0 } else { hits as f64 / pairs as f64 };
    let pair_score = ((0.75 - pair_frac) / 0.5).clamp(0.0, 1.0);

    // Vowel ratio: normal text sits in roughly 0.25..0.55
    let vowels = letters.iter().filter(|&&b| VOWELS.as_bytes().contains(&b)).count();
    let vowel_ratio = vowels as f64 / letters.len() as f64;
    let vowel_score = if vowel_ratio < 0.25 {
        (0.25 - vowel_ratio) / 0.25
    } else if vowel_ratio > 0.55 {
        ((vowel_ratio - 0.55) / 0.45).min(1.0)
    } else {
        0.0
    };

    // Longest consonant run; 4 is unremarkable ("strength"), 8 is mash
    let mut run = 0usize;
    let mut max_run = 0usize;
    for &b in &letters {
        if VOWELS.as_bytes().contains(&b) {
            run = 0;
        } else {
            run += 1;
            max_run = max_run.max(run);
        }
    }
    let run_score = ((max_run as f64 - 4.0) / 4.0).clamp(0.0, 1.0);

    Some((0.7 * pair_score + 0.2 * vowel_score + 0.1 * run_score).clamp(0.0, 1.0))
}
