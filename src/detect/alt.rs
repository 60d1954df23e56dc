//! Alt-account fingerprinting.
//!
//! Builds behavioral fingerprints from recent games (when the player is
//! online, what they open with, what speeds they play, whom they play)
//! and compares two users with a blended similarity. Output is a report
//! for moderator review; no decision is taken here.

use chrono::Timelike;
use std::collections::{HashMap, HashSet};

use crate::api::types::{Color, ExportedGame};
use crate::api::{ApiClient, ApiError};
use crate::core::config;
use crate::detect::games::recent_games;
use crate::render;

/// Behavioral fingerprint of one user.
#[derive(Debug, Clone)]
pub struct Fingerprint {
    pub username: String,
    pub games: usize,
    /// Normalized hour-of-day activity histogram (UTC)
    pub hours: [f64; 24],
    /// User's own first moves as white, normalized frequency
    pub repertoire_white: HashMap<String, f64>,
    /// User's own first moves as black, normalized frequency
    pub repertoire_black: HashMap<String, f64>,
    /// Speed ("bullet", "blitz", ...) frequency
    pub time_controls: HashMap<String, f64>,
    /// Opponent name -> games played against them
    pub opponents: HashMap<String, u32>,
}

impl Fingerprint {
    /// Aggregate a game list into a fingerprint.
    pub fn from_games(username: &str, games: &[ExportedGame]) -> Self {
        let mut hours = [0.0f64; 24];
        let mut rep_white: HashMap<String, f64> = HashMap::new();
        let mut rep_black: HashMap<String, f64> = HashMap::new();
        let mut tc: HashMap<String, f64> = HashMap::new();
        let mut opponents: HashMap<String, u32> = HashMap::new();

        for game in games {
            let Some(color) = game.side_of(username) else { continue };

            hours[game.created().hour() as usize] += 1.0;
            *tc.entry(game.speed.clone()).or_insert(0.0) += 1.0;

            if let Some(opening) = own_opening(game, color) {
                let rep = match color {
                    Color::White => &mut rep_white,
                    Color::Black => &mut rep_black,
                };
                *rep.entry(opening).or_insert(0.0) += 1.0;
            }

            let opponent_side = match color {
                Color::White => &game.players.black,
                Color::Black => &game.players.white,
            };
            if let Some(user) = &opponent_side.user {
                *opponents.entry(user.name.to_lowercase()).or_insert(0) += 1;
            }
        }

        normalize_array(&mut hours);
        normalize_map(&mut rep_white);
        normalize_map(&mut rep_black);
        normalize_map(&mut tc);

        Self {
            username: username.to_string(),
            games: games.len(),
            hours,
            repertoire_white: rep_white,
            repertoire_black: rep_black,
            time_controls: tc,
            opponents,
        }
    }

    /// Blended similarity in 0..1 against another fingerprint.
    ///
    /// Weighted mix: activity hours 0.35, opening repertoire 0.25, time
    /// controls 0.15, opponent pool overlap 0.25. The weights are tunables
    /// in the same sense as the classifier weights: reviewed, not learned.
    pub fn similarity(&self, other: &Fingerprint) -> f64 {
        let hours = cosine_arrays(&self.hours, &other.hours);

        // Average over colors with data; a user with no games as black
        // should not zero out half the repertoire term
        let mut rep_parts: Vec<f64> = Vec::with_capacity(2);
        if !(self.repertoire_white.is_empty() && other.repertoire_white.is_empty()) {
            rep_parts.push(cosine_maps(&self.repertoire_white, &other.repertoire_white));
        }
        if !(self.repertoire_black.is_empty() && other.repertoire_black.is_empty()) {
            rep_parts.push(cosine_maps(&self.repertoire_black, &other.repertoire_black));
        }
        let rep = if rep_parts.is_empty() {
            0.0
        } else {
            rep_parts.iter().sum::<f64>() / rep_parts.len() as f64
        };
        let tc = cosine_maps(&self.time_controls, &other.time_controls);
        let opp = overlap_coefficient(&self.opponents, &other.opponents);

        0.35 * hours + 0.25 * rep + 0.15 * tc + 0.25 * opp
    }

    /// Hours (0..24) this user is most active in, busiest first.
    pub fn peak_hours(&self, n: usize) -> Vec<usize> {
        let mut indexed: Vec<(usize, f64)> = self.hours.iter().copied().enumerate().collect();
        indexed.sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap_or(std::cmp::Ordering::Equal));
        indexed.into_iter().take(n).map(|(h, _)| h).collect()
    }
}

/// Alt comparison between two users.
#[derive(Debug, Clone)]
pub struct AltReport {
    pub a: Fingerprint,
    pub b: Fingerprint,
    pub similarity: f64,
    /// Above the review threshold
    pub flagged: bool,
}

/// Fetch both users' games and compare fingerprints.
pub async fn compare(api: &ApiClient, user_a: &str, user_b: &str) -> Result<AltReport, ApiError> {
    let games_a = recent_games(api, user_a, config::detect::MAX_GAMES, None).await?;
    let games_b = recent_games(api, user_b, config::detect::MAX_GAMES, None).await?;

    let a = Fingerprint::from_games(user_a, &games_a);
    let b = Fingerprint::from_games(user_b, &games_b);
    let similarity = a.similarity(&b);
    let flagged = similarity >= config::detect::ALT_SIMILARITY_THRESHOLD;

    if flagged {
        log::info!(
            "Alt check '{}' vs '{}': similarity {:.3}, above review threshold",
            user_a,
            user_b,
            similarity
        );
    }

    Ok(AltReport { a, b, similarity, flagged })
}

/// HTML fragment for the dashboard's alt panel.
pub fn render_report(report: &AltReport) -> String {
    let shared: usize = report
        .a
        .opponents
        .keys()
        .filter(|k| report.b.opponents.contains_key(*k))
        .count();

    render::definition_list(&[
        ("Users", format!("{} vs {}", report.a.username, report.b.username)),
        ("Games compared", format!("{} / {}", report.a.games, report.b.games)),
        ("Similarity", format!("{:.1}%", report.similarity * 100.0)),
        ("Shared opponents", shared.to_string()),
        (
            "Peak hours (UTC)",
            format!("{:?} vs {:?}", report.a.peak_hours(3), report.b.peak_hours(3)),
        ),
        ("Flagged", if report.flagged { "yes".into() } else { "no".into() }),
    ])
}

/// The user's own first moves in a game, joined with spaces.
fn own_opening(game: &ExportedGame, color: Color) -> Option<String> {
    let moves: Vec<&str> = game.moves.as_deref()?.split_ascii_whitespace().collect();
    let offset = match color {
        Color::White => 0,
        Color::Black => 1,
    };
    let own: Vec<&str> = moves
        .iter()
        .skip(offset)
        .step_by(2)
        .take(config::detect::REPERTOIRE_PLIES)
        .copied()
        .collect();
    if own.is_empty() {
        None
    } else {
        Some(own.join(" "))
    }
}

fn normalize_array(values: &mut [f64]) {
    let total: f64 = values.iter().sum();
    if total > 0.0 {
        for v in values.iter_mut() {
            *v /= total;
        }
    }
}

fn normalize_map(map: &mut HashMap<String, f64>) {
    let total: f64 = map.values().sum();
    if total > 0.0 {
        for v in map.values_mut() {
            *v /= total;
        }
    }
}

fn cosine_arrays(a: &[f64], b: &[f64]) -> f64 {
    let dot: f64 = a.iter().zip(b).map(|(x, y)| x * y).sum();
    let na: f64 = a.iter().map(|x| x * x).sum::<f64>().sqrt();
    let nb: f64 = b.iter().map(|x| x * x).sum::<f64>().sqrt();
    if na == 0.0 || nb == 0.0 {
        0.0
    } else {
        dot / (na * nb)
    }
}

fn cosine_maps(a: &HashMap<String, f64>, b: &HashMap<String, f64>) -> f64 {
    let dot: f64 = a.iter().filter_map(|(k, &x)| b.get(k).map(|&y| x * y)).sum();
    let na: f64 = a.values().map(|x| x * x).sum::<f64>().sqrt();
    let nb: f64 = b.values().map(|x| x * x).sum::<f64>().sqrt();
    if na == 0.0 || nb == 0.0 {
        0.0
    } else {
        dot / (na * nb)
    }
}

/// |A ∩ B| / min(|A|, |B|) over opponent name sets.
fn overlap_coefficient(a: &HashMap<String, u32>, b: &HashMap<String, u32>) -> f64 {
    if a.is_empty() || b.is_empty() {
        return 0.0;
    }
    let keys_a: HashSet<&String> = a.keys().collect();
    let keys_b: HashSet<&String> = b.keys().collect();
    let shared = keys_a.intersection(&keys_b).count();
    shared as f64 / keys_a.len().min(keys_b.len()) as f64
}
