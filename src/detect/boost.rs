//! Boosting / sandbagging heuristics.
//!
//! Works over the rating timeline of a user's recent rated games. Every
//! signal is a plain statistic a moderator can verify by eye in the game
//! list; the composite score only orders the review queue, it decides
//! nothing.

use std::collections::HashMap;

use crate::api::types::ExportedGame;
use crate::api::{ApiClient, ApiError};
use crate::core::config;
use crate::detect::games::recent_games;
use crate::detect::stats;
use crate::render;

/// Sandbagging/boosting analysis of one user.
#[derive(Debug, Clone)]
pub struct BoostReport {
    pub username: String,
    /// Rated games the analysis saw (chronological)
    pub games: usize,
    /// Longest run of consecutive losses
    pub longest_loss_streak: u32,
    /// Losses against opponents rated below the user
    pub losses_to_lower_rated: u32,
    /// Decisive losses over in few plies, the classic dumped game
    pub dumped_losses: u32,
    /// Largest rating fall inside the sliding window
    pub max_rating_drop: i32,
    /// Median of the user's rating over the sample
    pub median_rating: f64,
    /// MAD of the rating timeline
    pub rating_mad: f64,
    /// How far below their median the user currently sits, in MAD units
    /// (positive = below median)
    pub current_deviation: f64,
    /// Composite 0..100 ordering score
    pub sandbag_score: f64,
    /// Lower-rated opponents who took points off this user, by count;
    /// the boosting side of the same coin
    pub beneficiaries: Vec<(String, u32)>,
}

/// Fetch games and compute the report.
pub async fn analyze(api: &ApiClient, username: &str, perf: Option<&str>) -> Result<BoostReport, ApiError> {
    let games = recent_games(api, username, config::detect::MAX_GAMES, perf).await?;
    Ok(compute(username, &games))
}

/// Pure computation over a game list (export order: newest first).
pub fn compute(username: &str, games: &[ExportedGame]) -> BoostReport {
    // Chronological order for timeline signals
    let mut timeline: Vec<&ExportedGame> = games.iter().filter(|g| g.side_of(username).is_some()).collect();
    timeline.sort_by_key(|g| g.created_at);

    let mut ratings: Vec<f64> = Vec::with_capacity(timeline.len());
    let mut longest_streak = 0u32;
    let mut streak = 0u32;
    let mut losses_to_lower = 0u32;
    let mut dumped = 0u32;
    let mut losses = 0u32;
    let mut beneficiaries: HashMap<String, u32> = HashMap::new();

    for game in &timeline {
        let Some(color) = game.side_of(username) else { continue };
        let (own, opp) = match color {
            crate::api::types::Color::White => (&game.players.white, &game.players.black),
            crate::api::types::Color::Black => (&game.players.black, &game.players.white),
        };
        let own_rating = own.rating.unwrap_or(0);
        if own_rating > 0 {
            ratings.push(own_rating as f64);
        }

        if game.lost_by(username) {
            losses += 1;
            streak += 1;
            longest_streak = longest_streak.max(streak);

            let opp_rating = opp.rating.unwrap_or(0);
            if opp_rating > 0 && opp_rating < own_rating {
                losses_to_lower += 1;
                if let Some(user) = &opp.user {
                    *beneficiaries.entry(user.name.clone()).or_insert(0) += 1;
                }
            }
            if is_decisive(&game.status) && game.plies() <= config::detect::DUMP_PLY_THRESHOLD {
                dumped += 1;
            }
        } else {
            streak = 0;
        }
    }

    let max_drop = max_window_drop(&ratings, config::detect::DROP_WINDOW);
    let median_rating = stats::median(&ratings).unwrap_or(0.0);
    let rating_mad = stats::mad(&ratings).unwrap_or(0.0);
    let current = ratings.last().copied().unwrap_or(median_rating);
    let current_deviation = if rating_mad > 0.0 {
        (median_rating - current) / rating_mad
    } else {
        0.0
    };

    let sandbag_score = composite_score(longest_streak, dumped, losses, max_drop, current_deviation);

    let mut beneficiaries: Vec<(String, u32)> = beneficiaries.into_iter().collect();
    beneficiaries.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
    beneficiaries.truncate(10);

    BoostReport {
        username: username.to_string(),
        games: timeline.len(),
        longest_loss_streak: longest_streak,
        losses_to_lower_rated: losses_to_lower,
        dumped_losses: dumped,
        max_rating_drop: max_drop,
        median_rating,
        rating_mad,
        current_deviation,
        sandbag_score,
        beneficiaries,
    }
}

/// HTML fragment for the dashboard's boost panel.
pub fn render_report(report: &BoostReport) -> String {
    let deviation = if report.current_deviation >= 0.0 {
        format!("{:.1} MAD below median", report.current_deviation)
    } else {
        format!("{:.1} MAD above median", -report.current_deviation)
    };

    let mut out = render::definition_list(&[
        ("User", report.username.clone()),
        ("Games analyzed", report.games.to_string()),
        ("Sandbag score", format!("{:.0}/100", report.sandbag_score)),
        ("Longest loss streak", report.longest_loss_streak.to_string()),
        ("Losses to lower-rated", report.losses_to_lower_rated.to_string()),
        ("Dumped losses", report.dumped_losses.to_string()),
        ("Max rating drop", report.max_rating_drop.to_string()),
        (
            "Rating (median ± MAD)",
            format!("{:.0} ± {:.0}", report.median_rating, report.rating_mad),
        ),
        ("Current deviation", deviation),
    ]);

    if !report.beneficiaries.is_empty() {
        let rows: Vec<Vec<String>> = report
            .beneficiaries
            .iter()
            .map(|(name, wins)| vec![name.clone(), wins.to_string()])
            .collect();
        out.push_str(&render::table(&["beneficiary", "wins vs user"], &rows));
    }
    out
}

/// A loss that actually ended in a result, not an abort.
fn is_decisive(status: &str) -> bool {
    matches!(status, "mate" | "resign" | "outoftime" | "timeout")
}

/// Largest fall from a rating to a later rating within `window` games.
fn max_window_drop(ratings: &[f64], window: usize) -> i32 {
    let mut max_drop = 0.0f64;
    for (i, &start) in ratings.iter().enumerate() {
        let end = (i + window).min(ratings.len());
        for &later in &ratings[i + 1..end] {
            max_drop = max_drop.max(start - later);
        }
    }
    max_drop.round() as i32
}

/// Blend the signals into 0..100. Normalizers are tunables like everything
/// else in `config::detect`.
fn composite_score(streak: u32, dumped: u32, losses: u32, max_drop: i32, deviation: f64) -> f64 {
    let streak_n = (streak as f64 / 8.0).min(1.0);
    let dump_share = if losses > 0 { dumped as f64 / losses as f64 } else { 0.0 };
    let drop_n = (max_drop as f64 / 200.0).min(1.0);
    let dev_n = (deviation.max(0.0) / config::detect::MAD_DEVIATION_LIMIT).min(1.0);

    100.0 * (0.3 * streak_n + 0.25 * dump_share + 0.25 * drop_n + 0.2 * dev_n)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::types::{GamePlayers, GameSide, LightUser};

    fn game(
        ts: i64,
        user: &str,
        own_rating: i32,
        opp: &str,
        opp_rating: i32,
        user_lost: bool,
        plies: usize,
    ) -> ExportedGame {
        // User always plays white in the fixture; winner flips accordingly
        ExportedGame {
            id: format!("g{ts}"),
            rated: true,
            speed: "blitz".into(),
            perf: "blitz".into(),
            created_at: ts,
            last_move_at: None,
            status: "resign".into(),
            winner: Some(if user_lost { "black".into() } else { "white".into() }),
            players: GamePlayers {
                white: GameSide {
                    user: Some(LightUser {
                        name: user.into(),
                        id: None,
                    }),
                    rating: Some(own_rating),
                    rating_diff: None,
                },
                black: GameSide {
                    user: Some(LightUser {
                        name: opp.into(),
                        id: None,
                    }),
                    rating: Some(opp_rating),
                    rating_diff: None,
                },
            },
            moves: Some(vec!["e4"; plies].join(" ")),
        }
    }

    #[test]
    fn test_clean_player_scores_low() {
        // Alternating wins and losses against peers, stable rating
        let games: Vec<ExportedGame> = (0..20)
            .map(|i| game(1000 + i, "alice", 1800, "opp", 1805, i % 2 == 0, 60))
            .collect();
        let report = compute("alice", &games);

        assert!(report.longest_loss_streak <= 1);
        assert_eq!(report.dumped_losses, 0);
        assert!(report.sandbag_score < 15.0, "score was {}", report.sandbag_score);
    }

    #[test]
    fn test_sandbagger_scores_high() {
        // Ten quick losses in a row to lower-rated opponents, rating sliding
        let games: Vec<ExportedGame> = (0..10)
            .map(|i| game(1000 + i, "bagger", 1900 - i as i32 * 25, "lucky", 1600, true, 12))
            .collect();
        let report = compute("bagger", &games);

        assert_eq!(report.longest_loss_streak, 10);
        assert_eq!(report.losses_to_lower_rated, 10);
        assert_eq!(report.dumped_losses, 10);
        assert!(report.max_rating_drop >= 200);
        assert!(report.sandbag_score > 70.0, "score was {}", report.sandbag_score);
    }

    #[test]
    fn test_beneficiaries_ranked_by_wins() {
        let mut games = Vec::new();
        for i in 0..3 {
            games.push(game(1000 + i, "bagger", 1900, "harvester", 1600, true, 12));
        }
        games.push(game(2000, "bagger", 1900, "bystander", 1600, true, 12));

        let report = compute("bagger", &games);
        assert_eq!(report.beneficiaries[0], ("harvester".to_string(), 3));
        assert_eq!(report.beneficiaries[1], ("bystander".to_string(), 1));
    }

    #[test]
    fn test_deviation_measured_in_mad_units() {
        // Stable around 1800, then a cliff at the end
        let mut games: Vec<ExportedGame> = (0..16)
            .map(|i| game(1000 + i, "alice", 1800 + (i % 3) as i32 * 10, "opp", 1800, false, 60))
            .collect();
        games.push(game(2000, "alice", 1600, "opp", 1800, true, 60));

        let report = compute("alice", &games);
        assert!(report.current_deviation > 2.0, "deviation was {}", report.current_deviation);
    }

    #[test]
    fn test_empty_games_do_not_panic() {
        let report = compute("ghost", &[]);
        assert_eq!(report.games, 0);
        assert_eq!(report.sandbag_score, 0.0);
    }

    #[test]
    fn test_render_reports_deviation_direction() {
        // Climbing player: current rating above their median, negative
        // deviation must read as "above", never as a signed "below"
        let games: Vec<ExportedGame> = (0..10)
            .map(|i| game(1000 + i, "climber", 1700 + i as i32 * 20, "opp", 1700, false, 60))
            .collect();
        let report = compute("climber", &games);
        assert!(report.current_deviation < 0.0);

        let html = render_report(&report);
        assert!(html.contains("1.8 MAD above median"), "html was {html}");
        assert!(!html.contains("-1.8"), "negative sign leaked into {html}");
    }

    #[test]
    fn test_render_report_contains_signals() {
        let games: Vec<ExportedGame> = (0..4).map(|i| game(1000 + i, "bagger", 1900, "lucky", 1600, true, 12)).collect();
        let report = compute("bagger", &games);
        let html = render_report(&report);

        assert!(html.contains("Sandbag score"));
        assert!(html.contains("beneficiary"));
        assert!(html.contains("lucky"));
    }
}
