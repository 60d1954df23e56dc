//! Shared fixtures for integration tests.

use arbiter::api::types::{ExportedGame, GamePlayers, GameSide, LightUser};

/// Build a rated blitz game. `user` plays white; `user_lost` flips the
/// winner; `plies` controls the synthetic move list length.
pub fn game_fixture(
    ts: i64,
    user: &str,
    own_rating: i32,
    opp: &str,
    opp_rating: i32,
    user_lost: bool,
    plies: usize,
) -> ExportedGame {
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
