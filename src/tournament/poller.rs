//! Background tournament chat poller.
//!
//! Runs as a `tokio::spawn`ed task, emitting `ChatAlert`s through an mpsc
//! channel; the dashboard layer drains the channel and renders the alerts.
//!
//! The active tournament set is refreshed on a slow interval; each tracked
//! tournament's chat is polled on its own schedule. First polls are
//! staggered by a hash of the tournament id so simultaneous hourly arenas
//! do not align their requests, and an idle chat backs off exponentially up
//! to a cap; any new message resets the interval to the minimum.

use std::collections::HashMap;
use tokio::sync::mpsc;
use tokio::time::{interval, Duration, Instant};

use crate::api::types::{ChatLine, Tournament};
use crate::api::ApiClient;
use crate::chat::classifier::{classify, Classified};
use crate::chat::timeout::{TimeoutGate, TimeoutOutcome};
use crate::core::{config, metrics};
use crate::storage::cache;

/// One reportable chat line, ready for the dashboard.
#[derive(Debug, Clone)]
pub struct ChatAlert {
    pub tournament_id: String,
    pub tournament_name: String,
    pub username: String,
    pub classified: Classified,
    /// Highlighted HTML fragment of the line
    pub html: String,
    /// Set when the line was actionable and the timeout gate ran
    pub timeout: Option<TimeoutOutcome>,
}

/// Per-tournament polling state.
struct Tracked {
    tournament: Tournament,
    /// Chat lines already processed (watermark)
    seen: usize,
    /// First chat fetch seeds the watermark without emitting alerts
    seeded: bool,
    next_poll: Instant,
    poll_interval: Duration,
    consecutive_errors: u32,
    /// Set when the tournament was first observed finished
    finished_since: Option<Instant>,
}

/// Start the poller background task.
///
/// Returns a receiver for `ChatAlert`s; dropping it stops the task on its
/// next send.
pub fn start_poller(api: ApiClient, gate: TimeoutGate) -> mpsc::UnboundedReceiver<ChatAlert> {
    let (tx, rx) = mpsc::unbounded_channel();

    tokio::spawn(async move {
        let mut poller = Poller {
            api,
            gate,
            tx,
            tracked: HashMap::new(),
            last_refresh: None,
        };

        let mut ticker = interval(config::poller::cycle());
        log::info!(
            "Tournament poller started (cycle: {}s, chat interval: {}..{}s)",
            config::poller::CYCLE_SECS,
            config::poller::MIN_POLL_SECS,
            config::poller::MAX_POLL_SECS,
        );

        loop {
            ticker.tick().await;
            if !poller.run_cycle().await {
                log::warn!("Alert channel closed, stopping tournament poller");
                return;
            }
        }
    });

    rx
}

struct Poller {
    api: ApiClient,
    gate: TimeoutGate,
    tx: mpsc::UnboundedSender<ChatAlert>,
    tracked: HashMap<String, Tracked>,
    last_refresh: Option<Instant>,
}

impl Poller {
    /// One cycle: refresh the tournament set if due, poll due chats, drop
    /// dead tournaments. Returns false once the receiver is gone.
    async fn run_cycle(&mut self) -> bool {
        let now = Instant::now();

        let refresh_due = self
            .last_refresh
            .map_or(true, |t| now.duration_since(t) >= config::poller::refresh_interval());
        if refresh_due {
            self.refresh().await;
            self.last_refresh = Some(now);
            cache::cleanup_all().await;
        }

        for id in self.due_ids(now) {
            if !self.poll_chat(&id).await {
                return false;
            }
        }

        self.drop_dead(now);
        metrics::TRACKED_TOURNAMENTS.set(self.tracked.len() as f64);
        true
    }

    /// Tournaments whose chat is due for a poll. Finished tournaments stay
    /// on the schedule through their grace period: the minutes right after
    /// a tournament ends are exactly when chat needs watching.
    fn due_ids(&self, now: Instant) -> Vec<String> {
        self.tracked
            .iter()
            .filter(|(_, t)| t.next_poll <= now)
            .map(|(id, _)| id.clone())
            .collect()
    }

    /// Refresh the tracked set from the tournament index.
    async fn refresh(&mut self) {
        let index = match self.api.tournament_index().await {
            Ok(index) => index,
            Err(e) => {
                log::warn!("Tournament index refresh failed: {}", e);
                return;
            }
        };

        let now_ms = chrono::Utc::now().timestamp_millis();
        let candidates = index
            .started
            .into_iter()
            .chain(
                index
                    .created
                    .into_iter()
                    .filter(|t| t.starts_at - now_ms <= config::poller::LEAD_SECS * 1000),
            );

        let mut added = 0;
        for tournament in candidates {
            let id = tournament.id.clone();
            match self.tracked.get_mut(&id) {
                Some(tracked) => tracked.tournament = tournament,
                None => {
                    self.tracked.insert(
                        id.clone(),
                        Tracked {
                            tournament,
                            seen: 0,
                            seeded: false,
                            next_poll: Instant::now() + stagger(&id),
                            poll_interval: Duration::from_secs(config::poller::MIN_POLL_SECS),
                            consecutive_errors: 0,
                            finished_since: None,
                        },
                    );
                    added += 1;
                }
            }
        }

        // Index no longer lists a tracked tournament, or lists it finished:
        // start its grace period
        for finished in index.finished {
            if let Some(tracked) = self.tracked.get_mut(&finished.id) {
                tracked.tournament = finished;
            }
        }
        for tracked in self.tracked.values_mut() {
            if tracked.tournament.is_finished() && tracked.finished_since.is_none() {
                tracked.finished_since = Some(Instant::now());
            }
        }

        if added > 0 {
            log::info!("Tracking {} tournament(s) ({} new)", self.tracked.len(), added);
        }
    }

    /// Poll one tournament's chat. Returns false once the receiver is gone.
    async fn poll_chat(&mut self, id: &str) -> bool {
        let chat = match self.api.tournament_chat(id).await {
            Ok(chat) => chat,
            Err(e) => {
                if let Some(tracked) = self.tracked.get_mut(id) {
                    tracked.consecutive_errors += 1;
                    tracked.next_poll = Instant::now() + tracked.poll_interval;
                    log::warn!(
                        "Chat fetch for {} failed ({} consecutive): {}",
                        id,
                        tracked.consecutive_errors,
                        e
                    );
                }
                return true;
            }
        };

        let Some(tracked) = self.tracked.get_mut(id) else {
            return true;
        };
        tracked.consecutive_errors = 0;

        if !tracked.seeded {
            // First sighting: seed the watermark, report nothing old
            tracked.seen = chat.len();
            tracked.seeded = true;
            tracked.next_poll = Instant::now() + tracked.poll_interval;
            return true;
        }

        let (start, new_seen) = advance_watermark(tracked.seen, chat.len());
        let fresh: Vec<ChatLine> = chat[start..].to_vec();
        let had_new = !fresh.is_empty();
        tracked.seen = new_seen;
        tracked.poll_interval = next_interval(tracked.poll_interval, had_new);
        tracked.next_poll = Instant::now() + tracked.poll_interval;

        let name = tracked.tournament.full_name.clone();
        for line in fresh {
            // Server announcements and already-moderated lines are skipped
            let Some(user) = line.user.clone() else { continue };
            if line.deleted || line.troll {
                continue;
            }

            let classified = classify(&line.text);
            if !classified.is_reportable() {
                continue;
            }

            if let Some(category) = classified.top_category() {
                metrics::CHAT_ALERTS_TOTAL.with_label_values(&[category.as_str()]).inc();
            }

            let timeout = if classified.is_actionable() {
                Some(self.gate.apply(&self.api, id, &user, &classified).await)
            } else {
                None
            };

            let alert = ChatAlert {
                tournament_id: id.to_string(),
                tournament_name: name.clone(),
                username: user,
                html: classified.render_html(),
                classified,
                timeout,
            };
            if self.tx.send(alert).is_err() {
                return false;
            }
        }

        true
    }

    /// Drop finished tournaments past their grace period and tournaments
    /// whose chat keeps failing.
    fn drop_dead(&mut self, now: Instant) {
        let grace = Duration::from_secs(config::poller::FINISH_GRACE_SECS as u64);
        self.tracked.retain(|id, t| {
            if let Some(since) = t.finished_since {
                if now.duration_since(since) >= grace {
                    log::info!("Dropping finished tournament {}", id);
                    return false;
                }
            }
            if t.consecutive_errors >= config::poller::MAX_CONSECUTIVE_ERRORS {
                log::warn!(
                    "Dropping tournament {} after {} consecutive chat errors",
                    id,
                    t.consecutive_errors
                );
                return false;
            }
            true
        });
    }
}

/// Stagger a tournament's first poll inside the minimum interval so
/// same-minute arenas don't fetch in lockstep.
fn stagger(tournament_id: &str) -> Duration {
    let hash: u64 = tournament_id.bytes().fold(0u64, |acc, b| acc.wrapping_mul(31).wrapping_add(b as u64));
    Duration::from_secs(hash % config::poller::MIN_POLL_SECS.max(1))
}

/// Idle chats double their interval up to the cap; activity resets it.
fn next_interval(current: Duration, had_new: bool) -> Duration {
    if had_new {
        Duration::from_secs(config::poller::MIN_POLL_SECS)
    } else {
        (current * 2).min(Duration::from_secs(config::poller::MAX_POLL_SECS))
    }
}

/// Advance the seen-lines watermark. The server keeps a bounded chat
/// window, so a shorter list than last time means the window rotated: reset
/// to the new end and process nothing rather than replaying old lines.
fn advance_watermark(seen: usize, chat_len: usize) -> (usize, usize) {
    if chat_len < seen {
        (chat_len, chat_len)
    } else {
        (seen, chat_len)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::Throttle;

    fn test_poller() -> (Poller, mpsc::UnboundedReceiver<ChatAlert>) {
        let (tx, rx) = mpsc::unbounded_channel();
        let poller = Poller {
            api: ApiClient::with_base("http://127.0.0.1:1", None, Throttle::new()).unwrap(),
            gate: TimeoutGate::with_settings(Duration::from_secs(60), false),
            tx,
            tracked: HashMap::new(),
            last_refresh: None,
        };
        (poller, rx)
    }

    fn tracked_finished(now: Instant) -> Tracked {
        Tracked {
            tournament: Tournament {
                id: "t1".into(),
                full_name: "Hourly Blitz".into(),
                starts_at: 0,
                finishes_at: None,
                status: Tournament::STATUS_FINISHED,
                nb_players: 44,
            },
            seen: 3,
            seeded: true,
            next_poll: now - Duration::from_millis(1),
            poll_interval: Duration::from_secs(config::poller::MIN_POLL_SECS),
            consecutive_errors: 0,
            finished_since: Some(now),
        }
    }

    #[tokio::test]
    async fn test_finished_tournament_stays_due_through_grace() {
        let (mut poller, _rx) = test_poller();
        let now = Instant::now();
        poller.tracked.insert("t1".into(), tracked_finished(now));

        // Inside the grace window the chat stays on the poll schedule and
        // the tournament is not dropped
        assert_eq!(poller.due_ids(now), vec!["t1".to_string()]);
        poller.drop_dead(now);
        assert!(poller.tracked.contains_key("t1"));
    }

    #[tokio::test]
    async fn test_finished_tournament_dropped_after_grace() {
        let (mut poller, _rx) = test_poller();
        let now = Instant::now();
        poller.tracked.insert("t1".into(), tracked_finished(now));

        let later = now + Duration::from_secs(config::poller::FINISH_GRACE_SECS as u64 + 1);
        poller.drop_dead(later);
        assert!(poller.tracked.is_empty());
    }

    #[test]
    fn test_stagger_is_stable_and_bounded() {
        let a = stagger("winter-arena");
        let b = stagger("winter-arena");
        assert_eq!(a, b);
        assert!(a < Duration::from_secs(config::poller::MIN_POLL_SECS));
    }

    #[test]
    fn test_stagger_spreads_ids() {
        // Not a distribution test, just that different ids can differ
        let distinct: std::collections::HashSet<Duration> =
            ["a1", "b2", "c3", "d4", "e5", "f6"].iter().map(|id| stagger(id)).collect();
        assert!(distinct.len() > 1);
    }

    #[test]
    fn test_backoff_doubles_and_caps() {
        let min = Duration::from_secs(config::poller::MIN_POLL_SECS);
        let max = Duration::from_secs(config::poller::MAX_POLL_SECS);

        let mut cur = min;
        for _ in 0..20 {
            cur = next_interval(cur, false);
        }
        assert_eq!(cur, max);
    }

    #[test]
    fn test_activity_resets_backoff() {
        let max = Duration::from_secs(config::poller::MAX_POLL_SECS);
        assert_eq!(next_interval(max, true), Duration::from_secs(config::poller::MIN_POLL_SECS));
    }

    #[test]
    fn test_watermark_advances() {
        assert_eq!(advance_watermark(5, 8), (5, 8));
        assert_eq!(advance_watermark(0, 0), (0, 0));
    }

    #[test]
    fn test_watermark_resets_on_rotation() {
        // Server truncated its chat window below our watermark
        assert_eq!(advance_watermark(50, 30), (30, 30));
    }
}
