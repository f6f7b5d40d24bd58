//! Output formatting utilities for CLI.

use std::fmt::Write;

use prismfall::{MatchEvent, MatchSummary, Outcome};

/// Format a match summary as human-readable text.
pub(super) fn format_text(summary: &MatchSummary) -> String {
    let mut output = String::new();

    let _ = writeln!(output, "Match Result (seed: {})", summary.seed);
    let winner = match summary.outcome {
        Some(Outcome::PlayerWin) => "Player",
        Some(Outcome::OpponentWin) => "Opponent",
        None => "Undecided",
    };
    let _ = writeln!(output, "  Winner: {winner}");
    let _ = writeln!(
        output,
        "  Turns: {} ({:.1}s simulated)",
        summary.turns_played, summary.elapsed
    );
    let _ = writeln!(output, "  Deck reshuffles: {}", summary.deck_reshuffles);
    let _ = writeln!(output);
    let _ = writeln!(
        output,
        "  Player:   {:>7.1} volume, {} units on board",
        summary.player_volume, summary.player_units
    );
    let _ = writeln!(
        output,
        "  Opponent: {:>7.1} volume, {} units on board",
        summary.opponent_volume, summary.opponent_units
    );

    output
}

/// Format a single event as one log line.
pub(super) fn format_event(elapsed: f64, event: &MatchEvent) -> String {
    match serde_json::to_string(event) {
        Ok(json) => format!("[{elapsed:>8.2}] {json}"),
        Err(_) => format!("[{elapsed:>8.2}] {event:?}"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use prismfall::Side;

    fn summary(outcome: Option<Outcome>) -> MatchSummary {
        MatchSummary {
            seed: 42,
            outcome,
            turns_played: 12,
            elapsed: 96.0,
            player_volume: 1000.0,
            opponent_volume: 380.0,
            knowledge: 0,
            max_player_moves: 2,
            deck_reshuffles: 1,
            player_units: 5,
            opponent_units: 3,
        }
    }

    #[test]
    fn test_format_text() {
        let text = format_text(&summary(Some(Outcome::PlayerWin)));
        assert!(text.contains("seed: 42"));
        assert!(text.contains("Winner: Player"));
        assert!(text.contains("Turns: 12"));
    }

    #[test]
    fn test_format_text_undecided() {
        assert!(format_text(&summary(None)).contains("Undecided"));
    }

    #[test]
    fn test_format_event_is_json() {
        let line = format_event(1.5, &MatchEvent::TurnChanged { side: Side::Opponent });
        assert!(line.contains(r#""event":"turn_changed""#));
        assert!(line.contains(r#""side":"opponent""#));
    }
}
