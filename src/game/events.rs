//! Notifications emitted for the presentation and audio layers.
//!
//! The engine queues these and never waits on them. A host drains the queue
//! after each tick or action.

use serde::Serialize;

use crate::game::{CardId, Coord, Outcome, Side};

/// Named audio cue. The engine knows nothing about cue contents.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum AudioCue {
    /// A batch of pieces was drawn.
    PieceDrawn,
    /// A card was drawn.
    CardDrawn,
    /// A unit-targeted card was selected.
    CardSelected,
    /// A knowledge card was used.
    KnowledgeCardUsed,
}

/// Fire-and-forget notification.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum MatchEvent {
    /// Turn ownership changed.
    TurnChanged {
        /// Side now acting.
        side: Side,
    },
    /// Play the turn-change banner.
    TurnChangeAnimation,
    /// Moves left for the acting side.
    MovesLeftChanged {
        /// Remaining moves.
        moves: u32,
    },
    /// Pointer capture should be locked (opponent acting) or released.
    PointerCapture {
        /// Whether the pointer is locked.
        locked: bool,
    },
    /// Knowledge counter changed.
    KnowledgeChanged {
        /// New knowledge value.
        knowledge: u32,
    },
    /// A side's accumulated volume changed.
    VolumeFillChanged {
        /// Side whose tally changed.
        side: Side,
        /// New tally.
        value: f32,
        /// Threshold to win.
        max: f32,
    },
    /// A unit was placed or stacked.
    UnitPlaced {
        /// Owning side.
        side: Side,
        /// Tile placed on.
        coord: Coord,
    },
    /// A prism turned to attack.
    AttackTelegraphed {
        /// Attacking prism.
        from: Coord,
        /// Target tile.
        to: Coord,
    },
    /// A unit was destroyed and removed from the board.
    UnitDestroyed {
        /// Owning side.
        side: Side,
        /// Tile it stood on.
        coord: Coord,
    },
    /// A knowledge card was picked up.
    CardPickedUp {
        /// Card held.
        card: CardId,
    },
    /// A held knowledge card was dropped.
    CardDropped {
        /// Card released.
        card: CardId,
    },
    /// A card was used and left the hand.
    CardUsed {
        /// Card consumed.
        card: CardId,
    },
    /// Start fading out the board at the end of a match.
    FadeIn,
    /// Show the win or lose screen.
    MatchEnded {
        /// Final result.
        outcome: Outcome,
    },
    /// Open the tutorial panel.
    TutorialShouldOpen,
    /// Play an audio cue.
    Audio {
        /// Cue name.
        cue: AudioCue,
    },
}
