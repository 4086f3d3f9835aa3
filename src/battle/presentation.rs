//! Boundary to whatever shows the battle to a player.
//!
//! The core only pushes text and animation requests through a
//! `PresentationSink`. The one place it waits on the other side is
//! `request_acknowledgement`, used for send-out animations: a sink that
//! answers `AnimationAck::Pending` parks the turn in `TurnPhase::TurnBlocked`
//! until the caller reports completion through `Battle::acknowledge_animation`.

use crate::battle::battler::{BattlerId, Position};
use schema::{DbSymbol, StatType};
use serde::Serialize;
use std::sync::{Arc, Mutex};

#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum Animation {
    SendOut { battler: BattlerId, position: Position },
    Recall { battler: BattlerId },
    MoveUsed { user: BattlerId, move_used: DbSymbol },
    Hit { target: BattlerId },
    Faint { battler: BattlerId },
    StatChange { target: BattlerId, stat: StatType, rising: bool },
    SubstituteAppear { battler: BattlerId },
    SubstituteFade { battler: BattlerId },
    MegaEvolution { battler: BattlerId },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AnimationAck {
    Complete,
    /// The animation is still running; the caller will acknowledge later.
    Pending,
}

pub trait PresentationSink: std::fmt::Debug {
    fn display_message(&mut self, text: &str);

    fn display_message_and_wait(&mut self, text: &str) {
        self.display_message(text);
    }

    fn play_animation(&mut self, animation: &Animation);

    /// Plays an animation the turn must not outrun.
    fn request_acknowledgement(&mut self, animation: &Animation) -> AnimationAck {
        self.play_animation(animation);
        AnimationAck::Complete
    }
}

/// Discards everything.
#[derive(Debug, Default, Clone, Copy)]
pub struct NullSink;

impl PresentationSink for NullSink {
    fn display_message(&mut self, _text: &str) {}

    fn play_animation(&mut self, _animation: &Animation) {}
}

#[derive(Debug, Default, Clone, PartialEq)]
pub struct SinkLog {
    pub messages: Vec<String>,
    pub animations: Vec<Animation>,
    pub acknowledgements_requested: usize,
}

/// Keeps everything it receives behind a shared handle.
///
/// Clones share the same log, so a test can keep one clone while the battle
/// owns another.
#[derive(Debug, Default, Clone)]
pub struct RecordingSink {
    log: Arc<Mutex<SinkLog>>,
    defer_acknowledgements: bool,
}

impl RecordingSink {
    pub fn new() -> Self {
        Self::default()
    }

    /// A sink that answers every acknowledgement request with `Pending`.
    pub fn deferring() -> Self {
        Self {
            defer_acknowledgements: true,
            ..Self::default()
        }
    }

    pub fn snapshot(&self) -> SinkLog {
        self.log.lock().map(|log| log.clone()).unwrap_or_default()
    }

    pub fn messages(&self) -> Vec<String> {
        self.snapshot().messages
    }

    fn with_log(&self, f: impl FnOnce(&mut SinkLog)) {
        if let Ok(mut log) = self.log.lock() {
            f(&mut log);
        }
    }
}

impl PresentationSink for RecordingSink {
    fn display_message(&mut self, text: &str) {
        self.with_log(|log| log.messages.push(text.to_string()));
    }

    fn play_animation(&mut self, animation: &Animation) {
        self.with_log(|log| log.animations.push(animation.clone()));
    }

    fn request_acknowledgement(&mut self, animation: &Animation) -> AnimationAck {
        self.with_log(|log| {
            log.animations.push(animation.clone());
            log.acknowledgements_requested += 1;
        });
        if self.defer_acknowledgements {
            AnimationAck::Pending
        } else {
            AnimationAck::Complete
        }
    }
}

/// Prints messages to stdout.
#[derive(Debug, Default, Clone, Copy)]
pub struct ConsoleSink {
    pub show_animations: bool,
}

impl PresentationSink for ConsoleSink {
    fn display_message(&mut self, text: &str) {
        println!("{}", text);
    }

    fn display_message_and_wait(&mut self, text: &str) {
        println!("{}", text);
        println!();
    }

    fn play_animation(&mut self, animation: &Animation) {
        if self.show_animations {
            println!("  ~ {:?}", animation);
        }
    }
}
