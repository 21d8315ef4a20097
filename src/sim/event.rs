/// Events emitted during a simulation step.
/// The presentation layer and the log consume these.

#[derive(Clone, Debug, PartialEq)]
pub enum GameEvent {
    PairSpawned { top_height: f64 },
    PipesPruned { count: usize },
    Scored { score: u32 },
    SpeedChanged { speed: f64 },
    HitBoundary,
    HitPipe,
}

impl GameEvent {
    /// Did this event end the run?
    pub fn is_fatal(&self) -> bool {
        matches!(self, GameEvent::HitBoundary | GameEvent::HitPipe)
    }
}
