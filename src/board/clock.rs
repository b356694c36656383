// Elapsed-time counter shown next to the board.
// Counts whole seconds fed by the tick timer; it never reads a wall clock, so
// a paused tab simply stops counting.

/// ElapsedClock counts seconds since the game started.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ElapsedClock {
    seconds: u32,
    running: bool,
}

impl ElapsedClock {
    pub fn new() -> Self {
        Self::default()
    }

    /// Resets to zero and starts counting.
    pub fn start(&mut self) {
        self.seconds = 0;
        self.running = true;
    }

    pub fn stop(&mut self) {
        self.running = false;
    }

    /// Advances one second. Returns false (and does nothing) when stopped.
    pub fn tick(&mut self) -> bool {
        if !self.running {
            return false;
        }
        self.seconds = self.seconds.saturating_add(1);
        true
    }

    pub fn seconds(&self) -> u32 {
        self.seconds
    }

    pub fn is_running(&self) -> bool {
        self.running
    }

    /// `m:ss`, e.g. `0:07` or `12:05`.
    pub fn display(&self) -> String {
        format!("{}:{:02}", self.seconds / 60, self.seconds % 60)
    }
}
