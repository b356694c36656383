//! Memory tile game engine.
//!
//! A board of face-down tile pairs. The player flips two tiles at a time: a
//! matching pair stays face up, a mismatch stays visible for the settle delay
//! and is then turned back down. The engine is a plain value driven by
//! [`GameEvent`]s through [`Engine::handle_event`]; it pushes state to a
//! [`Surface`] and asks an injected [`Timers`] service for the settle delay
//! and the elapsed-time tick, so the whole game can run headless.
//!
//! States: `Idle` (no board) → `Playing` → `Won`. `Won` is left only by
//! starting a new game.

use std::fmt;

use rand::SeedableRng;
use rand::rngs::SmallRng;
use rand::seq::SliceRandom;
use serde::Deserialize;
use tracing::{debug, info, warn};

use crate::config::GameConfig;
use crate::timer::{TimerId, Timers, VirtualTimers};

mod best_score;
mod board_easy;
mod board_hard;
mod clock;

pub use best_score::{BestScores, KeyValueStore, MemoryStore};
pub use board_easy::EASY_SYMBOLS;
pub use board_hard::HARD_SYMBOLS;
pub use clock::ElapsedClock;

// --- Levels -------------------------------------------------------------------

/// Level descriptor (immutable).
#[derive(Debug)]
pub struct LevelDesc {
    pub name: &'static str,
    /// Label shown on the page.
    pub title: &'static str,
    /// Key of the best score in the key-value store.
    pub storage_key: &'static str,
    /// One entry per pair.
    pub symbols: &'static [&'static str],
}

impl LevelDesc {
    pub fn pair_count(&self) -> usize {
        self.symbols.len()
    }

    pub fn board_len(&self) -> usize {
        self.symbols.len() * 2
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Deserialize)]
#[serde(from = "String")]
pub enum Level {
    #[default]
    Easy,
    Hard,
}

impl Level {
    pub const ALL: [Level; 2] = [Level::Easy, Level::Hard];

    pub fn desc(self) -> &'static LevelDesc {
        match self {
            Level::Easy => &board_easy::EASY,
            Level::Hard => &board_hard::HARD,
        }
    }

    pub fn pair_count(self) -> usize {
        self.desc().pair_count()
    }

    pub fn board_len(self) -> usize {
        self.desc().board_len()
    }

    /// Unknown names fall back to easy.
    pub fn parse(name: &str) -> Self {
        match name.trim().to_ascii_lowercase().as_str() {
            "hard" => Level::Hard,
            _ => Level::Easy,
        }
    }
}

impl From<&str> for Level {
    fn from(name: &str) -> Self {
        Level::parse(name)
    }
}

impl From<String> for Level {
    fn from(name: String) -> Self {
        Level::parse(&name)
    }
}

impl fmt::Display for Level {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.desc().name)
    }
}

// --- Board ----------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Tile {
    pub symbol: &'static str,
    /// Face up. Stays true once matched.
    pub revealed: bool,
    pub matched: bool,
}

impl Tile {
    pub const fn new(symbol: &'static str) -> Self {
        Self {
            symbol,
            revealed: false,
            matched: false,
        }
    }
}

/// Tiles in page order; position is identity.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Board {
    level: Level,
    tiles: Vec<Tile>,
}

impl Board {
    /// Two tiles per level symbol in a uniformly random order.
    pub fn shuffled<R: rand::Rng + ?Sized>(level: Level, rng: &mut R) -> Self {
        let mut tiles: Vec<Tile> = level
            .desc()
            .symbols
            .iter()
            .flat_map(|&symbol| [Tile::new(symbol), Tile::new(symbol)])
            .collect();
        tiles.shuffle(rng);
        Self { level, tiles }
    }

    /// Board with a fixed layout. `None` unless `symbols` uses every level
    /// symbol exactly twice.
    pub fn from_symbols(level: Level, symbols: &[&str]) -> Option<Self> {
        let desc = level.desc();
        if symbols.len() != desc.board_len() {
            return None;
        }
        let mut tiles = Vec::with_capacity(symbols.len());
        for symbol in symbols {
            let known = desc.symbols.iter().find(|s| **s == *symbol)?;
            tiles.push(Tile::new(*known));
        }
        let board = Self { level, tiles };
        desc.symbols
            .iter()
            .all(|s| board.symbol_count(s) == 2)
            .then_some(board)
    }

    pub fn level(&self) -> Level {
        self.level
    }

    pub fn len(&self) -> usize {
        self.tiles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tiles.is_empty()
    }

    pub fn pair_count(&self) -> usize {
        self.tiles.len() / 2
    }

    pub fn tiles(&self) -> &[Tile] {
        &self.tiles
    }

    pub fn tile(&self, index: usize) -> Option<&Tile> {
        self.tiles.get(index)
    }

    pub fn symbol_count(&self, symbol: &str) -> usize {
        self.tiles.iter().filter(|t| t.symbol == symbol).count()
    }

    /// Position of the other tile carrying the same symbol.
    pub fn partner_of(&self, index: usize) -> Option<usize> {
        let symbol = self.tiles.get(index)?.symbol;
        self.tiles
            .iter()
            .enumerate()
            .position(|(i, t)| i != index && t.symbol == symbol)
    }

    pub fn all_matched(&self) -> bool {
        self.tiles.iter().all(|t| t.matched)
    }
}

// --- Events / state ---------------------------------------------------------------

/// Tiles revealed but not yet resolved.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Selection {
    #[default]
    Empty,
    One(usize),
    Two(usize, usize),
}

impl Selection {
    pub fn len(self) -> usize {
        match self {
            Selection::Empty => 0,
            Selection::One(_) => 1,
            Selection::Two(..) => 2,
        }
    }

    pub fn is_empty(self) -> bool {
        self == Selection::Empty
    }

    pub fn contains(self, index: usize) -> bool {
        match self {
            Selection::Empty => false,
            Selection::One(a) => a == index,
            Selection::Two(a, b) => a == index || b == index,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Phase {
    #[default]
    Idle,
    Playing,
    Won,
}

/// Everything that can happen to a game. Timer events carry the epoch of the
/// game that scheduled them.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GameEvent {
    StartRequested(Level),
    TileClicked(usize),
    Tick { epoch: u64 },
    SettleElapsed { epoch: u64 },
}

/// What an event did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transition {
    Ignored,
    Started,
    FirstReveal,
    Matched { finished: bool },
    Mismatch { pair: [usize; 2] },
    Settled,
    Ticked,
}

/// Rendering collaborator. The engine only pushes; it never reads back.
pub trait Surface {
    fn render(&mut self, board: &Board);
    fn set_counters(&mut self, moves: u32, matches: u32);
    fn set_elapsed(&mut self, text: &str);
    fn show_win(&mut self);
    fn hide_win(&mut self);
    fn set_best_scores(&mut self, easy: Option<u32>, hard: Option<u32>);
}

// --- Engine -----------------------------------------------------------------------

pub struct Engine<S, K, T> {
    surface: S,
    scores: BestScores<K>,
    timers: T,
    rng: SmallRng,
    config: GameConfig,
    board: Option<Board>,
    selection: Selection,
    locked: bool,
    moves: u32,
    matches: u32,
    clock: ElapsedClock,
    phase: Phase,
    /// Bumped on every start; stale timer events are dropped by comparing it.
    epoch: u64,
    tick_timer: Option<TimerId>,
    settle_timer: Option<TimerId>,
}

impl<S: Surface, K: KeyValueStore, T: Timers> Engine<S, K, T> {
    /// Engine shuffling from OS / browser entropy.
    pub fn new(surface: S, store: K, timers: T, config: GameConfig) -> Self {
        Self::with_rng(surface, store, timers, config, SmallRng::from_entropy())
    }

    /// Engine with a reproducible shuffle.
    pub fn with_seed(surface: S, store: K, timers: T, config: GameConfig, seed: u64) -> Self {
        Self::with_rng(surface, store, timers, config, SmallRng::seed_from_u64(seed))
    }

    fn with_rng(surface: S, store: K, timers: T, config: GameConfig, rng: SmallRng) -> Self {
        Self {
            surface,
            scores: BestScores::new(store),
            timers,
            rng,
            config,
            board: None,
            selection: Selection::Empty,
            locked: false,
            moves: 0,
            matches: 0,
            clock: ElapsedClock::new(),
            phase: Phase::Idle,
            epoch: 0,
            tick_timer: None,
            settle_timer: None,
        }
    }

    /// Single entry point for page input and timer callbacks.
    pub fn handle_event(&mut self, event: GameEvent) -> Transition {
        let transition = match event {
            GameEvent::StartRequested(level) => self.start_game(level),
            GameEvent::TileClicked(index) => self.select_tile(index),
            GameEvent::Tick { epoch } => self.tick(epoch),
            GameEvent::SettleElapsed { epoch } => self.settle(epoch),
        };
        if transition != Transition::Ignored {
            debug!(?event, ?transition, moves = self.moves, matches = self.matches, "game event");
        }
        transition
    }

    /// Shows the stored best scores before any game has been played.
    pub fn show_best_scores(&mut self) {
        let (easy, hard) = self.scores.both();
        self.surface.set_best_scores(easy, hard);
    }

    pub fn start_game(&mut self, level: Level) -> Transition {
        let board = Board::shuffled(level, &mut self.rng);
        self.start_with_board(board)
    }

    /// Starts a game on a prepared board. Any pending tick or settle from the
    /// previous game is cancelled.
    pub fn start_with_board(&mut self, board: Board) -> Transition {
        self.cancel_timers();
        self.epoch = self.epoch.wrapping_add(1);
        info!(level = %board.level(), tiles = board.len(), epoch = self.epoch, "starting game");

        self.selection = Selection::Empty;
        self.locked = false;
        self.moves = 0;
        self.matches = 0;
        self.phase = Phase::Playing;
        self.clock.start();

        self.surface.hide_win();
        self.surface.render(&board);
        self.board = Some(board);
        self.surface.set_counters(0, 0);
        self.surface.set_elapsed(&self.clock.display());
        self.show_best_scores();

        let tick = GameEvent::Tick { epoch: self.epoch };
        self.tick_timer = Some(self.timers.every(self.config.tick_period(), tick));
        Transition::Started
    }

    pub fn select_tile(&mut self, index: usize) -> Transition {
        if self.phase != Phase::Playing || self.locked || self.selection.len() == 2 {
            return Transition::Ignored;
        }
        let Some(board) = self.board.as_mut() else {
            return Transition::Ignored;
        };
        let Some(tile) = board.tiles.get_mut(index) else {
            return Transition::Ignored;
        };
        // Covers matched tiles and the sole pending tile.
        if tile.revealed {
            return Transition::Ignored;
        }
        tile.revealed = true;
        self.surface.render(board);

        match self.selection {
            Selection::Empty => {
                self.selection = Selection::One(index);
                Transition::FirstReveal
            }
            Selection::One(first) => {
                self.moves += 1;
                let transition = self.resolve(first, index);
                self.surface.set_counters(self.moves, self.matches);
                if let Transition::Matched { finished: true } = transition {
                    self.win();
                }
                transition
            }
            Selection::Two(..) => Transition::Ignored,
        }
    }

    fn resolve(&mut self, first: usize, second: usize) -> Transition {
        let Some(board) = self.board.as_mut() else {
            return Transition::Ignored;
        };
        if board.tiles[first].symbol == board.tiles[second].symbol {
            board.tiles[first].matched = true;
            board.tiles[second].matched = true;
            self.matches += 1;
            self.selection = Selection::Empty;
            self.surface.render(board);
            Transition::Matched {
                finished: self.matches as usize == board.pair_count(),
            }
        } else {
            self.selection = Selection::Two(first, second);
            self.locked = true;
            let settle = GameEvent::SettleElapsed { epoch: self.epoch };
            self.settle_timer = Some(self.timers.after(self.config.settle_delay(), settle));
            Transition::Mismatch {
                pair: [first, second],
            }
        }
    }

    fn settle(&mut self, epoch: u64) -> Transition {
        if epoch != self.epoch {
            warn!(epoch, current = self.epoch, "dropping settle from an earlier game");
            return Transition::Ignored;
        }
        let (Selection::Two(a, b), true) = (self.selection, self.locked) else {
            return Transition::Ignored;
        };
        // Fired; nothing left to cancel.
        self.settle_timer = None;
        let Some(board) = self.board.as_mut() else {
            return Transition::Ignored;
        };
        board.tiles[a].revealed = false;
        board.tiles[b].revealed = false;
        self.selection = Selection::Empty;
        self.locked = false;
        self.surface.render(board);
        Transition::Settled
    }

    fn tick(&mut self, epoch: u64) -> Transition {
        if epoch != self.epoch || !self.clock.tick() {
            return Transition::Ignored;
        }
        self.surface.set_elapsed(&self.clock.display());
        Transition::Ticked
    }

    fn win(&mut self) {
        self.phase = Phase::Won;
        self.clock.stop();
        if let Some(id) = self.tick_timer.take() {
            self.timers.cancel(id);
        }
        let Some(level) = self.level() else {
            return;
        };
        info!(%level, moves = self.moves, elapsed = %self.clock.display(), "game won");
        self.surface.show_win();
        match self.scores.set_if_better(level, self.moves) {
            Ok(true) => info!(%level, moves = self.moves, "new best score"),
            Ok(false) => {}
            Err(err) => warn!(%level, error = %err, "failed to store best score"),
        }
        self.show_best_scores();
    }

    fn cancel_timers(&mut self) {
        for id in [self.tick_timer.take(), self.settle_timer.take()]
            .into_iter()
            .flatten()
        {
            self.timers.cancel(id);
        }
    }

    pub fn board(&self) -> Option<&Board> {
        self.board.as_ref()
    }

    pub fn level(&self) -> Option<Level> {
        self.board.as_ref().map(Board::level)
    }

    pub fn selection(&self) -> Selection {
        self.selection
    }

    pub fn is_locked(&self) -> bool {
        self.locked
    }

    pub fn moves(&self) -> u32 {
        self.moves
    }

    pub fn matches(&self) -> u32 {
        self.matches
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn epoch(&self) -> u64 {
        self.epoch
    }

    pub fn clock(&self) -> &ElapsedClock {
        &self.clock
    }

    pub fn best_scores(&self) -> &BestScores<K> {
        &self.scores
    }

    pub fn config(&self) -> &GameConfig {
        &self.config
    }

    pub fn surface(&self) -> &S {
        &self.surface
    }

    pub fn surface_mut(&mut self) -> &mut S {
        &mut self.surface
    }

    pub fn timers(&self) -> &T {
        &self.timers
    }
}

impl<S: Surface, K: KeyValueStore> Engine<S, K, VirtualTimers> {
    /// Moves virtual time forward, handing every due timer event to the engine
    /// in order. Returns the transitions the fired events produced.
    pub fn advance(&mut self, by: std::time::Duration) -> Vec<Transition> {
        let deadline = self.timers.now() + by;
        let mut transitions = Vec::new();
        while let Some(event) = self.timers.fire_next(deadline) {
            transitions.push(self.handle_event(event));
        }
        self.timers.settle_at(deadline);
        transitions
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[derive(Debug, Clone, PartialEq)]
    enum Call {
        Render,
        Counters(u32, u32),
        Elapsed(String),
        ShowWin,
        HideWin,
        Best(Option<u32>, Option<u32>),
    }

    #[derive(Default)]
    struct Recorder {
        calls: Vec<Call>,
        last_board: Option<Board>,
    }

    impl Recorder {
        fn count(&self, call: &Call) -> usize {
            self.calls.iter().filter(|c| *c == call).count()
        }

        fn last_elapsed(&self) -> Option<&str> {
            self.calls.iter().rev().find_map(|c| match c {
                Call::Elapsed(text) => Some(text.as_str()),
                _ => None,
            })
        }
    }

    impl Surface for Recorder {
        fn render(&mut self, board: &Board) {
            self.calls.push(Call::Render);
            self.last_board = Some(board.clone());
        }
        fn set_counters(&mut self, moves: u32, matches: u32) {
            self.calls.push(Call::Counters(moves, matches));
        }
        fn set_elapsed(&mut self, text: &str) {
            self.calls.push(Call::Elapsed(text.to_owned()));
        }
        fn show_win(&mut self) {
            self.calls.push(Call::ShowWin);
        }
        fn hide_win(&mut self) {
            self.calls.push(Call::HideWin);
        }
        fn set_best_scores(&mut self, easy: Option<u32>, hard: Option<u32>) {
            self.calls.push(Call::Best(easy, hard));
        }
    }

    type TestEngine = Engine<Recorder, MemoryStore, VirtualTimers>;

    fn engine() -> TestEngine {
        Engine::with_seed(
            Recorder::default(),
            MemoryStore::new(),
            VirtualTimers::new(),
            GameConfig::default(),
            7,
        )
    }

    // Easy layout: pairs sit next to each other.
    fn paired_board() -> Board {
        let symbols: Vec<&str> = EASY_SYMBOLS.iter().flat_map(|s| [*s, *s]).collect();
        Board::from_symbols(Level::Easy, &symbols).unwrap()
    }

    #[test]
    fn test_board_sizes_and_pairs() {
        let mut rng = SmallRng::seed_from_u64(3);
        for level in Level::ALL {
            let board = Board::shuffled(level, &mut rng);
            assert_eq!(board.len(), 2 * level.pair_count());
            for symbol in level.desc().symbols {
                assert_eq!(board.symbol_count(symbol), 2, "{symbol} on {level}");
            }
            assert!(board.tiles().iter().all(|t| !t.revealed && !t.matched));
        }
        assert_eq!(Level::Easy.board_len(), 12);
        assert_eq!(Level::Hard.board_len(), 24);
    }

    #[test]
    fn test_from_symbols_rejects_bad_layouts() {
        let mut symbols: Vec<&str> = EASY_SYMBOLS.iter().flat_map(|s| [*s, *s]).collect();
        assert!(Board::from_symbols(Level::Easy, &symbols[..10]).is_none());
        symbols[0] = symbols[2];
        assert!(Board::from_symbols(Level::Easy, &symbols).is_none());
        symbols[0] = "🐱";
        assert!(Board::from_symbols(Level::Easy, &symbols).is_none());
        let easy_layout: Vec<&str> = paired_board().tiles().iter().map(|t| t.symbol).collect();
        assert!(Board::from_symbols(Level::Hard, &easy_layout).is_none());
    }

    #[test]
    fn test_level_parse_defaults_to_easy() {
        assert_eq!(Level::parse("hard"), Level::Hard);
        assert_eq!(Level::parse(" HARD "), Level::Hard);
        assert_eq!(Level::parse("easy"), Level::Easy);
        assert_eq!(Level::parse(""), Level::Easy);
        assert_eq!(Level::from("medium"), Level::Easy);
        assert_eq!(Level::Hard.to_string(), "hard");
    }

    #[test]
    fn test_start_resets_and_notifies() {
        let mut e = engine();
        assert_eq!(e.phase(), Phase::Idle);
        assert_eq!(e.handle_event(GameEvent::TileClicked(0)), Transition::Ignored);

        assert_eq!(e.handle_event(GameEvent::StartRequested(Level::Hard)), Transition::Started);
        assert_eq!(e.phase(), Phase::Playing);
        assert_eq!(e.board().map(Board::len), Some(24));
        assert_eq!(e.moves(), 0);
        assert_eq!(e.matches(), 0);
        let calls = &e.surface().calls;
        assert!(calls.contains(&Call::HideWin));
        assert!(calls.contains(&Call::Render));
        assert!(calls.contains(&Call::Counters(0, 0)));
        assert!(calls.contains(&Call::Elapsed("0:00".into())));
        assert!(calls.contains(&Call::Best(None, None)));
    }

    #[test]
    fn test_first_reveal_then_same_tile_is_noop() {
        let mut e = engine();
        e.start_with_board(paired_board());
        assert_eq!(e.select_tile(0), Transition::FirstReveal);
        assert_eq!(e.selection(), Selection::One(0));
        let before = e.surface().calls.len();
        assert_eq!(e.select_tile(0), Transition::Ignored);
        assert_eq!(e.selection(), Selection::One(0));
        assert_eq!(e.moves(), 0);
        assert_eq!(e.surface().calls.len(), before, "no re-render on a no-op");
    }

    #[test]
    fn test_out_of_range_index_is_ignored() {
        let mut e = engine();
        e.start_with_board(paired_board());
        assert_eq!(e.select_tile(12), Transition::Ignored);
        assert_eq!(e.select_tile(usize::MAX), Transition::Ignored);
        assert!(e.selection().is_empty());
    }

    #[test]
    fn test_match_clears_selection_without_lock() {
        let mut e = engine();
        e.start_with_board(paired_board());
        e.select_tile(0);
        assert_eq!(e.select_tile(1), Transition::Matched { finished: false });
        assert!(e.selection().is_empty());
        assert!(!e.is_locked());
        assert_eq!((e.moves(), e.matches()), (1, 1));
        let board = e.board().unwrap();
        assert!(board.tiles()[0].matched && board.tiles()[0].revealed);
        // matched tiles stay put
        assert_eq!(e.select_tile(0), Transition::Ignored);
        assert_eq!(e.select_tile(1), Transition::Ignored);
        assert_eq!(e.moves(), 1);
        assert!(e.surface().calls.contains(&Call::Counters(1, 1)));
    }

    #[test]
    fn test_mismatch_locks_until_settle() {
        let mut e = engine();
        e.start_with_board(paired_board());
        e.select_tile(0);
        assert_eq!(e.select_tile(2), Transition::Mismatch { pair: [0, 2] });
        assert!(e.is_locked());
        assert_eq!(e.selection(), Selection::Two(0, 2));
        assert_eq!(e.moves(), 1);

        for i in 0..12 {
            assert_eq!(e.select_tile(i), Transition::Ignored);
        }
        assert_eq!(e.moves(), 1);
        assert_eq!(e.selection(), Selection::Two(0, 2));

        // Still locked just before the delay runs out.
        e.advance(Duration::from_millis(999));
        assert!(e.is_locked());
        let fired = e.advance(Duration::from_millis(1));
        assert!(fired.contains(&Transition::Settled));
        assert!(!e.is_locked());
        assert!(e.selection().is_empty());
        let board = e.board().unwrap();
        assert!(!board.tiles()[0].revealed && !board.tiles()[2].revealed);
        assert_eq!(e.select_tile(2), Transition::FirstReveal);
    }

    #[test]
    fn test_moves_count_pairs_not_clicks() {
        let mut e = engine();
        e.start_with_board(paired_board());
        e.select_tile(0);
        assert_eq!(e.moves(), 0);
        e.select_tile(3);
        assert_eq!(e.moves(), 1);
        e.advance(Duration::from_secs(1));
        e.select_tile(4);
        assert_eq!(e.moves(), 1);
        e.select_tile(5);
        assert_eq!(e.moves(), 2);
    }

    #[test]
    fn test_one_mismatch_then_full_clear_wins_once() {
        let mut e = engine();
        e.start_with_board(paired_board());
        e.select_tile(0);
        e.select_tile(2);
        e.advance(Duration::from_secs(1));
        let mut wins = 0;
        for pair in 0..6 {
            e.select_tile(pair * 2);
            if let Transition::Matched { finished: true } = e.select_tile(pair * 2 + 1) {
                wins += 1;
            }
        }
        assert_eq!(wins, 1);
        assert_eq!(e.phase(), Phase::Won);
        assert_eq!((e.moves(), e.matches()), (7, 6));
        assert!(e.selection().is_empty());
        assert!(e.board().unwrap().all_matched());
        assert_eq!(e.surface().count(&Call::ShowWin), 1);
        assert_eq!(e.best_scores().get(Level::Easy), Some(7));
        assert_eq!(e.surface().calls.last(), Some(&Call::Best(Some(7), None)));
        // Won is terminal
        assert_eq!(e.select_tile(0), Transition::Ignored);
    }

    #[test]
    fn test_clock_ticks_and_stops_on_win() {
        let mut e = engine();
        e.start_with_board(paired_board());
        e.advance(Duration::from_secs(65));
        assert_eq!(e.surface().last_elapsed(), Some("1:05"));
        for pair in 0..6 {
            e.select_tile(pair * 2);
            e.select_tile(pair * 2 + 1);
        }
        assert_eq!(e.phase(), Phase::Won);
        let ticks = e.advance(Duration::from_secs(10));
        assert!(ticks.is_empty(), "tick timer cancelled on win");
        assert_eq!(e.clock().seconds(), 65);
        assert_eq!(e.timers().pending(), 0);
    }

    #[test]
    fn test_restart_mid_settle_drops_old_callbacks() {
        let mut e = engine();
        e.start_with_board(paired_board());
        e.select_tile(0);
        e.select_tile(2);
        assert!(e.is_locked());
        let old_epoch = e.epoch();

        e.start_with_board(paired_board());
        assert!(!e.is_locked());
        assert_eq!(e.timers().pending(), 1, "only the new tick timer remains");
        e.select_tile(4);
        e.select_tile(6);
        assert!(e.is_locked());

        // A settle stamped by the old game must not unlock the new one.
        assert_eq!(
            e.handle_event(GameEvent::SettleElapsed { epoch: old_epoch }),
            Transition::Ignored
        );
        assert!(e.is_locked());
        assert_eq!(e.handle_event(GameEvent::Tick { epoch: old_epoch }), Transition::Ignored);
        e.advance(Duration::from_secs(1));
        assert!(!e.is_locked());
    }

    #[test]
    fn test_best_score_only_improves() {
        let store = MemoryStore::new().with_entry("bestEasy", "6");
        let mut e = Engine::with_seed(
            Recorder::default(),
            store,
            VirtualTimers::new(),
            GameConfig::default(),
            1,
        );
        e.show_best_scores();
        assert_eq!(e.surface().calls.last(), Some(&Call::Best(Some(6), None)));
        e.start_with_board(paired_board());
        e.select_tile(0);
        e.select_tile(2);
        e.advance(Duration::from_secs(1));
        for pair in 0..6 {
            e.select_tile(pair * 2);
            e.select_tile(pair * 2 + 1);
        }
        assert_eq!(e.moves(), 7);
        assert_eq!(e.best_scores().get(Level::Easy), Some(6));
    }

    struct FailingStore;

    impl KeyValueStore for FailingStore {
        fn get(&self, _key: &str) -> Option<String> {
            None
        }
        fn set(&mut self, key: &str, _value: &str) -> Result<(), crate::error::StoreError> {
            Err(crate::error::StoreError::new(format!("quota exceeded for {key}")))
        }
    }

    #[test]
    fn test_store_failure_still_wins() {
        let mut e = Engine::with_seed(
            Recorder::default(),
            FailingStore,
            VirtualTimers::new(),
            GameConfig::default(),
            5,
        );
        e.start_with_board(paired_board());
        let mut last = Transition::Ignored;
        for pair in 0..6 {
            e.select_tile(pair * 2);
            last = e.select_tile(pair * 2 + 1);
        }
        assert_eq!(last, Transition::Matched { finished: true });
        assert_eq!(e.phase(), Phase::Won);
        assert!(!e.clock().is_running());
        assert_eq!(e.surface().count(&Call::ShowWin), 1);
        assert_eq!(e.timers().pending(), 0, "tick timer cancelled");
        assert_eq!(e.best_scores().get(Level::Easy), None);
        assert_eq!(e.surface().calls.last(), Some(&Call::Best(None, None)));
    }

    #[test]
    fn test_shuffled_games_are_solvable_by_partner_lookup() {
        let mut e = engine();
        e.start_game(Level::Hard);
        let board = e.board().unwrap().clone();
        let mut done = vec![false; board.len()];
        for i in 0..board.len() {
            if done[i] {
                continue;
            }
            let j = board.partner_of(i).unwrap();
            done[i] = true;
            done[j] = true;
            e.select_tile(i);
            e.select_tile(j);
        }
        assert_eq!(e.phase(), Phase::Won);
        assert_eq!(e.moves(), 12);
        assert_eq!(e.best_scores().get(Level::Hard), Some(12));
    }

    #[test]
    fn test_seeded_shuffles_are_reproducible() {
        let mut a = SmallRng::seed_from_u64(99);
        let mut b = SmallRng::seed_from_u64(99);
        assert_eq!(Board::shuffled(Level::Hard, &mut a), Board::shuffled(Level::Hard, &mut b));
    }
}
