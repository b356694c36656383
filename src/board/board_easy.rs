// Easy board definition: six pairs, a 4x3 grid on the page.
use super::LevelDesc;

pub static EASY_SYMBOLS: [&str; 6] = ["🍎", "🍌", "🍇", "🍒", "🍋", "🍉"];

pub static EASY: LevelDesc = LevelDesc {
    name: "easy",
    title: "Lengvas",
    storage_key: "bestEasy",
    symbols: &EASY_SYMBOLS,
};
