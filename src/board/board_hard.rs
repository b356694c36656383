// Hard board definition: twelve pairs, a 6x4 grid on the page.
// The first six symbols are the easy set so the two boards feel related.
use super::LevelDesc;

pub static HARD_SYMBOLS: [&str; 12] = [
    "🍎", "🍌", "🍇", "🍒", "🍋", "🍉", "🍓", "🍑", "🥥", "🥝", "🍊", "🍍",
];

pub static HARD: LevelDesc = LevelDesc {
    name: "hard",
    title: "Sunkus",
    storage_key: "bestHard",
    symbols: &HARD_SYMBOLS,
};
