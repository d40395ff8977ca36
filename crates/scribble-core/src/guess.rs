/// Maximum guess length in characters after trimming.
pub const MAX_GUESS_LEN: usize = 100;

/// Points every correct guess earns at zero time remaining.
pub const BASE_POINTS: u32 = 200;
/// Extra points scaled by the fraction of the turn still remaining.
pub const TIME_POINTS: u32 = 600;
/// Bonus for the first correct guesser of a turn.
pub const FIRST_GUESS_BONUS: u32 = 50;
/// Drawer credit per correct guesser, awarded at reveal.
pub const DRAWER_POINTS_PER_GUESSER: u32 = 100;

/// Result of comparing a guess against the secret word.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verdict {
    Correct,
    /// Wrong, but within one edit of the word.
    Close,
    Wrong,
}

/// Trim a raw guess. Returns `None` when it is empty or too long.
pub fn normalize_guess(raw: &str) -> Option<&str> {
    let trimmed = raw.trim();
    if trimmed.is_empty() || trimmed.chars().count() > MAX_GUESS_LEN {
        return None;
    }
    Some(trimmed)
}

/// Compare an already-normalized guess with the secret word.
pub fn evaluate(guess: &str, word: &str) -> Verdict {
    let guess = guess.trim().to_lowercase();
    let word = word.trim().to_lowercase();
    if guess == word {
        Verdict::Correct
    } else if is_close_guess(&guess, &word) {
        Verdict::Close
    } else {
        Verdict::Wrong
    }
}

/// True when `guess` is exactly one edit away from `word`, ignoring case.
/// Guesses whose length differs from the word by more than two are never close.
pub fn is_close_guess(guess: &str, word: &str) -> bool {
    let g: Vec<char> = guess.to_lowercase().chars().collect();
    let w: Vec<char> = word.to_lowercase().chars().collect();
    if g.len().abs_diff(w.len()) > 2 {
        return false;
    }
    levenshtein(&g, &w) == 1
}

/// Edit distance with unit costs for insert, delete and substitute.
pub fn levenshtein(a: &[char], b: &[char]) -> usize {
    let mut prev: Vec<usize> = (0..=b.len()).collect();
    let mut cur = vec![0; b.len() + 1];
    for (i, ca) in a.iter().enumerate() {
        cur[0] = i + 1;
        for (j, cb) in b.iter().enumerate() {
            cur[j + 1] = if ca == cb {
                prev[j]
            } else {
                1 + prev[j].min(prev[j + 1]).min(cur[j])
            };
        }
        std::mem::swap(&mut prev, &mut cur);
    }
    prev[b.len()]
}

/// Points for a correct guess: `200 + 600 * remaining / limit` (floored),
/// plus [`FIRST_GUESS_BONUS`] for the first guesser.
pub fn score_for_guess(time_remaining_secs: u32, time_limit_secs: u32, first: bool) -> u32 {
    let limit = time_limit_secs.max(1);
    let remaining = time_remaining_secs.min(limit);
    let mut points = BASE_POINTS + TIME_POINTS * remaining / limit;
    if first {
        points += FIRST_GUESS_BONUS;
    }
    points
}
