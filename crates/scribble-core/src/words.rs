use rand::Rng;
use rand::seq::IndexedRandom;

/// Number of candidate words offered to the drawer each turn.
pub const CANDIDATE_COUNT: usize = 3;

/// Built-in vocabulary. Every entry is unique and lower-case.
pub const WORDS: &[&str] = &[
    // Animals
    "cat", "dog", "horse", "elephant", "penguin", "shark", "dolphin", "eagle",
    "tiger", "rabbit", "frog", "butterfly", "whale", "crocodile", "giraffe",
    "owl", "parrot", "turtle", "bear", "fox", "wolf", "deer", "monkey", "fish",
    "lobster", "scorpion", "snail", "peacock", "flamingo", "kangaroo",
    // Food
    "pizza", "apple", "banana", "cake", "hamburger", "sushi", "strawberry",
    "watermelon", "corn", "carrot", "mushroom", "cheese", "donut", "taco",
    "sandwich", "cookie", "lemon", "cherry", "grapes", "pineapple", "broccoli",
    "popcorn", "muffin", "pretzel", "noodles", "toast", "avocado", "waffle",
    "hotdog", "cupcake",
    // Objects
    "chair", "table", "lamp", "telephone", "umbrella", "key", "clock",
    "bicycle", "anchor", "camera", "compass", "hammer", "scissors", "trophy",
    "suitcase", "guitar", "crown", "bell", "book", "candle", "envelope",
    "glasses", "hat", "magnet", "mirror", "ring", "rope", "shield", "sword",
    "backpack",
    // Places and nature
    "mountain", "island", "volcano", "beach", "forest", "castle", "rainbow",
    "river", "cave", "desert", "lighthouse", "bridge", "waterfall", "cloud",
    "moon", "sun", "star", "snowflake", "tornado", "tree", "flower", "cactus",
    "wave", "iceberg", "cliff", "lake", "valley", "canyon", "glacier", "pond",
    // Transport
    "rocket", "boat", "train", "airplane", "helicopter", "submarine", "balloon",
    "skateboard", "motorcycle", "truck", "canoe", "spaceship", "tractor",
    "parachute", "tank", "bulldozer", "sailboat", "ambulance", "bus", "scooter",
    // People
    "pirate", "wizard", "robot", "knight", "astronaut", "ninja", "chef",
    "doctor", "clown", "superhero", "cowboy", "viking", "mummy", "ghost",
    "vampire", "witch", "ballerina", "firefighter", "detective", "king",
    // Actions
    "swimming", "jumping", "climbing", "dancing", "sleeping", "cooking",
    "flying", "running", "reading", "painting", "throwing", "fishing", "digging",
    "skating", "surfing", "building", "planting", "pushing", "laughing", "crying",
    // More objects
    "television", "computer", "phone", "speaker", "headphones", "lantern",
    "barrel", "bucket", "ladder", "telescope", "microscope", "hourglass",
    "chess", "dice", "kite", "drum", "trumpet", "violin", "piano",
];

/// Draw `n` distinct words from [`WORDS`] without replacement.
///
/// Returns fewer than `n` words only if the vocabulary is smaller than `n`.
pub fn pick_candidates<R: Rng + ?Sized>(rng: &mut R, n: usize) -> Vec<String> {
    WORDS
        .choose_multiple(rng, n)
        .map(|w| (*w).to_string())
        .collect()
}

/// Mask a word for non-drawers: every character becomes `_`, a space becomes
/// a double-width gap, and symbols are separated by single spaces.
///
/// `make_hint("cat dog")` is `"_ _ _    _ _ _"`.
pub fn make_hint(word: &str) -> String {
    word.chars()
        .map(|c| if c == ' ' { "  " } else { "_" })
        .collect::<Vec<_>>()
        .join(" ")
}
