//! Constants for coordinates, board dimensions and format support.
//!
//! SGF encodes intersections as two letters taken from a 52-character
//! alphabet, which also bounds the largest board the format can describe.

// =============================================================================
// Coordinates
// =============================================================================

/// Coordinate alphabet: `'a' = 0` .. `'z' = 25`, `'A' = 26` .. `'Z' = 51`.
pub const ALPHABET: &[u8; 52] = b"abcdefghijklmnopqrstuvwxyzABCDEFGHIJKLMNOPQRSTUVWXYZ";

// =============================================================================
// Board Geometry
// =============================================================================

/// Board size used when the root node has no `SZ` property.
pub const DEFAULT_BOARD_SIZE: usize = 19;

/// Smallest accepted board dimension.
pub const MIN_BOARD_SIZE: i64 = 2;

/// Largest accepted board dimension (one coordinate letter per line).
pub const MAX_BOARD_SIZE: i64 = ALPHABET.len() as i64;

// =============================================================================
// Format Support
// =============================================================================

/// SGF format versions (`FF`) this implementation accepts.
pub const SUPPORTED_VERSIONS: [i64; 2] = [3, 4];

/// Version written by the encoder.
pub const OUTPUT_VERSION: i64 = 4;

/// Game type (`GM`) for Go. Any other game type is rejected.
pub const GO_GAME_TYPE: i64 = 1;

/// Charset assumed for raw values until a root `CA` property says otherwise.
pub const DEFAULT_CHARSET: &str = "ISO-8859-1";

/// Charset written by the encoder (decoded text is always Unicode).
pub const OUTPUT_CHARSET: &str = "UTF-8";

/// `CA` values recognised as UTF-8.
pub const UTF8_CHARSETS: [&str; 4] = ["utf8", "UTF8", "utf-8", "UTF-8"];

/// Default flags of a `FG[]` property without value.
pub const FIGURE_DEFAULT_FLAGS: i64 = 32768;
