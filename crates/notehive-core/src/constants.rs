//! Shared constants.

/// Reserved program literal accepted as-is (case-insensitive).
pub const RESERVED_PROGRAM: &str = "basics";

/// Accepted program tier prefixes (case-insensitive prefix match).
pub const PROGRAM_TIER_PREFIXES: [&str; 2] = ["Diploma", "Bachelors"];

/// Default upload size cap when MAX_FILE_SIZE_BYTES is not configured (25 MB).
pub const DEFAULT_MAX_FILE_SIZE_BYTES: usize = 25 * 1024 * 1024;

/// Extensions accepted for catalogued notes when not overridden.
pub const DEFAULT_ALLOWED_EXTENSIONS: [&str; 2] = ["pdf", "pptx"];

/// Content types accepted for catalogued notes when not overridden.
pub const DEFAULT_ALLOWED_CONTENT_TYPES: [&str; 3] = [
    "application/pdf",
    "application/vnd.openxmlformats-officedocument.presentationml.presentation",
    "application/octet-stream",
];
