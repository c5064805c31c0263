/// Maximum number of dump lines considered per pass unless overridden
pub const DEFAULT_LINE_LIMIT: usize = 150;

/// Key prefix stripped from author record ids (`/authors/OL1A` -> `OL1A`)
pub const AUTHOR_KEY_PREFIX: &str = "/authors/";

/// Key prefix stripped from work record ids (`/works/OL45W` -> `OL45W`)
pub const WORK_KEY_PREFIX: &str = "/works/";

/// Display name substituted for author ids not present in the store
pub const UNKNOWN_AUTHOR: &str = "Unknown Author";

/// Layout of the `created.value` timestamp in work records
pub const CREATED_TIMESTAMP_FORMAT: &str = "%Y-%m-%dT%H:%M:%S%.6f";

/// Progress update interval (tick every N lines)
pub const PROGRESS_INTERVAL: u64 = 1000;
