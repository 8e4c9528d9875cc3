/// Pages that may wait in the dispatcher queue before `submit` blocks
pub const DEFAULT_QUEUE_CAPACITY: usize = 100;

/// Progress update interval (tick every N submitted pages)
pub const PROGRESS_INTERVAL: u64 = 1000;

/// Title prefixes (before the first `:`) of pages that never define words
pub const RESERVED_NAMESPACES: &[&str] = &["User", "Template", "Module", "Category", "Thread", "Talk"];

/// Read buffer for the decompressed dump stream
pub const READ_BUFFER_SIZE: usize = 1024 * 1024;

/// Write buffer for each CSV output file
pub const WRITE_BUFFER_SIZE: usize = 128 * 1024;

/// Marker that must be present in a language section before it is segmented further
pub const VERB_HEADER_MARKER: &str = "===Verb===";
