// ============================================================
// Layer 4 — Data Pipeline
// ============================================================
// Everything from the remote dataset file to the train/test
// partitions the ML layer consumes.
//
// The pipeline flows in this order:
//
//   remote URL
//       │
//       ▼
//   HttpFetcher       → downloads the file to local disk
//       │
//       ▼
//   DatasetReader     → parses blocks of "<label> <text>" lines
//       │
//       ▼
//   deduplicate       → drops repeated (text, label) pairs
//       │
//       ▼
//   stratified_split  → seeded, class-preserving train/test split
//
// Each module is responsible for exactly one step.

/// Downloads the dataset file over HTTP
pub mod fetcher;

/// Parses the line-delimited labelled format
pub mod reader;

/// Removes duplicate records
pub mod cleaner;

/// Stratified train/test split
pub mod splitter;
