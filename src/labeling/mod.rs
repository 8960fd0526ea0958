//! Chunked LLM labeling: chunk the transcript, prompt a backend per chunk,
//! parse the replies tolerantly and merge them back in order.

pub mod backend;
pub mod chunker;
pub mod dispatcher;
pub mod local;
pub mod merge;
pub mod parse;
pub mod prompt;
pub mod remote;

pub use backend::{LabelBackend, MockBackend, create_backend, create_backend_with_runner};
pub use chunker::{Chunk, chunk_transcript};
pub use dispatcher::{ChunkDispatcher, ChunkResult};
pub use merge::{failed_chunks, merge_results};
pub use parse::{ParseFailure, ParsedLabels, parse_label_response};
