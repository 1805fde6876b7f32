mod core;
pub use core::{CompletionError, completion_stream};
