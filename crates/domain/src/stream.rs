use crate::error::Result;
use std::pin::Pin;

/// A boxed async stream, used for LLM streaming responses.
pub type BoxStream<'a, T> = Pin<Box<dyn futures_core::Stream<Item = T> + Send + 'a>>;

/// A provider's native streaming response: one item per text chunk, or the
/// error that ended the stream. Chunks may be empty strings; consumers skip
/// them.
pub type ChunkStream = BoxStream<'static, Result<String>>;
