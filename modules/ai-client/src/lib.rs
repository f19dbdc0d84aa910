pub mod error;
pub mod openai;
pub mod traits;
pub mod util;

pub use error::AiError;
pub use openai::{supports_structured_output, OpenAi, StructuredOutput};
pub use traits::{CompletionClient, CompletionRequest, ResponseFormat};
pub use util::{strip_code_blocks, truncate_to_char_boundary};
