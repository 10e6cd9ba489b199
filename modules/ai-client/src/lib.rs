pub mod error;
pub mod openai;
pub mod traits;
pub mod util;

pub use error::{AiError, Result};
pub use openai::OpenAi;
pub use traits::{Completion, Message, MessageRole};
pub use util::{char_len, truncate_chars};
