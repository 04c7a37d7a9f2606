pub mod indent;
pub mod lexer;
pub mod stream;
pub mod text;
pub mod token;
pub mod trace;
pub mod tree;

pub use lexer::{tokenize, TokenizeError};
pub use stream::{Checkpoint, TokenStream};
pub use token::{Matcher, Position, Token, TokenClass, TokenKind, TokenTable};
pub use trace::{LogTrace, NoTrace, RecordingTrace, Trace, TraceEvent};
pub use tree::{Child, ParseTree};
