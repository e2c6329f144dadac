pub mod ast;
pub mod lexer;
pub mod parser;
pub mod preprocess;

pub use ast::{Command, GateOp};
pub use lexer::{strip_outer_quotes, tokenize};
pub use parser::parse_commands;
pub use preprocess::preprocess_line;
