// SQL scalar-expression grammar: lexing, parsing and the raw syntax tree

pub mod ast;
pub mod lexer;
pub mod parser;
pub mod token;

pub use ast::{Expression, WhenClause};
pub use lexer::Lexer;
pub use parser::{parse_expression, Parser};
pub use token::Token;
