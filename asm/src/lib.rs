pub mod binary;
pub mod context;
pub mod data;
pub mod ea;
pub mod encoder;
pub mod error;
pub mod label;
pub mod lexer;
pub mod listing;
pub mod msg;
pub mod number;
pub mod operand;
pub mod output;
pub mod parser;
pub mod preproc;
pub mod project;
pub mod resolve;
pub mod session;
pub mod source;
