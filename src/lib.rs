pub mod access;
pub mod binding;
pub mod expression;
pub mod flow;
pub mod pipeline;
pub mod sql;
