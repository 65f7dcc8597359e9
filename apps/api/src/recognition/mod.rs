pub mod handlers;
pub mod models;
pub mod parser;
pub mod period;
pub mod prompts;
pub mod resolver;
pub mod store;
pub mod summaries;
pub mod tally;
pub mod weekly;
