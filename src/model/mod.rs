pub mod audit;
pub mod auth;
pub mod ballot;
pub mod position;
pub mod vote_count;
pub mod vote_record;
