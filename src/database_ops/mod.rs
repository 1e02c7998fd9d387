pub mod db;
pub mod score_history;
