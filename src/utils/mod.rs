pub mod db;
pub mod export;
