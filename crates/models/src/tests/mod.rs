
/// Schema constraints exercised against a live PostgreSQL instance
pub mod db_tests;
