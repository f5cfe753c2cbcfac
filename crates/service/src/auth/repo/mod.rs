//! Database-backed repository implementations.

pub mod seaorm;

pub use seaorm::SeaOrmAuthRepository;
