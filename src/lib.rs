pub mod args;
pub mod error;
pub mod game;
pub mod maze;
pub mod rating;
pub mod storage;
