mod board;
pub use board::BoardView;
