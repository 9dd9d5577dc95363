pub mod check;
pub mod dump;
pub mod resolve;
