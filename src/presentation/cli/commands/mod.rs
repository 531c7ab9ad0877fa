pub mod check;
pub mod daemon;
pub mod report;
