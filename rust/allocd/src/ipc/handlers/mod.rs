pub mod allocation;
pub mod core;
pub mod fees;
pub mod payments;
pub mod question_paper;
