//! Allocation checks for fee and marks configuration forms.
//!
//! Every check reduces to the same question: do `quantity * unit_value`
//! lines add up to a target exactly? [`allocation::validate`] answers it;
//! the domain modules layer their own rules on top.

pub mod allocation;
pub mod config;
pub mod fees;
pub mod ipc;
pub mod issue;
pub mod logging;
pub mod payments;
pub mod question_paper;

pub use allocation::{
    validate, AllocationItem, AllocationResult, AllocationStatus, InvalidItemError,
    InvalidReason, Validator,
};
