//! Command implementations

pub(crate) mod check;
pub(crate) mod common;
pub(crate) mod compile;
pub(crate) mod generate;
pub(crate) mod ls;
