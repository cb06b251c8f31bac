//! Strongly-typed procedure name.

use crate::newtype_string::define_newtype_string;

define_newtype_string! {
    /// Name of a DDL operation kind, e.g. `add_column` or `drop_index`.
    pub struct ProcedureName;
}
