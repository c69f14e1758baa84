//! Entry points, from a single mechanism/type pair on one column up to a
//! randomly configured run over the whole table.

pub mod high_level;
pub mod low_level;
pub mod mid_level;
