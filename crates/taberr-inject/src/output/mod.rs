pub mod csv;

pub use self::csv::{write_mask_csv, write_table_csv};
