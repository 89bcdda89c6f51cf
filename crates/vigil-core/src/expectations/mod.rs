//! Built-in expectations.

pub mod column_map;
pub mod regex;

pub use self::regex::{ExpectColumnValuesToMatchRegex, ExpectColumnValuesToNotMatchRegex};
