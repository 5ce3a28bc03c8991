pub mod range_query;

pub use range_query::{CityRangeQuery, RangeQuery};
