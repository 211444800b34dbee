pub mod recency_list;

pub use recency_list::{RecencyIter, RecencyList, WayId};
