pub use fetch::Fetch;

pub mod fetch;
