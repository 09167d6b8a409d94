pub mod apod;

pub use apod::ApodClient;
