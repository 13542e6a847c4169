pub mod chrome;

pub use chrome::{Anchor, ChromeDriver};
