//! In-process stand-ins for the external tools

pub mod mock;

pub use mock::{FailingTool, MockAligner, MockClusterer, MockProfileAligner, MockSearch};
