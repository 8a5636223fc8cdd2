pub mod autofill;
pub mod criteria;
pub mod engine;
pub mod error;
pub mod import;
pub mod matrix;
pub mod presenter;
pub mod session;

pub use autofill::*;
pub use criteria::*;
pub use engine::*;
pub use error::ValidationError;
pub use import::*;
pub use matrix::*;
pub use session::*;
