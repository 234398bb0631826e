pub mod advance;
pub mod question_bank;
pub mod scoring;
pub mod session;
pub mod timer;
pub mod validation;

// Re-export main components
pub use advance::*;
pub use question_bank::*;
pub use scoring::*;
pub use session::*;
pub use validation::*;
