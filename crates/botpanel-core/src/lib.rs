pub mod instructions;
pub mod progress;
pub mod report;
pub mod scope;
pub mod session;
pub mod status;

pub use instructions::*;
pub use progress::*;
pub use report::*;
pub use scope::*;
pub use session::*;
pub use status::Status;
