pub mod merged;
pub mod records;
pub mod report;

pub use merged::*;
pub use records::*;
pub use report::*;
