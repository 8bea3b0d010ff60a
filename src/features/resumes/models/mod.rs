pub mod parsed_resume;
pub mod resume;

pub use parsed_resume::*;
pub use resume::*;
