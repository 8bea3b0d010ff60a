pub mod resume_parser;

pub use resume_parser::ResumeParser;
