/// Default page size for pagination
pub const DEFAULT_PAGE_SIZE: i64 = 10;

/// Maximum page size allowed
pub const MAX_PAGE_SIZE: i64 = 100;

/// Maximum number of ids accepted by a single bulk action
pub const MAX_BULK_IDS: usize = 100;

// =============================================================================
// ROLE CONSTANTS
// =============================================================================

/// Recruiter role - posts jobs and reviews applications
pub const ROLE_HR: &str = "hr";

/// Job-seeker role - uploads resumes and applies to jobs
pub const ROLE_CANDIDATE: &str = "candidate";

// =============================================================================
// RESUME UPLOADS
// =============================================================================

/// File extensions accepted for resume uploads
pub const ALLOWED_RESUME_EXTENSIONS: &[&str] = &["pdf", "docx"];

/// MIME types accepted for resume uploads
pub const ALLOWED_RESUME_MIME_TYPES: &[&str] = &[
    "application/pdf",
    "application/vnd.openxmlformats-officedocument.wordprocessingml.document",
];
