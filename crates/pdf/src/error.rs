use thiserror::Error;

/// Errors from PDF normalization and rasterization.
#[derive(Debug, Error)]
pub enum PdfError {
    /// The bytes do not parse as a PDF document.
    #[error("the document is not a valid PDF: {0}")]
    InvalidDocument(String),

    /// The document is encrypted and no password was supplied.
    #[error("this PDF is password-protected and requires a password to open")]
    PasswordRequired,

    /// The supplied password does not open the document.
    #[error("the provided password is incorrect")]
    WrongPassword,

    /// A page index past the end of the document was requested.
    #[error("page {page} is out of range for a {count}-page document")]
    PageOutOfRange { page: usize, count: usize },

    /// Rasterization or image encoding failed.
    #[error("render failed: {0}")]
    Render(String),

    /// A batch render exceeded its deadline.
    #[error("rendering timed out after {0:?}")]
    Timeout(std::time::Duration),
}
