pub mod destination;
pub mod document;
pub mod outline;

pub use destination::DestinationResolver;
pub use document::PdfDocument;
