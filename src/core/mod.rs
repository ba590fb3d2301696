pub mod errors;
pub mod models;
pub mod preferences;
pub mod tasks;

pub use errors::ShengciError;
pub use models::{ ParseFailure, Record, RecordKind, SentenceRecord, Severity, VocabularyRecord, Warning };
pub use preferences::{ DocumentMode, FallbackYearPolicy, LayoutStrategy, Preferences };
