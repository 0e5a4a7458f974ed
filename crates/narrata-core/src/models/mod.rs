pub mod cache_entry;
pub mod completion;
pub mod narrative;
pub mod query;
pub mod result;
pub mod schema;
pub mod stage;
pub mod value;

pub use cache_entry::CacheEntry;
pub use completion::{ChatMessage, ChatRole, Completion, CompletionRequest, Fingerprint};
pub use narrative::{NarrativeResponse, RunTrace, StageTiming};
pub use query::{QueryRequest, SynthesizedQuery};
pub use result::{QueryResult, Row};
pub use schema::{ColumnDef, SchemaDescriptor, SemanticType};
pub use stage::PipelineStage;
pub use value::ScalarValue;
