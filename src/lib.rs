pub mod config;
pub mod error;
pub mod llm;
pub mod parser;

pub use config::LlmConfig;
pub use error::{ConfigError, StructuredError, TransportError};
pub use llm::shapes::{request_record, StructuredShape};
pub use llm::{AnthropicTransport, StructuredClient, StructuredSchema, Transport};
pub use parser::extract::competitive::extract as extract_competitive;
pub use parser::extract::content::extract as extract_content_audit;
pub use parser::extract::icp::extract as extract_icp_research;
pub use parser::extract::personas::extract_personas;
pub use parser::extract::positioning::extract as extract_positioning;
pub use parser::extract::products::extract_products;
pub use parser::extract::ExtractedRecord;
pub use parser::sanitize::{sanitize, sanitize_tabular, strip_markdown};
pub use parser::sections::{segment, Section};
pub use parser::{process_response, DocumentShape};
