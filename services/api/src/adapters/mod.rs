pub mod chat_llm;
pub mod http_backend;
pub mod simulated_health;
pub mod survey_flags;

pub use chat_llm::OpenAiChatAdapter;
pub use http_backend::HttpBackendAdapter;
pub use simulated_health::SimulatedHealthAdapter;
pub use survey_flags::{FileSurveyFlags, InMemorySurveyFlags};
