pub mod db;
pub mod memory;
pub mod recommendations;
pub mod recommendations_llm;
pub mod tutor;
pub mod tutor_llm;

pub use db::DbAdapter;
pub use memory::InMemoryDb;
pub use recommendations::{ResilientRecommender, StaticRecommendationAdapter};
pub use recommendations_llm::OpenAiRecommendationAdapter;
pub use tutor::ResilientTutor;
pub use tutor_llm::OpenAiTutorAdapter;
