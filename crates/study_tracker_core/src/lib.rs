pub mod board;
pub mod clock;
pub mod domain;
pub mod ledger;
pub mod lifecycle;
pub mod ports;
pub mod stats;
pub mod tracker;

pub use clock::{Clock, ManualClock, SystemClock};
pub use domain::{
    Doubt, DoubtAnswer, DoubtFilter, DoubtStatus, NewDoubt, NewDoubtAnswer, NewStudySession,
    NewTask, SessionPatch, SessionStatus, SessionType, StudySession, StudySuggestions,
    StudySummary, Task, TaskPatch, TaskPriority, TaskStatus, User, UserStats,
};
pub use lifecycle::SessionAction;
pub use ports::{
    DatabaseService, PortError, PortResult, RecommendationService, TutorService, WriteOutcome,
};
pub use stats::{ScoringPolicy, StatsEvent, StatsUpdate};
pub use tracker::StudyTracker;
