pub mod agent;
pub mod config;
pub mod notes;
pub mod playback;
pub mod session;
pub mod speech;

pub use agent::{Agent, AgentError, ChatMessage, OpenAiAgent, Role};
pub use config::ClientConfig;
pub use notes::{NotesError, NotesStore};
pub use playback::{AudioPlayer, PlaybackError, RodioPlayer};
pub use session::{ChatError, ChatSession};
pub use speech::{SpeechDispatcher, SpeechError, SpeechRoute, STREAMING_THRESHOLD_CHARS};
