pub mod context;
pub mod conversation;
pub mod goals;

pub use context::SessionContext;
pub use conversation::{ChatAccess, ChatTurn, ConversationSession, Message, Origin, TurnState};
pub use goals::{CompletionTicket, GoalListSession};
