//! Conversation state and reply text
//!
//! This module owns everything about how the system talks:
//!
//! - **Session**: the single pending question, the queue of words waiting
//!   for a part-of-speech answer, and the ring of recently discussed
//!   subjects.
//!
//! - **Templates**: every canned phrasing in one place. Gap questions,
//!   learning confirmations, part-of-speech prompts, and greetings all
//!   come from here so wording changes never touch engine logic.
//!
//! - **Answerer**: turns stored attributes back into sentences when the
//!   user asks a question, with a confidence grade per answer.

mod answerer;
mod session;
pub mod templates;

pub use answerer::{AnswerResult, QuestionAnswerer};
pub use session::{ConversationSession, PendingQuestion};
