//! Conversation builder
//!
//! Produces the opening message sequence for a money coach question: a
//! system directive scoped to the user and date window, then the user's
//! question verbatim.

use crate::dates::DateRange;
use crate::models::{ConversationMessage, ConversationRequest};

/// Build the system directive for a user and date window.
fn build_system_prompt(user_id: &str, range: &DateRange) -> String {
    format!(
        r#"You are a friendly, practical money coach helping a user understand their personal finances.

The current user's ID is {user_id}.
When the user asks about their spending, income, or transactions, call the get_user_transactions tool with this user ID.
Unless the user asks for a different period, only consider transactions between {start} and {end}, and pass those dates to the tool.
If the question does not need transaction data, answer directly.

Guidelines:
- Be concise and concrete
- Base figures only on the transactions you were given
- Say so when the data does not answer the question"#,
        user_id = user_id,
        start = range.start_str(),
        end = range.end_str(),
    )
}

/// Build the ordered message sequence for a question. The system message is
/// always first.
pub fn build_messages(user_id: &str, input: &str, range: &DateRange) -> Vec<ConversationMessage> {
    vec![
        ConversationMessage::system(build_system_prompt(user_id, range)),
        ConversationMessage::user(input),
    ]
}

impl ConversationRequest {
    pub fn messages(&self) -> Vec<ConversationMessage> {
        build_messages(&self.user_id, &self.input, &self.range)
    }
}
