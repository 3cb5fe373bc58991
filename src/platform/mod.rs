pub mod telegram;

/// A text message taken from a group chat.
#[derive(Debug, Clone)]
pub struct IncomingMessage {
    /// Chat the message was posted in
    pub chat_id: i64,
    /// Id of the message itself, used as the reply target
    pub message_id: i32,
    /// The message text
    pub text: String,
}
