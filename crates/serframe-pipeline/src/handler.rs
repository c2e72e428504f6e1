use serframe_frame::Message;

/// Sink for messages taken off the queue.
///
/// Called synchronously on the processor thread, one message at a time.
/// A slow handler delays shutdown by at most one dispatch.
pub trait MessageHandler: Send {
    fn handle(&mut self, message: Message);
}

impl<F> MessageHandler for F
where
    F: FnMut(Message) + Send,
{
    fn handle(&mut self, message: Message) {
        self(message)
    }
}

/// Handler that keeps every message it receives.
#[derive(Debug, Default)]
pub struct CollectingHandler {
    messages: Vec<Message>,
}

impl CollectingHandler {
    /// Create an empty collector.
    pub fn new() -> Self {
        Self::default()
    }

    /// Messages received so far, in dispatch order.
    pub fn messages(&self) -> &[Message] {
        &self.messages
    }

    /// Consume the collector and return the messages.
    pub fn into_messages(self) -> Vec<Message> {
        self.messages
    }
}

impl MessageHandler for CollectingHandler {
    fn handle(&mut self, message: Message) {
        self.messages.push(message);
    }
}
