use futures_util::StreamExt;
use parley_core::{ChatCompleteRequest, ChatCompleter, Message, MessagePart};
use tokio::io::{AsyncWrite, AsyncWriteExt};
use tokio_util::sync::CancellationToken;

/// Multi-turn conversation with a completer
pub struct Session<C> {
    completer: C,
    system: Option<String>,
    temperature: Option<f64>,
    messages: Vec<Message>,
}

impl<C: ChatCompleter> Session<C> {
    pub const fn new(completer: C, system: Option<String>, temperature: Option<f64>) -> Self {
        Self {
            completer,
            system,
            temperature,
            messages: Vec::new(),
        }
    }

    /// Send one user turn and stream the reply text to `out`
    ///
    /// The reply is appended to the conversation only if it completed. A
    /// failed turn is removed so the next one starts from a consistent state.
    pub async fn turn<W>(&mut self, prompt: String, out: &mut W, shutdown: &CancellationToken) -> anyhow::Result<()>
    where
        W: AsyncWrite + Unpin,
    {
        self.messages.push(Message::user_text(prompt));

        match self.stream_reply(out, shutdown).await {
            Ok(Some(reply)) => {
                self.messages.push(Message::model_text(reply));
                Ok(())
            }
            Ok(None) => {
                self.messages.pop();
                Ok(())
            }
            Err(e) => {
                self.messages.pop();
                Err(e)
            }
        }
    }

    /// Conversation so far
    pub fn messages(&self) -> &[Message] {
        &self.messages
    }

    async fn stream_reply<W>(&self, out: &mut W, shutdown: &CancellationToken) -> anyhow::Result<Option<String>>
    where
        W: AsyncWrite + Unpin,
    {
        let mut request = ChatCompleteRequest::new(self.messages.clone());
        if let Some(system) = &self.system {
            request = request.with_system(system.clone());
        }
        if let Some(temperature) = self.temperature {
            request = request.with_temperature(temperature);
        }

        let mut response = self.completer.chat_complete(request).await?;
        let mut reply = String::new();

        loop {
            tokio::select! {
                biased;

                () = shutdown.cancelled() => {
                    tracing::info!("completion cancelled");
                    out.write_all(b"\n").await?;
                    return Ok(None);
                }
                part = response.next() => match part {
                    Some(Ok(MessagePart::Text(text))) => {
                        out.write_all(text.as_bytes()).await?;
                        out.flush().await?;
                        reply.push_str(&text);
                    }
                    Some(Ok(part)) => tracing::warn!(kind = part.kind(), "ignoring non-text part"),
                    Some(Err(e)) => return Err(e.into()),
                    None => break,
                },
            }
        }

        out.write_all(b"\n").await?;
        out.flush().await?;

        Ok((!reply.is_empty()).then_some(reply))
    }
}
