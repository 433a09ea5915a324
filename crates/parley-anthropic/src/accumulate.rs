//! Folding of streamed events into a materialized message
//!
//! Tool input arrives as a sequence of JSON fragments and is only parseable
//! once its block closes, so the stream has to be accumulated before tool
//! calls can be reported.

use thiserror::Error;

use crate::protocol::{AnthropicStreamContentBlock, AnthropicStreamDelta, AnthropicStreamEvent, AnthropicUsage};

/// Content block assembled from stream events
#[derive(Debug, Clone, PartialEq)]
pub enum AccumulatedBlock {
    /// Text run
    Text {
        /// Block index within the message
        index: u32,
        /// Concatenated text deltas
        text: String,
    },
    /// Tool invocation
    ToolUse {
        /// Block index within the message
        index: u32,
        /// Tool use identifier
        id: String,
        /// Tool name
        name: String,
        /// Parsed input; the block-start value until the block closes
        input: serde_json::Value,
        /// Raw input JSON received so far
        partial_json: String,
    },
    /// Block kind without a normalized counterpart
    Other {
        /// Block index within the message
        index: u32,
    },
}

impl AccumulatedBlock {
    /// Block index within the message
    pub const fn index(&self) -> u32 {
        match self {
            Self::Text { index, .. } | Self::ToolUse { index, .. } | Self::Other { index } => *index,
        }
    }

    const fn kind(&self) -> &'static str {
        match self {
            Self::Text { .. } => "text",
            Self::ToolUse { .. } => "tool_use",
            Self::Other { .. } => "other",
        }
    }
}

/// Errors raised while folding an event into the message
#[derive(Debug, Error)]
pub enum AccumulateError {
    /// A delta or stop arrived while no block was open
    #[error("received {event} but there was no open content block")]
    NoOpenBlock {
        /// Wire name of the offending event
        event: &'static str,
    },

    /// A delta or stop referred to a block other than the open one
    #[error("received {event} for block {got} while block {open} is open")]
    IndexMismatch {
        /// Wire name of the offending event
        event: &'static str,
        /// Index carried by the event
        got: u32,
        /// Index of the open block
        open: u32,
    },

    /// A delta kind was applied to a block of a different kind
    #[error("received {delta} for a {block} block")]
    DeltaMismatch {
        /// Delta kind
        delta: &'static str,
        /// Kind of the open block
        block: &'static str,
    },

    /// A block started while another one was still open
    #[error("received content_block_start for block {got} while block {open} is open")]
    BlockAlreadyOpen {
        /// Index of the open block
        open: u32,
        /// Index carried by the event
        got: u32,
    },

    /// A tool block closed without any input JSON
    #[error("tool block {index} closed without input")]
    EmptyInput {
        /// Block index within the message
        index: u32,
    },

    /// Tool input ended before the JSON value was complete
    #[error("truncated tool input: {0}")]
    TruncatedInput(#[source] serde_json::Error),

    /// Tool input is not valid JSON
    #[error("invalid tool input: {0}")]
    InvalidInput(#[source] serde_json::Error),
}

impl AccumulateError {
    /// Whether the error can be ignored without losing information
    ///
    /// Tools without parameters close with an empty input buffer. The
    /// block-start input stays authoritative in that case. Input that was cut
    /// short mid-value is never benign.
    pub const fn is_benign(&self) -> bool {
        matches!(self, Self::EmptyInput { .. })
    }
}

/// Message assembled from the events of one streamed response
#[derive(Debug, Default)]
pub struct AccumulatedMessage {
    id: Option<String>,
    model: Option<String>,
    content: Vec<AccumulatedBlock>,
    open: bool,
    stop_reason: Option<String>,
    usage: AnthropicUsage,
}

impl AccumulatedMessage {
    /// Create an empty message
    pub fn new() -> Self {
        Self::default()
    }

    /// Response identifier from `message_start`
    pub fn id(&self) -> Option<&str> {
        self.id.as_deref()
    }

    /// Model reported by the provider
    pub fn model(&self) -> Option<&str> {
        self.model.as_deref()
    }

    /// Blocks accumulated since the last reset
    pub fn content(&self) -> &[AccumulatedBlock] {
        &self.content
    }

    /// Stop reason from `message_delta`
    pub fn stop_reason(&self) -> Option<&str> {
        self.stop_reason.as_deref()
    }

    /// Token usage reported so far
    pub const fn usage(&self) -> AnthropicUsage {
        self.usage
    }

    /// Drop accumulated blocks, keeping message metadata
    pub fn reset_content(&mut self) {
        self.content.clear();
        self.open = false;
    }

    /// Fold one event into the message
    ///
    /// # Errors
    ///
    /// Returns an [`AccumulateError`] if the event does not fit the current
    /// state. Check [`AccumulateError::is_benign`] before treating it as fatal.
    pub fn accumulate(&mut self, event: &AnthropicStreamEvent) -> Result<(), AccumulateError> {
        match event {
            AnthropicStreamEvent::MessageStart { message } => {
                self.id = Some(message.id.clone());
                self.model = Some(message.model.clone());
                if let Some(usage) = message.usage {
                    self.usage = usage;
                }
                Ok(())
            }

            AnthropicStreamEvent::ContentBlockStart { index, content_block } => {
                let index = *index;
                if self.open
                    && let Some(open) = self.content.last()
                {
                    return Err(AccumulateError::BlockAlreadyOpen {
                        open: open.index(),
                        got: index,
                    });
                }

                let block = match content_block {
                    AnthropicStreamContentBlock::Text { text } => AccumulatedBlock::Text {
                        index,
                        text: text.clone(),
                    },
                    AnthropicStreamContentBlock::ToolUse { id, name, input } => AccumulatedBlock::ToolUse {
                        index,
                        id: id.clone(),
                        name: name.clone(),
                        input: if input.is_null() {
                            serde_json::json!({})
                        } else {
                            input.clone()
                        },
                        partial_json: String::new(),
                    },
                    AnthropicStreamContentBlock::Other => AccumulatedBlock::Other { index },
                };
                self.content.push(block);
                self.open = true;
                Ok(())
            }

            AnthropicStreamEvent::ContentBlockDelta { index, delta } => {
                let block = self.open_block(event.name(), *index)?;
                match (delta, block) {
                    (AnthropicStreamDelta::TextDelta { text }, AccumulatedBlock::Text { text: buffer, .. }) => {
                        buffer.push_str(text);
                        Ok(())
                    }
                    (
                        AnthropicStreamDelta::InputJsonDelta { partial_json },
                        AccumulatedBlock::ToolUse { partial_json: buffer, .. },
                    ) => {
                        buffer.push_str(partial_json);
                        Ok(())
                    }
                    (AnthropicStreamDelta::Other, _) => Ok(()),
                    (AnthropicStreamDelta::TextDelta { .. }, block) => Err(AccumulateError::DeltaMismatch {
                        delta: "text_delta",
                        block: block.kind(),
                    }),
                    (AnthropicStreamDelta::InputJsonDelta { .. }, block) => Err(AccumulateError::DeltaMismatch {
                        delta: "input_json_delta",
                        block: block.kind(),
                    }),
                }
            }

            AnthropicStreamEvent::ContentBlockStop { index } => {
                let block = self.open_block(event.name(), *index)?;
                let result = match block {
                    AccumulatedBlock::ToolUse { index, partial_json, .. } if partial_json.trim().is_empty() => {
                        Err(AccumulateError::EmptyInput { index: *index })
                    }
                    AccumulatedBlock::ToolUse {
                        input, partial_json, ..
                    } => match serde_json::from_str(partial_json) {
                        Ok(parsed) => {
                            *input = parsed;
                            Ok(())
                        }
                        Err(e) if e.is_eof() => Err(AccumulateError::TruncatedInput(e)),
                        Err(e) => Err(AccumulateError::InvalidInput(e)),
                    },
                    AccumulatedBlock::Text { .. } | AccumulatedBlock::Other { .. } => Ok(()),
                };
                self.open = false;
                result
            }

            AnthropicStreamEvent::MessageDelta { delta, usage } => {
                if delta.stop_reason.is_some() {
                    self.stop_reason.clone_from(&delta.stop_reason);
                }
                if let Some(usage) = usage {
                    self.usage.output_tokens = usage.output_tokens;
                    if usage.input_tokens > 0 {
                        self.usage.input_tokens = usage.input_tokens;
                    }
                }
                Ok(())
            }

            AnthropicStreamEvent::MessageStop
            | AnthropicStreamEvent::Ping
            | AnthropicStreamEvent::Error { .. }
            | AnthropicStreamEvent::Unknown => Ok(()),
        }
    }

    /// The block a delta or stop event applies to
    fn open_block(&mut self, event: &'static str, index: u32) -> Result<&mut AccumulatedBlock, AccumulateError> {
        if !self.open {
            return Err(AccumulateError::NoOpenBlock { event });
        }

        let block = self
            .content
            .last_mut()
            .ok_or(AccumulateError::NoOpenBlock { event })?;

        if block.index() != index {
            return Err(AccumulateError::IndexMismatch {
                event,
                got: index,
                open: block.index(),
            });
        }

        Ok(block)
    }
}
