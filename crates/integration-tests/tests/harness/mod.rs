pub mod mock_anthropic;
pub mod transcripts;
