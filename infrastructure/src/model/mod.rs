//! Model provider clients

mod http;

pub use http::{HttpModelClient, render_anthropic, render_gemini, render_openai};
