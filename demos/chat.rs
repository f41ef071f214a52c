//! Minimal non-streaming completion.
//!
//! Run with: OPENAI_API_KEY=sk-... cargo run --example chat

use modelrelay::{Client, Config, Message, Request};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let client = Client::new(Config::from_env());

    let request = Request::new(
        "openai/gpt-4o-mini",
        vec![
            Message::system("You are terse."),
            Message::user("Say hello in one sentence."),
        ],
    )
    .with_temperature(0.7)
    .with_max_completion_tokens(100);

    let response = client.complete(&request).await?;
    if let Some(choice) = response.choices.first() {
        println!("{}", choice.message.content.as_deref().unwrap_or(""));
    }
    if let Some(usage) = &response.usage {
        println!("({} tokens)", usage.total_tokens);
    }
    Ok(())
}
