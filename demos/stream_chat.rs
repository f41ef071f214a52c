//! Streaming completion printed chunk by chunk.
//!
//! Run with: OPENAI_API_KEY=sk-... cargo run --example stream_chat

use std::io::Write;

use futures::StreamExt;
use modelrelay::{Client, Config, Message, Request};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let client = Client::new(Config::from_env());

    let request = Request::new(
        "openai/gpt-4o-mini",
        vec![Message::user("Count from one to ten, slowly.")],
    );

    let mut stream = client.complete_stream(&request).await?;
    while let Some(chunk) = stream.next().await {
        let chunk = chunk?;
        if let Some(choice) = chunk.choices.first() {
            if let Some(content) = &choice.delta.content {
                print!("{content}");
                std::io::stdout().flush()?;
            }
        }
    }
    println!();
    Ok(())
}
