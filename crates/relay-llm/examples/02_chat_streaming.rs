use futures::StreamExt;
use relay_llm::{ClientFactory, HttpOptions, Message, ModelConfig};
use std::io::Write;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let endpoint = std::env::var("ARK_MODEL_ENDPOINT")?;
    let config = ModelConfig::new().model_name(endpoint);

    // API key is read from ARK_API_KEY
    let adapter = ClientFactory::create_adapter("dsr1", &config, &HttpOptions::default())?;

    let messages = vec![
        Message::system("You are a concise assistant."),
        Message::user("Explain backpressure in one paragraph."),
    ];

    let mut stream = adapter.converse_stream(messages).await?;
    let mut stdout = std::io::stdout();
    while let Some(fragment) = stream.next().await {
        write!(stdout, "{}", fragment?)?;
        stdout.flush()?;
    }
    println!();

    Ok(())
}
