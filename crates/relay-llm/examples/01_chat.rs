use relay_llm::{ClientFactory, HttpOptions, ModelConfig};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let model_name = std::env::var("DEEPSEEK_MODEL").unwrap_or_else(|_| "deepseek-chat".into());
    let config = ModelConfig::new().model_name(model_name);

    // API key is read from DEEPSEEK_API_KEY
    let adapter = ClientFactory::create_adapter("deepseek", &config, &HttpOptions::default())?;

    let answer = adapter.generate("What is the capital of France?").await?;
    println!("{} ({}): {}", adapter.vendor(), adapter.model(), answer);

    Ok(())
}
