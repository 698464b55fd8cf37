use anyhow::Result;
use log::debug;

use crate::chat::{ChatClient, ChatOptions};

/// Send a single message and print the reply
#[tracing::instrument(skip(client, credential, options))]
pub async fn send(
    client: &ChatClient,
    credential: &str,
    message: &str,
    options: &ChatOptions,
    show_usage: bool,
) -> Result<()> {
    debug!("Sending one message to {}", client.config().chat_url());

    let completion = client
        .complete(credential, message, options)
        .await
        .map_err(|e| anyhow::anyhow!("{}", e))?;

    println!("{}", completion.message);

    if show_usage {
        if let Some(usage) = completion.usage {
            println!(
                "[{}] prompt: {}, completion: {}, total: {} tokens",
                completion.model.as_deref().unwrap_or("unknown model"),
                usage.prompt_tokens,
                usage.completion_tokens,
                usage.total_tokens
            );
        }
    }

    Ok(())
}
