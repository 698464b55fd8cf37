use anyhow::{Context, Result};

use crate::chat::ChatClient;

/// Check whether the relay answers at its base URL
#[tracing::instrument(skip(client))]
pub async fn ping(client: &ChatClient) -> Result<()> {
    let base_url = &client.config().base_url;

    if client.test_connection().await {
        println!("{} is reachable.", base_url);
        Ok(())
    } else {
        anyhow::bail!("{} is not reachable.", base_url)
    }
}

/// Print the relay's status document
#[tracing::instrument(skip(client))]
pub async fn status(client: &ChatClient) -> Result<()> {
    let body = client
        .api_status()
        .await
        .map_err(|e| anyhow::anyhow!("{}", e))?;

    let pretty = serde_json::to_string_pretty(&body).context("Failed to format status")?;
    println!("{}", pretty);
    Ok(())
}

/// Run the connection diagnosis and print the report
#[tracing::instrument(skip(client))]
pub async fn diagnose(client: &ChatClient) -> Result<()> {
    let report = client.diagnose().await;
    print!("{}", report);

    if !report.is_healthy() {
        anyhow::bail!("Diagnosis found problems with {}", report.base_url);
    }
    Ok(())
}
