//! Examples for calling the GraphRAG Server retrieval gateway.

use reqwest::Client;
use serde_json::json;

const SERVER_URL: &str = "http://localhost:8080";
const API_KEY: &str = "demo-key-12345";
const GROUP_ID: &str = "tenant-a";

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let client = Client::new();

    println!("1. Health Check:");
    let resp = client.get(format!("{SERVER_URL}/health")).send().await?;
    println!("Status: {}", resp.status());
    println!("Body: {}", resp.text().await?);
    println!();

    println!("2. Fact-extraction query (expected to run Route 2 synchronously):");
    let resp = client
        .post(format!("{SERVER_URL}/chat"))
        .header("X-API-Key", API_KEY)
        .header("X-Group-ID", GROUP_ID)
        .json(&json!({
            "messages": [{ "role": "user", "content": "What was the invoice total?" }],
            "context": {}
        }))
        .send()
        .await?;
    println!("Status: {}", resp.status());
    println!("Body: {}", resp.text().await?);
    println!();

    println!("3. Thematic survey query (expected to enqueue a Route 3/5 job):");
    let resp = client
        .post(format!("{SERVER_URL}/chat"))
        .header("X-API-Key", API_KEY)
        .header("X-Group-ID", GROUP_ID)
        .json(&json!({
            "messages": [{ "role": "user", "content": "What are the common obligations of the buyer across all agreements?" }],
            "context": {}
        }))
        .send()
        .await?;
    println!("Status: {}", resp.status());
    let body: serde_json::Value = resp.json().await?;
    println!("Body: {body}");

    if let Some(job_id) = body.get("job_id").and_then(|v| v.as_str()) {
        println!();
        println!("4. Polling job status for {job_id}:");
        let resp = client
            .get(format!("{SERVER_URL}/chat/status/{job_id}"))
            .header("X-API-Key", API_KEY)
            .header("X-Group-ID", GROUP_ID)
            .send()
            .await?;
        println!("Status: {}", resp.status());
        println!("Body: {}", resp.text().await?);
    }
    println!();

    println!("5. Forcing a specific route via route_preference:");
    let resp = client
        .post(format!("{SERVER_URL}/chat"))
        .header("X-API-Key", API_KEY)
        .header("X-Group-ID", GROUP_ID)
        .json(&json!({
            "messages": [{ "role": "user", "content": "Does the invoice match the contract?" }],
            "context": { "route_preference": "route_4" }
        }))
        .send()
        .await?;
    println!("Status: {}", resp.status());
    println!("Body: {}", resp.text().await?);
    println!();

    println!("6. Prometheus Metrics:");
    let resp = client.get(format!("{SERVER_URL}/metrics")).send().await?;
    println!("Status: {}", resp.status());
    println!("Body: {}", resp.text().await?);
    println!();

    println!("All examples completed!");
    Ok(())
}
