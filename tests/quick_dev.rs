//! Smoke test against a running server (`cargo run`, then
//! `cargo test --test quick_dev -- --ignored --nocapture`).

use serde_json::json;

#[tokio::test]
#[ignore = "needs a server on localhost:3000"]
async fn quick_dev() -> anyhow::Result<()> {
    let hc = httpc_test::new_client("http://localhost:3000")?;

    hc.do_get("/health").await?.print().await?;

    let created = hc
        .do_post(
            "/api/events",
            json!({
                "name": "quick dev",
                "dates": ["2024-06-01", "2024-06-02"],
                "startHour": 18,
                "endHour": 20
            }),
        )
        .await?;
    created.print().await?;
    let body = created.json_body()?;
    let id = body["id"].as_str().unwrap_or_default();

    hc.do_post(
        &format!("/api/events/{id}/availability"),
        json!({
            "participant": "Aria",
            "slots": { "2024-06-01-18": { "available": true, "note": "remote" } }
        }),
    )
    .await?
    .print()
    .await?;

    hc.do_get(&format!("/api/events/{id}/heatmap"))
        .await?
        .print()
        .await?;

    Ok(())
}
