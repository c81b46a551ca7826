use std::time::Duration;

use axum::http::StatusCode;
use pretty_assertions::assert_eq;

use crate::test_utils::TestContext;

#[tokio::test]
async fn event_stream_closes_once_shutdown_starts() {
    let ctx = TestContext::new();
    ctx.state.shutdown.cancel();

    let response = tokio::time::timeout(Duration::from_secs(2), async {
        ctx.server
            .get("/api/events")
            .add_query_param("topics", "services")
            .await
    })
    .await
    .expect("event stream should end after shutdown");

    assert_eq!(response.status_code(), StatusCode::OK);
    assert!(!response.text().contains("event:"));
}
