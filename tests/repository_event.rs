mod common;

use link_tracker::domain::repositories::{ClickRecord, EventRepository, LinkRepository};
use link_tracker::infrastructure::persistence::{PgEventRepository, PgLinkRepository};
use sqlx::PgPool;
use std::sync::Arc;
use tokio::task::JoinSet;

#[sqlx::test]
async fn test_record_click_increments_and_stores_event(pool: PgPool) {
    let owner = common::insert_user(&pool, "alice", "member").await;
    let pool = Arc::new(pool);
    let links = PgLinkRepository::new(pool.clone());
    let events = PgEventRepository::new(pool);

    let link = links.create(common::new_link(owner, "event1")).await.unwrap();
    let event = common::new_event(&link);

    let ClickRecord::Recorded(stored) = events.record_click(&link, event).await.unwrap()
    else {
        panic!("click should be recorded");
    };

    assert_eq!(stored.token, "event1");
    assert_eq!(stored.country.as_deref(), Some("US"));
    assert!(stored.is_bot);
    assert_eq!(stored.owner_id, Some(owner));

    let after = links.find_by_token("event1").await.unwrap().unwrap();
    assert_eq!(after.click_count, 1);
    assert!(after.last_clicked.is_some());

    let listed = events.list_by_token("event1", 10).await.unwrap();
    assert_eq!(listed.len(), 1);
    assert_eq!(listed[0].id, stored.id);
    assert_eq!(listed[0].client_signature.as_deref(), Some("curl/8.5.0"));
    assert_eq!(listed[0].bot_reason.as_deref(), Some("keyword match"));
}

#[sqlx::test]
async fn test_limit_reached_writes_nothing(pool: PgPool) {
    let owner = common::insert_user(&pool, "alice", "member").await;
    let pool = Arc::new(pool);
    let links = PgLinkRepository::new(pool.clone());
    let events = PgEventRepository::new(pool);

    let mut input = common::new_link(owner, "event2");
    input.click_limit = 1;
    let link = links.create(input).await.unwrap();

    let first = events.record_click(&link, common::new_event(&link)).await.unwrap();
    let second = events.record_click(&link, common::new_event(&link)).await.unwrap();

    assert!(matches!(first, ClickRecord::Recorded(_)));
    assert!(matches!(second, ClickRecord::LimitReached));
    assert_eq!(events.list_by_token("event2", 10).await.unwrap().len(), 1);
    assert_eq!(
        links.find_by_token("event2").await.unwrap().unwrap().click_count,
        1
    );
}

#[sqlx::test]
async fn test_concurrent_recording_respects_limit(pool: PgPool) {
    let owner = common::insert_user(&pool, "alice", "member").await;
    let pool = Arc::new(pool);
    let links = PgLinkRepository::new(pool.clone());
    let events = Arc::new(PgEventRepository::new(pool));

    let mut input = common::new_link(owner, "event3");
    input.click_limit = 3;
    let link = Arc::new(links.create(input).await.unwrap());

    let mut tasks = JoinSet::new();
    for _ in 0..10 {
        let events = events.clone();
        let link = link.clone();
        tasks.spawn(async move {
            events
                .record_click(&link, common::new_event(&link))
                .await
                .unwrap()
        });
    }

    let mut recorded = 0;
    while let Some(result) = tasks.join_next().await {
        if matches!(result.unwrap(), ClickRecord::Recorded(_)) {
            recorded += 1;
        }
    }

    assert_eq!(recorded, 3);
    assert_eq!(
        links.find_by_token("event3").await.unwrap().unwrap().click_count,
        3
    );
}
