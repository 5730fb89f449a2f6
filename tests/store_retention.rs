// tests/store_retention.rs
use news_cache::ingest::normalize;
use news_cache::store::{Store, LATEST_CAP};
use serde_json::json;

#[test]
fn only_the_200_most_recent_are_retained() {
    let total = 260i64;
    let mut store = Store::new(vec![]);
    // strictly decreasing publish times: id 0 is the newest
    for i in 0..total {
        let it = normalize(&json!({ "id": i.to_string(), "published_on": 1_000_000 - i })).unwrap();
        assert!(store.insert(it));
    }
    store.rebuild();

    let latest = store.latest(LATEST_CAP);
    assert_eq!(latest.len(), LATEST_CAP);
    let expected: Vec<String> = (0..LATEST_CAP as i64).map(|i| i.to_string()).collect();
    let got: Vec<String> = latest.iter().map(|it| it.id.clone()).collect();
    assert_eq!(got, expected);

    // nothing older than the cutoff survives, in the view or the map
    assert!(latest.iter().all(|it| it.published_at.timestamp() > 1_000_000 - LATEST_CAP as i64));
    assert_eq!(store.len(), LATEST_CAP);
    assert!(store.latest(LATEST_CAP + 50).len() <= LATEST_CAP);
}

#[test]
fn retention_holds_across_many_cycles() {
    let mut store = Store::new(vec![]);
    for cycle in 0..10i64 {
        for j in 0..50i64 {
            let n = cycle * 50 + j;
            let it = normalize(&json!({ "id": format!("n{n}"), "published_on": n })).unwrap();
            store.insert(it);
        }
        store.rebuild();
        assert!(store.latest_view().len() <= LATEST_CAP);
        assert!(store.len() <= LATEST_CAP);
    }
    assert_eq!(store.latest(1)[0].id, "n499");
}
