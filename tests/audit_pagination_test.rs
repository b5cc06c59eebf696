//! Exercises the pagination protocol end to end over a synthetic event log:
//! cursor round-trips combined with page assembly must walk the whole log
//! exactly once, in order, including runs of equal timestamps.

use chrono::{DateTime, TimeZone, Utc};
use uuid::Uuid;

use regserver::audit::query::{assemble_page, clamp_limit};
use regserver::audit::storage::DbAuditEvent;
use regserver::audit::Cursor;

fn event(created_at: DateTime<Utc>, id: Uuid) -> DbAuditEvent {
    DbAuditEvent {
        id,
        action: "CREATED".to_string(),
        entity_type: "CONTROL".to_string(),
        entity_id: id.to_string(),
        control_id: Some(id),
        risk_id: None,
        actor_id: None,
        meta: None,
        created_at,
    }
}

/// Newest-first log where several events share the same timestamp, which is
/// exactly the case a timestamp-only cursor would mishandle.
fn synthetic_log() -> Vec<DbAuditEvent> {
    let mut ids: Vec<Uuid> = (0..23).map(|_| Uuid::new_v4()).collect();
    ids.sort();
    ids.reverse();

    let mut log = Vec::new();
    for (i, id) in ids.into_iter().enumerate() {
        // Three events per second, so id is the tiebreaker within each second.
        let ts = Utc.timestamp_opt(1_000_000 - (i as i64 / 3), 0).unwrap();
        log.push(event(ts, id));
    }
    log
}

/// What the store would return for one page request: rows strictly past the
/// cursor, newest first, `limit + 1` of them.
fn fetch(log: &[DbAuditEvent], cursor: Option<&Cursor>, limit: usize) -> Vec<DbAuditEvent> {
    log.iter()
        .filter(|row| match cursor {
            None => true,
            Some(c) => {
                row.created_at < c.created_at
                    || (row.created_at == c.created_at && row.id < c.id)
            }
        })
        .take(limit + 1)
        .cloned()
        .collect()
}

#[test]
fn page_walk_covers_log_exactly_once() {
    let log = synthetic_log();
    let limit = clamp_limit(Some(4)) as usize;

    let mut seen: Vec<Uuid> = Vec::new();
    let mut token: Option<String> = None;
    let mut pages = 0;

    loop {
        let cursor = match &token {
            Some(t) => Some(Cursor::decode(t).unwrap()),
            None => None,
        };
        let rows = fetch(&log, cursor.as_ref(), limit);
        let (kept, next) = assemble_page(rows, limit);

        seen.extend(kept.iter().map(|row| row.id));
        pages += 1;
        assert!(pages <= log.len(), "walk failed to terminate");

        match next {
            // The cursor goes through its wire form on every hop.
            Some(next) => token = Some(next.encode()),
            None => break,
        }
    }

    let expected: Vec<Uuid> = log.iter().map(|row| row.id).collect();
    assert_eq!(seen, expected);
    assert_eq!(pages, 6); // 23 events in pages of 4
}

#[test]
fn final_partial_page_emits_no_cursor() {
    let log = synthetic_log();
    let rows = fetch(&log, None, log.len());
    let (kept, next) = assemble_page(rows, log.len());
    assert_eq!(kept.len(), log.len());
    assert!(next.is_none());
}

#[test]
fn equal_timestamp_run_is_split_without_loss() {
    let ts = Utc.timestamp_opt(500, 0).unwrap();
    let mut ids: Vec<Uuid> = (0..5).map(|_| Uuid::new_v4()).collect();
    ids.sort();
    ids.reverse();
    let log: Vec<DbAuditEvent> = ids.iter().map(|id| event(ts, *id)).collect();

    let first = fetch(&log, None, 2);
    let (kept, next) = assemble_page(first, 2);
    assert_eq!(kept.len(), 2);
    let cursor = Cursor::decode(&next.unwrap().encode()).unwrap();

    let second = fetch(&log, Some(&cursor), 10);
    let (rest, next) = assemble_page(second, 10);
    assert!(next.is_none());

    let walked: Vec<Uuid> = kept.iter().chain(rest.iter()).map(|row| row.id).collect();
    assert_eq!(walked, ids);
}

#[test]
fn resumed_walk_is_stable_under_later_inserts() {
    let mut log = synthetic_log();
    let limit = 4;

    let rows = fetch(&log, None, limit);
    let (kept, next) = assemble_page(rows, limit);
    let cursor = next.unwrap();

    // A newer event lands after the first page was served.
    let newest = log[0].created_at + chrono::Duration::seconds(10);
    log.insert(0, event(newest, Uuid::new_v4()));

    let rows = fetch(&log, Some(&cursor), limit);
    let (second, _) = assemble_page(rows, limit);

    // The resumed page continues past the cursor; already-served rows and
    // the newer insert do not reappear.
    let first_ids: Vec<Uuid> = kept.iter().map(|row| row.id).collect();
    for row in &second {
        assert!(!first_ids.contains(&row.id));
        assert!(row.created_at <= cursor.created_at);
    }
}
