//! Audit coupling over a live database: a successful mutation leaves
//! exactly one audit event, and a rejected mutation leaves none. Each test
//! runs inside `test_transaction` and connects via `DATABASE_URL`; when the
//! database is unavailable the tests skip instead of failing.

use diesel::prelude::*;

use regserver::controls::service as controls;
use regserver::controls::types::CreateControlRequest;
use regserver::controls::ControlsError;
use regserver::risks::links;
use regserver::risks::service as risks;
use regserver::risks::types::CreateRiskRequest;
use regserver::risks::RisksError;
use regserver::shared::schema::audit_events;

fn connect() -> Option<PgConnection> {
    let url = match std::env::var("DATABASE_URL") {
        Ok(url) => url,
        Err(_) => {
            println!("Skipping test - DATABASE_URL not set");
            return None;
        }
    };
    match PgConnection::establish(&url) {
        Ok(conn) => Some(conn),
        Err(_) => {
            println!("Skipping test - cannot connect to database");
            None
        }
    }
}

fn event_count(conn: &mut PgConnection) -> i64 {
    audit_events::table
        .count()
        .get_result(conn)
        .expect("count audit events")
}

fn control_request(code: &str) -> CreateControlRequest {
    CreateControlRequest {
        code: code.to_string(),
        title: "Quarterly access review".to_string(),
        description: None,
        status: None,
        category: None,
        owner_id: None,
    }
}

fn risk_request() -> CreateRiskRequest {
    CreateRiskRequest {
        title: "Dormant accounts retain access".to_string(),
        description: "Leavers keep credentials past offboarding".to_string(),
        severity: Some(3),
        likelihood: Some(3),
        impact: Some(2),
        owner_id: None,
    }
}

#[test]
fn successful_create_writes_exactly_one_event() {
    let Some(mut conn) = connect() else {
        return;
    };

    conn.test_transaction::<_, ControlsError, _>(|conn| {
        let before = event_count(conn);
        let control = controls::create_control(conn, control_request("AC-201"), None)?;

        assert_eq!(event_count(conn), before + 1);

        let for_control: i64 = audit_events::table
            .filter(audit_events::entity_id.eq(control.id.to_string()))
            .count()
            .get_result(conn)?;
        assert_eq!(for_control, 1);
        Ok(())
    });
}

#[test]
fn rejected_create_leaves_no_event_behind() {
    let Some(mut conn) = connect() else {
        return;
    };

    conn.test_transaction::<_, ControlsError, _>(|conn| {
        controls::create_control(conn, control_request("AC-202"), None)?;
        let before = event_count(conn);

        // Duplicate code fails the domain write inside the coordinator's
        // transaction; the rollback must take the audit insert with it.
        let err = controls::create_control(conn, control_request("AC-202"), None);
        assert!(matches!(err, Err(ControlsError::Conflict(_))));
        assert_eq!(event_count(conn), before);
        Ok(())
    });
}

#[test]
fn relink_conflicts_without_a_new_event() {
    let Some(mut conn) = connect() else {
        return;
    };

    conn.test_transaction::<_, RisksError, _>(|conn| {
        let control = controls::create_control(conn, control_request("AC-203"), None)
            .map_err(|e| RisksError::Internal(e.to_string()))?;
        let risk = risks::create_risk(conn, risk_request(), None)?;

        links::link_control(conn, risk.id, control.id, None)?;
        let before = event_count(conn);

        let err = links::link_control(conn, risk.id, control.id, None);
        assert!(matches!(err, Err(RisksError::Conflict(_))));
        assert_eq!(event_count(conn), before);

        links::unlink_control(conn, risk.id, control.id, None)?;
        assert_eq!(event_count(conn), before + 1);
        Ok(())
    });
}
