diesel::table! {
    controls (id) {
        id -> Uuid,
        code -> Varchar,
        title -> Varchar,
        description -> Nullable<Text>,
        status -> Varchar,
        category -> Nullable<Varchar>,
        owner_id -> Nullable<Uuid>,
        created_at -> Timestamptz,
        updated_at -> Timestamptz,
    }
}

diesel::table! {
    risks (id) {
        id -> Uuid,
        title -> Varchar,
        description -> Text,
        severity -> Int4,
        likelihood -> Int4,
        impact -> Int4,
        status -> Varchar,
        owner_id -> Nullable<Uuid>,
        created_at -> Timestamptz,
        updated_at -> Timestamptz,
    }
}

diesel::table! {
    risk_controls (risk_id, control_id) {
        risk_id -> Uuid,
        control_id -> Uuid,
    }
}

diesel::table! {
    control_evidence (id) {
        id -> Uuid,
        control_id -> Uuid,
        evidence_type -> Varchar,
        note -> Nullable<Text>,
        link -> Nullable<Varchar>,
        created_at -> Timestamptz,
    }
}

diesel::table! {
    audit_events (id) {
        id -> Uuid,
        action -> Varchar,
        entity_type -> Varchar,
        entity_id -> Varchar,
        control_id -> Nullable<Uuid>,
        risk_id -> Nullable<Uuid>,
        actor_id -> Nullable<Uuid>,
        meta -> Nullable<Jsonb>,
        created_at -> Timestamptz,
    }
}

diesel::joinable!(risk_controls -> risks (risk_id));
diesel::joinable!(risk_controls -> controls (control_id));
diesel::joinable!(control_evidence -> controls (control_id));

diesel::allow_tables_to_appear_in_same_query!(
    controls,
    risks,
    risk_controls,
    control_evidence,
    audit_events,
);
