mod common;

use anyhow::Result;
use reqwest::StatusCode;
use serde_json::{json, Value};

fn report_payload(patient_id: &Value, report_type: &str) -> Value {
    json!({
        "patientId": patient_id,
        "title": "Blood panel",
        "fileUrl": "https://files.example.com/reports/blood-panel.pdf",
        "type": report_type,
    })
}

#[tokio::test]
async fn admin_attaches_report_visible_only_to_patient() -> Result<()> {
    let server = common::spawn_server().await?;
    let (alice, alice_user) = common::logged_in(&server, "alice", "patient").await?;
    let (bob, _) = common::logged_in(&server, "bob", "patient").await?;
    let (admin, _) = common::logged_in(&server, "root", "admin").await?;

    let res = admin
        .post(server.url("/api/reports"))
        .json(&report_payload(&alice_user["id"], "xray"))
        .send()
        .await?;
    assert_eq!(res.status(), StatusCode::CREATED);
    let report: Value = res.json().await?;
    assert_eq!(report["type"], "xray");
    assert_eq!(report["patientId"], alice_user["id"]);
    assert!(report["date"].is_string());

    let own: Vec<Value> = alice.get(server.url("/api/reports")).send().await?.json().await?;
    assert_eq!(own.len(), 1);
    assert_eq!(own[0]["id"], report["id"]);

    let others: Vec<Value> = bob.get(server.url("/api/reports")).send().await?.json().await?;
    assert!(others.is_empty());

    // Admins only see reports filed against themselves
    let admins: Vec<Value> = admin.get(server.url("/api/reports")).send().await?.json().await?;
    assert!(admins.is_empty());
    Ok(())
}

#[tokio::test]
async fn patients_cannot_create_reports() -> Result<()> {
    let server = common::spawn_server().await?;
    let (alice, alice_user) = common::logged_in(&server, "alice", "patient").await?;

    let res = alice
        .post(server.url("/api/reports"))
        .json(&report_payload(&alice_user["id"], "report"))
        .send()
        .await?;
    assert_eq!(res.status(), StatusCode::UNAUTHORIZED);

    let res = reqwest::Client::new().get(server.url("/api/reports")).send().await?;
    assert_eq!(res.status(), StatusCode::UNAUTHORIZED);
    Ok(())
}

#[tokio::test]
async fn report_validation_and_missing_patient() -> Result<()> {
    let server = common::spawn_server().await?;
    let (admin, admin_user) = common::logged_in(&server, "root", "admin").await?;

    let res = admin
        .post(server.url("/api/reports"))
        .json(&report_payload(&admin_user["id"], "mri"))
        .send()
        .await?;
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    let body: Value = res.json().await?;
    assert_eq!(body["field"], "type");

    let res = admin
        .post(server.url("/api/reports"))
        .json(&report_payload(&json!(9999), "prescription"))
        .send()
        .await?;
    assert_eq!(res.status(), StatusCode::NOT_FOUND);
    Ok(())
}
