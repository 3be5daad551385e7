mod common;

use anyhow::Result;
use axum::http::{Method, StatusCode};
use common::{acquire_db_lock, body_to_json, TestApp};

async fn seed_letter(app: &TestApp, user_token: &str, no_surat: &str) -> Result<()> {
    let fields = vec![
        ("uraian", "Izin operasional"),
        ("no_surat", no_surat),
        ("tanggal", "2024-12-31"),
        ("kategori_permit_letter", "Operasional"),
        ("sub_kategori_permit_letter", "Cabang"),
        ("status_tahapan", "Draft"),
        ("nama_pt", "PT Sentosa"),
    ];
    let response = app
        .send_multipart(
            Method::POST,
            "/api/permit-letters/upload",
            &fields,
            None,
            user_token,
        )
        .await?;
    anyhow::ensure!(
        response.status() == StatusCode::CREATED,
        "seed upload failed with status {}",
        response.status()
    );
    Ok(())
}

#[tokio::test]
async fn listing_is_scoped_and_counts_unread() -> Result<()> {
    let _lock = acquire_db_lock().await;
    let app = TestApp::new().await?;

    app.insert_user("budi", "budi@example.com", "pass-one", "USER", "Operations")
        .await?;
    app.insert_user("sari", "sari@example.com", "pass-two", "USER", "Finance")
        .await?;
    let budi = app.login_token("budi@example.com", "pass-one").await?;
    let sari = app.login_token("sari@example.com", "pass-two").await?;

    seed_letter(&app, &budi, "SK/100/2024").await?;
    seed_letter(&app, &budi, "SK/101/2024").await?;

    let response = app.get("/api/notifications", Some(&budi)).await?;
    assert_eq!(response.status(), StatusCode::OK);
    let body = body_to_json(response.into_body()).await?;
    assert_eq!(body["notifications"].as_array().unwrap().len(), 2);
    assert_eq!(body["unread_count"], 2);

    // the other user sees nothing of budi's events
    let response = app.get("/api/notifications", Some(&sari)).await?;
    let body = body_to_json(response.into_body()).await?;
    assert!(body["notifications"].as_array().unwrap().is_empty());
    assert_eq!(body["unread_count"], 0);

    app.cleanup().await?;
    Ok(())
}

#[tokio::test]
async fn mark_read_and_delete_respect_ownership() -> Result<()> {
    let _lock = acquire_db_lock().await;
    let app = TestApp::new().await?;

    app.insert_user("budi", "budi@example.com", "pass-one", "USER", "Operations")
        .await?;
    app.insert_user("sari", "sari@example.com", "pass-two", "USER", "Finance")
        .await?;
    let budi = app.login_token("budi@example.com", "pass-one").await?;
    let sari = app.login_token("sari@example.com", "pass-two").await?;

    seed_letter(&app, &budi, "SK/110/2024").await?;

    let response = app.get("/api/notifications", Some(&budi)).await?;
    let body = body_to_json(response.into_body()).await?;
    let id = body["notifications"][0]["id"].as_str().unwrap().to_string();

    // another user cannot read, mark, or delete it
    let response = app
        .get(&format!("/api/notifications/{id}"), Some(&sari))
        .await?;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    let response = app
        .patch(&format!("/api/notifications/{id}/read"), Some(&sari))
        .await?;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);

    let response = app
        .patch(&format!("/api/notifications/{id}/read"), Some(&budi))
        .await?;
    assert_eq!(response.status(), StatusCode::NO_CONTENT);

    let response = app.get("/api/notifications", Some(&budi)).await?;
    let body = body_to_json(response.into_body()).await?;
    assert_eq!(body["unread_count"], 0);
    assert!(body["notifications"][0]["read_at"].is_string());

    let response = app
        .delete(&format!("/api/notifications/delete/{id}"), Some(&budi))
        .await?;
    assert_eq!(response.status(), StatusCode::NO_CONTENT);

    let response = app
        .get(&format!("/api/notifications/{id}"), Some(&budi))
        .await?;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);

    app.cleanup().await?;
    Ok(())
}

#[tokio::test]
async fn endpoints_require_authentication() -> Result<()> {
    let _lock = acquire_db_lock().await;
    let app = TestApp::new().await?;

    let response = app.get("/api/notifications", None).await?;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

    let response = app.get("/api/permit-letters/", None).await?;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

    // the health probe stays open
    let response = app.get("/api/health", None).await?;
    assert_eq!(response.status(), StatusCode::OK);
    let body = body_to_json(response.into_body()).await?;
    assert_eq!(body["status"], "ok");
    assert_eq!(body["service"], "permitdesk");

    app.cleanup().await?;
    Ok(())
}
