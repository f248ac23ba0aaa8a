mod common;

use anyhow::{Context, Result};
use common::{send, TEST_PASSWORD as PASSWORD};
use nodos_api::locale::Language;
use reqwest::{Client, StatusCode};
use serde_json::{json, Value};

/// Insert a confirmed ADMIN straight into the database and return its username
async fn create_admin(database_url: &str, suffix: &str) -> Result<String> {
    let username = format!("flow_admin_{suffix}");
    common::insert_user(database_url, &username, "ADMIN").await?;
    Ok(username)
}

#[tokio::test]
async fn node_lifecycle_with_localization_and_token_rotation() -> Result<()> {
    let Some(database_url) = common::test_database_url() else {
        eprintln!("NODOS_TEST_DATABASE_URL not set; skipping database flow");
        return Ok(());
    };
    let server = common::ensure_server().await?;
    let client = Client::new();
    let suffix = common::unique_suffix();
    let username = create_admin(&database_url, &suffix).await?;

    // Login
    let (status, body) = send(
        client
            .post(server.url("/api/token/"))
            .json(&json!({ "username": username, "password": PASSWORD })),
    )
    .await?;
    assert_eq!(status, StatusCode::OK, "{body}");
    let access = body["data"]["access"].as_str().context("access token")?.to_string();
    let refresh = body["data"]["refresh"].as_str().context("refresh token")?.to_string();
    let bearer = format!("Bearer {access}");

    // Create a root and a child
    let root_content = format!("Flow root {suffix}");
    let (status, root) = send(
        client
            .post(server.url("/api/nodes/"))
            .header("Authorization", &bearer)
            .json(&json!({ "content": root_content })),
    )
    .await?;
    assert_eq!(status, StatusCode::CREATED, "{root}");
    let root_id = root["data"]["id"].as_i64().context("root id")?;
    assert_eq!(root["data"]["parent"], Value::Null);
    assert_eq!(root["data"]["title"], Language::En.spell(root_id));

    let (status, child) = send(
        client
            .post(server.url("/api/nodes/"))
            .header("Authorization", &bearer)
            .json(&json!({ "content": "Child", "parent": root_id })),
    )
    .await?;
    assert_eq!(status, StatusCode::CREATED, "{child}");
    let child_id = child["data"]["id"].as_i64().context("child id")?;

    // Same content in the same scope is refused, case-insensitively
    let (status, dup) = send(
        client
            .post(server.url("/api/nodes/"))
            .header("Authorization", &bearer)
            .json(&json!({ "content": "CHILD", "parent": root_id })),
    )
    .await?;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(dup["field_errors"]["content"].is_string());

    // Localized read with one level of children
    let res = client
        .get(server.url(&format!("/api/nodes/{root_id}/?depth=1")))
        .header("Authorization", &bearer)
        .header("Accept-Language", "es-ES,es;q=0.9")
        .header("Time-Zone", "America/Bogota")
        .send()
        .await?;
    assert_eq!(res.status(), StatusCode::OK);
    let vary = res.headers().get("vary").and_then(|v| v.to_str().ok()).unwrap_or_default().to_string();
    assert!(vary.contains("Accept-Language"), "vary: {vary}");
    let tree: Value = res.json().await?;
    assert_eq!(tree["data"]["title"], Language::Es.spell(root_id));
    assert_eq!(tree["data"]["children"][0]["id"], child_id);

    // A node with active children cannot be deleted
    let (status, err) = send(client.delete(server.url(&format!("/api/nodes/{root_id}/"))).header("Authorization", &bearer)).await?;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(err["code"], "HAS_CHILDREN");

    // Moving the root under its own child would make a cycle
    let (status, _) = send(
        client
            .patch(server.url(&format!("/api/nodes/{root_id}/")))
            .header("Authorization", &bearer)
            .json(&json!({ "parent": child_id })),
    )
    .await?;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    // Delete bottom-up, then restore the root
    for id in [child_id, root_id] {
        let (status, body) = send(client.delete(server.url(&format!("/api/nodes/{id}/"))).header("Authorization", &bearer)).await?;
        assert_eq!(status, StatusCode::OK, "{body}");
        assert_eq!(body["data"]["id"], id);
    }
    let (status, _) = send(client.get(server.url(&format!("/api/nodes/{root_id}/"))).header("Authorization", &bearer)).await?;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, restored) = send(
        client
            .post(server.url(&format!("/api/nodes/{root_id}/restore/")))
            .header("Authorization", &bearer),
    )
    .await?;
    assert_eq!(status, StatusCode::OK, "{restored}");
    assert_eq!(restored["data"]["is_deleted"], false);

    // Own profile carries the audit extras
    let (status, me) = send(client.get(server.url("/api/users/me/")).header("Authorization", &bearer)).await?;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(me["data"]["username"], username);
    assert_eq!(me["data"]["role_display"], "Administrator");
    assert!(me["data"]["nodes_created_count"].as_i64().unwrap_or_default() >= 1);
    assert!(me["data"].get("password_hash").is_none());

    // Refresh rotation: the old refresh token is single use
    let (status, rotated) = send(client.post(server.url("/api/token/refresh/")).json(&json!({ "refresh": refresh }))).await?;
    assert_eq!(status, StatusCode::OK, "{rotated}");
    assert!(rotated["data"]["access"].is_string());

    let (status, _) = send(client.post(server.url("/api/token/refresh/")).json(&json!({ "refresh": refresh }))).await?;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    Ok(())
}

#[tokio::test]
async fn bad_identifiers_are_rejected_before_lookup() -> Result<()> {
    let Some(database_url) = common::test_database_url() else {
        return Ok(());
    };
    let server = common::ensure_server().await?;
    let client = Client::new();
    let suffix = common::unique_suffix();
    let username = create_admin(&database_url, &suffix).await?;

    let (_, body) = send(
        client
            .post(server.url("/api/token/"))
            .json(&json!({ "username": username, "password": PASSWORD })),
    )
    .await?;
    let bearer = format!("Bearer {}", body["data"]["access"].as_str().context("access token")?);

    let (status, body) = send(client.get(server.url("/api/nodes/abc/")).header("Authorization", &bearer)).await?;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["code"], "INVALID_ID_FORMAT");

    let (status, body) = send(client.get(server.url("/api/nodes/0/")).header("Authorization", &bearer)).await?;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["code"], "INVALID_ID");

    // A query string that cannot be decoded still gets the JSON error body
    let (status, body) = send(
        client
            .get(server.url("/api/nodes/?parent=1&parent=2"))
            .header("Authorization", &bearer),
    )
    .await?;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["success"], false);
    assert_eq!(body["code"], "BAD_REQUEST");
    Ok(())
}

#[tokio::test]
async fn crossing_moves_never_form_a_cycle() -> Result<()> {
    let Some(database_url) = common::test_database_url() else {
        return Ok(());
    };
    let server = common::ensure_server().await?;
    let client = Client::new();
    let suffix = common::unique_suffix();
    let username = create_admin(&database_url, &suffix).await?;
    let bearer = common::login(server, &username, PASSWORD).await?;

    let mut ids = Vec::new();
    for name in ["left", "right"] {
        let (status, node) = send(
            client
                .post(server.url("/api/nodes/"))
                .header("Authorization", &bearer)
                .json(&json!({ "content": format!("Cross {name} {suffix}") })),
        )
        .await?;
        assert_eq!(status, StatusCode::CREATED, "{node}");
        ids.push(node["data"]["id"].as_i64().context("node id")?);
    }
    let (left, right) = (ids[0], ids[1]);

    // Each move is valid on its own; together they would close a loop
    let move_under = |id: i64, parent: i64| {
        send(
            client
                .patch(server.url(&format!("/api/nodes/{id}/")))
                .header("Authorization", &bearer)
                .json(&json!({ "parent": parent })),
        )
    };
    let (first, second) = tokio::join!(move_under(left, right), move_under(right, left));
    let (first, second) = (first?, second?);

    let mut statuses = [first.0, second.0];
    statuses.sort();
    assert_eq!(statuses, [StatusCode::OK, StatusCode::BAD_REQUEST], "{} / {}", first.1, second.1);

    // Exactly one of the two is still a root
    let mut roots = 0;
    for id in [left, right] {
        let (status, node) = send(client.get(server.url(&format!("/api/nodes/{id}/?depth=0"))).header("Authorization", &bearer)).await?;
        assert_eq!(status, StatusCode::OK, "{node}");
        if node["data"]["parent"].is_null() {
            roots += 1;
        }
    }
    assert_eq!(roots, 1);
    Ok(())
}
