mod common;

use anyhow::{Context, Result};
use common::{send, TEST_PASSWORD};
use reqwest::{Client, StatusCode};
use serde_json::{json, Value};
use sqlx::postgres::PgPoolOptions;

const NEW_PASSWORD: &str = "Violet-Harbor-7731";

fn usernames(page: &Value) -> Vec<String> {
    page["data"]["results"]
        .as_array()
        .map(|rows| rows.iter().filter_map(|u| u["username"].as_str().map(String::from)).collect())
        .unwrap_or_default()
}

async fn sudo_count(database_url: &str) -> Result<i64> {
    let pool = PgPoolOptions::new().max_connections(1).connect(database_url).await?;
    let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM users WHERE role = 'SUDO'")
        .fetch_one(&pool)
        .await?;
    pool.close().await;
    Ok(count)
}

#[tokio::test]
async fn user_management_follows_the_role_hierarchy() -> Result<()> {
    let Some(database_url) = common::test_database_url() else {
        eprintln!("NODOS_TEST_DATABASE_URL not set; skipping users flow");
        return Ok(());
    };
    let server = common::ensure_server().await?;
    let client = Client::new();
    let suffix = common::unique_suffix();

    let Some(sudo_id) = common::ensure_sudo(&database_url).await? else {
        eprintln!("the SUDO account is soft-deleted; skipping users flow");
        return Ok(());
    };
    let sudo = common::bearer_for(sudo_id, "SUDO")?;

    let admin_name = format!("people_admin_{suffix}");
    let user_name = format!("people_user_{suffix}");
    let admin_id = common::insert_user(&database_url, &admin_name, "ADMIN").await?;
    let user_id = common::insert_user(&database_url, &user_name, "USER").await?;
    let admin = common::login(server, &admin_name, TEST_PASSWORD).await?;
    let user = common::login(server, &user_name, TEST_PASSWORD).await?;

    // Only ADMIN and SUDO may create accounts
    let new_account = |role: &str, name: &str| {
        json!({
            "username": name,
            "email": format!("{name}@example.org"),
            "password": NEW_PASSWORD,
            "password_confirm": NEW_PASSWORD,
            "role": role,
        })
    };
    let (status, _) = send(
        client
            .post(server.url("/api/users/"))
            .header("Authorization", &user)
            .json(&new_account("USER", &format!("people_nope_{suffix}"))),
    )
    .await?;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let created_name = format!("people_new_{suffix}");
    let (status, created) = send(
        client
            .post(server.url("/api/users/"))
            .header("Authorization", &admin)
            .json(&new_account("USER", &created_name)),
    )
    .await?;
    assert_eq!(status, StatusCode::CREATED, "{created}");
    assert_eq!(created["data"]["role"], "USER");
    assert_eq!(created["data"]["is_email_confirmed"], false);
    assert!(created["data"].get("password_hash").is_none());

    // There is exactly one SUDO, whoever asks for a second one
    let (status, _) = send(
        client
            .post(server.url("/api/users/"))
            .header("Authorization", &admin)
            .json(&new_account("SUDO", &format!("people_sudo_a_{suffix}"))),
    )
    .await?;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, body) = send(
        client
            .post(server.url("/api/users/"))
            .header("Authorization", &sudo)
            .json(&new_account("SUDO", &format!("people_sudo_b_{suffix}"))),
    )
    .await?;
    assert_eq!(status, StatusCode::BAD_REQUEST, "{body}");
    assert_eq!(body["field_errors"]["role"], "A SUDO user already exists.");

    let (status, body) = send(
        client
            .patch(server.url(&format!("/api/users/{user_id}/")))
            .header("Authorization", &sudo)
            .json(&json!({ "role": "SUDO" })),
    )
    .await?;
    assert_eq!(status, StatusCode::BAD_REQUEST, "{body}");
    assert!(body["field_errors"]["role"].is_string());
    assert_eq!(sudo_count(&database_url).await?, 1);

    // Role filter and search narrow the listing; ADMIN never sees SUDO
    let (status, page) = send(
        client
            .get(server.url(&format!("/api/users/?role=USER&search={suffix}&ordering=username")))
            .header("Authorization", &admin),
    )
    .await?;
    assert_eq!(status, StatusCode::OK, "{page}");
    let names = usernames(&page);
    assert!(names.contains(&user_name) && names.contains(&created_name), "{names:?}");
    assert!(!names.contains(&admin_name));
    assert!(page["data"]["results"].as_array().context("results")?.iter().all(|u| u["role"] == "USER"));
    let mut sorted = names.clone();
    sorted.sort();
    assert_eq!(names, sorted);

    let (status, page) = send(client.get(server.url("/api/users/?role=SUDO")).header("Authorization", &admin)).await?;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(page["data"]["count"], 0);

    // A USER only ever sees itself
    let (status, page) = send(client.get(server.url("/api/users/")).header("Authorization", &user)).await?;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(page["data"]["count"], 1);
    assert_eq!(usernames(&page), vec![user_name.clone()]);

    // nodes-created lists what the ADMIN made
    let (status, node) = send(
        client
            .post(server.url("/api/nodes/"))
            .header("Authorization", &admin)
            .json(&json!({ "content": format!("People node {suffix}") })),
    )
    .await?;
    assert_eq!(status, StatusCode::CREATED, "{node}");
    let node_id = node["data"]["id"].as_i64().context("node id")?;

    let (status, page) = send(
        client
            .get(server.url(&format!("/api/users/{admin_id}/nodes-created/")))
            .header("Authorization", &sudo),
    )
    .await?;
    assert_eq!(status, StatusCode::OK, "{page}");
    assert_eq!(page["data"]["count"], 1);
    assert_eq!(page["data"]["results"][0]["id"], node_id);

    let (status, _) = send(
        client
            .get(server.url(&format!("/api/users/{admin_id}/nodes-created/")))
            .header("Authorization", &user),
    )
    .await?;
    assert_eq!(status, StatusCode::NOT_FOUND);

    // An account that still owns active nodes stays
    let (status, body) = send(client.delete(server.url(&format!("/api/users/{admin_id}/"))).header("Authorization", &sudo)).await?;
    assert_eq!(status, StatusCode::BAD_REQUEST, "{body}");
    assert_eq!(body["error"], "Cannot delete a user who has active nodes.");

    let (status, _) = send(client.delete(server.url(&format!("/api/nodes/{node_id}/"))).header("Authorization", &admin)).await?;
    assert_eq!(status, StatusCode::OK);

    let (status, body) = send(client.delete(server.url(&format!("/api/users/{admin_id}/"))).header("Authorization", &sudo)).await?;
    assert_eq!(status, StatusCode::NO_CONTENT, "{body}");
    let (status, _) = send(client.get(server.url(&format!("/api/users/{admin_id}/"))).header("Authorization", &sudo)).await?;
    assert_eq!(status, StatusCode::NOT_FOUND);

    // Own password change
    let change = |old: &str, new: &str, confirm: &str| {
        client
            .post(server.url("/api/users/me/change-password/"))
            .header("Authorization", &user)
            .json(&json!({ "old_password": old, "new_password": new, "confirm_password": confirm }))
    };
    let (status, body) = send(change("not-my-password", NEW_PASSWORD, NEW_PASSWORD)).await?;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["field_errors"]["old_password"].is_string());

    let (status, body) = send(change(TEST_PASSWORD, NEW_PASSWORD, "something-else-1")).await?;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["field_errors"]["confirm_password"].is_string());

    let (status, body) = send(change(TEST_PASSWORD, NEW_PASSWORD, NEW_PASSWORD)).await?;
    assert_eq!(status, StatusCode::OK, "{body}");
    assert_eq!(body["data"]["message"], "Password changed successfully.");

    assert!(common::login(server, &user_name, TEST_PASSWORD).await.is_err());
    common::login(server, &user_name, NEW_PASSWORD).await?;
    Ok(())
}
