use anyhow::anyhow;
use serde_json::json;

use crate::auth::password::hash_password;
use crate::cli::utils::{output_progress, output_success};
use crate::cli::OutputFormat;
use crate::database::models::Role;
use crate::database::users::NewUser;
use crate::database::{DatabaseManager, NodeRepository, UserRepository};

pub const SEED_PASSWORD: &str = "password123";

/// (username, email, role, email confirmed, purpose)
const SEED_USERS: [(&str, &str, Role, bool, &str); 5] = [
    ("admin_boss", "admin@tree.com", Role::Admin, true, "confirmed ADMIN, can edit and delete nodes"),
    ("admin_pending", "pending_admin@tree.com", Role::Admin, false, "unconfirmed ADMIN, login must fail"),
    ("user_regular", "user@tree.com", Role::User, true, "confirmed USER, read only"),
    ("user_new", "new@tree.com", Role::User, false, "unconfirmed USER, login must fail"),
    ("staff_dev", "dev@tree.com", Role::Admin, true, "second ADMIN for hierarchy checks"),
];

const ROOT_NAMES: [&str; 7] = [
    "Head Office",
    "Technology",
    "Human Resources",
    "Corporate Finance",
    "Active Projects",
    "Operations",
    "Marketing",
];
const CHILD_KINDS: [&str; 8] = [
    "Division",
    "Team",
    "Project",
    "Department",
    "Working Group",
    "Committee",
    "Initiative",
    "Program",
];
const TASK_KINDS: [&str; 8] = [
    "Task",
    "Subtask",
    "Documentation",
    "Review",
    "Implementation",
    "Testing",
    "Deployment",
    "Maintenance",
];
const DETAIL_KINDS: [&str; 8] = [
    "Checklist",
    "Note",
    "Comment",
    "Observation",
    "Reminder",
    "Follow-up",
    "Update",
    "Fix",
];

pub async fn seed_users(output_format: OutputFormat) -> anyhow::Result<()> {
    let users = UserRepository::new(DatabaseManager::main_pool().await?);
    let password_hash = hash_password(SEED_PASSWORD)?;

    let mut created = Vec::new();
    let mut skipped = Vec::new();

    for (username, email, role, confirmed, purpose) in SEED_USERS {
        if users.username_taken(username, None).await? || users.email_taken(email, None).await? {
            output_progress(&output_format, &format!("  skipped: {username} already exists"));
            skipped.push(username);
            continue;
        }

        users
            .create(&NewUser {
                username: username.to_string(),
                email: email.to_string(),
                password_hash: password_hash.clone(),
                first_name: String::new(),
                last_name: String::new(),
                role,
                is_email_confirmed: confirmed,
            })
            .await?;
        output_progress(&output_format, &format!("  created: {username} - {purpose}"));
        created.push(username);
    }

    output_success(
        &output_format,
        &format!("Seeded users: {} created, {} skipped", created.len(), skipped.len()),
        Some(json!({ "created": created, "skipped": skipped })),
    )
}

/// One node of the sample tree, parent given as an index into the plan
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlannedNode {
    pub parent: Option<usize>,
    pub content: String,
}

/// Deterministic sample tree: seven roots, up to four levels deep, plus a
/// few standalone and numeric nodes. Contents are unique per parent.
pub fn plan_tree() -> Vec<PlannedNode> {
    fn push(plan: &mut Vec<PlannedNode>, parent: Option<usize>, content: String) -> usize {
        plan.push(PlannedNode { parent, content });
        plan.len() - 1
    }

    let mut plan = Vec::new();

    let mut roots = Vec::new();
    for (r, name) in ROOT_NAMES.iter().enumerate() {
        let root = push(&mut plan, None, format!("{} #{}", name, r + 1));
        roots.push(root);

        for i in 1..=(1 + r % 3) {
            let kind = CHILD_KINDS[(r + i) % CHILD_KINDS.len()];
            let letter = char::from(b'A' + (i - 1) as u8);
            let child = push(&mut plan, Some(root), format!("{} {} of {} #{}", kind, letter, name, r + 1));

            // Roughly three in five children get tasks
            if (r + i) % 5 >= 3 {
                continue;
            }
            for j in 1..=(1 + (r + i) % 3) {
                let kind = TASK_KINDS[(r * 3 + i + j) % TASK_KINDS.len()];
                let task = push(&mut plan, Some(child), format!("{} {}.{}", kind, j, i));

                if (r + i + j) % 10 >= 3 {
                    continue;
                }
                for k in 1..=(1 + (r + j) % 2) {
                    let kind = DETAIL_KINDS[(r + i + j + k) % DETAIL_KINDS.len()];
                    push(&mut plan, Some(task), format!("{} {}.{}.{}", kind, k, j, i));
                }
            }
        }
    }

    for n in 0..5 {
        let parent = (n % 2 == 0).then(|| roots[n % roots.len()]);
        push(&mut plan, parent, format!("Standalone node #{}", n + 1));
    }
    for n in 0..3 {
        let parent = (n % 2 == 0).then(|| roots[(n + 3) % roots.len()]);
        push(&mut plan, parent, format!("Number {}", 1000 + (n * 7919) % 90000));
    }

    plan
}

pub async fn seed_nodes(output_format: OutputFormat) -> anyhow::Result<()> {
    let pool = DatabaseManager::main_pool().await?;
    let sudo = UserRepository::new(pool.clone())
        .find_sudo()
        .await?
        .ok_or_else(|| anyhow!("No SUDO user exists; run `nodos setup-sudo` first"))?;
    output_progress(&output_format, &format!("Using SUDO user: {} (ID: {})", sudo.username, sudo.id));

    let plan = plan_tree();
    let mut tx = pool.begin().await?;

    let removed = NodeRepository::purge_all(&mut tx).await?;
    output_progress(&output_format, &format!("Removed {removed} existing nodes"));

    let mut ids: Vec<i64> = Vec::with_capacity(plan.len());
    for planned in &plan {
        let parent = planned.parent.map(|idx| ids[idx]);
        let node = NodeRepository::insert(&mut *tx, parent, &planned.content, Some(sudo.id)).await?;
        output_progress(&output_format, &format!("  created {}: {}", node.id, node.content));
        ids.push(node.id);
    }

    let (total, roots, leaves) = NodeRepository::tree_stats(&mut *tx).await?;
    tx.commit().await?;
    tracing::info!(target: "audit", user_id = sudo.id, total, "node tree reseeded");

    output_success(
        &output_format,
        &format!("Seeded {total} nodes ({roots} roots, {leaves} leaves) as {}", sudo.username),
        Some(json!({ "nodes": total, "roots": roots, "leaves": leaves, "created_by": sudo.id })),
    )
}
