//! One handler per endpoint in the external interface.
//!
//! Read endpoints call the repository's scanning methods directly. Mutating
//! endpoints go through [`forge_core::Repository`]'s methods, each of which
//! acquires the mesh lock, mutates, rebuilds the forest, and persists it
//! before returning — the dispatch rule of the HTTP Surface component.

use std::collections::BTreeMap;
use std::sync::Arc;

use axum::extract::{Path, Query, State};
use axum::Json;
use serde::{Deserialize, Serialize};

use forge_core::model::BranchEntry;
use forge_core::paths::sanitize;
use forge_core::Repository;

use crate::http::error::ApiError;

pub type SharedRepository = Arc<Repository>;

#[derive(Serialize)]
pub struct HealthResponse {
    status: &'static str,
    version: &'static str,
    data_root: String,
}

pub async fn health(State(repo): State<SharedRepository>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        version: env!("CARGO_PKG_VERSION"),
        data_root: repo.root().display().to_string(),
    })
}

#[derive(Deserialize)]
pub struct RescanQuery {
    mesh: Option<String>,
}

#[derive(Serialize)]
pub struct RescanResponse {
    status: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    mesh: Option<String>,
}

pub async fn rescan(
    State(repo): State<SharedRepository>,
    Query(query): Query<RescanQuery>,
) -> Result<Json<RescanResponse>, ApiError> {
    tokio::task::spawn_blocking(move || repo.rescan())
        .await
        .expect("rescan task panicked")?;
    Ok(Json(RescanResponse {
        status: "ok",
        mesh: query.mesh,
    }))
}

pub async fn get_forest(
    State(repo): State<SharedRepository>,
) -> Result<Json<forge_core::model::Forest>, ApiError> {
    let forest = tokio::task::spawn_blocking(move || repo.read_forest())
        .await
        .expect("read_forest task panicked")?;
    Ok(Json(forest))
}

#[derive(Serialize)]
pub struct MeshResponse {
    mesh: String,
    correct_branch: Option<String>,
    branches: BTreeMap<String, BranchEntry>,
}

pub async fn get_mesh(
    State(repo): State<SharedRepository>,
    Path(mesh): Path<String>,
) -> Result<Json<MeshResponse>, ApiError> {
    tokio::task::spawn_blocking(move || {
        let mesh = sanitize(&mesh);
        let branches = repo.list_branches(&mesh)?;
        let correct_branch = repo.read_correct(&mesh)?;
        let mut entries = BTreeMap::new();
        for branch in branches {
            let commits = repo
                .list_commits(&mesh, &branch)?
                .into_iter()
                .map(forge_core::model::CommitSummary::bare)
                .collect();
            entries.insert(branch, BranchEntry { commits });
        }
        Ok(Json(MeshResponse {
            mesh,
            correct_branch,
            branches: entries,
        }))
    })
    .await
    .expect("get_mesh task panicked")
}

#[derive(Serialize)]
pub struct BranchesResponse {
    mesh: String,
    branches: Vec<String>,
}

pub async fn get_mesh_branches(
    State(repo): State<SharedRepository>,
    Path(mesh): Path<String>,
) -> Result<Json<BranchesResponse>, ApiError> {
    tokio::task::spawn_blocking(move || {
        let mesh = sanitize(&mesh);
        let branches = repo.list_branches(&mesh)?;
        Ok(Json(BranchesResponse { mesh, branches }))
    })
    .await
    .expect("get_mesh_branches task panicked")
}

#[derive(Serialize)]
pub struct CommitsResponse {
    mesh: String,
    branch: String,
    commits: Vec<String>,
}

pub async fn get_branch_commits(
    State(repo): State<SharedRepository>,
    Path((mesh, branch)): Path<(String, String)>,
) -> Result<Json<CommitsResponse>, ApiError> {
    tokio::task::spawn_blocking(move || {
        let mesh = sanitize(&mesh);
        let branch = sanitize(&branch);
        let commits = repo.list_commits(&mesh, &branch)?;
        Ok(Json(CommitsResponse {
            mesh,
            branch,
            commits,
        }))
    })
    .await
    .expect("get_branch_commits task panicked")
}

#[derive(Deserialize)]
pub struct SetCorrectBody {
    branch: String,
}

#[derive(Serialize)]
pub struct SetCorrectResponse {
    mesh: String,
    correct_branch: String,
    updated_at: String,
}

pub async fn set_correct(
    State(repo): State<SharedRepository>,
    Path(mesh): Path<String>,
    Json(body): Json<SetCorrectBody>,
) -> Result<Json<SetCorrectResponse>, ApiError> {
    tokio::task::spawn_blocking(move || {
        let mesh = sanitize(&mesh);
        let doc = repo.set_correct(&mesh, &body.branch)?;
        Ok(Json(SetCorrectResponse {
            mesh,
            correct_branch: doc.current_branch,
            updated_at: doc.updated_at,
        }))
    })
    .await
    .expect("set_correct task panicked")
}

#[derive(Deserialize)]
pub struct CreateBranchBody {
    branch: String,
}

#[derive(Serialize)]
pub struct BranchStatusResponse {
    mesh: String,
    branch: String,
    status: &'static str,
}

pub async fn create_branch(
    State(repo): State<SharedRepository>,
    Path(mesh): Path<String>,
    Json(body): Json<CreateBranchBody>,
) -> Result<Json<BranchStatusResponse>, ApiError> {
    tokio::task::spawn_blocking(move || {
        let created = repo.create_branch(&mesh, &body.branch)?;
        Ok(Json(BranchStatusResponse {
            mesh: created.mesh,
            branch: created.branch,
            status: "created",
        }))
    })
    .await
    .expect("create_branch task panicked")
}

pub async fn delete_branch(
    State(repo): State<SharedRepository>,
    Path((mesh, branch)): Path<(String, String)>,
) -> Result<Json<BranchStatusResponse>, ApiError> {
    tokio::task::spawn_blocking(move || {
        let mesh = sanitize(&mesh);
        let branch = sanitize(&branch);
        repo.delete_branch(&mesh, &branch)?;
        Ok(Json(BranchStatusResponse {
            mesh,
            branch,
            status: "deleted",
        }))
    })
    .await
    .expect("delete_branch task panicked")
}

#[derive(Deserialize)]
pub struct CreateCommitBody {
    branch: String,
    message: Option<String>,
    tag: Option<String>,
}

#[derive(Serialize)]
pub struct CommitInfo {
    id: String,
    datetime: String,
    message: Option<String>,
    tag: Option<String>,
}

#[derive(Serialize)]
pub struct CreateCommitResponse {
    mesh: String,
    branch: String,
    commit: CommitInfo,
    status: &'static str,
}

pub async fn create_commit(
    State(repo): State<SharedRepository>,
    Path(mesh): Path<String>,
    Json(body): Json<CreateCommitBody>,
) -> Result<Json<CreateCommitResponse>, ApiError> {
    tokio::task::spawn_blocking(move || {
        let created = repo.create_commit(&mesh, &body.branch, body.message, body.tag)?;
        Ok(Json(CreateCommitResponse {
            mesh: created.mesh,
            branch: created.branch,
            commit: CommitInfo {
                id: created.commit_id,
                datetime: created.document.datetime,
                message: created.document.message,
                tag: created.document.tag,
            },
            status: "created",
        }))
    })
    .await
    .expect("create_commit task panicked")
}

#[derive(Serialize)]
pub struct DeleteCommitResponse {
    mesh: String,
    branch: String,
    commit_id: String,
    status: &'static str,
}

pub async fn delete_commit(
    State(repo): State<SharedRepository>,
    Path((mesh, branch, commit_id)): Path<(String, String, String)>,
) -> Result<Json<DeleteCommitResponse>, ApiError> {
    tokio::task::spawn_blocking(move || {
        let mesh = sanitize(&mesh);
        let branch = sanitize(&branch);
        let commit_id = sanitize(&commit_id);
        repo.delete_commit(&mesh, &branch, &commit_id)?;
        Ok(Json(DeleteCommitResponse {
            mesh,
            branch,
            commit_id,
            status: "deleted",
        }))
    })
    .await
    .expect("delete_commit task panicked")
}
