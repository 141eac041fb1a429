// server/src/routes/snomed_routes.rs
//! Idempotent control endpoints for the seeding job, under `/api/snomed`.
//!
//! Seed launches run on detached tasks so long jobs outlive the request;
//! the request lifetime never cancels a running import.

use std::convert::Infallible;
use std::sync::Arc;

use seeding_service::{JobControlError, SnomedSeedingService};
use serde::Deserialize;
use serde_json::json;
use warp::filters::BoxedFilter;
use warp::http::StatusCode;
use warp::reply::{Json, WithStatus};
use warp::{Filter, Rejection};

/// Unified reply type so every handler slots into the same route chain.
type ApiReply = Result<WithStatus<Json>, Rejection>;

fn with_service(
    svc: Arc<SnomedSeedingService>,
) -> impl Filter<Extract = (Arc<SnomedSeedingService>,), Error = Infallible> + Clone {
    warp::any().map(move || svc.clone())
}

/// RFC 7807 style body carried by every non-2xx response.
fn problem(status: StatusCode, title: &str, detail: String) -> WithStatus<Json> {
    let body = json!({
        "title": title,
        "detail": detail,
        "status": status.as_u16(),
    });
    warp::reply::with_status(warp::reply::json(&body), status)
}

fn control_error_reply(error: JobControlError) -> WithStatus<Json> {
    let detail = error.to_string();
    match error {
        JobControlError::AlreadyRunning => {
            problem(StatusCode::CONFLICT, "Seeding job already running", detail)
        }
        JobControlError::MissingSnapshot(_) => {
            problem(StatusCode::BAD_REQUEST, "Snapshot directory missing", detail)
        }
        JobControlError::NoActiveJob => {
            problem(StatusCode::NOT_FOUND, "No running seeding job", detail)
        }
        JobControlError::NoCheckpoint => {
            problem(StatusCode::NOT_FOUND, "No seed checkpoint", detail)
        }
        JobControlError::NotResumable(_) => {
            problem(StatusCode::BAD_REQUEST, "Checkpoint not resumable", detail)
        }
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SeedQuery {
    active_only: Option<bool>,
    batch_size: Option<usize>,
    force_restart: Option<bool>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ReseedQuery {
    active_only: Option<bool>,
    batch_size: Option<usize>,
}

async fn handle_status(svc: Arc<SnomedSeedingService>) -> ApiReply {
    let status = svc.full_status().await;
    Ok(warp::reply::with_status(warp::reply::json(&status), StatusCode::OK))
}

async fn handle_job(svc: Arc<SnomedSeedingService>) -> ApiReply {
    match svc.status().await {
        Some(status) => Ok(warp::reply::with_status(warp::reply::json(&status), StatusCode::OK)),
        None => Ok(problem(
            StatusCode::NOT_FOUND,
            "No seed checkpoint",
            "No seeding job checkpoint exists".to_string(),
        )),
    }
}

async fn handle_seed(query: SeedQuery, svc: Arc<SnomedSeedingService>) -> ApiReply {
    let mut options = svc.config().seed_options();
    if let Some(active_only) = query.active_only {
        options.active_only = active_only;
    }
    if let Some(batch_size) = query.batch_size {
        options.batch_size = batch_size;
    }

    match svc.start(options, query.force_restart.unwrap_or(false)).await {
        Ok(started) => Ok(warp::reply::with_status(warp::reply::json(&started), StatusCode::ACCEPTED)),
        Err(e) => Ok(control_error_reply(e)),
    }
}

async fn handle_reseed(query: ReseedQuery, svc: Arc<SnomedSeedingService>) -> ApiReply {
    let seed_query = SeedQuery {
        active_only: query.active_only,
        batch_size: query.batch_size,
        force_restart: Some(true),
    };
    handle_seed(seed_query, svc).await
}

async fn handle_pause(svc: Arc<SnomedSeedingService>) -> ApiReply {
    match svc.pause_job().await {
        Ok(response) => Ok(warp::reply::with_status(warp::reply::json(&response), StatusCode::OK)),
        Err(e) => Ok(control_error_reply(e)),
    }
}

async fn handle_resume(svc: Arc<SnomedSeedingService>) -> ApiReply {
    match svc.resume_job().await {
        Ok(started) => Ok(warp::reply::with_status(warp::reply::json(&started), StatusCode::ACCEPTED)),
        Err(e) => Ok(control_error_reply(e)),
    }
}

async fn handle_delete_checkpoint(svc: Arc<SnomedSeedingService>) -> ApiReply {
    svc.clear_checkpoint().await;
    Ok(warp::reply::with_status(
        warp::reply::json(&json!(null)),
        StatusCode::NO_CONTENT,
    ))
}

async fn handle_verify(svc: Arc<SnomedSeedingService>) -> ApiReply {
    match svc.verify().await {
        Ok(verification) => Ok(warp::reply::with_status(
            warp::reply::json(&verification),
            StatusCode::OK,
        )),
        Err(e) => Ok(problem(
            StatusCode::INTERNAL_SERVER_ERROR,
            "Verification failed",
            e.to_string(),
        )),
    }
}

pub fn snomed_routes(svc: Arc<SnomedSeedingService>) -> BoxedFilter<(WithStatus<Json>,)> {
    let with_svc = with_service(svc);

    let status = warp::path!("api" / "snomed" / "status")
        .and(warp::get())
        .and(with_svc.clone())
        .and_then(handle_status);

    let job = warp::path!("api" / "snomed" / "job")
        .and(warp::get())
        .and(with_svc.clone())
        .and_then(handle_job);

    let seed = warp::path!("api" / "snomed" / "seed")
        .and(warp::post())
        .and(warp::query::<SeedQuery>())
        .and(with_svc.clone())
        .and_then(handle_seed);

    let reseed = warp::path!("api" / "snomed" / "reseed")
        .and(warp::post())
        .and(warp::query::<ReseedQuery>())
        .and(with_svc.clone())
        .and_then(handle_reseed);

    let pause = warp::path!("api" / "snomed" / "pause")
        .and(warp::post())
        .and(with_svc.clone())
        .and_then(handle_pause);

    let resume = warp::path!("api" / "snomed" / "resume")
        .and(warp::post())
        .and(with_svc.clone())
        .and_then(handle_resume);

    let checkpoint = warp::path!("api" / "snomed" / "checkpoint")
        .and(warp::delete())
        .and(with_svc.clone())
        .and_then(handle_delete_checkpoint);

    let verify = warp::path!("api" / "snomed" / "verify")
        .and(warp::get())
        .and(with_svc)
        .and_then(handle_verify);

    status
        .or(job)
        .unify()
        .or(seed)
        .unify()
        .or(reseed)
        .unify()
        .or(pause)
        .unify()
        .or(resume)
        .unify()
        .or(checkpoint)
        .unify()
        .or(verify)
        .unify()
        .boxed()
}

#[cfg(test)]
mod tests {
    use super::*;
    use graph_engine::{GraphRepository, GraphService};
    use seeding_service::{CheckpointStore, SnomedConfig};
    use std::sync::atomic::AtomicBool;
    use tempfile::TempDir;

    fn test_service(tmp: &TempDir, with_snapshot: bool) -> Arc<SnomedSeedingService> {
        let import_dir = tmp.path().join("import");
        let snapshot_dir = import_dir.join("Snapshot");
        if with_snapshot {
            std::fs::create_dir_all(snapshot_dir.join("Terminology")).unwrap();
            for name in [
                "sct2_Concept_Snapshot.txt",
                "sct2_Description_Snapshot.txt",
                "sct2_Relationship_Snapshot.txt",
            ] {
                std::fs::write(snapshot_dir.join("Terminology").join(name), "header\n").unwrap();
            }
        }

        let config = SnomedConfig {
            import_directory: import_dir,
            ..Default::default()
        };
        let repository: Arc<dyn GraphRepository> = Arc::new(GraphService::new());
        let checkpoints = Arc::new(CheckpointStore::new(config.snapshot_directory()));
        Arc::new(SnomedSeedingService::new(
            repository,
            checkpoints,
            config,
            Arc::new(AtomicBool::new(false)),
        ))
    }

    #[tokio::test]
    async fn status_always_responds_ok() {
        let tmp = TempDir::new().unwrap();
        let routes = snomed_routes(test_service(&tmp, false));

        let resp = warp::test::request()
            .method("GET")
            .path("/api/snomed/status")
            .reply(&routes)
            .await;
        assert_eq!(resp.status(), StatusCode::OK);

        let body: serde_json::Value = serde_json::from_slice(resp.body()).unwrap();
        assert_eq!(body["snapshotPresent"], serde_json::json!(false));
    }

    #[tokio::test]
    async fn job_without_checkpoint_is_not_found() {
        let tmp = TempDir::new().unwrap();
        let routes = snomed_routes(test_service(&tmp, false));

        let resp = warp::test::request()
            .method("GET")
            .path("/api/snomed/job")
            .reply(&routes)
            .await;
        assert_eq!(resp.status(), StatusCode::NOT_FOUND);

        let body: serde_json::Value = serde_json::from_slice(resp.body()).unwrap();
        assert_eq!(body["status"], serde_json::json!(404));
        assert!(body["title"].is_string());
    }

    #[tokio::test]
    async fn seed_without_snapshot_dir_is_bad_request() {
        let tmp = TempDir::new().unwrap();
        let routes = snomed_routes(test_service(&tmp, false));

        let resp = warp::test::request()
            .method("POST")
            .path("/api/snomed/seed")
            .reply(&routes)
            .await;
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn seed_accepts_then_conflicts_while_running() {
        let tmp = TempDir::new().unwrap();
        let service = test_service(&tmp, true);

        // hold the run slot as a running job would
        let first = service
            .start(service.config().seed_options(), false)
            .await;
        assert!(first.is_ok());

        let routes = snomed_routes(service);
        let resp = warp::test::request()
            .method("POST")
            .path("/api/snomed/seed")
            .reply(&routes)
            .await;
        // either still running (409) or the tiny job already finished (202)
        assert!(
            resp.status() == StatusCode::CONFLICT || resp.status() == StatusCode::ACCEPTED,
            "unexpected status {}",
            resp.status()
        );
    }

    #[tokio::test]
    async fn pause_without_running_job_is_not_found() {
        let tmp = TempDir::new().unwrap();
        let routes = snomed_routes(test_service(&tmp, true));

        let resp = warp::test::request()
            .method("POST")
            .path("/api/snomed/pause")
            .reply(&routes)
            .await;
        assert_eq!(resp.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn resume_without_checkpoint_is_not_found() {
        let tmp = TempDir::new().unwrap();
        let routes = snomed_routes(test_service(&tmp, true));

        let resp = warp::test::request()
            .method("POST")
            .path("/api/snomed/resume")
            .reply(&routes)
            .await;
        assert_eq!(resp.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn delete_checkpoint_is_no_content() {
        let tmp = TempDir::new().unwrap();
        let routes = snomed_routes(test_service(&tmp, true));

        let resp = warp::test::request()
            .method("DELETE")
            .path("/api/snomed/checkpoint")
            .reply(&routes)
            .await;
        assert_eq!(resp.status(), StatusCode::NO_CONTENT);
    }

    #[tokio::test]
    async fn verify_reports_missing_root_concepts() {
        let tmp = TempDir::new().unwrap();
        let routes = snomed_routes(test_service(&tmp, true));

        let resp = warp::test::request()
            .method("GET")
            .path("/api/snomed/verify")
            .reply(&routes)
            .await;
        assert_eq!(resp.status(), StatusCode::OK);

        let body: serde_json::Value = serde_json::from_slice(resp.body()).unwrap();
        assert_eq!(body["totalConcepts"], serde_json::json!(0));
        assert_eq!(body["rootConceptPresent"], serde_json::json!(false));
        assert!(body["errors"].as_array().unwrap().len() >= 2);
    }

    #[tokio::test]
    async fn seed_honors_query_parameters() {
        let tmp = TempDir::new().unwrap();
        let service = test_service(&tmp, true);
        let routes = snomed_routes(service.clone());

        let resp = warp::test::request()
            .method("POST")
            .path("/api/snomed/seed?activeOnly=false&batchSize=50")
            .reply(&routes)
            .await;
        assert_eq!(resp.status(), StatusCode::ACCEPTED);

        let body: serde_json::Value = serde_json::from_slice(resp.body()).unwrap();
        assert!(body["jobId"].as_str().unwrap().len() == 32);
    }
}
