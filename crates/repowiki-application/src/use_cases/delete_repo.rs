//! Repository deletion (§4.2): signal cancellation to any in-flight task,
//! wait out the grace period, then cascade-delete DB rows, the on-disk
//! clone, and the vector-store collection.

use std::sync::Arc;

use repowiki_domain::constants::DELETE_GRACE_PERIOD;
use repowiki_domain::error::{Error, Result};
use repowiki_domain::ports::{CancellationRegistry, JobQueue, JobStateMachine, RepoRepository, VectorStoreProvider};
use repowiki_domain::value_objects::RepositoryId;
use tracing::{info, warn};

pub struct DeleteRepoService {
    repos: Arc<dyn RepoRepository>,
    job_state: Arc<dyn JobStateMachine>,
    job_queue: Arc<dyn JobQueue>,
    cancellation: Arc<dyn CancellationRegistry>,
    vector_store: Arc<dyn VectorStoreProvider>,
}

impl DeleteRepoService {
    #[must_use]
    pub fn new(
        repos: Arc<dyn RepoRepository>,
        job_state: Arc<dyn JobStateMachine>,
        job_queue: Arc<dyn JobQueue>,
        cancellation: Arc<dyn CancellationRegistry>,
        vector_store: Arc<dyn VectorStoreProvider>,
    ) -> Self {
        Self {
            repos,
            job_state,
            job_queue,
            cancellation,
            vector_store,
        }
    }

    /// Delete a repository and every derived artifact. If a task is
    /// in-flight, sets its cancel flag and best-effort revokes/cancels it,
    /// then waits `DELETE_GRACE_PERIOD` before touching anything the worker
    /// might still be writing to.
    pub async fn delete(&self, repo_id: RepositoryId) -> Result<()> {
        let repo = self
            .repos
            .get(&repo_id)
            .await?
            .ok_or_else(|| Error::not_found(format!("repository {repo_id}")))?;

        if let Some(active) = self.job_state.active_task_for_repo(&repo_id).await? {
            self.cancellation.set(&active.id).await?;

            if let Err(e) = self.job_queue.revoke(active.id).await {
                warn!(task_id = %active.id, error = %e, "best-effort queue revoke failed during repo deletion");
            }
            if let Err(e) = self.job_state.cancel(&active.id).await {
                warn!(task_id = %active.id, error = %e, "best-effort task cancel failed during repo deletion");
            }

            tokio::time::sleep(DELETE_GRACE_PERIOD).await;
            self.cancellation.clear(&active.id).await.ok();
        }

        if let Some(clone_path) = repo.local_clone_path.as_ref() {
            match std::fs::remove_dir_all(clone_path) {
                Ok(()) => info!(repo_id = %repo_id, path = %clone_path, "removed clone directory"),
                Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
                Err(e) => warn!(repo_id = %repo_id, path = %clone_path, error = %e, "failed to remove clone directory"),
            }
        }

        let collection = format!("repo_{}_chunks", repo_id.to_string().replace('-', "_"));
        if let Err(e) = self.vector_store.delete_collection(&collection).await {
            warn!(repo_id = %repo_id, collection = %collection, error = %e, "failed to delete vector-store collection");
        }

        self.repos.delete(&repo_id).await?;
        info!(repo_id = %repo_id, "repository deleted");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use repowiki_domain::entities::{Repository, Task, TaskType};
    use repowiki_domain::value_objects::JobId;
    use std::sync::Mutex;

    struct FakeRepos(Mutex<Vec<Repository>>);
    #[async_trait]
    impl RepoRepository for FakeRepos {
        async fn insert(&self, repo: &Repository) -> Result<()> {
            self.0.lock().unwrap().push(repo.clone());
            Ok(())
        }
        async fn get(&self, id: &RepositoryId) -> Result<Option<Repository>> {
            Ok(self.0.lock().unwrap().iter().find(|r| r.id == *id).cloned())
        }
        async fn get_by_url(&self, _url: &str) -> Result<Option<Repository>> {
            Ok(None)
        }
        async fn list(&self) -> Result<Vec<Repository>> {
            Ok(self.0.lock().unwrap().clone())
        }
        async fn update(&self, repo: &Repository) -> Result<()> {
            let mut guard = self.0.lock().unwrap();
            if let Some(slot) = guard.iter_mut().find(|r| r.id == repo.id) {
                *slot = repo.clone();
            }
            Ok(())
        }
        async fn delete(&self, id: &RepositoryId) -> Result<()> {
            self.0.lock().unwrap().retain(|r| r.id != *id);
            Ok(())
        }
    }

    struct FakeJobState(Mutex<Option<Task>>);
    #[async_trait]
    impl JobStateMachine for FakeJobState {
        async fn create(&self, repo_id: RepositoryId, task_type: TaskType) -> Result<JobId> {
            let task = Task::new(repo_id, task_type);
            let id = task.id;
            *self.0.lock().unwrap() = Some(task);
            Ok(id)
        }
        async fn set_stage(
            &self,
            _task_id: &JobId,
            _stage: repowiki_domain::entities::Stage,
            _progress_pct: f32,
            _label: &str,
        ) -> Result<()> {
            Ok(())
        }
        async fn fail(&self, _task_id: &JobId, _stage: repowiki_domain::entities::Stage, _message: &str) -> Result<()> {
            Ok(())
        }
        async fn complete(&self, _task_id: &JobId) -> Result<()> {
            Ok(())
        }
        async fn cancel(&self, task_id: &JobId) -> Result<()> {
            if let Some(task) = self.0.lock().unwrap().as_mut() {
                if task.id == *task_id {
                    task.status = repowiki_domain::entities::TaskStatus::Cancelled;
                }
            }
            Ok(())
        }
        async fn reset_to_pending(&self, _task_id: &JobId) -> Result<()> {
            Ok(())
        }
        async fn get(&self, task_id: &JobId) -> Result<Option<Task>> {
            Ok(self.0.lock().unwrap().clone().filter(|t| t.id == *task_id))
        }
        async fn mark_interrupted_if_non_terminal(&self) -> Result<usize> {
            Ok(0)
        }
        async fn active_task_for_repo(&self, repo_id: &RepositoryId) -> Result<Option<Task>> {
            Ok(self
                .0
                .lock()
                .unwrap()
                .clone()
                .filter(|t| t.repo_id == *repo_id && !t.status.is_terminal()))
        }
    }

    struct FakeQueue(Mutex<Vec<JobId>>);
    #[async_trait]
    impl JobQueue for FakeQueue {
        async fn enqueue(&self, task_id: JobId) -> Result<()> {
            self.0.lock().unwrap().push(task_id);
            Ok(())
        }
        async fn dequeue(&self) -> Result<Option<JobId>> {
            Ok(self.0.lock().unwrap().pop())
        }
        async fn revoke(&self, task_id: JobId) -> Result<()> {
            self.0.lock().unwrap().retain(|id| *id != task_id);
            Ok(())
        }
    }

    struct FakeCancellation(Mutex<std::collections::HashSet<JobId>>);
    #[async_trait]
    impl CancellationRegistry for FakeCancellation {
        async fn set(&self, task_id: &JobId) -> Result<()> {
            self.0.lock().unwrap().insert(*task_id);
            Ok(())
        }
        async fn get(&self, task_id: &JobId) -> Result<bool> {
            Ok(self.0.lock().unwrap().contains(task_id))
        }
        async fn clear(&self, task_id: &JobId) -> Result<()> {
            self.0.lock().unwrap().remove(task_id);
            Ok(())
        }
    }

    struct FakeVectorStore;
    #[async_trait]
    impl VectorStoreProvider for FakeVectorStore {
        async fn ensure_collection(&self, _name: &str, _dimensions: usize) -> Result<()> {
            Ok(())
        }
        async fn delete_collection(&self, _name: &str) -> Result<()> {
            Ok(())
        }
        async fn list_collections(&self) -> Result<Vec<String>> {
            Ok(Vec::new())
        }
        async fn upsert(
            &self,
            _collection: &str,
            _points: Vec<repowiki_domain::ports::VectorPoint>,
        ) -> Result<()> {
            Ok(())
        }
        async fn delete_points(&self, _collection: &str, _ids: &[String]) -> Result<()> {
            Ok(())
        }
        async fn query(
            &self,
            _collection: &str,
            _vector: &[f32],
            _limit: usize,
            _filter: Option<serde_json::Value>,
        ) -> Result<Vec<repowiki_domain::ports::VectorMatch>> {
            Ok(Vec::new())
        }
        async fn get_points(
            &self,
            _collection: &str,
            _ids: &[String],
        ) -> Result<Vec<repowiki_domain::ports::VectorMatch>> {
            Ok(Vec::new())
        }
    }

    #[tokio::test]
    async fn delete_removes_repo_row_when_no_active_task() {
        let repo = Repository::new("https://github.com/owner/repo", "repo");
        let repo_id = repo.id;
        let repos = Arc::new(FakeRepos(Mutex::new(vec![repo])));
        let job_state = Arc::new(FakeJobState(Mutex::new(None)));
        let queue = Arc::new(FakeQueue(Mutex::new(Vec::new())));
        let cancellation = Arc::new(FakeCancellation(Mutex::new(std::collections::HashSet::new())));
        let vector_store = Arc::new(FakeVectorStore);

        let svc = DeleteRepoService::new(repos.clone(), job_state, queue, cancellation, vector_store);
        svc.delete(repo_id).await.unwrap();

        assert!(repos.0.lock().unwrap().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn delete_sets_cancel_flag_for_active_task() {
        let repo = Repository::new("https://github.com/owner/repo", "repo");
        let repo_id = repo.id;
        let task = Task::new(repo_id, TaskType::FullProcess);
        let task_id = task.id;
        let repos = Arc::new(FakeRepos(Mutex::new(vec![repo])));
        let job_state = Arc::new(FakeJobState(Mutex::new(Some(task))));
        let queue = Arc::new(FakeQueue(Mutex::new(vec![task_id])));
        let cancellation = Arc::new(FakeCancellation(Mutex::new(std::collections::HashSet::new())));
        let vector_store = Arc::new(FakeVectorStore);

        let svc = DeleteRepoService::new(
            repos,
            job_state,
            queue.clone(),
            Arc::clone(&cancellation),
            vector_store,
        );
        svc.delete(repo_id).await.unwrap();

        assert!(queue.0.lock().unwrap().is_empty());
        assert!(!cancellation.0.lock().unwrap().contains(&task_id));
    }
}
