//! Task submission: creates the repository row (if new) and a task row,
//! enforcing the at-most-one-active-task-per-repo invariant before either
//! hits the job queue.

use std::sync::Arc;

use repowiki_domain::entities::{Repository, TaskType};
use repowiki_domain::error::{Error, Result};
use repowiki_domain::ports::{JobQueue, JobStateMachine, RepoRepository};
use repowiki_domain::value_objects::{JobId, RepositoryId};

pub struct TaskSubmissionService {
    repos: Arc<dyn RepoRepository>,
    job_state: Arc<dyn JobStateMachine>,
    job_queue: Arc<dyn JobQueue>,
}

impl TaskSubmissionService {
    #[must_use]
    pub fn new(
        repos: Arc<dyn RepoRepository>,
        job_state: Arc<dyn JobStateMachine>,
        job_queue: Arc<dyn JobQueue>,
    ) -> Self {
        Self {
            repos,
            job_state,
            job_queue,
        }
    }

    /// Submit a `full_process` task for a repository URL, creating the
    /// repository row on first submission. Rejects with `Error::Conflict`
    /// (carrying the offending task id) if a non-terminal task already
    /// exists for this repo.
    pub async fn submit_repo(&self, canonical_url: &str, display_name: &str) -> Result<JobId> {
        let repo = match self.repos.get_by_url(canonical_url).await? {
            Some(existing) => existing,
            None => {
                let repo = Repository::new(canonical_url, display_name);
                self.repos.insert(&repo).await?;
                repo
            }
        };

        self.submit(repo.id, TaskType::FullProcess).await
    }

    /// Submit a task of any type against an existing repository, enforcing
    /// the active-task conflict check.
    pub async fn submit(&self, repo_id: RepositoryId, task_type: TaskType) -> Result<JobId> {
        if let Some(active) = self.job_state.active_task_for_repo(&repo_id).await? {
            return Err(Error::conflict(active.id.to_string()));
        }

        let task_id = self.job_state.create(repo_id, task_type).await?;
        self.job_queue.enqueue(task_id).await?;
        Ok(task_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use repowiki_domain::entities::Task;
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
        async fn get_by_url(&self, url: &str) -> Result<Option<Repository>> {
            Ok(self.0.lock().unwrap().iter().find(|r| r.canonical_url == url).cloned())
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
        async fn cancel(&self, _task_id: &JobId) -> Result<()> {
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

    #[tokio::test]
    async fn second_submission_conflicts_with_active_task() {
        let repos = Arc::new(FakeRepos(Mutex::new(Vec::new())));
        let job_state = Arc::new(FakeJobState(Mutex::new(None)));
        let queue = Arc::new(FakeQueue(Mutex::new(Vec::new())));
        let svc = TaskSubmissionService::new(repos, job_state, queue);

        let first = svc.submit_repo("https://github.com/owner/repo", "repo").await;
        assert!(first.is_ok());

        let second = svc.submit_repo("https://github.com/owner/repo", "repo").await;
        match second {
            Err(Error::Conflict { existing_task_id }) => {
                assert_eq!(existing_task_id, first.unwrap().to_string());
            }
            other => panic!("expected conflict, got {other:?}"),
        }
    }
}
