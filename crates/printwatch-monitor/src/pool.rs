//! 동시 실행 상한이 있는 작업 풀.
//!
//! 대상마다 태스크를 하나씩 띄우되 세마포어로 동시 실행 수를 제한한다.
//! 풀 실행 future를 drop하면 `JoinSet`이 진행 중인 태스크를 모두 abort한다.

use std::future::Future;
use std::sync::Arc;
use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use tracing::warn;

/// 동시 실행 상한
#[derive(Debug, Clone, Copy)]
pub struct WorkerPool {
    limit: usize,
}

impl WorkerPool {
    /// 상한은 최소 1
    pub fn new(limit: usize) -> Self {
        Self {
            limit: limit.max(1),
        }
    }

    pub fn limit(&self) -> usize {
        self.limit
    }

    /// 모든 항목에 작업을 실행하고 입력 순서대로 결과를 돌려준다.
    ///
    /// 패닉한 작업의 자리는 None.
    pub async fn run<T, R, F, Fut>(&self, items: Vec<T>, task: F) -> Vec<Option<R>>
    where
        T: Send + 'static,
        R: Send + 'static,
        F: Fn(T) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = R> + Send + 'static,
    {
        let semaphore = Arc::new(Semaphore::new(self.limit));
        let task = Arc::new(task);
        let mut results: Vec<Option<R>> = Vec::with_capacity(items.len());
        results.resize_with(items.len(), || None);

        let mut set = JoinSet::new();
        for (idx, item) in items.into_iter().enumerate() {
            let semaphore = Arc::clone(&semaphore);
            let task = Arc::clone(&task);
            set.spawn(async move {
                // 세마포어는 닫지 않으므로 acquire는 실패하지 않는다
                let _permit = semaphore.acquire_owned().await.ok();
                (idx, task(item).await)
            });
        }

        while let Some(joined) = set.join_next().await {
            match joined {
                Ok((idx, value)) => results[idx] = Some(value),
                Err(e) => warn!("작업 태스크 실패: {e}"),
            }
        }

        results
    }
}
