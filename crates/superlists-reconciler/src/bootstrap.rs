use std::time::Duration;
use superlists_core::{SuperListsError, SuperListsResult};
use superlists_dom::{query, Dom, NodeId, PageSelectors};

/// How long to wait for the page to render its board root.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    pub attempts: u32,
    pub interval: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            attempts: 10,
            interval: Duration::from_millis(100),
        }
    }
}

/// Polls for the board root. Dropping the future cancels the wait.
pub async fn wait_for_board_root(
    dom: &dyn Dom,
    sel: &PageSelectors,
    policy: &RetryPolicy,
) -> SuperListsResult<NodeId> {
    for attempt in 1..=policy.attempts {
        if let Some(root) = query::board_root(dom, sel) {
            if attempt > 1 {
                tracing::debug!(attempt, "Board root found");
            }
            return Ok(root);
        }
        if attempt < policy.attempts {
            tokio::time::sleep(policy.interval).await;
        }
    }
    tracing::error!(
        attempts = policy.attempts,
        "Board root did not appear; board not set up"
    );
    Err(SuperListsError::not_found(format!(
        "board root after {} attempts",
        policy.attempts
    )))
}

#[cfg(test)]
mod tests {
    use super::*;
    use superlists_dom::{BoardFixture, ListFixture, MemoryDocument};

    #[tokio::test]
    async fn test_finds_rendered_board() {
        let sel = PageSelectors::default();
        let mut doc = MemoryDocument::new("about:blank");
        let built = BoardFixture::new("b1")
            .list(ListFixture::new("Todo"))
            .build(&mut doc, &sel)
            .unwrap();
        let root = wait_for_board_root(&doc, &sel, &RetryPolicy::default())
            .await
            .unwrap();
        assert_eq!(root, built.board);
    }

    #[tokio::test(start_paused = true)]
    async fn test_gives_up_after_attempts() {
        let doc = MemoryDocument::new("https://trello.com/");
        let policy = RetryPolicy {
            attempts: 3,
            interval: Duration::from_millis(100),
        };
        let started = tokio::time::Instant::now();
        let result = wait_for_board_root(&doc, &PageSelectors::default(), &policy).await;
        assert!(matches!(result, Err(SuperListsError::NotFound(_))));
        assert!(started.elapsed() >= Duration::from_millis(200));
    }
}
