use std::sync::Arc;
use std::time::Duration;

use ::common::{PollVerdict, SubmissionStatus};
use imislab::cache::MemoryCache;
use imislab::config::PollConfig;
use imislab::error::AppError;
use imislab::judge::JudgeError;
use imislab::pipeline::PollExit;
use imislab::rate_limit::SubmitRateLimiter;
use tokio::time::Instant;

use crate::common::*;

mod submit {
    use super::*;

    #[tokio::test(start_paused = true)]
    async fn accepted_verdict_stores_measurements() {
        let store = seeded_store();
        let judge = ScriptedJudge::with_script([running(), accepted("0.012", 1024)]);
        let pipeline = pipeline(&store, &judge, PollConfig::default());

        let code = "print(sum(map(int, input().split())))";
        let receipt = pipeline.submit(1, code, "Python").await.unwrap();
        assert_eq!(receipt.view.status, SubmissionStatus::InQueue);
        assert!(!receipt.view.is_completed);
        assert_eq!(receipt.view.judge_token.as_deref(), Some(receipt.token.as_str()));

        let exit = receipt.poll.await.unwrap();
        assert_eq!(
            exit,
            PollExit::Finished {
                status: SubmissionStatus::Accepted,
                recorded: true
            }
        );

        let view = pipeline.get_status(&receipt.token).await.unwrap();
        assert_eq!(view.status, SubmissionStatus::Accepted);
        assert!(view.is_completed);
        assert_eq!(view.execute_time, Some(12));
        assert_eq!(view.memory_usage, Some(1024));
        assert_eq!(judge.poll_count(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn judge_request_carries_testcase_and_limits() {
        let store = seeded_store();
        store.add_testcase(1, "5 5", "10");
        let judge = ScriptedJudge::with_script([accepted("0.001", 1)]);
        let pipeline = pipeline(&store, &judge, PollConfig::default());

        pipeline.submit(1, "package main", "Go").await.unwrap();

        let sent = judge.submitted();
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].source_code, "package main");
        assert_eq!(sent[0].language_id, 60);
        assert_eq!(sent[0].stdin, "1 2");
        assert_eq!(sent[0].expected_output, "3");
        assert_eq!(sent[0].cpu_time_limit, 1.0);
        assert_eq!(sent[0].memory_limit, 240_000);
    }

    #[tokio::test]
    async fn missing_problem_is_not_found() {
        let store = seeded_store();
        let judge = ScriptedJudge::new();
        let pipeline = pipeline(&store, &judge, PollConfig::default());

        let err = pipeline.submit(42, "x", "Java").await.unwrap_err();
        assert!(matches!(err, AppError::NotFound(_)));
        assert!(store.submissions().is_empty());
        assert!(judge.submitted().is_empty());
    }

    #[tokio::test]
    async fn problem_without_testcases_is_rejected() {
        let store = MemoryStore::new();
        store.add_problem(2);
        let judge = ScriptedJudge::new();
        let pipeline = pipeline(&store, &judge, PollConfig::default());

        let err = pipeline.submit(2, "x", "Java").await.unwrap_err();
        assert!(matches!(err, AppError::NoTestcases(2)));
        assert!(store.submissions().is_empty());
    }

    #[tokio::test]
    async fn unmapped_language_is_rejected() {
        let store = seeded_store();
        let judge = ScriptedJudge::new();
        let pipeline = pipeline(&store, &judge, PollConfig::default());

        let err = pipeline.submit(1, "fn main() {}", "Rust").await.unwrap_err();
        assert!(matches!(err, AppError::UnsupportedLanguage(ref tag) if tag == "Rust"));
        assert!(store.submissions().is_empty());
    }

    #[tokio::test]
    async fn judge_failure_leaves_submission_pending_without_token() {
        let store = seeded_store();
        let judge = ScriptedJudge::new();
        judge.fail_next_submit(JudgeError::Unavailable("connection refused".into()));
        let pipeline = pipeline(&store, &judge, PollConfig::default());

        let err = pipeline.submit(1, "int main() {}", "C++").await.unwrap_err();
        assert!(matches!(err, AppError::JudgeUnavailable(_)));

        let stored = store.submissions();
        assert_eq!(stored.len(), 1);
        assert_eq!(stored[0].status, SubmissionStatus::Pending);
        assert!(stored[0].judge_token.is_none());
        assert_eq!(pipeline.scheduler().active(), 0);
    }

    #[tokio::test]
    async fn judge_protocol_error_surfaces() {
        let store = seeded_store();
        let judge = ScriptedJudge::new();
        judge.fail_next_submit(JudgeError::Protocol("Judge returned no token".into()));
        let pipeline = pipeline(&store, &judge, PollConfig::default());

        let err = pipeline.submit(1, "x", "Go").await.unwrap_err();
        assert!(matches!(err, AppError::JudgeProtocol(_)));
        assert_eq!(store.submissions()[0].status, SubmissionStatus::Pending);
    }
}

mod polling {
    use super::*;

    #[tokio::test(start_paused = true)]
    async fn failure_verdict_stops_immediately() {
        let store = seeded_store();
        let judge = ScriptedJudge::with_script([running(), wrong_answer(), accepted("0.1", 1)]);
        let pipeline = pipeline(&store, &judge, PollConfig::default());

        let receipt = pipeline.submit(1, "x", "Python").await.unwrap();
        let exit = receipt.poll.await.unwrap();

        assert!(matches!(
            exit,
            PollExit::Finished {
                status: SubmissionStatus::WrongAnswer,
                ..
            }
        ));
        assert_eq!(judge.poll_count(), 2);

        let view = pipeline.get_status(&receipt.token).await.unwrap();
        assert_eq!(view.status, SubmissionStatus::WrongAnswer);
        assert_eq!(view.execute_time, None);
        assert_eq!(view.memory_usage, None);
    }

    #[tokio::test(start_paused = true)]
    async fn unusable_response_counts_as_failure() {
        let store = seeded_store();
        let judge = ScriptedJudge::with_script([Reply::Garbage]);
        let pipeline = pipeline(&store, &judge, PollConfig::default());

        let receipt = pipeline.submit(1, "x", "Python").await.unwrap();
        receipt.poll.await.unwrap();

        let view = pipeline.get_status(&receipt.token).await.unwrap();
        assert_eq!(view.status, SubmissionStatus::WrongAnswer);
    }

    #[tokio::test(start_paused = true)]
    async fn transient_errors_consume_attempts_without_writing() {
        let store = seeded_store();
        let judge = ScriptedJudge::with_script([
            Reply::Unavailable,
            Reply::Unavailable,
            accepted("0.029", 2048),
        ]);
        let pipeline = pipeline(&store, &judge, poll_config(3, 1000));

        let receipt = pipeline.submit(1, "x", "Java").await.unwrap();
        let exit = receipt.poll.await.unwrap();

        assert!(matches!(
            exit,
            PollExit::Finished {
                status: SubmissionStatus::Accepted,
                recorded: true
            }
        ));
        assert_eq!(judge.poll_count(), 3);
        let view = pipeline.get_status(&receipt.token).await.unwrap();
        assert_eq!(view.execute_time, Some(29));
    }

    #[tokio::test(start_paused = true)]
    async fn exhausted_attempts_time_out_after_full_budget() {
        let store = seeded_store();
        let judge = ScriptedJudge::with_script([Reply::Unavailable]);
        let pipeline = pipeline(&store, &judge, poll_config(3, 1000));

        let started = Instant::now();
        let receipt = pipeline.submit(1, "x", "Go").await.unwrap();
        let exit = receipt.poll.await.unwrap();
        let elapsed = started.elapsed();

        assert!(matches!(
            exit,
            PollExit::Finished {
                status: SubmissionStatus::Timeout,
                recorded: true
            }
        ));
        assert_eq!(judge.poll_count(), 3);
        assert!(elapsed >= Duration::from_secs(3), "elapsed {elapsed:?}");
        assert!(elapsed < Duration::from_secs(4), "elapsed {elapsed:?}");

        let view = pipeline.get_status(&receipt.token).await.unwrap();
        assert_eq!(view.status, SubmissionStatus::Timeout);
        assert!(view.is_completed);
    }

    #[tokio::test(start_paused = true)]
    async fn terminal_status_is_never_overwritten() {
        let store = seeded_store();
        let judge = ScriptedJudge::with_script([wrong_answer(), accepted("0.001", 1)]);
        let pipeline = pipeline(&store, &judge, PollConfig::default());

        let receipt = pipeline.submit(1, "x", "Go").await.unwrap();
        receipt.poll.await.unwrap();

        let again = pipeline
            .scheduler()
            .schedule(receipt.submission_id, &receipt.token)
            .unwrap();
        assert_eq!(
            again.await.unwrap(),
            PollExit::Finished {
                status: SubmissionStatus::Accepted,
                recorded: false
            }
        );

        let view = pipeline.get_status(&receipt.token).await.unwrap();
        assert_eq!(view.status, SubmissionStatus::WrongAnswer);
    }

    #[tokio::test]
    async fn poll_once_buckets_replies() {
        let store = seeded_store();
        let judge = ScriptedJudge::with_script([
            accepted("0.012", 1024),
            running(),
            Reply::Garbage,
            Reply::Unavailable,
        ]);
        let pipeline = pipeline(&store, &judge, PollConfig::default());

        assert_eq!(
            pipeline.poll_once("t").await.unwrap(),
            PollVerdict::Accepted {
                time_ms: Some(12),
                memory_kb: Some(1024)
            }
        );
        assert_eq!(pipeline.poll_once("t").await.unwrap(), PollVerdict::Running);
        assert!(matches!(
            pipeline.poll_once("t").await.unwrap(),
            PollVerdict::Failed {
                status_id: None,
                ..
            }
        ));
        assert!(pipeline.poll_once("t").await.unwrap_err().is_transient());
    }
}

mod scheduling {
    use super::*;

    #[tokio::test(start_paused = true)]
    async fn second_loop_for_same_token_is_refused() {
        let store = seeded_store();
        let judge = ScriptedJudge::new();
        let pipeline = pipeline(&store, &judge, PollConfig::default());

        let receipt = pipeline.submit(1, "x", "Go").await.unwrap();
        assert!(pipeline.scheduler().is_polling(&receipt.token));
        assert!(
            pipeline
                .scheduler()
                .schedule(receipt.submission_id, &receipt.token)
                .is_none()
        );
        assert_eq!(pipeline.scheduler().active(), 1);

        pipeline.cancel_poll(&receipt.token);
        receipt.poll.await.unwrap();
    }

    #[tokio::test(start_paused = true)]
    async fn cancelled_poll_writes_nothing() {
        let store = seeded_store();
        let judge = ScriptedJudge::new();
        let pipeline = pipeline(&store, &judge, PollConfig::default());

        let receipt = pipeline.submit(1, "x", "Go").await.unwrap();
        assert!(pipeline.cancel_poll(&receipt.token));

        assert_eq!(receipt.poll.await.unwrap(), PollExit::Cancelled);
        assert!(!pipeline.scheduler().is_polling(&receipt.token));
        assert!(!pipeline.cancel_poll(&receipt.token));

        let view = pipeline.get_status(&receipt.token).await.unwrap();
        assert_eq!(view.status, SubmissionStatus::InQueue);
    }

    #[tokio::test(start_paused = true)]
    async fn concurrent_loops_are_capped() {
        let store = seeded_store();
        let judge = ScriptedJudge::new();
        let poll = PollConfig {
            max_attempts: 2,
            interval_ms: 1000,
            max_concurrent: 1,
        };
        let pipeline = pipeline(&store, &judge, poll);

        let first = pipeline.submit(1, "a", "Go").await.unwrap();
        let second = pipeline.submit(1, "b", "Go").await.unwrap();
        assert_eq!(pipeline.scheduler().active(), 2);

        first.poll.await.unwrap();
        second.poll.await.unwrap();

        assert_eq!(
            judge.polled(),
            vec![
                first.token.clone(),
                first.token.clone(),
                second.token.clone(),
                second.token.clone()
            ]
        );
        assert_eq!(pipeline.scheduler().active(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn shutdown_cancels_and_refuses_new_loops() {
        let store = seeded_store();
        let judge = ScriptedJudge::new();
        let pipeline = pipeline(&store, &judge, PollConfig::default());

        let receipt = pipeline.submit(1, "x", "Go").await.unwrap();
        pipeline.shutdown();

        assert_eq!(receipt.poll.await.unwrap(), PollExit::Cancelled);
        assert!(pipeline.scheduler().schedule(99, "late").is_none());
    }

    #[tokio::test]
    async fn submit_after_shutdown_is_refused() {
        let store = seeded_store();
        let judge = ScriptedJudge::new();
        let pipeline = pipeline(&store, &judge, PollConfig::default());

        pipeline.shutdown();

        let err = pipeline.submit(1, "x", "Go").await.unwrap_err();
        assert!(matches!(err, AppError::ShuttingDown));
        assert!(store.submissions().is_empty());
        assert!(judge.submitted().is_empty());
        assert_eq!(pipeline.scheduler().active(), 0);
    }
}

mod store_failures {
    use super::*;

    #[tokio::test(start_paused = true)]
    async fn status_read_failure_does_not_break_submit() {
        let store = seeded_store();
        store.fail_token_reads(true);
        let judge = ScriptedJudge::with_script([accepted("0.012", 1024)]);
        let pipeline = pipeline(&store, &judge, PollConfig::default());

        let receipt = pipeline.submit(1, "x", "Python").await.unwrap();
        assert_eq!(receipt.view.status, SubmissionStatus::InQueue);
        assert_eq!(receipt.view.judge_token.as_deref(), Some(receipt.token.as_str()));
        assert!(matches!(
            pipeline.get_status(&receipt.token).await.unwrap_err(),
            AppError::Store(_)
        ));

        assert_eq!(
            receipt.poll.await.unwrap(),
            PollExit::Finished {
                status: SubmissionStatus::Accepted,
                recorded: true
            }
        );

        store.fail_token_reads(false);
        let view = pipeline.get_status(&receipt.token).await.unwrap();
        assert_eq!(view.status, SubmissionStatus::Accepted);
        assert_eq!(view.execute_time, Some(12));
    }

    #[tokio::test(start_paused = true)]
    async fn outcome_write_failure_leaves_submission_queued() {
        let store = seeded_store();
        store.fail_outcome_writes(true);
        let judge =
            ScriptedJudge::with_script([accepted("0.012", 1024), accepted("0.012", 1024)]);
        let pipeline = pipeline(&store, &judge, PollConfig::default());

        let receipt = pipeline.submit(1, "x", "Python").await.unwrap();
        assert_eq!(
            receipt.poll.await.unwrap(),
            PollExit::Finished {
                status: SubmissionStatus::Accepted,
                recorded: false
            }
        );
        assert!(!pipeline.scheduler().is_polling(&receipt.token));

        let stored = store.submission(receipt.submission_id).unwrap();
        assert_eq!(stored.status, SubmissionStatus::InQueue);
        assert_eq!(stored.judge_token.as_deref(), Some(receipt.token.as_str()));
        assert_eq!(stored.execute_time, None);
        assert_eq!(stored.memory_usage, None);

        // The token can be picked up again once the store recovers.
        store.fail_outcome_writes(false);
        let again = pipeline
            .scheduler()
            .schedule(receipt.submission_id, &receipt.token)
            .unwrap();
        assert_eq!(
            again.await.unwrap(),
            PollExit::Finished {
                status: SubmissionStatus::Accepted,
                recorded: true
            }
        );
        let view = pipeline.get_status(&receipt.token).await.unwrap();
        assert_eq!(view.status, SubmissionStatus::Accepted);
        assert_eq!(view.memory_usage, Some(1024));
    }

    #[tokio::test]
    async fn queue_mark_failure_keeps_submission_pending_without_loop() {
        let store = seeded_store();
        store.fail_queue_marks(true);
        let judge = ScriptedJudge::new();
        let pipeline = pipeline(&store, &judge, PollConfig::default());

        let err = pipeline.submit(1, "x", "Go").await.unwrap_err();
        assert!(matches!(err, AppError::Store(_)));

        let stored = store.submissions();
        assert_eq!(stored.len(), 1);
        assert_eq!(stored[0].status, SubmissionStatus::Pending);
        assert!(stored[0].judge_token.is_none());
        assert_eq!(pipeline.scheduler().active(), 0);
    }
}

mod status {
    use super::*;

    #[tokio::test]
    async fn unknown_token_is_not_found() {
        let store = seeded_store();
        let judge = ScriptedJudge::new();
        let pipeline = pipeline(&store, &judge, PollConfig::default());

        let err = pipeline.get_status("nope").await.unwrap_err();
        assert!(matches!(err, AppError::NotFound(_)));
    }

    #[tokio::test(start_paused = true)]
    async fn repeated_reads_are_identical() {
        let store = seeded_store();
        let judge = ScriptedJudge::with_script([accepted("0.5", 300)]);
        let pipeline = pipeline(&store, &judge, PollConfig::default());

        let receipt = pipeline.submit(1, "x", "Python").await.unwrap();
        receipt.poll.await.unwrap();

        let first = pipeline.get_status(&receipt.token).await.unwrap();
        let second = pipeline.get_status(&receipt.token).await.unwrap();
        assert_eq!(first, second);
        assert_eq!(first.code, "x");
        assert_eq!(first.problem_id, 1);
    }
}

mod rate_limiting {
    use super::*;

    #[tokio::test(start_paused = true)]
    async fn client_over_limit_is_refused() {
        let store = seeded_store();
        let judge = ScriptedJudge::new();
        let pipeline = pipeline(&store, &judge, PollConfig::default())
            .with_rate_limiter(SubmitRateLimiter::new(Arc::new(MemoryCache::new()), 2));

        pipeline.submit_as("10.0.0.1", 1, "a", "Go").await.unwrap();
        pipeline.submit_as("10.0.0.1", 1, "b", "Go").await.unwrap();
        let err = pipeline.submit_as("10.0.0.1", 1, "c", "Go").await.unwrap_err();
        assert!(matches!(err, AppError::RateLimited { retry_after: 60 }));
        assert_eq!(store.submissions().len(), 2);

        pipeline.submit_as("10.0.0.2", 1, "d", "Go").await.unwrap();
        pipeline.shutdown();
    }

    #[tokio::test(start_paused = true)]
    async fn cache_failure_lets_submission_through() {
        let store = seeded_store();
        let judge = ScriptedJudge::new();
        let pipeline = pipeline(&store, &judge, PollConfig::default())
            .with_rate_limiter(SubmitRateLimiter::new(Arc::new(BrokenCache), 1));

        pipeline.submit_as("10.0.0.1", 1, "a", "Go").await.unwrap();
        pipeline.submit_as("10.0.0.1", 1, "b", "Go").await.unwrap();
        assert_eq!(store.submissions().len(), 2);
        pipeline.shutdown();
    }
}
