mod utils;
#[allow(unused)]
use utils::*;

#[cfg(feature = "integration")]
mod tests {
    use super::*;

    use ntest::timeout;
    use std::sync::Arc;
    use std::time::Duration;
    use wideload::prelude::*;
    use wideload_cli::workloads::{self, http::HttpWorkload};

    #[tokio::test]
    #[timeout(10_000)]
    async fn per_worker_rate_against_delay_endpoint() {
        init().await;

        let engine = Engine::new(
            RunConfig::new()
                .concurrency(4)
                .qps(20)
                .duration(Duration::from_secs(2))
                .seed(11),
        )
        .unwrap();
        let workload = HttpWorkload::new(&url("/delay/ms/5")).unwrap();

        let report = engine.run(Arc::new(workload)).await.unwrap();
        let stats = &report.stats;

        // 4 workers * 20/s * 2s, minus startup jitter.
        assert!(dbg!(stats.total_invocations) >= 120);
        assert!(stats.total_invocations <= 160);
        assert_eq!(stats.failure_count, 0);
        assert!(stats.average_latency_ms >= 5.);
        assert!(report.latency.p50 >= Duration::from_millis(5));
    }

    #[tokio::test]
    #[timeout(10_000)]
    async fn server_errors_are_failed_invocations() {
        init().await;

        let engine = Engine::new(
            RunConfig::new()
                .concurrency(2)
                .qps(50)
                .duration(Duration::from_secs(1))
                .max_jitter(Duration::ZERO),
        )
        .unwrap();
        let workload = HttpWorkload::new(&url("/flaky/4/name/server_errors")).unwrap();

        let report = engine.run(Arc::new(workload)).await.unwrap();
        let stats = &report.stats;

        assert!(stats.total_invocations >= 60);
        assert_eq!(stats.failure_count, stats.total_invocations / 4);
        assert_eq!(
            stats.success_count + stats.failure_count,
            stats.total_invocations
        );
    }

    #[tokio::test]
    #[timeout(10_000)]
    async fn unreachable_target_counts_every_call_as_failed() {
        init().await;

        let engine = Engine::new(RunConfig::new().concurrency(3).qps(0)).unwrap();
        let workload = HttpWorkload::new("http://127.0.0.1:9/").unwrap();

        let report = engine.run(Arc::new(workload)).await.unwrap();
        assert_eq!(report.stats.total_invocations, 3);
        assert_eq!(report.stats.failure_count, 3);
        assert_eq!(report.stop_reason, StopReason::Completed);
    }

    #[tokio::test]
    #[timeout(10_000)]
    async fn shared_rate_stays_under_server_limit() {
        init().await;

        let engine = Engine::new(
            RunConfig::new()
                .concurrency(8)
                .qps(40)
                .topology(RateTopology::Shared)
                .duration(Duration::from_secs(2)),
        )
        .unwrap();
        let workload = HttpWorkload::new(&url("/max/50/delay/ms/1/scenario/shared_rate")).unwrap();

        let report = engine.run(Arc::new(workload)).await.unwrap();
        let stats = &report.stats;

        assert!(dbg!(stats.total_invocations) >= 60);
        assert!(stats.total_invocations <= 90);
        assert!(stats.error_rate() < 0.1);
    }

    #[tokio::test]
    #[timeout(10_000)]
    async fn registry_builds_http_from_target() {
        init().await;

        let engine = Engine::new(
            RunConfig::new()
                .qps(0)
                .concurrency(2)
                .target(url("/status/503")),
        )
        .unwrap();
        let suite = workloads::registry()
            .build("http", engine.config())
            .unwrap();

        let reports = engine.run_suite(&suite).await.unwrap();
        assert_eq!(reports.len(), 1);
        assert_eq!(reports[0].stats.failure_count, 2);
    }
}
