// tests/admission/reclaimer_tests.rs

#[cfg(test)]
mod tests {
    use chat_gateway::Store;
    use crate::fixtures::controller;
    use chat_gateway::AdmissionConfig;
    use std::time::Duration;

    fn short_windows() -> AdmissionConfig {
        AdmissionConfig::new()
            .request_window(Duration::from_secs(1))
            .resource_window(Duration::from_secs(10))
            .reclaim_interval(Duration::from_secs(1))
    }

    #[test]
    fn sweep_removes_only_the_fully_expired_identity() {
        let (limiter, clock) = controller(short_windows());

        // "old" starts at t=0: both windows gone by t=10s
        limiter.check_request_rate("old");

        // "busy" starts at t=5s: request window gone at t=6s, quota at t=15s
        clock.set_ms(5_000);
        limiter.report_resource_usage("busy", 3);

        clock.set_ms(10_000);
        let reclaimer = limiter.reclaimer();
        assert_eq!(reclaimer.sweep(), 1);
        assert!(limiter.store().get("old").is_none());
        assert!(limiter.store().get("busy").is_some());

        clock.set_ms(15_000);
        assert_eq!(reclaimer.sweep(), 1);
        assert!(limiter.store().is_empty());
    }

    #[test]
    fn renewed_request_window_delays_eviction() {
        let (limiter, clock) = controller(short_windows());
        limiter.check_request_rate("alice");

        // renews only the request window; the quota window (t=10s) still governs
        clock.set_ms(9_500);
        limiter.check_request_rate("alice");

        clock.set_ms(10_000);
        assert_eq!(limiter.reclaimer().sweep(), 0);

        clock.set_ms(10_500);
        assert_eq!(limiter.reclaimer().sweep(), 1);
    }

    #[test]
    fn evicted_identity_starts_fresh() {
        let (limiter, clock) = controller(short_windows().requests_per_window(1));
        assert!(limiter.check_request_rate("bob").allowed);
        limiter.report_resource_usage("bob", 50);

        clock.set_ms(20_000);
        assert_eq!(limiter.reclaimer().sweep(), 1);

        let d = limiter.check_request_rate("bob");
        assert!(d.allowed);
        assert_eq!(limiter.store().get("bob").unwrap().resource_used, 0);
    }

    #[tokio::test]
    async fn background_reclaimer_runs_until_shutdown() {
        let (limiter, clock) = controller(short_windows());
        limiter.check_request_rate("idle");
        clock.set_ms(60_000);

        let handle = limiter.reclaimer().spawn(Duration::from_millis(25)).unwrap();
        for _ in 0..100 {
            if limiter.store().is_empty() {
                break;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
        assert!(limiter.store().is_empty());
        assert!(!handle.is_finished());

        handle.shutdown().await;
    }
}
