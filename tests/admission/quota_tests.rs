// tests/admission/quota_tests.rs

#[cfg(test)]
mod tests {
    use chat_gateway::Store;
    use crate::fixtures::controller;
    use chat_gateway::AdmissionConfig;
    use std::time::Duration;

    fn hundred_units() -> AdmissionConfig {
        AdmissionConfig::new()
            .resource_per_window(100)
            .resource_window(Duration::from_secs(3600))
    }

    #[test]
    fn scenario_hundred_units() {
        let (limiter, _) = controller(hundred_units());

        limiter.report_resource_usage("alice", 60);
        assert!(limiter.check_resource_quota("alice"));

        limiter.report_resource_usage("alice", 50);
        assert!(!limiter.check_resource_quota("alice"));
        assert_eq!(limiter.store().get("alice").unwrap().resource_used, 110);
    }

    #[test]
    fn usage_is_additive_within_a_window() {
        let (limiter, clock) = controller(hundred_units());
        limiter.report_resource_usage("bob", 7);
        clock.advance_ms(1_000);
        limiter.report_resource_usage("bob", 11);
        limiter.report_resource_usage("bob", 0);
        assert_eq!(limiter.store().get("bob").unwrap().resource_used, 18);
    }

    #[test]
    fn exactly_at_limit_is_exhausted() {
        let (limiter, _) = controller(hundred_units());
        limiter.report_resource_usage("carol", 99);
        assert!(limiter.check_resource_quota("carol"));
        limiter.report_resource_usage("carol", 1);
        assert!(!limiter.check_resource_quota("carol"));
    }

    #[test]
    fn unknown_identity_has_quota_and_no_entry() {
        let (limiter, _) = controller(hundred_units());
        assert!(limiter.check_resource_quota("nobody"));
        assert!(limiter.store().is_empty());
    }

    #[test]
    fn first_report_creates_exactly_one_entry() {
        let (limiter, _) = controller(hundred_units());
        limiter.report_resource_usage("dave", 5);
        assert_eq!(limiter.store().len(), 1);
        let entry = limiter.store().get("dave").unwrap();
        assert_eq!(entry.request_count, 0);
        assert_eq!(entry.resource_used, 5);
    }

    #[test]
    fn rate_exhaustion_does_not_touch_quota() {
        let (limiter, _) = controller(
            hundred_units()
                .requests_per_window(1)
                .request_window(Duration::from_secs(60)),
        );
        assert!(limiter.check_request_rate("erin").allowed);
        assert!(!limiter.check_request_rate("erin").allowed);
        assert!(limiter.check_resource_quota("erin"));
    }

    #[test]
    fn quota_exhaustion_does_not_touch_rate() {
        let (limiter, _) = controller(hundred_units());
        limiter.report_resource_usage("frank", 1_000);
        assert!(!limiter.check_resource_quota("frank"));
        let d = limiter.check_request_rate("frank");
        assert!(d.allowed);
        assert_eq!(d.remaining, 9);
    }

    #[test]
    fn request_window_roll_keeps_usage() {
        let (limiter, clock) = controller(
            hundred_units()
                .requests_per_window(1)
                .request_window(Duration::from_secs(1)),
        );
        limiter.report_resource_usage("gina", 80);
        assert!(limiter.check_request_rate("gina").allowed);

        clock.set_ms(5_000);
        assert!(limiter.check_request_rate("gina").allowed);
        assert_eq!(limiter.store().get("gina").unwrap().resource_used, 80);
    }

    #[test]
    fn quota_returns_after_window_expires() {
        let (limiter, clock) = controller(hundred_units());
        limiter.report_resource_usage("hank", 100);
        assert!(!limiter.check_resource_quota("hank"));

        clock.set_ms(3_600_000);
        assert!(limiter.check_resource_quota("hank"));
        limiter.report_resource_usage("hank", 10);
        assert_eq!(limiter.store().get("hank").unwrap().resource_used, 10);
        assert_eq!(limiter.quota_status("hank").remaining, 90);
    }
}
