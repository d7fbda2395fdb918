// tests/admission/concurrency_tests.rs

#[cfg(test)]
mod tests {
    use chat_gateway::Store;
    use crate::fixtures::controller;
    use chat_gateway::AdmissionConfig;
    use std::sync::Arc;
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::thread;
    use std::time::Duration;

    #[test]
    fn concurrent_checks_never_exceed_the_limit() {
        let limit = 50;
        let (limiter, _) = controller(
            AdmissionConfig::new()
                .requests_per_window(limit)
                .request_window(Duration::from_secs(60)),
        );
        let limiter = Arc::new(limiter);
        let allowed = Arc::new(AtomicU32::new(0));

        let handles: Vec<_> = (0..8)
            .map(|_| {
                let limiter = Arc::clone(&limiter);
                let allowed = Arc::clone(&allowed);
                thread::spawn(move || {
                    for _ in 0..100 {
                        if limiter.check_request_rate("shared").allowed {
                            allowed.fetch_add(1, Ordering::Relaxed);
                        }
                    }
                })
            })
            .collect();
        for handle in handles {
            handle.join().unwrap();
        }

        assert_eq!(allowed.load(Ordering::Relaxed), limit);
        assert_eq!(limiter.store().get("shared").unwrap().request_count, limit);
    }

    #[test]
    fn concurrent_reports_are_all_counted() {
        let (limiter, _) = controller(AdmissionConfig::default());
        let limiter = Arc::new(limiter);

        let handles: Vec<_> = (0..4)
            .map(|_| {
                let limiter = Arc::clone(&limiter);
                thread::spawn(move || {
                    for _ in 0..250 {
                        limiter.report_resource_usage("shared", 2);
                    }
                })
            })
            .collect();
        for handle in handles {
            handle.join().unwrap();
        }

        assert_eq!(limiter.store().get("shared").unwrap().resource_used, 2_000);
    }

    #[test]
    fn sweeps_racing_with_checks_leave_live_entries() {
        let (limiter, clock) = controller(
            AdmissionConfig::new()
                .request_window(Duration::from_secs(1))
                .resource_window(Duration::from_secs(1)),
        );
        let limiter = Arc::new(limiter);
        for i in 0..200 {
            limiter.check_request_rate(&format!("user-{i}"));
        }
        // every entry is expired, but half of them are about to be renewed
        clock.set_ms(5_000);

        let renewer = {
            let limiter = Arc::clone(&limiter);
            thread::spawn(move || {
                for i in (0..200).step_by(2) {
                    limiter.report_resource_usage(&format!("user-{i}"), 1);
                }
            })
        };
        let reclaimer = limiter.reclaimer();
        let sweeper = thread::spawn(move || reclaimer.sweep());
        renewer.join().unwrap();
        sweeper.join().unwrap();

        // renewed identities hold a live resource window and must survive
        for i in (0..200).step_by(2) {
            assert!(limiter.store().get(&format!("user-{i}")).is_some());
        }
        limiter.reclaimer().sweep();
        assert_eq!(limiter.store().len(), 100);
    }
}
