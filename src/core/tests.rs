#[cfg(test)]
mod tests {
    use crate::core::{
        BlockPattern, Clock, DetectorConfig, DetectorOptions, ExitIntent, GestureEvent,
        GestureKind, SimulatedPage,
    };
    use std::cell::{Cell, RefCell};
    use std::rc::Rc;

    fn counter() -> Rc<Cell<u32>> {
        Rc::new(Cell::new(0))
    }

    fn start(page: &SimulatedPage, options: DetectorOptions, hits: &Rc<Cell<u32>>) -> ExitIntent {
        let hits = hits.clone();
        ExitIntent::init(
            DetectorConfig::from_options(&options).unwrap(),
            &page.host(),
            page.observer.clone(),
            move |_: &GestureEvent| {
                hits.set(hits.get() + 1);
                true
            },
        )
    }

    // ========================================================================
    // Active time
    // ========================================================================

    #[test]
    fn test_count_never_includes_hidden_intervals() {
        let page = SimulatedPage::new("https://x");
        let scheduler = page.scheduler();
        let total = Rc::new(Cell::new(0.0));
        let sink = total.clone();
        scheduler.count(move |elapsed, _| {
            sink.set(elapsed);
            true
        });

        // Three visible frames, a hidden stretch with frames and one without.
        // Each return to visible discards the next frame.
        page.step(16.0);
        page.step(16.0);
        page.step(16.0);
        page.visibility.hide();
        page.step(1_000.0);
        page.step(1_000.0);
        page.visibility.show();
        page.step(16.0);
        page.visibility.hide();
        page.clock.advance(30_000.0);
        page.visibility.show();
        page.step(250.0);
        page.step(10.0);
        page.step(20.0);

        assert_eq!(total.get(), 16.0 * 3.0 + 10.0 + 20.0);
    }

    #[test]
    fn test_repeated_restore_without_frames_discards_one_interval_each() {
        let page = SimulatedPage::new("https://x");
        let ticks = Rc::new(RefCell::new(Vec::new()));
        let sink = ticks.clone();
        page.scheduler().pulse(move |tick| {
            sink.borrow_mut().push(tick);
            true
        });

        page.visibility.hide();
        page.visibility.show();
        page.visibility.hide();
        page.visibility.show();

        page.step(5.0);
        page.step(6.0);
        page.step(7.0);
        assert_eq!(*ticks.borrow(), vec![7.0]);
    }

    #[test]
    fn test_concurrent_schedules_are_independent() {
        let page = SimulatedPage::new("https://x");
        let scheduler = page.scheduler();
        let order = Rc::new(RefCell::new(Vec::new()));

        let first = order.clone();
        scheduler.schedule_after(move || first.borrow_mut().push("short"), 32.0);
        let second = order.clone();
        scheduler.schedule_after(move || second.borrow_mut().push("long"), 64.0);
        assert_eq!(scheduler.live_sessions(), 2);

        page.run_for(48.0);
        assert_eq!(*order.borrow(), vec!["short"]);
        assert_eq!(scheduler.live_sessions(), 1);

        page.run_for(32.0);
        assert_eq!(*order.borrow(), vec!["short", "long"]);
        assert_eq!(scheduler.live_sessions(), 0);
    }

    #[test]
    fn test_countdown_remaining_time() {
        let page = SimulatedPage::new("https://x");
        let remaining = Rc::new(RefCell::new(Vec::new()));
        let sink = remaining.clone();
        let done = Rc::new(Cell::new(false));
        let done_inner = done.clone();

        page.scheduler().schedule(
            move || done_inner.set(true),
            Some(move |left: f64, _tick: f64| sink.borrow_mut().push(left.max(0.0))),
            40.0,
        );
        page.run_for(48.0);

        assert!(done.get());
        assert_eq!(*remaining.borrow(), vec![24.0, 8.0, 0.0]);
    }

    // ========================================================================
    // Cooldowns
    // ========================================================================

    #[test]
    fn test_wildcard_block_lifetime() {
        let page = SimulatedPage::new("https://x");
        let store = page.host().cooldowns();
        let written_at = page.clock.now_ms();
        store.add_block(&BlockPattern::Wildcard, 10.0).unwrap();

        page.clock.advance(1.0);
        assert!(store.is_blocking("https://x").unwrap());

        page.clock.set(written_at + 10.0 * 60_000.0 + 1.0);
        assert!(!store.is_blocking("https://x").unwrap());
    }

    #[test]
    fn test_purge_same_token_twice_then_new_token() {
        let page = SimulatedPage::new("https://x");
        let store = page.host().cooldowns();

        store.purge("v1");
        store.add_block(&BlockPattern::Wildcard, 10.0).unwrap();
        store.purge("v1");
        assert!(store.is_blocking("https://x").unwrap());

        store.purge("v2");
        assert!(!store.is_blocking("https://x").unwrap());
    }

    // ========================================================================
    // Detector
    // ========================================================================

    #[test]
    fn test_mouse_leave_filter_end_to_end() {
        let page = SimulatedPage::new("https://x");
        let hits = counter();
        let _detector = start(&page, DetectorOptions::default(), &hits);
        page.run_for(3_000.0);

        page.binder.emit(GestureEvent::mouse_leave(5.0));
        assert!(page.observer.triggers.borrow().is_empty());

        page.binder.emit(GestureEvent::mouse_leave(0.0));
        assert_eq!(*page.observer.triggers.borrow(), vec![GestureKind::MouseLeave]);
        assert_eq!(hits.get(), 1);
    }

    #[test]
    fn test_cooldown_survives_reload() {
        let page = SimulatedPage::new("https://shop.example/cart");
        let hits = counter();
        let options = DetectorOptions {
            bind_delay_ms: Some(0.0),
            cooldown_minutes: Some(1.0),
            ..Default::default()
        };

        let first = start(&page, options.clone(), &hits);
        page.run_for(16.0);
        page.binder.emit(GestureEvent::blur());
        assert!(first.acted());
        assert_eq!(hits.get(), 1);

        // Same storage, fresh page state
        let second = start(&page, options.clone(), &hits);
        page.run_for(16.0);
        page.binder.emit(GestureEvent::blur());
        assert!(!second.acted());
        assert_eq!(hits.get(), 1);
        assert_eq!(page.observer.storage_blocks.borrow().len(), 1);

        page.clock.advance(60_000.0);
        let third = start(&page, options, &hits);
        page.run_for(16.0);
        page.binder.emit(GestureEvent::blur());
        assert!(third.acted());
        assert_eq!(hits.get(), 2);
    }

    #[test]
    fn test_pattern_cooldown_only_blocks_matching_pages() {
        let page = SimulatedPage::new("https://shop.example/checkout");
        let hits = counter();
        let options = DetectorOptions {
            bind_delay_ms: Some(0.0),
            cooldown_pattern: Some(r"/checkout$".to_string()),
            ..Default::default()
        };

        let _checkout = start(&page, options.clone(), &hits);
        page.run_for(16.0);
        page.binder.emit(GestureEvent::blur());
        assert_eq!(hits.get(), 1);

        page.location.navigate("https://shop.example/blog");
        let blog = start(&page, options, &hits);
        page.run_for(16.0);
        page.binder.emit(GestureEvent::blur());
        assert!(blog.acted());
        assert_eq!(hits.get(), 2);
    }

    #[test]
    fn test_missing_storage_falls_back_to_flag() {
        let page = SimulatedPage::new("https://x");
        let hits = counter();
        let hits_inner = hits.clone();
        let detector = ExitIntent::init(
            DetectorConfig {
                bind_delay_ms: 0.0,
                ..Default::default()
            },
            &page.host_without_storage(),
            page.observer.clone(),
            move |_: &GestureEvent| hits_inner.set(hits_inner.get() + 1),
        );
        page.run_for(16.0);

        page.binder.emit(GestureEvent::blur());
        page.binder.emit(GestureEvent::blur());
        assert_eq!(hits.get(), 1);
        assert!(detector.acted());
        assert!(!detector.purge_blocks("v1"));
    }

    #[test]
    fn test_ignore_both_gates() {
        let page = SimulatedPage::new("https://x");
        let hits = counter();
        let detector = start(
            &page,
            DetectorOptions {
                bind_delay_ms: Some(0.0),
                ignore_flag_blocking: Some(true),
                ignore_storage_blocking: Some(true),
                ..Default::default()
            },
            &hits,
        );
        page.run_for(16.0);

        for _ in 0..3 {
            page.binder.emit(GestureEvent::blur());
        }
        assert_eq!(hits.get(), 3);
        assert!(detector.acted());
        // Cooldowns are still written, just not consulted
        assert_eq!(detector.cooldowns().entries().len(), 3);
        assert!(page.observer.storage_blocks.borrow().is_empty());
    }
}
