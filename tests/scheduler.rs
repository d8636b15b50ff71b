mod common;

mod tests {
    use super::common::ScriptedRandom;
    use meteor_bar::scheduler::{OFFSET_DISABLED, SECOND_TIMER_TOP, SecondTick};
    use meteor_bar::{Bounds, Direction, Mode, Scheduler, SeededRandom, TriggerOffset};

    fn draw(seconds: u32, offset: u32) -> u32 {
        (seconds << 15) | offset
    }

    #[test]
    fn test_bounds_repair() {
        let bounds = Bounds::new(5, 60);
        assert_eq!((bounds.min(), bounds.max()), (5, 60));

        assert_eq!(bounds.with_min(10), Bounds::new(10, 60));
        assert_eq!(bounds.with_min(60), Bounds::new(60, 61));
        assert_eq!(bounds.with_max(5).max(), 6);
        assert_eq!(Bounds::new(9, 0).max(), 10);

        let top = Bounds::new(u16::MAX, u16::MAX);
        assert_eq!((top.min(), top.max()), (u16::MAX - 1, u16::MAX));
        assert_eq!(Bounds::new(3, 4).span(), 1);
    }

    #[test]
    fn test_mode_from_raw() {
        assert_eq!(Mode::from_raw(0), Mode::Manual);
        assert_eq!(Mode::from_raw(1), Mode::FixedBackward);
        assert_eq!(Mode::from_raw(2), Mode::FixedForward);
        assert_eq!(Mode::from_raw(3), Mode::Random);
        assert_eq!(Mode::from_raw(42), Mode::Random);
        assert_eq!(Mode::FixedForward.as_raw(), 2);
    }

    #[test]
    fn test_offset_folds_into_timer_range() {
        assert_eq!(TriggerOffset::from_draw(0), TriggerOffset::At(0));
        assert_eq!(TriggerOffset::from_draw(31_249), TriggerOffset::At(31_249));
        assert_eq!(TriggerOffset::from_draw(31_250), TriggerOffset::At(29_732));
        assert_eq!(TriggerOffset::from_draw(0x7FFF), TriggerOffset::At(31_249));
        // Only the low 15 bits count
        assert_eq!(TriggerOffset::from_draw(0xFFFF_8005), TriggerOffset::At(5));
        assert_eq!(TriggerOffset::Disabled.compare_value(), OFFSET_DISABLED);
        assert_eq!(TriggerOffset::At(17).compare_value(), 17);
    }

    #[test]
    fn test_reset_random_draws_countdown_and_direction() {
        let random = ScriptedRandom::new(&[draw(7, 1), draw(100, 2)]);
        let mut scheduler = Scheduler::new(Mode::Random, Bounds::new(5, 60), random);

        assert_eq!(scheduler.reset_random(), Some(Direction::Forward));
        assert_eq!(scheduler.countdown(), 12);
        assert_eq!(scheduler.offset(), TriggerOffset::At(1));

        // 100 % 55 == 45
        assert_eq!(scheduler.reset_random(), Some(Direction::Backward));
        assert_eq!(scheduler.countdown(), 50);
        assert_eq!(scheduler.offset(), TriggerOffset::At(2));
    }

    #[test]
    fn test_fixed_modes_pin_direction() {
        let random = ScriptedRandom::new(&[draw(0, 1)]);
        let mut scheduler = Scheduler::new(Mode::FixedBackward, Bounds::new(5, 60), random);
        assert_eq!(scheduler.reset_random(), Some(Direction::Backward));

        let random = ScriptedRandom::new(&[draw(0, 0)]);
        let mut scheduler = Scheduler::new(Mode::FixedForward, Bounds::new(5, 60), random);
        assert_eq!(scheduler.reset_random(), Some(Direction::Forward));
    }

    #[test]
    fn test_manual_mode_disables_automatic_trigger() {
        let random = ScriptedRandom::new(&[draw(3, 3)]);
        let mut scheduler = Scheduler::new(Mode::Random, Bounds::new(5, 60), random);
        scheduler.reset_random();
        let countdown = scheduler.countdown();

        scheduler.set_mode(Mode::Manual);
        assert_eq!(scheduler.reset_random(), None);
        assert_eq!(scheduler.offset(), TriggerOffset::Disabled);
        assert_eq!(scheduler.countdown(), countdown);
        assert_eq!(scheduler.on_second(true), SecondTick::Held);
        assert_eq!(scheduler.countdown(), countdown);
    }

    #[test]
    fn test_second_tick_counts_down_then_fires() {
        let random = ScriptedRandom::new(&[draw(1, 0)]);
        let mut scheduler = Scheduler::new(Mode::Random, Bounds::new(2, 10), random);
        scheduler.reset_random();
        assert_eq!(scheduler.countdown(), 3);

        for remaining in (0..3).rev() {
            assert_eq!(scheduler.on_second(true), SecondTick::Counting);
            assert_eq!(scheduler.countdown(), remaining);
        }
        assert_eq!(scheduler.on_second(false), SecondTick::Held);
        assert_eq!(scheduler.on_second(true), SecondTick::Fire);
        assert_eq!(scheduler.countdown(), 0);
    }

    #[test]
    fn test_disable_holds_countdown() {
        let random = ScriptedRandom::new(&[draw(4, 0)]);
        let mut scheduler = Scheduler::new(Mode::Random, Bounds::new(0, 10), random);
        scheduler.reset_random();
        scheduler.disable();
        assert_eq!(scheduler.on_second(true), SecondTick::Held);
        assert_eq!(scheduler.countdown(), 4);
    }

    #[test]
    fn test_set_bounds_clamps_countdown() {
        let random = ScriptedRandom::new(&[draw(50, 0)]);
        let mut scheduler = Scheduler::new(Mode::Random, Bounds::new(5, 60), random);
        scheduler.reset_random();
        assert_eq!(scheduler.countdown(), 55);

        scheduler.set_bounds(Bounds::new(5, 20));
        assert_eq!(scheduler.countdown(), 20);
        scheduler.set_bounds(Bounds::new(1, 40));
        assert_eq!(scheduler.countdown(), 20);
    }

    #[test]
    fn test_nudge_never_passes_max() {
        let random = ScriptedRandom::new(&[draw(7, 0)]);
        let mut scheduler = Scheduler::new(Mode::Random, Bounds::new(5, 15), random);
        scheduler.reset_random();
        assert_eq!(scheduler.countdown(), 12);

        scheduler.nudge();
        assert_eq!(scheduler.countdown(), 14);
        scheduler.nudge();
        assert_eq!(scheduler.countdown(), 15);
        scheduler.nudge();
        assert_eq!(scheduler.countdown(), 15);
    }

    #[test]
    fn test_draws_stay_within_bounds() {
        for (min, max) in [(5, 60), (0, 1), (100, 101), (1, 65_535), (300, 9_000)] {
            let bounds = Bounds::new(min, max);
            let mut scheduler = Scheduler::new(Mode::Random, bounds, SeededRandom::from_address(7));
            for _ in 0..2_000 {
                scheduler.reset_random();
                let countdown = scheduler.countdown();
                assert!(countdown >= bounds.min() && countdown < bounds.max());
                match scheduler.offset() {
                    TriggerOffset::At(ticks) => assert!(ticks < SECOND_TIMER_TOP),
                    TriggerOffset::Disabled => panic!("automatic trigger disabled"),
                }
            }
        }
    }

    #[test]
    fn test_seed_selects_sequence() {
        let bounds = Bounds::new(0, 60_000);
        let mut first = Scheduler::new(Mode::Random, bounds, SeededRandom::from_address(1));
        let mut again = Scheduler::new(Mode::Random, bounds, SeededRandom::from_address(1));
        let mut other = Scheduler::new(Mode::Random, bounds, SeededRandom::from_address(2));

        let mut differs = false;
        for _ in 0..8 {
            first.reset_random();
            again.reset_random();
            other.reset_random();
            assert_eq!(first.state(), again.state());
            differs |= first.state() != other.state();
        }
        assert!(differs);
    }
}
