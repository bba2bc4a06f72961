use std::cell::RefCell;
use std::rc::Rc;
use std::time::Duration;

use assert_matches::assert_matches;
use rand::{rngs::StdRng, Rng, SeedableRng};
use reflex::{
    layout::Size,
    sequencer::Resolution,
    target::TargetState,
    Attempt, Game, GameConfig, GameError, Ignored, Status,
};

fn ms(v: u64) -> Duration {
    Duration::from_millis(v)
}

fn game(seed: u64) -> Game {
    Game::with_seed(GameConfig::default(), seed)
}

fn recorder(game: &mut Game) -> Rc<RefCell<Vec<Status>>> {
    let seen = Rc::new(RefCell::new(Vec::new()));
    let sink = Rc::clone(&seen);
    game.subscribe(move |status: Status| sink.borrow_mut().push(status));
    seen
}

#[test]
fn manual_win_waits_for_grace_period() {
    let mut game = game(1);
    let seen = recorder(&mut game);
    game.start(3).unwrap();

    for v in 1..=3 {
        assert_matches!(game.attempt_select(v), Attempt::Resolved(_));
        game.advance(ms(200));
    }
    assert_eq!(game.status(), Status::Playing);
    assert_eq!(game.expected_value(), Some(3));
    game.advance(ms(2799));
    assert_eq!(game.status(), Status::Playing);
    game.advance(ms(1));

    assert_eq!(game.status(), Status::Won);
    assert_eq!(game.accepted(), &[1, 2, 3]);
    assert_eq!(*seen.borrow(), vec![Status::Playing, Status::Won]);
}

#[test]
fn wrong_pick_loses_immediately() {
    let mut game = game(2);
    let seen = recorder(&mut game);
    game.start(4).unwrap();

    game.attempt_select(1);
    assert_eq!(
        game.attempt_select(3),
        Attempt::Resolved(Resolution::Mismatch {
            expected: 2,
            got: 3
        })
    );

    assert_eq!(game.status(), Status::Lost);
    assert_eq!(game.expected_value(), None);
    assert_eq!(game.accepted(), &[1]);
    assert_eq!(*seen.borrow(), vec![Status::Playing, Status::Lost]);

    // nothing counts after the loss
    assert_eq!(
        game.attempt_select(2),
        Attempt::Ignored(Ignored::NotPlaying)
    );
}

#[test]
fn clock_stops_when_session_resolves() {
    let mut game = game(3);
    game.start(2).unwrap();
    game.advance(ms(1000));
    assert_eq!(game.elapsed(), ms(1000));

    game.attempt_select(2);
    game.advance(ms(5000));
    assert_eq!(game.elapsed(), ms(1000));
}

#[test]
fn countdowns_freeze_after_loss() {
    let mut game = game(4);
    game.start(3).unwrap();
    game.attempt_select(1);
    game.advance(ms(1000));
    game.attempt_select(3);

    game.advance(ms(10_000));
    let one = game.target(1).unwrap();
    assert_eq!(one.state(), TargetState::Selected);
    assert_eq!(one.remaining(), ms(2000));
}

#[test]
fn selected_targets_expire_after_countdown() {
    let mut game = game(5);
    game.start(5).unwrap();
    game.attempt_select(1);
    game.advance(ms(2900));
    assert!(game.target(1).unwrap().is_visible());

    game.advance(ms(100));
    assert_eq!(game.target(1).unwrap().state(), TargetState::Expired);
    assert_eq!(game.visible_targets(1500).count(), 4);
}

#[test]
fn autoplay_completes_the_session() {
    let mut game = game(6);
    game.start(4).unwrap();
    assert!(game.set_autoplay(true));
    assert_eq!(game.autoplay_pending(), Some(1));

    game.advance(ms(3999));
    assert_eq!(game.accepted(), &[1, 2, 3]);
    game.advance(ms(1));
    assert_eq!(game.accepted(), &[1, 2, 3, 4]);
    assert_eq!(game.autoplay_pending(), None);

    game.advance(ms(3000));
    assert_eq!(game.status(), Status::Won);
}

#[test]
fn autoplay_gates_manual_clicks_on_other_targets() {
    let mut game = game(7);
    game.start(3).unwrap();
    game.set_autoplay(true);

    assert_eq!(
        game.attempt_select(2),
        Attempt::Ignored(Ignored::AutoplayGate)
    );
    assert_eq!(game.status(), Status::Playing);

    // the expected target can still be taken by hand
    assert_eq!(
        game.attempt_select(1),
        Attempt::Resolved(Resolution::Advanced { next: 2 })
    );
    assert_eq!(game.autoplay_pending(), Some(2));
}

#[test]
fn turning_autoplay_off_cancels_pending_trigger() {
    let mut game = game(8);
    game.start(3).unwrap();
    game.set_autoplay(true);
    game.advance(ms(500));
    game.set_autoplay(false);

    game.advance(ms(5000));
    assert!(game.accepted().is_empty());
    assert_eq!(game.status(), Status::Playing);
}

#[test]
fn restart_cancels_every_timer_of_the_old_session() {
    let mut game = game(9);
    let seen = recorder(&mut game);
    game.start(2).unwrap();
    game.set_autoplay(true);
    game.advance(ms(2000));
    // win is pending now
    assert_eq!(game.accepted(), &[1, 2]);

    game.start(2).unwrap();
    game.advance(ms(10_000));

    assert_eq!(game.status(), Status::Playing);
    assert!(game.accepted().is_empty());
    assert_eq!(game.elapsed(), ms(10_000));
    assert_eq!(*seen.borrow(), vec![Status::Playing, Status::Playing]);
}

#[test]
fn invalid_target_counts_leave_game_untouched() {
    let mut game = game(10);
    assert_eq!(game.start(0), Err(GameError::InvalidTargetCount(0)));
    assert_eq!(game.start(-3), Err(GameError::InvalidTargetCount(-3)));
    assert_eq!(game.status(), Status::Idle);

    game.start(2).unwrap();
    game.attempt_select(1);
    assert!(game.start(i64::MAX).is_err());
    assert_eq!(game.accepted(), &[1]);
}

#[test]
fn targets_stay_inside_the_play_area() {
    let mut game = game(11);
    game.set_play_area(Size::new(200.0, 100.0));
    game.start(300).unwrap();

    let size = game.config().target_size;
    for target in game.targets() {
        let pos = target.position();
        assert!(pos.x >= 0.0 && pos.x + size.width <= 200.0);
        assert!(pos.y >= 0.0 && pos.y + size.height <= 100.0);
    }
    assert_eq!(game.targets().count(), 300);
}

#[test]
fn accepted_is_full_sequence_exactly_when_won() {
    let mut rng = StdRng::seed_from_u64(42);

    for seed in 0..60 {
        let count = rng.gen_range(1..=8u32);
        let mut game = game(seed);
        game.start(i64::from(count)).unwrap();
        if rng.gen_bool(0.2) {
            game.set_autoplay(true);
        }

        let mut guard = 0;
        while game.status() == Status::Playing && guard < 200 {
            let pick = match game.expected_value() {
                Some(v) if rng.gen_bool(0.85) => v,
                _ => rng.gen_range(1..=count + 1),
            };
            game.attempt_select(pick);
            game.advance(ms(rng.gen_range(0..700)));
            guard += 1;
        }
        game.advance(ms(4000));

        let full: Vec<u32> = (1..=count).collect();
        let status = game.status();
        assert!(status.is_resolved(), "seed {seed} never resolved");
        assert_eq!(
            status == Status::Won,
            game.accepted() == full.as_slice(),
            "seed {seed}: {status} with {:?}",
            game.accepted()
        );
        if status == Status::Lost {
            assert!(full.starts_with(game.accepted()));
        }
    }
}
