//! Fixed timestep play loop
//!
//! One tick: launch impulse, flipper drive, physics step, clamp, drain
//! check, hit extraction and scoring, jackpot countdown. `PlaySession`
//! exclusively owns its physics backend; dropping the session releases the
//! world and everything built into it.
//!
//! Score events pile up across ticks until the presenter drains them, so a
//! display frame that runs several ticks still sees every hit.

use glam::Vec2;
use rand::{Rng, SeedableRng};
use rand_pcg::Pcg32;

use super::backend::{BodyHandle, PhysicsBackend};
use super::builder::{TableBodies, build_table};
use super::flipper::FlipperController;
use super::hits::{BallSample, TargetKind, hits_among};
use super::scoring::{ScoreEvent, TickHits};
use super::state::{ElementPose, FlipperPose, GamePhase, Pose, SessionState, Snapshot};
use crate::consts::*;
use crate::level::{ElementKind, Level, Side};
use crate::px;

/// Lateral launch jitter range (impulse units, centred on zero)
const LAUNCH_JITTER: f32 = 1.2;
/// Plunger force to upward impulse
const LAUNCH_DIVISOR: f32 = 37.5;
/// Longest frame delta fed into the accumulator (seconds)
const MAX_FRAME_DELTA: f32 = 0.1;

/// Input commands for a single tick
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TickInput {
    /// Left flipper key held
    pub left: bool,
    /// Right flipper key held
    pub right: bool,
    /// Launch pressed since the last tick (edge, not level)
    pub launch: bool,
}

/// Per-session knobs
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SessionOptions {
    pub seed: u64,
    pub starting_lives: u32,
}

impl Default for SessionOptions {
    fn default() -> Self {
        Self {
            seed: 0,
            starting_lives: STARTING_LIVES,
        }
    }
}

/// Fixed target centres, sampled once after the build
#[derive(Debug, Clone, Default)]
struct TargetCentres {
    bumpers: Vec<Vec2>,
    bumper_points: Vec<u32>,
    slings: Vec<Vec2>,
    kickers: Vec<Vec2>,
    cards: Vec<Vec2>,
    icons: Vec<Vec2>,
}

impl TargetCentres {
    fn sample<B: PhysicsBackend>(backend: &B, bodies: &TableBodies) -> Self {
        fn centres<B: PhysicsBackend>(backend: &B, handles: &[BodyHandle]) -> Vec<Vec2> {
            handles.iter().map(|&h| backend.translation(h)).collect()
        }
        Self {
            bumpers: bodies.bumpers.iter().map(|b| backend.translation(b.body)).collect(),
            bumper_points: bodies.bumpers.iter().map(|b| b.points).collect(),
            slings: centres(backend, &bodies.slings),
            kickers: centres(backend, &bodies.kickers),
            cards: centres(backend, &bodies.card_targets),
            icons: centres(backend, &bodies.icon_targets),
        }
    }

    fn hits(&self, ball: BallSample) -> TickHits {
        TickHits {
            bumpers: hits_among(ball, &self.bumpers, TargetKind::Bumper)
                .into_iter()
                .map(|i| (i, self.bumper_points[i]))
                .collect(),
            slings: hits_among(ball, &self.slings, TargetKind::Sling),
            kickers: hits_among(ball, &self.kickers, TargetKind::Kicker),
            cards: hits_among(ball, &self.cards, TargetKind::Card),
            icons: hits_among(ball, &self.icons, TargetKind::Icon),
        }
    }
}

/// A level being played on one physics world
pub struct PlaySession<B: PhysicsBackend> {
    backend: B,
    bodies: TableBodies,
    left: Option<FlipperController>,
    right: Option<FlipperController>,
    targets: TargetCentres,
    /// Non-flipper element bodies for the snapshot, in level order per kind
    statics: Vec<(ElementKind, usize, BodyHandle)>,
    spawn: Vec2,
    drain_y: f32,
    state: SessionState,
    rng: Pcg32,
}

impl<B: PhysicsBackend> PlaySession<B> {
    /// Build `level` into `backend` (which must be empty) and start playing.
    /// The level must already have passed `Level::validate`.
    pub fn new(mut backend: B, level: &Level, options: SessionOptions) -> Self {
        let bodies = build_table(&mut backend, level);

        for side in [Side::Left, Side::Right] {
            if bodies.flipper(side).is_none() {
                log::warn!("Level '{}' has no {:?} flipper; that key does nothing", level.name, side);
            }
        }
        let left = bodies.left_flipper.clone().map(FlipperController::new);
        let right = bodies.right_flipper.clone().map(FlipperController::new);
        let targets = TargetCentres::sample(&backend, &bodies);

        let bumper_bodies: Vec<BodyHandle> = bodies.bumpers.iter().map(|b| b.body).collect();
        let groups = [
            (ElementKind::Wall, &bodies.walls),
            (ElementKind::Bumper, &bumper_bodies),
            (ElementKind::Sling, &bodies.slings),
            (ElementKind::Kicker, &bodies.kickers),
            (ElementKind::LaneGuide, &bodies.lane_guides),
            (ElementKind::CardTarget, &bodies.card_targets),
            (ElementKind::IconTarget, &bodies.icon_targets),
            (ElementKind::Trampoline, &bodies.trampolines),
        ];
        let statics = groups
            .iter()
            .flat_map(|&(kind, handles)| handles.iter().enumerate().map(move |(i, &h)| (kind, i, h)))
            .collect();

        log::info!(
            "Session started on '{}' (seed {}, {} lives)",
            level.name,
            options.seed,
            options.starting_lives
        );

        Self {
            backend,
            statics,
            left,
            right,
            spawn: Vec2::from(level.ball_spawn) * px(1.0),
            drain_y: px(TABLE_HEIGHT + DRAIN_MARGIN),
            state: SessionState::new(
                options.seed,
                bodies.card_targets.len(),
                bodies.icon_targets.len(),
                options.starting_lives,
            ),
            targets,
            bodies,
            rng: Pcg32::seed_from_u64(options.seed),
        }
    }

    pub fn state(&self) -> &SessionState {
        &self.state
    }

    pub fn phase(&self) -> GamePhase {
        self.state.phase
    }

    pub fn score(&self) -> u64 {
        self.state.board.score
    }

    pub fn lives(&self) -> u32 {
        self.state.board.lives
    }

    pub fn bodies(&self) -> &TableBodies {
        &self.bodies
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    /// Direct world access for tools and tests
    pub fn backend_mut(&mut self) -> &mut B {
        &mut self.backend
    }

    pub fn flipper(&self, side: Side) -> Option<&FlipperController> {
        match side {
            Side::Left => self.left.as_ref(),
            Side::Right => self.right.as_ref(),
        }
    }

    /// Advance one fixed step. Does nothing once the game is over.
    pub fn tick(&mut self, input: &TickInput) {
        if self.state.is_game_over() {
            return;
        }

        if input.launch {
            self.launch();
        }

        if let Some(left) = &self.left {
            left.drive(&mut self.backend, input.left);
        }
        if let Some(right) = &self.right {
            right.drive(&mut self.backend, input.right);
        }

        self.backend.step();
        self.state.time_ticks += 1;

        for ctrl in [&self.left, &self.right].into_iter().flatten() {
            ctrl.enforce_clamp(&mut self.backend);
        }

        let ball = self.bodies.ball;
        let pos = self.backend.translation(ball);
        if pos.y > self.drain_y {
            if self.state.board.drain() {
                self.state.phase = GamePhase::GameOver;
                return;
            }
            log::debug!("Ball drained, {} lives left", self.state.board.lives);
            self.reset_ball();
        }

        let sample = BallSample {
            pos: self.backend.translation(ball),
            vel: self.backend.linvel(ball),
        };
        if sample.is_finite() {
            let hits = self.targets.hits(sample);
            self.state.board.apply_hits(&hits);
        } else {
            // A non-finite ball can neither score nor drain
            log::warn!(
                "Ball state {:?} is not finite at tick {}; respawning",
                sample,
                self.state.time_ticks
            );
            self.reset_ball();
        }

        self.state.board.tick_jackpot();
    }

    /// Plunger impulse with a little lateral jitter
    fn launch(&mut self) {
        let u: f32 = self.rng.random();
        let impulse = Vec2::new((u - 0.5) * LAUNCH_JITTER, -PLUNGER_FORCE / LAUNCH_DIVISOR);
        self.backend.apply_impulse(self.bodies.ball, impulse);
        log::debug!("Launch impulse {:?}", impulse);
    }

    fn reset_ball(&mut self) {
        let ball = self.bodies.ball;
        self.backend.set_translation(ball, self.spawn);
        self.backend.set_linvel(ball, Vec2::ZERO);
        self.backend.set_angvel(ball, 0.0);
    }

    /// "Play Again": full lives, zero score, banks and jackpot cleared,
    /// ball back on the spawn point
    pub fn replay(&mut self) {
        self.state.board.reset();
        self.state.phase = GamePhase::Playing;
        self.state.time_ticks = 0;
        self.reset_ball();
        log::info!("Replaying (seed {})", self.state.seed);
    }

    fn pose(&self, body: BodyHandle) -> Pose {
        Pose {
            pos: self.backend.translation(body) * SCALE,
            rotation: self.backend.rotation(body),
        }
    }

    /// Events raised since the last drain, oldest first
    pub fn drain_events(&mut self) -> Vec<ScoreEvent> {
        self.state.board.take_events()
    }

    /// Snapshot carrying the pending events; they are drained, so the next
    /// one starts empty
    pub fn take_snapshot(&mut self) -> Snapshot {
        let mut snapshot = self.snapshot();
        snapshot.events = self.drain_events();
        snapshot
    }

    /// Owned, render-ready copy of the current state. Pending events are
    /// copied, not drained.
    pub fn snapshot(&self) -> Snapshot {
        let board = &self.state.board;
        Snapshot {
            tick: self.state.time_ticks,
            phase: self.state.phase,
            ball: self.pose(self.bodies.ball),
            flippers: self
                .bodies
                .flippers
                .iter()
                .map(|rig| FlipperPose {
                    id: rig.id.clone(),
                    side: rig.side,
                    pose: self.pose(rig.body),
                })
                .collect(),
            elements: self
                .statics
                .iter()
                .map(|&(kind, index, body)| ElementPose {
                    kind,
                    index,
                    pose: self.pose(body),
                })
                .collect(),
            score: board.score,
            lives: board.lives,
            card_hits: board.cards.flags().to_vec(),
            icon_hits: board.icons.flags().to_vec(),
            jackpot_active: board.jackpot_active,
            jackpot_timer: board.jackpot_timer,
            events: board.events().to_vec(),
        }
    }
}

/// Turns variable display-frame deltas into whole fixed ticks
#[derive(Debug, Clone)]
pub struct FrameClock {
    dt: f32,
    accumulator: f32,
}

impl Default for FrameClock {
    fn default() -> Self {
        Self::new(SIM_DT)
    }
}

impl FrameClock {
    pub fn new(dt: f32) -> Self {
        Self { dt, accumulator: 0.0 }
    }

    /// Feed one frame delta (seconds); returns how many ticks to run
    pub fn advance(&mut self, frame_delta: f32) -> u32 {
        // Clamp to prevent spiral of death after a stall
        let delta = if frame_delta.is_finite() {
            frame_delta.clamp(0.0, MAX_FRAME_DELTA)
        } else {
            0.0
        };
        self.accumulator += delta;

        let mut substeps = 0;
        while self.accumulator >= self.dt && substeps < MAX_SUBSTEPS {
            self.accumulator -= self.dt;
            substeps += 1;
        }
        substeps
    }

    /// Fraction of a tick left in the accumulator, for interpolation
    pub fn alpha(&self) -> f32 {
        (self.accumulator / self.dt).clamp(0.0, 1.0)
    }

    pub fn reset(&mut self) {
        self.accumulator = 0.0;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::level::{Bumper, ElementId, Point, Target};
    use crate::sim::scoring::JACKPOT_DURATION_TICKS;
    use crate::sim::{KinematicWorld, RapierWorld};
    use proptest::prelude::*;

    fn at_px(x: f32, y: f32) -> Vec2 {
        Vec2::new(px(x), px(y))
    }

    fn session(level: &Level, lives: u32) -> PlaySession<KinematicWorld> {
        PlaySession::new(
            KinematicWorld::default(),
            level,
            SessionOptions {
                seed: 42,
                starting_lives: lives,
            },
        )
    }

    /// Place the ball and give it a velocity before the next tick
    fn throw(s: &mut PlaySession<KinematicWorld>, pos: Vec2, vel: Vec2) {
        let ball = s.bodies().ball;
        s.backend_mut().set_translation(ball, pos);
        s.backend_mut().set_linvel(ball, vel);
    }

    fn target(id: &str, cx: f32, cy: f32) -> Target {
        Target {
            id: ElementId::from(id),
            cx,
            cy,
            rotation: None,
            label: "?".into(),
        }
    }

    #[test]
    fn test_bumper_hit_scores_once_per_tick() {
        let mut level = Level::empty("bumper");
        level.bumpers.push(Bumper {
            id: ElementId::from("b"),
            cx: 100.0,
            cy: 100.0,
            radius: Some(20.0),
            restitution: Some(1.5),
            points: None,
        });
        let mut s = session(&level, 3);
        throw(&mut s, at_px(100.0, 90.0), Vec2::new(0.0, 5.0));
        s.tick(&TickInput::default());
        assert_eq!(s.score(), 100);
        assert_eq!(
            s.snapshot().events,
            vec![ScoreEvent::BumperHit { index: 0, points: 100 }]
        );
    }

    #[test]
    fn test_empty_level_never_scores() {
        let level = Level::empty("nothing");
        let mut s = session(&level, 3);
        for _ in 0..1000 {
            s.tick(&TickInput::default());
        }
        assert_eq!(s.score(), 0);
        assert_eq!(s.lives(), 3);
        assert_eq!(s.phase(), GamePhase::Playing);
    }

    #[test]
    fn test_drain_costs_one_life_and_respawns() {
        let mut level = Level::empty("drain");
        level.ball_spawn = Point::new(150.0, 200.0);
        let mut s = session(&level, 3);
        throw(&mut s, at_px(200.0, 800.0), Vec2::new(1.0, 4.0));
        s.tick(&TickInput::default());

        assert_eq!(s.lives(), 2);
        let ball = s.bodies().ball;
        assert!((s.backend().translation(ball) - at_px(150.0, 200.0)).length() < 1e-5);
        assert_eq!(s.backend().linvel(ball), Vec2::ZERO);
        assert_eq!(s.phase(), GamePhase::Playing);
    }

    #[test]
    fn test_last_life_ends_game_and_halts() {
        let level = Level::empty("over");
        let mut s = session(&level, 1);
        let below = at_px(200.0, 800.0);
        throw(&mut s, below, Vec2::new(0.0, 6.0));
        s.tick(&TickInput::default());

        assert_eq!(s.phase(), GamePhase::GameOver);
        assert_eq!(s.lives(), 0);
        let ball = s.bodies().ball;
        let frozen = s.backend().translation(ball);
        assert!(frozen.y > below.y);
        let ticks = s.state().time_ticks;

        s.tick(&TickInput {
            launch: true,
            ..Default::default()
        });
        assert_eq!(s.state().time_ticks, ticks);
        assert_eq!(s.backend().translation(ball), frozen);

        s.replay();
        assert_eq!(s.phase(), GamePhase::Playing);
        assert_eq!(s.lives(), 1);
        assert_eq!(s.score(), 0);
        assert_eq!(s.backend().translation(ball), Vec2::from(level.ball_spawn) * px(1.0));
    }

    #[test]
    fn test_card_bank_jackpot_cycle() {
        let mut level = Level::empty("cards");
        level.card_targets = vec![target("c0", 100.0, 200.0), target("c1", 300.0, 200.0)];
        let mut s = session(&level, 3);

        throw(&mut s, at_px(100.0, 200.0), Vec2::new(3.0, 0.0));
        s.tick(&TickInput::default());
        assert_eq!(s.score(), 500);
        assert!(!s.state().board.jackpot_active);

        throw(&mut s, at_px(300.0, 200.0), Vec2::new(3.0, 0.0));
        s.tick(&TickInput::default());
        assert_eq!(s.score(), 2 * 500 + 10_000);
        assert!(s.state().board.jackpot_active);
        assert_eq!(s.state().board.jackpot_timer, JACKPOT_DURATION_TICKS - 1);

        // Park the ball well away from both cards
        throw(&mut s, at_px(200.0, 500.0), Vec2::ZERO);
        let mut ticks = 1;
        while s.state().board.jackpot_active {
            s.tick(&TickInput::default());
            ticks += 1;
            assert!(ticks <= JACKPOT_DURATION_TICKS);
        }
        assert_eq!(ticks, JACKPOT_DURATION_TICKS);
        assert_eq!(s.snapshot().card_hits, vec![false, false]);
        assert_eq!(s.score(), 2 * 500 + 10_000);
    }

    #[test]
    fn test_icon_bank_resets_on_completion() {
        let mut level = Level::empty("icons");
        level.icon_targets = vec![target("i0", 100.0, 300.0), target("i1", 300.0, 300.0)];
        let mut s = session(&level, 3);

        throw(&mut s, at_px(100.0, 300.0), Vec2::new(0.0, 2.0));
        s.tick(&TickInput::default());
        assert_eq!(s.snapshot().icon_hits, vec![true, false]);

        throw(&mut s, at_px(300.0, 300.0), Vec2::new(0.0, 2.0));
        s.tick(&TickInput::default());
        let snap = s.snapshot();
        assert_eq!(snap.icon_hits, vec![false, false]);
        assert_eq!(snap.score, 2000);
        assert!(snap.events.contains(&ScoreEvent::IconBankReset));
    }

    #[test]
    fn test_frame_of_several_ticks_keeps_hits() {
        let mut level = Level::empty("cards");
        level.card_targets = vec![target("c0", 100.0, 200.0), target("c1", 300.0, 200.0)];
        let mut s = session(&level, 3);
        let mut clock = FrameClock::default();

        throw(&mut s, at_px(100.0, 200.0), Vec2::new(3.0, 0.0));
        let steps = clock.advance(2.0 * SIM_DT + 1e-4);
        assert_eq!(steps, 2);
        for _ in 0..steps {
            s.tick(&TickInput::default());
        }

        let snap = s.take_snapshot();
        assert_eq!(snap.score, 500);
        assert_eq!(snap.events, vec![ScoreEvent::CardHit { index: 0 }]);
        assert!(s.take_snapshot().events.is_empty());
    }

    #[test]
    fn test_game_over_event_outlives_later_ticks() {
        let level = Level::empty("over");
        let mut s = session(&level, 1);
        throw(&mut s, at_px(200.0, 800.0), Vec2::new(0.0, 6.0));
        s.tick(&TickInput::default());
        s.tick(&TickInput::default());
        s.tick(&TickInput::default());

        assert_eq!(
            s.drain_events(),
            vec![ScoreEvent::BallLost { lives_left: 0 }, ScoreEvent::GameOver]
        );
        assert!(s.drain_events().is_empty());
    }

    #[test]
    fn test_non_finite_ball_respawns_without_cost() {
        let mut level = Level::empty("nan");
        level.ball_spawn = Point::new(150.0, 200.0);
        let mut s = session(&level, 3);
        throw(&mut s, Vec2::new(f32::NAN, 1.0), Vec2::ZERO);
        s.tick(&TickInput::default());

        let ball = s.bodies().ball;
        assert!((s.backend().translation(ball) - at_px(150.0, 200.0)).length() < 1e-5);
        assert_eq!(s.lives(), 3);
        assert_eq!(s.score(), 0);
        assert!(s.drain_events().is_empty());

        s.tick(&TickInput::default());
        assert!(s.backend().translation(ball).is_finite());
        assert_eq!(s.phase(), GamePhase::Playing);
    }

    #[test]
    fn test_launch_is_seeded() {
        let level = Level::empty("launch");
        let velocity_after_launch = |seed: u64| {
            let mut s = PlaySession::new(
                KinematicWorld::default(),
                &level,
                SessionOptions {
                    seed,
                    starting_lives: 3,
                },
            );
            s.tick(&TickInput {
                launch: true,
                ..Default::default()
            });
            s.backend().linvel(s.bodies().ball)
        };

        let a = velocity_after_launch(7);
        let b = velocity_after_launch(7);
        assert_eq!(a, b);
        assert!(a.y < 0.0);
        assert!(a.x.abs() < a.y.abs());
        assert_ne!(a.x, velocity_after_launch(8).x);
    }

    #[test]
    fn test_snapshot_covers_every_body() {
        let level = Level::classic();
        let s = PlaySession::new(KinematicWorld::default(), &level, SessionOptions::default());
        let snap = s.snapshot();
        assert_eq!(snap.flippers.len(), level.flippers.len());
        assert_eq!(
            snap.elements.len(),
            level.element_count() - level.flippers.len()
        );
        assert_eq!(snap.card_hits.len(), level.card_targets.len());
        assert!((snap.ball.pos - Vec2::from(level.ball_spawn)).length() < 1e-3);
    }

    #[test]
    fn test_frame_clock_bounds_substeps() {
        let mut clock = FrameClock::default();
        assert_eq!(clock.advance(SIM_DT * 3.0 + 1e-4), 3);
        clock.reset();
        // A one second stall is clamped to 0.1 s
        assert_eq!(clock.advance(1.0), 6);
        clock.reset();
        assert_eq!(clock.advance(f32::NAN), 0);
        assert_eq!(clock.advance(-1.0), 0);
        assert!(clock.alpha() >= 0.0 && clock.alpha() <= 1.0);
    }

    #[test]
    fn test_determinism() {
        let level = Level::classic();
        let mut a = PlaySession::new(RapierWorld::default(), &level, SessionOptions::default());
        let mut b = PlaySession::new(RapierWorld::default(), &level, SessionOptions::default());
        let inputs = [
            TickInput {
                launch: true,
                ..Default::default()
            },
            TickInput {
                left: true,
                ..Default::default()
            },
            TickInput {
                right: true,
                ..Default::default()
            },
            TickInput::default(),
        ];
        for _ in 0..30 {
            for input in &inputs {
                a.tick(input);
                b.tick(input);
            }
        }
        assert_eq!(a.snapshot(), b.snapshot());
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(16))]

        #[test]
        fn prop_score_never_decreases(
            inputs in proptest::collection::vec((any::<bool>(), any::<bool>(), any::<bool>()), 1..300),
        ) {
            let mut s = PlaySession::new(RapierWorld::default(), &Level::classic(), SessionOptions::default());
            let mut last = 0;
            for (left, right, launch) in inputs {
                s.tick(&TickInput { left, right, launch });
                prop_assert!(s.score() >= last);
                last = s.score();
            }
        }
    }
}
