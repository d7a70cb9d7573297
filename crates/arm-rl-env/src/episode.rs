//! Episode lifecycle: initialization, per-tick stepping and termination
//!
//! One [`EpisodeController`] owns the pose, joints, claw and target of a
//! single arm. A tick runs in a fixed order:
//!
//! 1. clip and apply the control signals
//! 2. collect collision tags (queued tags first, then the contact source)
//! 3. try to grasp, then compute and accumulate the shaping reward
//! 4. apply the first terminating tag, if any
//! 5. release the target if the claw opened
//! 6. enforce the step budget
//! 7. encode the next observation

use std::f64::consts::TAU;
use std::fmt;

use nalgebra::Vector3;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use arm_rl_core::{ContinuousAction, RLError, Result, Reward, VectorObservation};

use crate::actuator::JointActuator;
use crate::config::ArmEnvConfig;
use crate::contact::{ContactFrame, ContactSource, ContactTag};
use crate::encoder::ObservationEncoder;
use crate::grasp::{GraspController, GraspState, ReleasePolicy, Target};
use crate::kinematics::ArmKinematicsState;
use crate::pose::PoseInterface;
use crate::scene::{ArmLayout, KinematicChain};
use crate::shaping::{RewardBreakdown, RewardShaper};

/// How an episode ended
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EpisodeOutcome {
    /// Goal reached
    Succeeded,
    /// Arm hit the ground
    Failed,
    /// Claw let go of the target
    Released,
    /// Step budget exhausted
    Truncated,
    /// Reset before the episode finished
    Interrupted,
}

impl fmt::Display for EpisodeOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Succeeded => "succeeded",
            Self::Failed => "failed",
            Self::Released => "released",
            Self::Truncated => "truncated",
            Self::Interrupted => "interrupted",
        };
        f.write_str(name)
    }
}

/// Lifecycle phase of the controller
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EpisodePhase {
    /// Joints not yet captured
    Uninitialized,
    /// Waiting for the first episode
    Ready,
    /// Accepting steps
    Running,
    /// Finished, waiting for the next episode
    Ended(EpisodeOutcome),
}

/// Previous episode's result, for a renderer to show
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum OutcomeIndicator {
    /// The goal was touched
    Success,
    /// It was not
    Failure,
}

/// Counters and carried values of the current episode
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EpisodeState {
    /// One-based index of the current episode, zero before the first
    pub episode_index: u64,
    /// Reward accumulated this episode, terminal rewards included
    pub cumulative_reward: f64,
    /// Tip-to-target distance at the end of the last tick
    pub previous_distance_to_goal: f64,
    /// Whether the goal was touched; cleared when the next episode begins
    pub touched_goal_last_episode: bool,
    /// Ticks taken this episode
    pub steps: usize,
    /// Result of the previous episode; the first episode starts on `Failure`
    pub indicator: Option<OutcomeIndicator>,
}

/// Target placement around the arm base
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TargetSpawn {
    /// Inner radius of the annulus
    pub min_radius: f64,
    /// Outer radius of the annulus
    pub max_radius: f64,
    /// Fixed height of the target
    pub height: f64,
}

impl Default for TargetSpawn {
    fn default() -> Self {
        Self {
            min_radius: 1.0,
            max_radius: 3.0,
            height: 0.1,
        }
    }
}

impl TargetSpawn {
    /// Uniform angle and uniform radius around `base`, so density rises toward
    /// the inner edge
    pub fn sample<R: Rng + ?Sized>(&self, rng: &mut R, base: Vector3<f64>) -> Vector3<f64> {
        let angle = rng.gen_range(0.0..TAU);
        let radius = rng.gen_range(self.min_radius..=self.max_radius);
        Vector3::new(
            base.x + angle.cos() * radius,
            self.height,
            base.z + angle.sin() * radius,
        )
    }
}

/// Everything produced by one tick
#[derive(Debug, Clone)]
pub struct StepReport {
    /// Observation after the tick
    pub observation: VectorObservation,
    /// Shaping plus any terminal reward of this tick
    pub reward: Reward,
    /// Shaping terms
    pub breakdown: RewardBreakdown,
    /// Tip-to-target distance after actuation
    pub distance: f64,
    /// Set when the tick ended the episode
    pub outcome: Option<EpisodeOutcome>,
    /// Whether the claw holds the target
    pub grasped: bool,
}

/// State machine driving one arm
pub struct EpisodeController<P: PoseInterface = KinematicChain> {
    pose: P,
    arm: ArmKinematicsState,
    grasp: Option<GraspController>,
    target: Target,
    actuator: JointActuator,
    encoder: ObservationEncoder,
    shaper: RewardShaper,
    spawn: TargetSpawn,
    release_policy: ReleasePolicy,
    time_step: f64,
    max_steps: Option<usize>,
    observation_size: Option<usize>,
    rng: StdRng,
    phase: EpisodePhase,
    state: EpisodeState,
    pending: Vec<ContactTag>,
}

impl<P: PoseInterface> EpisodeController<P> {
    /// Controller over a scene; handles are checked against `pose`
    pub fn new(pose: P, layout: &ArmLayout, config: &ArmEnvConfig) -> Result<Self> {
        config.validate()?;
        let arm = ArmKinematicsState::new(layout);
        arm.validate(&pose)?;

        let grasp = config
            .variant
            .has_claw()
            .then(|| GraspController::new(config.grasp.clone()));
        let encoder = ObservationEncoder::new(&arm, grasp.is_some());
        let rng = config
            .environment
            .seed
            .map_or_else(StdRng::from_entropy, StdRng::seed_from_u64);

        Ok(Self {
            pose,
            arm,
            grasp,
            target: Target::at(Vector3::new(0.0, config.target.height, 0.0)),
            actuator: JointActuator::new(config.rotation_speed, config.time_step),
            encoder,
            shaper: RewardShaper::new(config.reward.clone()),
            spawn: config.target.clone(),
            release_policy: config.grasp.release_policy,
            time_step: config.time_step,
            max_steps: config.environment.max_steps,
            observation_size: config.observation_size,
            rng,
            phase: EpisodePhase::Uninitialized,
            state: EpisodeState::default(),
            pending: Vec::new(),
        })
    }

    /// Capture the rest pose; allowed once per controller
    pub fn initialize(&mut self) -> Result<()> {
        if self.phase != EpisodePhase::Uninitialized {
            return Err(RLError::InvalidState("controller already initialized".to_string()));
        }
        self.encoder.validate(self.observation_size)?;
        self.arm.capture_initial(&self.pose);
        self.state = EpisodeState::default();
        self.phase = EpisodePhase::Ready;
        info!(
            joints = self.arm.joints().len(),
            reach = self.arm.reach(&self.pose),
            observation = self.encoder.len(),
            "arm initialized"
        );
        Ok(())
    }

    /// Start a new episode and return its first observation
    ///
    /// A running episode is closed as interrupted, without terminal reward.
    pub fn begin_episode(&mut self) -> Result<VectorObservation> {
        match self.phase {
            EpisodePhase::Uninitialized => {
                return Err(RLError::InvalidState("begin_episode before initialize".to_string()));
            }
            EpisodePhase::Running => self.end(EpisodeOutcome::Interrupted),
            EpisodePhase::Ready | EpisodePhase::Ended(_) => {}
        }

        self.state.indicator = Some(if self.state.touched_goal_last_episode {
            OutcomeIndicator::Success
        } else {
            OutcomeIndicator::Failure
        });
        self.state.touched_goal_last_episode = false;
        self.state.episode_index += 1;
        self.state.cumulative_reward = 0.0;
        self.state.steps = 0;
        self.pending.clear();

        self.arm.reset_to_initial(&mut self.pose);
        let (frame, tip) = (self.arm.frame(), self.arm.tip());
        if let Some(claw) = &mut self.grasp {
            claw.reset(&mut self.target, &self.pose, frame, tip);
        }
        let base = self.arm.base_position(&self.pose);
        self.target = Target::at(self.spawn.sample(&mut self.rng, base));
        self.state.previous_distance_to_goal = self.distance_to_goal();
        self.phase = EpisodePhase::Running;

        info!(
            episode = self.state.episode_index,
            target = ?self.target_position(),
            distance = self.state.previous_distance_to_goal,
            "episode started"
        );
        Ok(self.observe())
    }

    /// Advance one tick
    pub fn step(&mut self, signals: &[f64], contacts: &dyn ContactSource) -> Result<StepReport> {
        if self.phase != EpisodePhase::Running {
            return Err(RLError::InvalidState(format!("step while {:?}", self.phase)));
        }
        if signals.len() != self.control_size() {
            return Err(RLError::DimensionMismatch {
                expected: self.control_size(),
                actual: signals.len(),
            });
        }
        if signals.iter().any(|s| !s.is_finite()) {
            return Err(RLError::InvalidAction(format!("non-finite control signal in {signals:?}")));
        }
        let action = ContinuousAction::from(signals.to_vec()).clipped(-1.0, 1.0);
        let signals = action.as_slice();

        let joint_count = self.arm.joints().len();
        // claw rotation is the last joint and gets the same speed * dt scaling
        for (joint, signal) in self.arm.joints_mut().iter_mut().zip(signals) {
            let _ = self.actuator.drive(joint, &mut self.pose, *signal);
        }
        if let Some(claw) = &mut self.grasp {
            claw.advance_progress(signals[joint_count], self.time_step);
        }
        self.state.steps += 1;

        let mut tags = std::mem::take(&mut self.pending);
        tags.extend(contacts.detect(&self.contact_frame()));

        let distance = self.distance_to_goal();
        let (frame, tip) = (self.arm.frame(), self.arm.tip());
        if let Some(claw) = &mut self.grasp {
            if claw.try_grasp(&mut self.target, &self.pose, frame, tip, distance) {
                debug!(episode = self.state.episode_index, step = self.state.steps, "grasp");
            }
        }

        let (breakdown, carried) = self.shaper.step_reward(
            self.state.previous_distance_to_goal,
            distance,
            signals,
            self.grasp.as_ref(),
        );
        self.state.previous_distance_to_goal = carried;
        let mut reward = Reward(breakdown.total());
        self.state.cumulative_reward += reward.0;

        for tag in tags {
            if let Some(terminal) = self.handle_tag(tag) {
                reward += terminal;
            }
        }

        if self.phase == EpisodePhase::Running {
            if let Some(claw) = &mut self.grasp {
                if claw.should_release() {
                    claw.release(&mut self.target, &self.pose, frame, tip);
                    if self.release_policy == ReleasePolicy::EndEpisode {
                        self.end(EpisodeOutcome::Released);
                    }
                }
            }
        }

        if self.phase == EpisodePhase::Running && self.max_steps.is_some_and(|max| self.state.steps >= max) {
            self.end(EpisodeOutcome::Truncated);
        }

        Ok(StepReport {
            observation: self.observe(),
            reward,
            breakdown,
            distance,
            outcome: self.outcome(),
            grasped: self.grasp.as_ref().is_some_and(GraspController::is_grasped),
        })
    }

    /// Queue a collision tag for the next tick
    pub fn notify(&mut self, tag: ContactTag) {
        if self.phase == EpisodePhase::Running {
            self.pending.push(tag);
        } else {
            debug!(%tag, phase = ?self.phase, "ignoring tag outside an episode");
        }
    }

    fn handle_tag(&mut self, tag: ContactTag) -> Option<Reward> {
        match tag {
            ContactTag::Goal => self.succeed(),
            ContactTag::Ground => self.fail(),
        }
    }

    /// Goal reached: terminal reward once, then the episode ends
    pub fn succeed(&mut self) -> Option<Reward> {
        if self.phase != EpisodePhase::Running {
            return None;
        }
        let reward = self.shaper.success();
        self.state.cumulative_reward += reward.0;
        self.state.touched_goal_last_episode = true;
        self.end(EpisodeOutcome::Succeeded);
        Some(reward)
    }

    /// Failure: terminal penalty once, then the episode ends
    pub fn fail(&mut self) -> Option<Reward> {
        if self.phase != EpisodePhase::Running {
            return None;
        }
        let reward = self.shaper.failure();
        self.state.cumulative_reward += reward.0;
        self.end(EpisodeOutcome::Failed);
        Some(reward)
    }

    fn end(&mut self, outcome: EpisodeOutcome) {
        self.phase = EpisodePhase::Ended(outcome);
        if outcome == EpisodeOutcome::Interrupted {
            warn!(episode = self.state.episode_index, steps = self.state.steps, "episode interrupted");
            return;
        }
        info!(
            episode = self.state.episode_index,
            %outcome,
            reward = self.state.cumulative_reward,
            steps = self.state.steps,
            "episode ended"
        );
    }

    fn contact_frame(&self) -> ContactFrame {
        ContactFrame {
            tip: self.arm.end_effector_position(&self.pose),
            links: self.arm.link_positions(&self.pose),
            target: self.target_position(),
            target_held: self.target.is_held(),
        }
    }

    /// Encode the present state
    #[must_use]
    pub fn observe(&self) -> VectorObservation {
        self.encoder.encode(
            &self.arm,
            &self.pose,
            self.grasp_state(),
            self.target_position(),
        )
    }

    /// Move the target; the distance carried into the next tick follows it
    pub fn place_target(&mut self, position: Vector3<f64>) {
        if let Some(claw) = &mut self.grasp {
            claw.release(&mut self.target, &self.pose, self.arm.frame(), self.arm.tip());
        }
        self.target = Target::at(position);
        self.state.previous_distance_to_goal = self.distance_to_goal();
    }

    /// Current tip-to-target distance
    #[must_use]
    pub fn distance_to_goal(&self) -> f64 {
        (self.arm.end_effector_position(&self.pose) - self.target_position()).norm()
    }

    /// Target position in the reference frame
    #[must_use]
    pub fn target_position(&self) -> Vector3<f64> {
        self.target
            .local_position(&self.pose, self.arm.frame(), self.arm.tip())
    }

    /// Number of control signals per tick
    #[must_use]
    pub fn control_size(&self) -> usize {
        self.arm.joints().len() + usize::from(self.grasp.is_some())
    }

    /// Length of every observation
    #[must_use]
    pub fn observation_size(&self) -> usize {
        self.encoder.len()
    }

    /// Observation encoder
    #[must_use]
    pub fn encoder(&self) -> &ObservationEncoder {
        &self.encoder
    }

    /// Lifecycle phase
    #[must_use]
    pub fn phase(&self) -> EpisodePhase {
        self.phase
    }

    /// How the last episode ended, if it has
    #[must_use]
    pub fn outcome(&self) -> Option<EpisodeOutcome> {
        match self.phase {
            EpisodePhase::Ended(outcome) => Some(outcome),
            _ => None,
        }
    }

    /// Episode counters
    #[must_use]
    pub fn state(&self) -> &EpisodeState {
        &self.state
    }

    /// Claw state, grasp task only
    #[must_use]
    pub fn grasp_state(&self) -> Option<GraspState> {
        self.grasp.as_ref().map(GraspController::state)
    }

    /// Arm joints
    #[must_use]
    pub fn arm(&self) -> &ArmKinematicsState {
        &self.arm
    }

    /// Scene
    #[must_use]
    pub fn pose(&self) -> &P {
        &self.pose
    }
}
