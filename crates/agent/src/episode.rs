use std::fs::File;
use std::io::BufWriter;

use duel_shared::*;
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::learning::TableError;
use crate::policy::Controller;
use crate::recorder::EpisodeRecorder;
use crate::transport::{Inbound, Outbox, Transport, TransportError};

#[derive(Debug, Error)]
pub enum EpisodeError {
    #[error(transparent)]
    Transport(#[from] TransportError),
    #[error("failed to persist Q-table: {0}")]
    Persist(#[from] TableError),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoopState {
    Running,
    Terminated(EpisodeEndReason),
}

enum Received {
    Frame(TelemetryFrame),
    /// Malformed, or not the participant this slot expects. The cycle starts over.
    Skipped,
    TimedOut,
}

/// One episode: telemetry pairs in, one command out per complete pair, until a
/// terminal condition.
pub struct EpisodeLoop<T: Transport> {
    config: ControllerConfig,
    transport: T,
    controller: Box<dyn Controller>,
    outbox: Outbox,
    recorder: Option<EpisodeRecorder<BufWriter<File>>>,
    /// Last command handed to the transport; held on the terminal tick.
    last_command: Command,
    final_timer: u64,
    cycles: u64,
    commands_sent: u64,
    send_failures: u64,
    dropped_frames: u64,
    discarded_frames: u64,
}

impl<T: Transport> EpisodeLoop<T> {
    pub fn new(config: ControllerConfig, transport: T, controller: Box<dyn Controller>) -> Self {
        let outbox = Outbox::new(config.participant);
        Self {
            config,
            transport,
            controller,
            outbox,
            recorder: None,
            last_command: Command::none(),
            final_timer: 0,
            cycles: 0,
            commands_sent: 0,
            send_failures: 0,
            dropped_frames: 0,
            discarded_frames: 0,
        }
    }

    pub fn with_recorder(mut self, recorder: EpisodeRecorder<BufWriter<File>>) -> Self {
        self.recorder = Some(recorder);
        self
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    /// Run cycles until the episode terminates, then persist the learner's table.
    ///
    /// A transport error aborts the episode, but the table is saved before the
    /// error is returned.
    pub fn run(&mut self) -> Result<EpisodeSummary, EpisodeError> {
        info!(
            controller = self.controller.name(),
            participant = self.config.participant,
            "episode started"
        );
        let reason = loop {
            match self.step() {
                Ok(LoopState::Running) => {}
                Ok(LoopState::Terminated(reason)) => break reason,
                Err(e) => {
                    warn!(error = %e, cycles = self.cycles, "episode aborted");
                    if let Err(persist) = self.persist() {
                        warn!(error = %persist, "Q-table not saved after abort");
                    }
                    return Err(e);
                }
            }
        };
        self.finish(reason)
    }

    /// One cycle. Nothing is sent unless a complete frame pair arrived.
    pub fn step(&mut self) -> Result<LoopState, EpisodeError> {
        let first = match self.receive(PARTICIPANT_ONE)? {
            Received::Frame(f) => f,
            Received::Skipped => return Ok(LoopState::Running),
            Received::TimedOut => return Ok(LoopState::Terminated(EpisodeEndReason::ChannelTimeout)),
        };
        let second = match self.receive(PARTICIPANT_TWO)? {
            Received::Frame(f) => f,
            Received::Skipped => return Ok(LoopState::Running),
            Received::TimedOut => return Ok(LoopState::Terminated(EpisodeEndReason::ChannelTimeout)),
        };
        self.cycles += 1;

        let (me, enemy) = if self.config.participant == PARTICIPANT_ONE {
            (first, second)
        } else {
            (second, first)
        };
        self.final_timer = me.timer;

        // No action on a terminal tick: the previous command is held, never firing.
        let ending = self.scripted_ending(&me, &enemy);
        let command = match ending {
            None => {
                let command = self.controller.act(&me, &enemy);
                if command.fire {
                    self.outbox.fire();
                }
                command
            }
            Some(reason) => {
                info!(
                    ?reason,
                    timer = me.timer,
                    enemy_health = enemy.health,
                    power = me.power,
                    "episode ending"
                );
                self.controller.on_terminal(reason, &me, &enemy);
                if reason.sends_reset() {
                    self.outbox.reset();
                }
                Command {
                    fire: false,
                    ..self.last_command
                }
            }
        };
        self.last_command = command;

        if let Some(recorder) = self.recorder.as_mut() {
            if let Err(e) = recorder.record(&me, &enemy, &command) {
                warn!(error = %e, "episode recording failed, disabling");
                self.recorder = None;
            }
        }

        match self.outbox.send(&mut self.transport, me.timer, &command) {
            Ok(frame) => {
                self.commands_sent += 1;
                debug!(
                    timer = me.timer,
                    thrust = command.thrust,
                    steering = command.steering,
                    declination = command.turret_declination,
                    turret_bearing = command.turret_bearing,
                    code = ?frame.code,
                    "command sent"
                );
            }
            Err(e) => {
                self.send_failures += 1;
                warn!(error = %e, timer = me.timer, "command send failed");
            }
        }

        Ok(match ending {
            Some(reason) => LoopState::Terminated(reason),
            None => LoopState::Running,
        })
    }

    fn receive(&mut self, expected: i32) -> Result<Received, EpisodeError> {
        let datagram = match self.transport.recv()? {
            Inbound::Datagram(d) => d,
            Inbound::TimedOut => return Ok(Received::TimedOut),
        };
        let frame = match decode_telemetry(&datagram) {
            Ok(f) => f,
            Err(e) => {
                self.dropped_frames += 1;
                warn!(error = %e, "dropping telemetry datagram");
                return Ok(Received::Skipped);
            }
        };
        if frame.number != expected {
            self.discarded_frames += 1;
            debug!(expected, got = frame.number, "out-of-order frame, restarting cycle");
            return Ok(Received::Skipped);
        }
        Ok(Received::Frame(frame))
    }

    /// Checked in order: enemy destroyed, time limit, power depleted.
    fn scripted_ending(&self, me: &TelemetryFrame, enemy: &TelemetryFrame) -> Option<EpisodeEndReason> {
        let limits = &self.config.episode;
        if enemy.health < limits.destroyed_health {
            Some(EpisodeEndReason::EnemyDestroyed)
        } else if me.timer > limits.time_limit_ticks {
            Some(EpisodeEndReason::TimeLimit)
        } else if me.power < limits.min_power {
            Some(EpisodeEndReason::PowerDepleted)
        } else {
            None
        }
    }

    /// Save the learner's table, if the controller has one. Returns its row count.
    fn persist(&self) -> Result<usize, EpisodeError> {
        match self.controller.learner() {
            Some(agent) => {
                agent.persist(&self.config.persistence.q_table_path)?;
                Ok(agent.table().len())
            }
            None => Ok(0),
        }
    }

    fn finish(&mut self, reason: EpisodeEndReason) -> Result<EpisodeSummary, EpisodeError> {
        let q_states = self.persist()?;

        let summary = EpisodeSummary {
            controller: self.controller.name().to_string(),
            reason,
            final_timer: self.final_timer,
            cycles: self.cycles,
            commands_sent: self.commands_sent,
            send_failures: self.send_failures,
            dropped_frames: self.dropped_frames,
            discarded_frames: self.discarded_frames,
            stats: self.controller.stats(),
            q_states,
        };
        info!(
            ?reason,
            cycles = summary.cycles,
            fired = summary.stats.fired,
            hits = summary.stats.hits,
            total_reward = summary.stats.total_reward,
            "episode complete"
        );
        Ok(summary)
    }
}
