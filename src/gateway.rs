//! One invocation: decode, evaluate, record, emit.
//!
//! `Start → Decoded → Evaluated → Logged → Emitted`. A decode failure jumps
//! straight to emission with the configured [`FailureMode`]. An audit
//! failure is logged and otherwise ignored.

use std::io::{Read, Write};

use log::{debug, error, warn};

use crate::audit::AuditLog;
use crate::config::Config;
use crate::emit::{Emission, FailureMode};
use crate::error::{AuditWriteError, GatewayError, PolicyError};
use crate::event::{self, ToolInvocationEvent, decode::DEFAULT_MAX_BYTES};
use crate::policy::{Decision, PolicyEngine};

/// Last step an invocation completed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Stage {
    Start,
    Decoded,
    Evaluated,
    Logged,
    Emitted,
}

/// Everything that happened to one invocation before emission.
#[derive(Debug)]
pub struct Outcome {
    pub stage: Stage,
    pub event: Option<ToolInvocationEvent>,
    pub decision: Option<Decision>,
    pub emission: Emission,
    /// Set when the audit append failed. The emission is unaffected.
    pub audit_error: Option<AuditWriteError>,
    /// Set when no decision could be reached.
    pub failure: Option<GatewayError>,
}

impl Outcome {
    /// Deliver the emission and return the exit status.
    ///
    /// If the diagnostic cannot be written the status still stands and the
    /// stage stays where processing left it.
    pub fn emit<W: Write>(&mut self, diag: &mut W) -> i32 {
        match self.emission.emit(diag) {
            Ok(status) => {
                debug!("emitted status {status} after {:?}", self.stage);
                self.stage = Stage::Emitted;
                status
            }
            Err(e) => {
                error!("{e}");
                self.emission.status
            }
        }
    }
}

pub struct Gateway {
    engine: PolicyEngine,
    audit: AuditLog,
    failure_mode: FailureMode,
    max_input_bytes: usize,
}

impl Gateway {
    pub fn new(engine: PolicyEngine, audit: AuditLog) -> Self {
        Self {
            engine,
            audit,
            failure_mode: FailureMode::default(),
            max_input_bytes: DEFAULT_MAX_BYTES,
        }
    }

    pub fn from_config(config: &Config) -> Result<Self, PolicyError> {
        Ok(Self::new(
            PolicyEngine::from_config(config)?,
            AuditLog::from_config(&config.audit),
        )
        .with_failure_mode(FailureMode::from_fail_closed(config.settings.fail_closed))
        .with_max_input_bytes(config.input.max_bytes))
    }

    pub fn with_failure_mode(mut self, mode: FailureMode) -> Self {
        self.failure_mode = mode;
        self
    }

    pub fn with_max_input_bytes(mut self, max: usize) -> Self {
        self.max_input_bytes = max;
        self
    }

    pub fn failure_mode(&self) -> FailureMode {
        self.failure_mode
    }

    /// Decode, evaluate and record one invocation without emitting.
    pub fn process<R: Read>(&self, input: R) -> Outcome {
        let event = match event::read_event(input, self.max_input_bytes) {
            Ok(event) => event,
            Err(e) => {
                let failure = GatewayError::from(e);
                error!("{failure}; failing {:?}", self.failure_mode);
                return Outcome {
                    stage: Stage::Start,
                    event: None,
                    decision: None,
                    emission: Emission::internal_failure(self.failure_mode),
                    audit_error: None,
                    failure: Some(failure),
                };
            }
        };
        let mut stage = Stage::Decoded;
        debug!(
            "decoded {} event: tool={:?} path={:?}",
            event.phase().as_str(),
            event.tool_name(),
            event.operation_path()
        );

        let decision = self.engine.evaluate(&event);
        stage = Stage::Evaluated;
        debug!(
            "evaluated: {} (rule {:?})",
            decision.verdict().as_str(),
            decision.rule()
        );

        let audit_error = match self.audit.record(&event) {
            Ok(path) => {
                debug!("audit line appended to {}", path.display());
                stage = Stage::Logged;
                None
            }
            Err(e) => {
                warn!("audit log degraded: {e}");
                Some(e)
            }
        };

        Outcome {
            stage,
            emission: Emission::from_decision(&decision, &event),
            event: Some(event),
            decision: Some(decision),
            audit_error,
            failure: None,
        }
    }

    /// Run one full invocation and return the exit status.
    pub fn run<R: Read, W: Write>(&self, input: R, diag: &mut W) -> i32 {
        self.process(input).emit(diag)
    }
}
