// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The explicit context threaded through every engine operation.
//!
//! Replaces the module-scope mutable config/roots of older tooling: one
//! `EngineCtx` is built at the CLI boundary and passed down.

use chrono::{DateTime, Utc};
use lf_core::{ActorId, Clock, Config, LfPaths, SystemClock};
use std::sync::Arc;

/// Per-process operation context.
#[derive(Clone)]
pub struct EngineCtx {
    pub paths: LfPaths,
    pub config: Config,
    pub clock: Arc<dyn Clock>,
    pub actor: Option<ActorId>,
}

impl EngineCtx {
    pub fn new(paths: LfPaths, config: Config) -> Self {
        Self {
            paths,
            config,
            clock: Arc::new(SystemClock),
            actor: None,
        }
    }

    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    pub fn with_actor(mut self, actor: ActorId) -> Self {
        self.actor = Some(actor);
        self
    }

    pub fn now(&self) -> DateTime<Utc> {
        self.clock.now_utc()
    }

    /// Lane branch name for a lane.
    pub fn lane_branch(&self, lane: &str) -> String {
        format!("lane/{}", lf_core::lane_slug(lane))
    }

    /// Trunk branch from config.
    pub fn trunk(&self) -> &str {
        &self.config.engine.trunk
    }
}
