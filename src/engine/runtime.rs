// src/engine/runtime.rs

use std::fmt;

use tokio::sync::{broadcast, mpsc};
use tracing::{debug, info};

use crate::dag::ScheduledTask;
use crate::errors::Result;
use crate::exec::ExecutorBackend;
use crate::types::ReloadKind;

use super::core::CoreRuntime;
use super::{CoreCommand, RunSummary, RuntimeEvent};

/// Async IO shell around [`CoreRuntime`].
///
/// Reads `RuntimeEvent`s, feeds them to the core, dispatches scheduled tasks
/// to an [`ExecutorBackend`] and forwards reloads to the dev server.
pub struct Runtime<E: ExecutorBackend> {
    core: CoreRuntime,
    event_rx: mpsc::Receiver<RuntimeEvent>,
    executor: E,
    reload_tx: Option<broadcast::Sender<ReloadKind>>,
}

impl<E: ExecutorBackend> fmt::Debug for Runtime<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Runtime")
            .field("core", &self.core)
            .finish_non_exhaustive()
    }
}

impl<E: ExecutorBackend> Runtime<E> {
    pub fn new(core: CoreRuntime, event_rx: mpsc::Receiver<RuntimeEvent>, executor: E) -> Self {
        Self {
            core,
            event_rx,
            executor,
            reload_tx: None,
        }
    }

    /// Post `CoreCommand::Reload`s on this channel.
    pub fn with_reload_sender(mut self, reload_tx: broadcast::Sender<ReloadKind>) -> Self {
        self.reload_tx = Some(reload_tx);
        self
    }

    /// Main event loop. Returns what happened once the core asks to stop or
    /// the event channel closes.
    pub async fn run(mut self) -> Result<RunSummary> {
        debug!("runtime started");

        loop {
            let Some(event) = self.event_rx.recv().await else {
                info!("runtime event channel closed; exiting");
                break;
            };

            debug!(?event, "runtime received event");
            let step = self.core.step(event);

            for command in step.commands {
                self.execute_command(command).await?;
            }

            if !step.keep_running {
                debug!("core requested exit; stopping runtime");
                break;
            }
        }

        Ok(self.core.into_summary())
    }

    async fn execute_command(&mut self, command: CoreCommand) -> Result<()> {
        match command {
            CoreCommand::DispatchTasks(tasks) => self.spawn_ready(tasks).await?,
            CoreCommand::Reload(kind) => self.post_reload(kind),
            CoreCommand::RequestExit => debug!("core issued RequestExit"),
        }
        Ok(())
    }

    fn post_reload(&self, kind: ReloadKind) {
        let Some(tx) = &self.reload_tx else {
            return;
        };
        // `send` only fails when no browser is connected.
        let clients = tx.send(kind).unwrap_or(0);
        info!(reload = kind.as_event_data(), clients, "posted reload");
    }

    async fn spawn_ready(&mut self, tasks: Vec<ScheduledTask>) -> Result<()> {
        if tasks.is_empty() {
            return Ok(());
        }

        let names: Vec<_> = tasks.iter().map(|t| t.name.as_str()).collect();
        debug!(?names, run_id = tasks[0].run_id, "spawning ready tasks");

        self.executor.spawn_ready_tasks(tasks).await
    }
}
