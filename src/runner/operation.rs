//! Operation execution
//!
//! Runs the ordered steps of an [`Operation`] through a [`ShellExecutor`],
//! applying the fail-fast or collect-all policy and forwarding each step's
//! output as soon as it finishes.

use crate::config::{Operation, ProjectDefinition, Stage};
use crate::error::{ExecutionError, ExecutionResult};
use crate::runner::{build_environment, CommandResult, Context, ShellExecutor};
use crate::ui::print_wide_line_to;
use std::ffi::OsString;
use std::io::{self, Stderr, Stdout, Write};
use std::time::Instant;
use tracing::{debug, info, warn};

/// Drives operations and forwards step output to two sinks
pub struct OperationRunner<O: Write, E: Write> {
    out: O,
    err: E,
}

impl OperationRunner<Stdout, Stderr> {
    /// Runner writing to the process's standard streams
    pub fn stdio() -> Self {
        OperationRunner::new(io::stdout(), io::stderr())
    }
}

impl<O: Write, E: Write> OperationRunner<O, E> {
    pub fn new(out: O, err: E) -> Self {
        OperationRunner { out, err }
    }

    /// Return the output sinks
    pub fn into_inner(self) -> (O, E) {
        (self.out, self.err)
    }

    /// Run every step of `operation` in order.
    ///
    /// The merged environment is installed on the executor once, before the
    /// first step. An empty operation succeeds without touching the executor.
    pub async fn run<X: ShellExecutor + ?Sized>(
        &mut self,
        ctx: &Context,
        operation: &Operation,
        ambient: &[(OsString, OsString)],
        executor: &mut X,
    ) -> ExecutionResult<()> {
        if operation.is_empty() {
            return Ok(());
        }

        if !operation.env.is_empty() {
            let mut keys: Vec<&str> = operation.env.keys().map(String::as_str).collect();
            keys.sort_unstable();
            info!(
                count = keys.len(),
                keys = ?keys,
                "Loading additional environment variable(s)"
            );
        }
        executor.add_env(build_environment(ambient, &operation.env));

        let result = self.run_steps(ctx, operation, executor).await;
        log_write_error(print_wide_line_to(&mut self.out, '='));
        result
    }

    async fn run_steps<X: ShellExecutor + ?Sized>(
        &mut self,
        ctx: &Context,
        operation: &Operation,
        executor: &mut X,
    ) -> ExecutionResult<()> {
        let mut failed_steps = Vec::new();

        for (idx, step) in operation.steps.iter().enumerate() {
            log_write_error(writeln!(self.out, "[{}] {}", idx + 1, step));

            match executor.execute(ctx, step).await {
                Ok(result) => {
                    self.forward(&result);
                    if result.success() {
                        debug!(step = idx + 1, command = %step, "step succeeded");
                        continue;
                    }

                    warn!(step = idx + 1, command = %step, exit_code = result.exit_code, "step failed");
                    if operation.fail_fast {
                        return Err(ExecutionError::CommandFailed {
                            command: step.clone(),
                            exit_code: result.exit_code,
                        });
                    }
                    failed_steps.push(step.clone());
                }
                Err(err) => {
                    warn!(step = idx + 1, command = %step, error = %err, "step could not complete");
                    // Nothing further can run under an ended context
                    if operation.fail_fast || err.is_cancelled() {
                        return Err(err);
                    }
                    failed_steps.push(step.clone());
                }
            }
        }

        if failed_steps.is_empty() {
            Ok(())
        } else {
            Err(ExecutionError::StepsFailed(failed_steps))
        }
    }

    fn forward(&mut self, result: &CommandResult) {
        write_block(&mut self.out, &result.stdout);
        write_block(&mut self.err, &result.stderr);
    }

    /// Run the operation behind a stage.
    ///
    /// An empty stage logs a warning and succeeds; failures are wrapped with
    /// the stage name.
    pub async fn run_stage<X: ShellExecutor + ?Sized>(
        &mut self,
        ctx: &Context,
        definition: &ProjectDefinition,
        stage: Stage,
        ambient: &[(OsString, OsString)],
        executor: &mut X,
    ) -> ExecutionResult<()> {
        let operation = definition.operation(stage);
        if operation.is_empty() {
            warn!("No {} steps defined in the configuration.", stage);
            return Ok(());
        }

        let started = Instant::now();
        self.run(ctx, operation, ambient, executor)
            .await
            .map_err(|source| ExecutionError::Stage {
                stage,
                source: Box::new(source),
            })?;

        info!(
            stage = %stage,
            duration_ms = started.elapsed().as_millis() as u64,
            "{} completed successfully",
            stage
        );
        Ok(())
    }
}

/// Write captured output, terminating it with a newline if it lacks one
fn write_block<W: Write>(w: &mut W, text: &str) {
    if text.is_empty() {
        return;
    }
    let written = if text.ends_with('\n') {
        w.write_all(text.as_bytes())
    } else {
        writeln!(w, "{}", text)
    };
    log_write_error(written.and_then(|()| w.flush()));
}

/// A closed stream (e.g. EPIPE) must not fail the step, but is logged
fn log_write_error(result: io::Result<()>) {
    if let Err(err) = result {
        debug!(error = %err, "failed to write step output");
    }
}
