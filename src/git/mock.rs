use crate::error::Result;
use crate::git::{ProcessOutput, ProcessRunner};
use std::cell::RefCell;
use std::collections::{HashMap, VecDeque};
use std::path::Path;

/// Scripted [ProcessRunner] for testing without launching processes.
///
/// Responses are keyed by the space-joined command line. When several
/// responses are queued for the same command they are consumed in order; the
/// last one is repeated for any further invocations, so a command issued
/// once per package only needs to be scripted once. Commands with no
/// scripted response come back as a failed invocation, mirroring a command
/// the environment cannot satisfy.
///
/// Every invocation is recorded, which is what the memoization tests use to
/// assert that tag resolution runs its subprocess sequence at most once.
pub struct ScriptedRunner {
    responses: RefCell<HashMap<String, VecDeque<ProcessOutput>>>,
    calls: RefCell<Vec<String>>,
}

impl ScriptedRunner {
    pub fn new() -> Self {
        ScriptedRunner {
            responses: RefCell::new(HashMap::new()),
            calls: RefCell::new(Vec::new()),
        }
    }

    /// Queue a response for the given space-joined command line
    pub fn add_response(&mut self, command: impl Into<String>, output: ProcessOutput) {
        self.responses
            .borrow_mut()
            .entry(command.into())
            .or_default()
            .push_back(output);
    }

    /// Every command line this runner has executed, in order
    pub fn calls(&self) -> Vec<String> {
        self.calls.borrow().clone()
    }

    /// How many recorded command lines start with `prefix`
    pub fn call_count(&self, prefix: &str) -> usize {
        self.calls
            .borrow()
            .iter()
            .filter(|call| call.starts_with(prefix))
            .count()
    }
}

impl Default for ScriptedRunner {
    fn default() -> Self {
        Self::new()
    }
}

impl ProcessRunner for ScriptedRunner {
    fn run(&self, args: &[&str], _cwd: Option<&Path>) -> Result<ProcessOutput> {
        let command = args.join(" ");
        self.calls.borrow_mut().push(command.clone());

        let mut responses = self.responses.borrow_mut();
        match responses.get_mut(&command) {
            Some(queue) => {
                let output = if queue.len() > 1 {
                    queue.pop_front()
                } else {
                    queue.front().cloned()
                };
                Ok(output
                    .unwrap_or_else(|| ProcessOutput::failed(1, "scripted queue exhausted")))
            }
            None => Ok(ProcessOutput::failed(
                1,
                format!("no scripted response for '{}'", command),
            )),
        }
    }
}
