//! Script runner
//!
//! Executes [`ScriptCommand`]s against a [`CollabService`], one line at a
//! time. Engine failures are reported per step and never abort the run
//! unless `stop_on_error` is set; only I/O errors are fatal.

use super::command::ScriptCommand;
use collab_application::{CollabService, CommentQuery, CreateWorkspaceInput};
use collab_domain::{CollabResult, Failure, ProposalStatus, Role, VoteChoice};
use serde::Serialize;
use serde_json::Value;
use std::collections::HashMap;
use std::io::BufRead;
use thiserror::Error;
use tracing::debug;

/// Errors that stop a script run
#[derive(Error, Debug)]
pub enum ScriptError {
    #[error("Failed to read script: {0}")]
    Io(#[from] std::io::Error),

    #[error("Line {line}: {message}")]
    Aborted { line: usize, message: String },
}

/// Why a line could not be turned into a command
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum InvalidLine {
    #[error("malformed command: {0}")]
    Malformed(String),

    #[error("unbound variable '${0}'")]
    UnboundVariable(String),
}

/// Outcome of one script line
#[derive(Debug, Clone, PartialEq)]
pub enum StepOutcome {
    Success(Value),
    Failed(Failure),
    Invalid(InvalidLine),
}

#[derive(Debug, Clone, PartialEq)]
pub struct StepResult {
    /// 1-based line number in the script
    pub line: usize,
    pub op: Option<&'static str>,
    pub outcome: StepOutcome,
}

impl StepResult {
    pub fn is_success(&self) -> bool {
        matches!(self.outcome, StepOutcome::Success(_))
    }
}

/// Counts per outcome kind
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct ScriptSummary {
    pub succeeded: usize,
    pub failed: usize,
    pub invalid: usize,
}

impl ScriptSummary {
    fn record(&mut self, step: &StepResult) {
        match step.outcome {
            StepOutcome::Success(_) => self.succeeded += 1,
            StepOutcome::Failed(_) => self.failed += 1,
            StepOutcome::Invalid(_) => self.invalid += 1,
        }
    }

    pub fn total(&self) -> usize {
        self.succeeded + self.failed + self.invalid
    }
}

pub struct ScriptRunner<'a> {
    service: &'a CollabService,
    bindings: HashMap<String, String>,
    stop_on_error: bool,
}

impl<'a> ScriptRunner<'a> {
    pub fn new(service: &'a CollabService) -> Self {
        Self {
            service,
            bindings: HashMap::new(),
            stop_on_error: false,
        }
    }

    /// Abort the run at the first failed or invalid line.
    pub fn with_stop_on_error(mut self, stop: bool) -> Self {
        self.stop_on_error = stop;
        self
    }

    /// Run every line of `reader`, handing each step to `on_step`.
    pub fn run<R: BufRead>(
        &mut self,
        reader: R,
        mut on_step: impl FnMut(&StepResult),
    ) -> Result<ScriptSummary, ScriptError> {
        let mut summary = ScriptSummary::default();
        for (index, line) in reader.lines().enumerate() {
            let line = line?;
            let Some(step) = self.run_line(index + 1, &line) else {
                continue;
            };
            summary.record(&step);
            on_step(&step);

            if self.stop_on_error && !step.is_success() {
                let message = match &step.outcome {
                    StepOutcome::Failed(failure) => failure.message.clone(),
                    StepOutcome::Invalid(invalid) => invalid.to_string(),
                    StepOutcome::Success(_) => String::new(),
                };
                return Err(ScriptError::Aborted {
                    line: step.line,
                    message,
                });
            }
        }
        Ok(summary)
    }

    /// Run a single line. Blank lines and `#` comments yield `None`.
    pub fn run_line(&mut self, line_no: usize, line: &str) -> Option<StepResult> {
        let trimmed = line.trim();
        if trimmed.is_empty() || trimmed.starts_with('#') {
            return None;
        }

        let (command, bind_as) = match self.parse(trimmed) {
            Ok(parsed) => parsed,
            Err(invalid) => {
                return Some(StepResult {
                    line: line_no,
                    op: None,
                    outcome: StepOutcome::Invalid(invalid),
                });
            }
        };

        let op = command.op();
        debug!("Script line {}: {}", line_no, op);
        let outcome = match self.execute(command) {
            Ok(value) => {
                if let Some(name) = bind_as
                    && let Some(id) = result_id(&value)
                {
                    self.bindings.insert(name, id);
                }
                StepOutcome::Success(value)
            }
            Err(e) => StepOutcome::Failed(e.to_failure()),
        };

        Some(StepResult {
            line: line_no,
            op: Some(op),
            outcome,
        })
    }

    fn parse(&self, line: &str) -> Result<(ScriptCommand, Option<String>), InvalidLine> {
        let mut value: Value =
            serde_json::from_str(line).map_err(|e| InvalidLine::Malformed(e.to_string()))?;

        let bind_as = match &mut value {
            Value::Object(map) => match map.remove("as") {
                Some(Value::String(name)) => Some(name),
                Some(_) => {
                    return Err(InvalidLine::Malformed("'as' must be a string".to_string()));
                }
                None => None,
            },
            _ => {
                return Err(InvalidLine::Malformed(
                    "each line must be a JSON object".to_string(),
                ));
            }
        };

        self.substitute(&mut value)?;
        let command = serde_json::from_value(value)
            .map_err(|e| InvalidLine::Malformed(e.to_string()))?;
        Ok((command, bind_as))
    }

    fn substitute(&self, value: &mut Value) -> Result<(), InvalidLine> {
        match value {
            Value::String(s) => {
                if let Some(name) = variable_name(s) {
                    let bound = self
                        .bindings
                        .get(name)
                        .ok_or_else(|| InvalidLine::UnboundVariable(name.to_string()))?;
                    *s = bound.clone();
                }
            }
            Value::Array(items) => {
                for item in items {
                    self.substitute(item)?;
                }
            }
            Value::Object(map) => {
                for item in map.values_mut() {
                    self.substitute(item)?;
                }
            }
            _ => {}
        }
        Ok(())
    }

    /// Dispatch one command to the service.
    pub fn execute(&self, command: ScriptCommand) -> CollabResult<Value> {
        let service = self.service;
        let value = match command {
            ScriptCommand::CreateWorkspace {
                owner_id,
                name,
                description,
                visibility,
                settings,
            } => {
                let mut input = CreateWorkspaceInput::new(owner_id, name);
                input.description = description;
                input.visibility = visibility;
                input.settings = settings;
                to_json(service.create_workspace(input))
            }
            ScriptCommand::GetWorkspace { workspace_id } => {
                to_json(service.get_workspace(&workspace_id)?)
            }
            ScriptCommand::ListWorkspaces { user_id } => {
                to_json(service.list_workspaces(&user_id))
            }
            ScriptCommand::GetWorkspaceRole {
                workspace_id,
                user_id,
            } => {
                let role = service.get_workspace_role(&workspace_id, &user_id)?;
                serde_json::json!({ "role": role })
            }
            ScriptCommand::AddWorkspaceMember {
                workspace_id,
                user_id,
                role,
                invited_by,
            } => {
                let role: Role = role.parse()?;
                to_json(service.add_workspace_member(
                    &workspace_id,
                    &user_id,
                    role,
                    invited_by.as_ref(),
                )?)
            }
            ScriptCommand::RemoveWorkspaceMember {
                workspace_id,
                user_id,
            } => to_json(service.remove_workspace_member(&workspace_id, &user_id)?),
            ScriptCommand::AddDtuToWorkspace {
                workspace_id,
                dtu_id,
            } => {
                let added = service.add_dtu_to_workspace(&workspace_id, &dtu_id)?;
                serde_json::json!({ "dtu_id": dtu_id, "added": added })
            }

            ScriptCommand::AddComment {
                dtu_id,
                user_id,
                text,
                parent_id,
            } => to_json(service.add_comment(&dtu_id, &user_id, text, parent_id.as_ref())?),
            ScriptCommand::GetComments {
                dtu_id,
                tree,
                limit,
            } => {
                let query = if tree {
                    CommentQuery::tree()
                } else {
                    CommentQuery::flat(limit)
                };
                to_json(service.get_comments(&dtu_id, query))
            }
            ScriptCommand::EditComment {
                comment_id,
                user_id,
                text,
            } => to_json(service.edit_comment(&comment_id, &user_id, text)?),
            ScriptCommand::ResolveComment { comment_id } => {
                to_json(service.resolve_comment(&comment_id)?)
            }
            ScriptCommand::ReactToComment {
                comment_id,
                user_id,
                emoji,
            } => to_json(service.react_to_comment(&comment_id, &user_id, &emoji)?),

            ScriptCommand::ProposeRevision {
                dtu_id,
                user_id,
                changes,
                reason,
            } => to_json(service.propose_revision(&dtu_id, &user_id, changes, reason)?),
            ScriptCommand::VoteOnRevision {
                proposal_id,
                user_id,
                vote,
            } => {
                let vote: VoteChoice = vote.parse()?;
                to_json(service.vote_on_revision(&proposal_id, &user_id, vote)?)
            }
            ScriptCommand::GetRevisionProposals { dtu_id, status } => {
                let status = status
                    .map(|s| s.parse::<ProposalStatus>())
                    .transpose()?;
                to_json(service.get_revision_proposals(&dtu_id, status))
            }
            ScriptCommand::GetRevisionProposal { proposal_id } => {
                to_json(service.get_revision_proposal(&proposal_id)?)
            }
            ScriptCommand::ApplyRevision {
                proposal_id,
                user_id,
            } => to_json(service.apply_revision(&proposal_id, &user_id)?),
            ScriptCommand::WithdrawRevision {
                proposal_id,
                user_id,
            } => to_json(service.withdraw_revision(&proposal_id, &user_id)?),

            ScriptCommand::StartEditSession { dtu_id, user_id } => {
                let output = service.start_edit_session(&dtu_id, &user_id);
                serde_json::json!({ "session": output.session, "joined": output.joined })
            }
            ScriptCommand::RecordEdit {
                dtu_id,
                user_id,
                field,
                old_value,
                new_value,
            } => to_json(service.record_edit(&dtu_id, &user_id, &field, old_value, new_value)?),
            ScriptCommand::EndEditSession { dtu_id } => {
                to_json(service.end_edit_session(&dtu_id)?)
            }
            ScriptCommand::GetEditSession { dtu_id } => {
                to_json(service.get_edit_session(&dtu_id)?)
            }
            ScriptCommand::GetConflictingEdits {
                dtu_id,
                user_id,
                field,
                after_seq,
            } => to_json(service.get_conflicting_edits(&dtu_id, &user_id, &field, after_seq)?),
        };
        Ok(value)
    }
}

fn to_json<T: Serialize>(value: T) -> Value {
    serde_json::to_value(value).unwrap_or(Value::Null)
}

/// `$name` where name is an identifier
fn variable_name(s: &str) -> Option<&str> {
    let name = s.strip_prefix('$')?;
    let mut chars = name.chars();
    let first = chars.next()?;
    let valid = (first.is_ascii_alphabetic() || first == '_')
        && chars.all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-');
    valid.then_some(name)
}

/// The id a step produced, for `as` bindings
fn result_id(value: &Value) -> Option<String> {
    value
        .get("id")
        .or_else(|| value.get("session").and_then(|s| s.get("id")))
        .or_else(|| value.get("proposal").and_then(|p| p.get("id")))
        .and_then(Value::as_str)
        .map(str::to_string)
}
