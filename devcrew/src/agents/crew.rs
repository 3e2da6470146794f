//! Sequential task pipeline across agents.

use anyhow::{Context, Result, bail};
use tracing::{info, instrument};

use super::Agent;
use crate::io::prompt::{PromptEngine, TaskPromptInputs};
use crate::io::provider::TextCompletionProvider;

/// A unit of work assigned to one agent of the crew.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Task {
    pub description: String,
    pub expected_output: String,
    /// Index into the crew's agent list.
    pub agent: usize,
}

/// Shared inputs every task sees.
#[derive(Debug, Clone, Copy)]
pub struct CrewContext<'a> {
    pub requirement: &'a str,
    pub code: &'a str,
}

/// Output of a single task.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TaskOutput {
    pub description: String,
    pub agent: String,
    pub output: String,
}

/// Outputs of every task, in execution order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CrewOutput {
    pub tasks: Vec<TaskOutput>,
}

impl CrewOutput {
    /// Output of the last task (the crew's answer).
    pub fn final_output(&self) -> &str {
        self.tasks.last().map(|t| t.output.as_str()).unwrap_or_default()
    }
}

/// Agents plus the ordered tasks they work through.
#[derive(Debug, Clone)]
pub struct Crew {
    agents: Vec<Agent>,
    tasks: Vec<Task>,
}

impl Crew {
    /// Build a crew, rejecting empty task lists and dangling agent indices.
    pub fn new(agents: Vec<Agent>, tasks: Vec<Task>) -> Result<Self> {
        if tasks.is_empty() {
            bail!("crew needs at least one task");
        }
        if let Some(task) = tasks.iter().find(|task| task.agent >= agents.len()) {
            bail!(
                "task {:?} assigned to agent {} but crew has {} agents",
                task.description,
                task.agent,
                agents.len()
            );
        }
        Ok(Self { agents, tasks })
    }

    pub fn tasks(&self) -> &[Task] {
        &self.tasks
    }

    /// Agent assigned to `task`; `None` when the index is out of range.
    pub fn agent_for(&self, task: &Task) -> Option<&Agent> {
        self.agents.get(task.agent)
    }

    /// Agent of one of this crew's own tasks, validated in [`Crew::new`].
    fn assigned(&self, task: &Task) -> &Agent {
        &self.agents[task.agent]
    }

    /// Agent assigned to the last task.
    pub fn reviewer(&self) -> &Agent {
        let last = &self.tasks[self.tasks.len() - 1];
        self.assigned(last)
    }

    /// Run every task in order; each task sees the previous task's output.
    ///
    /// Stops at the first failing task.
    #[instrument(skip_all, fields(tasks = self.tasks.len()))]
    pub fn kickoff<P: TextCompletionProvider + ?Sized>(
        &self,
        provider: &P,
        prompts: &PromptEngine,
        context: CrewContext<'_>,
    ) -> Result<CrewOutput> {
        let mut outputs: Vec<TaskOutput> = Vec::with_capacity(self.tasks.len());
        for (index, task) in self.tasks.iter().enumerate() {
            let agent = self.assigned(task);
            info!(task = index + 1, agent = %agent.name, "starting crew task");
            let previous = outputs.last().map(|out| out.output.as_str());
            let output = agent
                .perform(
                    provider,
                    prompts,
                    &TaskPromptInputs {
                        description: &task.description,
                        expected_output: &task.expected_output,
                        requirement: Some(context.requirement),
                        code: Some(context.code),
                        previous,
                    },
                )
                .with_context(|| format!("crew task {} ({})", index + 1, agent.role))?;
            outputs.push(TaskOutput {
                description: task.description.clone(),
                agent: agent.name.clone(),
                output,
            });
        }
        Ok(CrewOutput { tasks: outputs })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::agents::roster::{default_crew, junior_developer};
    use crate::io::provider::ProviderError;
    use crate::test_support::ScriptedProvider;

    #[test]
    fn new_rejects_dangling_agent_index() {
        let err = Crew::new(
            vec![junior_developer()],
            vec![Task {
                description: "review".to_string(),
                expected_output: "text".to_string(),
                agent: 1,
            }],
        )
        .unwrap_err();
        assert!(err.to_string().contains("has 1 agents"));
    }

    #[test]
    fn agent_for_foreign_task_is_none() {
        let crew = default_crew().expect("crew");
        let foreign = Task {
            description: "not ours".to_string(),
            expected_output: "text".to_string(),
            agent: 7,
        };
        assert!(crew.agent_for(&foreign).is_none());
        assert_eq!(
            crew.agent_for(&crew.tasks()[0]).map(|agent| agent.name.as_str()),
            Some("Velibor")
        );
    }

    #[test]
    fn new_rejects_empty_tasks() {
        assert!(Crew::new(vec![junior_developer()], Vec::new()).is_err());
    }

    #[test]
    fn kickoff_chains_previous_output_into_next_task() {
        let provider = ScriptedProvider::new(vec![
            Ok("def add(a, b): return a + b".to_string()),
            Ok("Looks correct.".to_string()),
        ]);
        let prompts = PromptEngine::new().expect("prompts");
        let crew = default_crew().expect("crew");

        let output = crew
            .kickoff(
                &provider,
                &prompts,
                CrewContext {
                    requirement: "add numbers",
                    code: "print(1 + 2)",
                },
            )
            .expect("kickoff");

        assert_eq!(output.tasks.len(), 2);
        assert_eq!(output.tasks[0].agent, "Velibor");
        assert_eq!(output.final_output(), "Looks correct.");

        let sent = provider.prompts();
        assert!(sent[0].contains("Generate code based on the CTO's prompt"));
        assert!(sent[0].contains("add numbers"));
        assert!(!sent[0].contains("<previous_task_output>"));
        assert!(sent[1].contains("Verify the generated code"));
        assert!(sent[1].contains("def add(a, b): return a + b"));
        assert!(sent[1].contains("print(1 + 2)"));
    }

    #[test]
    fn kickoff_stops_at_first_failure() {
        let provider = ScriptedProvider::new(vec![Err(ProviderError::Authentication)]);
        let prompts = PromptEngine::new().expect("prompts");
        let crew = default_crew().expect("crew");

        let err = crew
            .kickoff(
                &provider,
                &prompts,
                CrewContext {
                    requirement: "r",
                    code: "c",
                },
            )
            .unwrap_err();

        assert!(format!("{err:#}").contains("authentication failed"));
        assert_eq!(provider.prompts().len(), 1);
    }
}
