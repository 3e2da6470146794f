//! The default two-person team: a junior developer and a reviewing CTO.

use anyhow::Result;

use super::Agent;
use super::crew::{Crew, Task};

pub fn junior_developer() -> Agent {
    Agent {
        name: "Velibor".to_string(),
        role: "Junior Developer".to_string(),
        goal: "Generate code based on prompts".to_string(),
        backstory: "A junior developer eager to learn and implement new ideas.".to_string(),
    }
}

pub fn chief_technical_officer() -> Agent {
    Agent {
        name: "Chief Technical Officer".to_string(),
        role: "Senior Developer and CTO".to_string(),
        goal: "Oversee code generation and verify its correctness".to_string(),
        backstory:
            "An experienced CTO with a keen eye for code quality and best practices.".to_string(),
    }
}

/// Developer writes, CTO reviews, in that order.
pub fn default_crew() -> Result<Crew> {
    Crew::new(
        vec![junior_developer(), chief_technical_officer()],
        vec![
            Task {
                description: "Generate code based on the CTO's prompt".to_string(),
                expected_output: "Python code that fulfills the CTO's requirements".to_string(),
                agent: 0,
            },
            Task {
                description: "Verify the generated code and provide feedback".to_string(),
                expected_output: "A detailed review of the code, including suggestions for improvements if necessary".to_string(),
                agent: 1,
            },
        ],
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_crew_pairs_developer_then_reviewer() {
        let crew = default_crew().expect("crew");
        let assigned: Vec<&str> = crew
            .tasks()
            .iter()
            .filter_map(|task| crew.agent_for(task))
            .map(|agent| agent.role.as_str())
            .collect();
        assert_eq!(assigned, vec!["Junior Developer", "Senior Developer and CTO"]);
    }

    #[test]
    fn reviewer_is_the_cto() {
        let crew = default_crew().expect("crew");
        assert_eq!(crew.reviewer().name, "Chief Technical Officer");
    }
}
