use std::time::Duration;

use anyhow::{anyhow, Result};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::core::state::AgentSnapshot;
use crate::skills::plan::AVAILABLE_SKILLS;

const DEFAULT_PLANNER_URL: &str = "http://localhost:8080/plan";
/// Hard network-level timeout; the planner is advisory, never load-bearing.
const TIMEOUT: Duration = Duration::from_secs(10);

#[derive(Serialize)]
struct PlanRequest<'a> {
    id: Uuid,
    goal: &'a str,
    state: &'a AgentSnapshot,
    skills: &'static [&'static str],
}

#[derive(Deserialize)]
struct PlanResponse {
    steps: Vec<String>,
}

/// Client for the external long-horizon planner (an LLM service). Sends
/// the goal, an agent-state snapshot, and the skill vocabulary; gets back
/// an ordered list of skill-invocation strings. Step validation happens
/// downstream in the plan runner, per step.
#[derive(Clone)]
pub struct PlannerClient {
    client: reqwest::Client,
    url: String,
}

impl PlannerClient {
    pub fn new() -> Self {
        let url =
            std::env::var("GAMBIT_PLANNER_URL").unwrap_or_else(|_| DEFAULT_PLANNER_URL.to_string());
        Self::with_url(url)
    }

    pub fn with_url(url: String) -> Self {
        Self {
            client: reqwest::Client::builder()
                .timeout(TIMEOUT)
                .build()
                .unwrap_or_else(|_| reqwest::Client::new()),
            url,
        }
    }

    pub async fn plan(&self, goal: &str, state: &AgentSnapshot) -> Result<Vec<String>> {
        let request = PlanRequest {
            id: Uuid::new_v4(),
            goal,
            state,
            skills: AVAILABLE_SKILLS,
        };

        let response = self.client.post(&self.url).json(&request).send().await?;
        if !response.status().is_success() {
            return Err(anyhow!("planner returned {}", response.status()));
        }

        let body = response.text().await?;
        parse_plan_body(&body)
    }
}

/// LLM services are loose about envelopes; accept either the documented
/// `{"steps": [...]}` object or a bare JSON array of step strings.
pub fn parse_plan_body(body: &str) -> Result<Vec<String>> {
    if let Ok(parsed) = serde_json::from_str::<PlanResponse>(body) {
        return Ok(parsed.steps);
    }
    serde_json::from_str::<Vec<String>>(body)
        .map_err(|e| anyhow!("unparseable plan response: {e}"))
}

impl Default for PlannerClient {
    fn default() -> Self {
        Self::new()
    }
}
