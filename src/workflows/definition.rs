use serde::{Deserialize, Serialize};

fn default_enabled() -> bool {
    true
}

/// A node in a workflow's state graph.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct State {
    pub id: String,
    #[serde(default)]
    pub name: String,
    #[serde(default, alias = "isinitial")]
    pub is_initial: bool,
    #[serde(default, alias = "isfinal")]
    pub is_final: bool,
    #[serde(default = "default_enabled")]
    pub enabled: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

impl State {
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            is_initial: false,
            is_final: false,
            enabled: true,
            description: None,
        }
    }

    pub fn initial(mut self) -> Self {
        self.is_initial = true;
        self
    }

    pub fn terminal(mut self) -> Self {
        self.is_final = true;
        self
    }

    pub fn disabled(mut self) -> Self {
        self.enabled = false;
        self
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }
}

/// A directed transition rule: fired from any of `from_states`, lands on `to_state`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ActionDef {
    pub id: String,
    #[serde(default)]
    pub name: String,
    #[serde(default = "default_enabled")]
    pub enabled: bool,
    #[serde(default, alias = "fromstates")]
    pub from_states: Vec<String>,
    #[serde(alias = "tostate")]
    pub to_state: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

impl ActionDef {
    pub fn new<I, S>(
        id: impl Into<String>,
        name: impl Into<String>,
        from_states: I,
        to_state: impl Into<String>,
    ) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            id: id.into(),
            name: name.into(),
            enabled: true,
            from_states: from_states.into_iter().map(Into::into).collect(),
            to_state: to_state.into(),
            description: None,
        }
    }

    pub fn disabled(mut self) -> Self {
        self.enabled = false;
        self
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn fires_from(&self, state_id: &str) -> bool {
        self.from_states.iter().any(|s| s == state_id)
    }
}

/// Template describing the legal states and transitions of a class of workflows.
///
/// Read-only once admitted to a store; the store hands out shared references.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WorkflowDefinition {
    pub id: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub states: Vec<State>,
    #[serde(default)]
    pub actions: Vec<ActionDef>,
}

impl WorkflowDefinition {
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            states: Vec::new(),
            actions: Vec::new(),
        }
    }

    pub fn with_state(mut self, state: State) -> Self {
        self.states.push(state);
        self
    }

    pub fn with_action(mut self, action: ActionDef) -> Self {
        self.actions.push(action);
        self
    }

    /// First state with the given id, in definition order.
    pub fn state(&self, id: &str) -> Option<&State> {
        self.states.iter().find(|s| s.id == id)
    }

    /// First action with the given id, in definition order.
    pub fn action(&self, id: &str) -> Option<&ActionDef> {
        self.actions.iter().find(|a| a.id == id)
    }
}
