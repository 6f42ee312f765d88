// src/app/registry.rs

use crate::{error::DispatchError, process::ObservationTable};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::{BTreeMap, HashMap};
use tracing::debug;

/// A property of a page component, e.g. `map.clickData`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ComponentProp {
    pub id: String,
    pub property: String,
}

impl ComponentProp {
    pub fn new(id: impl Into<String>, property: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            property: property.into(),
        }
    }
}

/// Computes one value per declared output from the triggering input value.
pub type Handler =
    Box<dyn Fn(&ObservationTable, &Value) -> Result<Vec<Value>, DispatchError> + Send + Sync>;

struct Callback {
    input: ComponentProp,
    outputs: Vec<ComponentProp>,
    handler: Handler,
}

/// Body of `POST /_dash-update-component`.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct UpdateRequest {
    pub inputs: Vec<InputValue>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct InputValue {
    pub id: String,
    pub property: String,
    #[serde(default)]
    pub value: Value,
}

/// `{"response": {"<id>": {"<property>": value}}}`
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
pub struct UpdateResponse {
    pub response: BTreeMap<String, BTreeMap<String, Value>>,
}

/// One entry of `GET /_dash-dependencies`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Dependency {
    pub inputs: Vec<ComponentProp>,
    pub outputs: Vec<ComponentProp>,
}

/// Routes a browser event, keyed by the component property that changed, to
/// the view update bound to it.
#[derive(Default)]
pub struct CallbackRegistry {
    callbacks: Vec<Callback>,
    by_input: HashMap<ComponentProp, usize>,
}

impl CallbackRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Bind `handler` to `input`. Registering the same input again replaces the
    /// earlier binding.
    pub fn register<F>(&mut self, input: ComponentProp, outputs: Vec<ComponentProp>, handler: F)
    where
        F: Fn(&ObservationTable, &Value) -> Result<Vec<Value>, DispatchError>
            + Send
            + Sync
            + 'static,
    {
        let callback = Callback {
            input: input.clone(),
            outputs,
            handler: Box::new(handler),
        };
        match self.by_input.get(&input) {
            Some(&idx) => self.callbacks[idx] = callback,
            None => {
                self.by_input.insert(input, self.callbacks.len());
                self.callbacks.push(callback);
            }
        }
    }

    pub fn len(&self) -> usize {
        self.callbacks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.callbacks.is_empty()
    }

    pub fn dependencies(&self) -> Vec<Dependency> {
        self.callbacks
            .iter()
            .map(|cb| Dependency {
                inputs: vec![cb.input.clone()],
                outputs: cb.outputs.clone(),
            })
            .collect()
    }

    /// Run the callback selected by the first input and collect its outputs.
    pub fn dispatch(
        &self,
        table: &ObservationTable,
        request: &UpdateRequest,
    ) -> Result<UpdateResponse, DispatchError> {
        let trigger = request.inputs.first().ok_or(DispatchError::NoInputs)?;
        let key = ComponentProp::new(trigger.id.as_str(), trigger.property.as_str());
        let idx = *self
            .by_input
            .get(&key)
            .ok_or_else(|| DispatchError::UnknownCallback {
                id: key.id.clone(),
                property: key.property.clone(),
            })?;
        let callback = &self.callbacks[idx];

        let values = (callback.handler)(table, &trigger.value)?;
        if values.len() != callback.outputs.len() {
            return Err(DispatchError::Internal(format!(
                "{}.{} returned {} values for {} outputs",
                key.id,
                key.property,
                values.len(),
                callback.outputs.len()
            )));
        }
        debug!(id = %key.id, property = %key.property, outputs = values.len(), "dispatched");

        let mut out = UpdateResponse::default();
        for (target, value) in callback.outputs.iter().zip(values) {
            out.response
                .entry(target.id.clone())
                .or_default()
                .insert(target.property.clone(), value);
        }
        Ok(out)
    }
}
