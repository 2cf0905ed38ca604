use std::collections::BTreeMap;
use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::artifact::Artifact;
use crate::errors::{Result, StepError};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ArgKind {
    Parameter,
    Artifact,
}

/// Declared shape of a single component input or output.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ArgSpec {
    pub kind: ArgKind,
    pub type_name: String,
}

impl ArgSpec {
    pub fn parameter(type_name: impl Into<String>) -> Self {
        Self {
            kind: ArgKind::Parameter,
            type_name: type_name.into(),
        }
    }

    pub fn artifact(type_name: impl Into<String>) -> Self {
        Self {
            kind: ArgKind::Artifact,
            type_name: type_name.into(),
        }
    }
}

/// Immutable metadata describing a component's arguments. Supplied by the
/// pipeline-definition side; read-only to the harness.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ComponentSpec {
    inputs: BTreeMap<String, ArgSpec>,
    outputs: BTreeMap<String, ArgSpec>,
}

impl ComponentSpec {
    pub fn new(
        inputs: impl IntoIterator<Item = (String, ArgSpec)>,
        outputs: impl IntoIterator<Item = (String, ArgSpec)>,
    ) -> Result<Self> {
        Ok(Self {
            inputs: collect_args(inputs, "input")?,
            outputs: collect_args(outputs, "output")?,
        })
    }

    pub fn inputs(&self) -> impl Iterator<Item = (&String, &ArgSpec)> {
        self.inputs.iter()
    }

    pub fn outputs(&self) -> impl Iterator<Item = (&String, &ArgSpec)> {
        self.outputs.iter()
    }

    pub fn input(&self, name: &str) -> Option<&ArgSpec> {
        self.inputs.get(name)
    }

    pub fn output(&self, name: &str) -> Option<&ArgSpec> {
        self.outputs.get(name)
    }
}

fn collect_args(
    args: impl IntoIterator<Item = (String, ArgSpec)>,
    role: &str,
) -> Result<BTreeMap<String, ArgSpec>> {
    let mut collected = BTreeMap::new();
    for (name, spec) in args {
        let name = name.trim().to_string();
        if name.is_empty() {
            return Err(StepError::InvalidComponent(format!(
                "{role} names must not be empty"
            )));
        }
        if collected.insert(name.clone(), spec).is_some() {
            return Err(StepError::InvalidComponent(format!(
                "duplicate {role} '{name}'"
            )));
        }
    }
    Ok(collected)
}

/// An argument value is either an inline parameter value or an artifact
/// reference, checked by pattern match only.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "value", rename_all = "snake_case")]
pub enum ArgValue {
    Plain(Value),
    Artifact(Artifact),
}

/// Caller-supplied arguments for one run. Raw values destined for artifact
/// slots are accepted; the executor converts them.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ComponentArgs {
    args: BTreeMap<String, ArgValue>,
}

impl ComponentArgs {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_value(mut self, name: impl Into<String>, value: Value) -> Self {
        self.args.insert(name.into(), ArgValue::Plain(value));
        self
    }

    pub fn with_artifact(mut self, name: impl Into<String>, artifact: Artifact) -> Self {
        self.args.insert(name.into(), ArgValue::Artifact(artifact));
        self
    }

    pub fn get(&self, name: &str) -> Option<&ArgValue> {
        self.args.get(name)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &ArgValue)> {
        self.args.iter()
    }

    /// Deep copy with every artifact reference rewritten; plain values pass
    /// through untouched.
    pub fn map_artifacts<F>(&self, rewrite: F) -> Result<ComponentArgs>
    where
        F: Fn(&Artifact) -> Result<Artifact>,
    {
        let mut args = BTreeMap::new();
        for (name, value) in &self.args {
            let mapped = match value {
                ArgValue::Artifact(artifact) => ArgValue::Artifact(rewrite(artifact)?),
                ArgValue::Plain(value) => ArgValue::Plain(value.clone()),
            };
            args.insert(name.clone(), mapped);
        }
        Ok(ComponentArgs { args })
    }
}

/// The fully materialized argument set handed to a component: every declared
/// artifact slot resolved to an [`Artifact`], every parameter inline.
#[derive(Debug, Clone)]
pub struct ExecArgs {
    args: BTreeMap<String, ArgValue>,
}

impl ExecArgs {
    pub(crate) fn new(args: BTreeMap<String, ArgValue>) -> Self {
        Self { args }
    }

    pub fn param<T: DeserializeOwned>(&self, name: &str) -> Result<T> {
        match self.args.get(name) {
            Some(ArgValue::Plain(value)) => {
                serde_json::from_value(value.clone()).map_err(|_| StepError::ArgumentMismatch {
                    name: name.to_string(),
                    expected: "parameter of the requested type",
                })
            }
            Some(ArgValue::Artifact(_)) => Err(StepError::ArgumentMismatch {
                name: name.to_string(),
                expected: "parameter",
            }),
            None => Err(StepError::MissingArgument(name.to_string())),
        }
    }

    pub fn artifact(&self, name: &str) -> Result<&Artifact> {
        match self.args.get(name) {
            Some(ArgValue::Artifact(artifact)) => Ok(artifact),
            Some(ArgValue::Plain(_)) => Err(StepError::ArgumentMismatch {
                name: name.to_string(),
                expected: "artifact",
            }),
            None => Err(StepError::MissingArgument(name.to_string())),
        }
    }
}

/// What a component hands back: nothing, a single value, or a named tuple of
/// values (the names travel with the tuple).
#[derive(Debug, Clone, PartialEq)]
pub enum ReturnValue {
    None,
    Single(Value),
    Named(BTreeMap<String, Value>),
}

pub type ComponentFn = Arc<dyn Fn(&ExecArgs) -> Result<ReturnValue> + Send + Sync>;

/// A unit of computation: declared argument metadata, the runtime image it
/// ships in, the source file it lives in, and its execution contract.
#[derive(Clone)]
pub struct Component {
    name: String,
    source_path: PathBuf,
    image: String,
    spec: ComponentSpec,
    func: ComponentFn,
}

impl Component {
    pub fn new(
        name: impl Into<String>,
        source_path: impl Into<PathBuf>,
        image: impl Into<String>,
        spec: ComponentSpec,
        func: ComponentFn,
    ) -> Result<Self> {
        let name = name.into().trim().to_string();
        if name.is_empty() {
            return Err(StepError::InvalidComponent(
                "component name must not be empty".to_string(),
            ));
        }
        let image = image.into().trim().to_string();
        if image.is_empty() {
            return Err(StepError::InvalidComponent(format!(
                "component '{name}' image must not be empty"
            )));
        }
        Ok(Self {
            name,
            source_path: source_path.into(),
            image,
            spec,
            func,
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn source_path(&self) -> &Path {
        &self.source_path
    }

    pub fn source_file_name(&self) -> Result<String> {
        self.source_path
            .file_name()
            .and_then(|name| name.to_str())
            .map(str::to_string)
            .ok_or_else(|| {
                StepError::InvalidComponent(format!(
                    "component source path '{}' has no file name",
                    self.source_path.display()
                ))
            })
    }

    pub fn image(&self) -> &str {
        &self.image
    }

    pub fn spec(&self) -> &ComponentSpec {
        &self.spec
    }

    pub fn locator(&self) -> Result<Locator> {
        Ok(Locator::new(self.source_file_name()?, self.name.as_str()))
    }

    pub(crate) fn execute(&self, args: &ExecArgs) -> Result<ReturnValue> {
        (self.func)(args)
    }
}

impl fmt::Debug for Component {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Component")
            .field("name", &self.name)
            .field("source_path", &self.source_path)
            .field("image", &self.image)
            .field("spec", &self.spec)
            .finish_non_exhaustive()
    }
}

/// Serializable reference to a component callable. Callables do not cross the
/// process boundary; the sandbox side re-resolves this against its registry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Locator {
    pub source_file: String,
    pub symbol: String,
}

impl Locator {
    pub fn new(source_file: impl Into<String>, symbol: impl Into<String>) -> Self {
        Self {
            source_file: source_file.into(),
            symbol: symbol.into(),
        }
    }

    /// Module-resolution contract: the file stem of the source file is the
    /// module a symbol is looked up under.
    pub fn module(&self) -> &str {
        let name = self
            .source_file
            .rsplit('/')
            .next()
            .unwrap_or(&self.source_file);
        match name.rsplit_once('.') {
            Some((stem, _)) => stem,
            None => name,
        }
    }
}

/// Explicit lookup table the sandbox entry point resolves locators against.
#[derive(Debug, Default)]
pub struct ComponentRegistry {
    components: BTreeMap<String, Arc<Component>>,
}

impl ComponentRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, component: Component) -> Result<()> {
        let name = component.name().to_string();
        if self
            .components
            .insert(name.clone(), Arc::new(component))
            .is_some()
        {
            return Err(StepError::InvalidComponent(format!(
                "component '{name}' is already registered"
            )));
        }
        Ok(())
    }

    pub fn resolve(&self, locator: &Locator) -> Result<Arc<Component>> {
        let component = match self.components.get(&locator.symbol) {
            Some(component) => component.clone(),
            None => return Err(Self::unresolved(locator)),
        };
        let registered = Locator::new(component.source_file_name()?, component.name());
        if registered.module() != locator.module() {
            return Err(Self::unresolved(locator));
        }
        Ok(component)
    }

    fn unresolved(locator: &Locator) -> StepError {
        StepError::ComponentUnresolved {
            source_file: locator.source_file.clone(),
            symbol: locator.symbol.clone(),
        }
    }
}
