//! Demo components exercised by the usage tests: a squaring step, a halving
//! step that chains from it, a component with named outputs, and one that
//! always fails. The registry at the bottom is what the runner binary
//! resolves locators against.

use std::collections::BTreeMap;
use std::sync::Arc;

use serde_json::json;
use stepbox::{
    ArgSpec, Component, ComponentRegistry, ComponentSpec, ExecArgs, Result, ReturnValue, StepError,
};

const SOURCE: &str = concat!(env!("CARGO_MANIFEST_DIR"), "/src/lib.rs");
const IMAGE: &str = "debian:bookworm-slim";

/// Squares each element of its input dataset into its output dataset.
pub fn square_component() -> Result<Component> {
    let spec = ComponentSpec::new(
        [("input_list".to_string(), ArgSpec::artifact("system.Dataset"))],
        [(
            "squared_list".to_string(),
            ArgSpec::artifact("system.Dataset"),
        )],
    )?;
    Component::new(
        "square_component",
        SOURCE,
        IMAGE,
        spec,
        Arc::new(|args: &ExecArgs| {
            let input: Vec<i64> = args.artifact("input_list")?.read_json()?;
            let squared: Vec<i64> = input.iter().map(|x| x * x).collect();
            args.artifact("squared_list")?.write_json(&squared)?;
            Ok(ReturnValue::None)
        }),
    )
}

/// Halves each element of its input dataset; chains from `square_component`.
pub fn halve_component() -> Result<Component> {
    let spec = ComponentSpec::new(
        [(
            "squared_list".to_string(),
            ArgSpec::artifact("system.Dataset"),
        )],
        [(
            "halved_list".to_string(),
            ArgSpec::artifact("system.Dataset"),
        )],
    )?;
    Component::new(
        "halve_component",
        SOURCE,
        IMAGE,
        spec,
        Arc::new(|args: &ExecArgs| {
            let input: Vec<f64> = args.artifact("squared_list")?.read_json()?;
            let halved: Vec<f64> = input.iter().map(|x| x / 2.0).collect();
            args.artifact("halved_list")?.write_json(&halved)?;
            Ok(ReturnValue::None)
        }),
    )
}

/// Returns a named tuple (`full_name`, `squared_dataset`) and additionally
/// writes the squared dataset to an output artifact.
pub fn named_output_component() -> Result<Component> {
    let spec = ComponentSpec::new(
        [
            ("firstname".to_string(), ArgSpec::parameter("String")),
            ("lastname".to_string(), ArgSpec::parameter("String")),
            (
                "input_dataset".to_string(),
                ArgSpec::artifact("system.Dataset"),
            ),
        ],
        [
            ("full_name".to_string(), ArgSpec::parameter("String")),
            ("squared_dataset".to_string(), ArgSpec::parameter("String")),
            (
                "output_dataset".to_string(),
                ArgSpec::artifact("system.Dataset"),
            ),
        ],
    )?;
    Component::new(
        "named_output_component",
        SOURCE,
        IMAGE,
        spec,
        Arc::new(|args: &ExecArgs| {
            let firstname: String = args.param("firstname")?;
            let lastname: String = args.param("lastname")?;
            let input: Vec<i64> = args.artifact("input_dataset")?.read_json()?;
            let squared: Vec<i64> = input.iter().map(|x| x * x).collect();
            args.artifact("output_dataset")?.write_json(&squared)?;

            let mut named = BTreeMap::new();
            named.insert(
                "full_name".to_string(),
                json!(format!("{firstname} {lastname}")),
            );
            named.insert("squared_dataset".to_string(), json!(squared));
            Ok(ReturnValue::Named(named))
        }),
    )
}

/// Fails unconditionally; used to observe error surfacing across the
/// sandbox boundary.
pub fn failing_component() -> Result<Component> {
    let spec = ComponentSpec::new(
        [("input_list".to_string(), ArgSpec::artifact("system.Dataset"))],
        [],
    )?;
    Component::new(
        "failing_component",
        SOURCE,
        IMAGE,
        spec,
        Arc::new(|_args: &ExecArgs| {
            Err(StepError::Execution(
                "failing_component always fails".to_string(),
            ))
        }),
    )
}

pub fn registry() -> Result<ComponentRegistry> {
    let mut registry = ComponentRegistry::new();
    registry.register(square_component()?)?;
    registry.register(halve_component()?)?;
    registry.register(named_output_component()?)?;
    registry.register(failing_component()?)?;
    Ok(registry)
}
